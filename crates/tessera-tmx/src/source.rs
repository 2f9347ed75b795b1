//! Where document trees come from.
//!
//! The parser only needs a nested key/value tree. A [`DocumentSource`] turns a
//! [`Meta`] location into that tree; [`JsonFileSource`] reads the
//! interchange format's JSON export from disk.

use std::path::PathBuf;

use serde_json::Value;

use crate::meta::Meta;
use crate::model::Document;
use crate::parse::parse_document;
use crate::TmxError;

/// Produces the raw key/value tree for a document location.
pub trait DocumentSource {
    fn load(&self, meta: &Meta) -> Result<Value, TmxError>;
}

impl<F> DocumentSource for F
where
    F: Fn(&Meta) -> Result<Value, TmxError>,
{
    fn load(&self, meta: &Meta) -> Result<Value, TmxError> {
        self(meta)
    }
}

/// Reads `meta.path/meta.file` from the filesystem as JSON.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonFileSource;

impl DocumentSource for JsonFileSource {
    fn load(&self, meta: &Meta) -> Result<Value, TmxError> {
        let path = PathBuf::from(meta.full_path());
        let text = std::fs::read_to_string(&path).map_err(|source| TmxError::Io {
            path: path.clone(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| TmxError::Json { path, source })
    }
}

impl Document {
    /// Load the document at a combined `path/file` location.
    pub fn load(source: &impl DocumentSource, pathfile: &str) -> Result<Self, TmxError> {
        Self::load_meta(source, Meta::split(pathfile)?)
    }

    /// Load the document `file` in directory `path`.
    pub fn load_from(
        source: &impl DocumentSource,
        path: &str,
        file: &str,
    ) -> Result<Self, TmxError> {
        Self::load_meta(source, Meta::new(path, file))
    }

    /// Parse an in-memory tree as if it had been loaded from `meta`.
    pub fn from_value(value: &Value, meta: Meta) -> Result<Self, TmxError> {
        parse_document(value, meta)
    }

    fn load_meta(source: &impl DocumentSource, meta: Meta) -> Result<Self, TmxError> {
        let value = source.load(&meta)?;
        parse_document(&value, meta)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;

    #[test]
    fn closure_source_receives_split_location() {
        let source = |meta: &Meta| -> Result<Value, TmxError> {
            assert_eq!(meta.path, "levels");
            assert_eq!(meta.file, "one.json");
            Ok(serde_json::json!({ "orientation": "hexagonal" }))
        };
        let err = Document::load(&source, "levels/one.json").unwrap_err();
        assert!(matches!(err, TmxError::UnsupportedValue { field: "orientation", .. }));
    }

    #[test]
    fn bad_filename_never_reaches_source() {
        let source = |_: &Meta| -> Result<Value, TmxError> { panic!("source must not be called") };
        let err = Document::load(&source, "levels/").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MalformedDocument);
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = Document::load_from(&JsonFileSource, "/nonexistent-dir", "map.json").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Io);
    }
}
