//! Source location of a document.

use serde::{Deserialize, Serialize};

use crate::TmxError;

/// Directory and file name a document was loaded from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Meta {
    pub path: String,
    pub file: String,
}

impl Meta {
    pub fn new(path: impl Into<String>, file: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            file: file.into(),
        }
    }

    /// Split a combined `path/file` string.
    ///
    /// The file is everything after the last `/` or `\`; the directory is
    /// everything before it, with backslashes normalised to `/`. A bare file
    /// name yields the directory `"./"`.
    ///
    /// ```
    /// use tessera_tmx::meta::Meta;
    ///
    /// let meta = Meta::split("maps\\town/square.tmx").unwrap();
    /// assert_eq!(meta.path, "maps/town");
    /// assert_eq!(meta.file, "square.tmx");
    /// ```
    pub fn split(pathfile: &str) -> Result<Self, TmxError> {
        let (path, file) = match pathfile.rfind(['/', '\\']) {
            Some(sep) => (&pathfile[..sep], &pathfile[sep + 1..]),
            None => (pathfile, pathfile),
        };

        if file.is_empty() {
            return Err(TmxError::BadFilename {
                input: pathfile.to_owned(),
            });
        }

        let path = if path == file {
            "./".to_owned()
        } else {
            path.replace('\\', "/")
        };

        Ok(Self::new(path, file))
    }

    /// Full path of the document itself.
    pub fn full_path(&self) -> String {
        self.join(&self.file)
    }

    /// Resolve `relative` against the document's directory.
    pub fn join(&self, relative: &str) -> String {
        let dir = self.path.trim_end_matches('/');
        format!("{dir}/{relative}")
    }
}
