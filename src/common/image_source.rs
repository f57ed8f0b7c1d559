use std::path::PathBuf;

/// A photograph on disk, together with the path it was selected under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageSource {
    path: PathBuf,
    relative_path: String,
    file_name: String,
}

impl ImageSource {
    /// `relative_path` uses `/` separators, e.g. `Root/1234/img1.jpg`.
    pub fn new(path: impl Into<PathBuf>, relative_path: impl Into<String>) -> Self {
        let relative_path = relative_path.into();
        let file_name = relative_path
            .rsplit('/')
            .next()
            .unwrap_or_default()
            .to_string();

        Self {
            path: path.into(),
            relative_path,
            file_name,
        }
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    pub fn relative_path(&self) -> &str {
        &self.relative_path
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }
}
