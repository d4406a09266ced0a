use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use url::Url;
use utoipa::ToSchema;

/// Opaque locator for a file the OS handed to the process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileReference {
    path: PathBuf,
}

impl FileReference {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Accepts a plain filesystem path or a `file://` URL. Other URL schemes
    /// and empty input are rejected.
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if raw.is_empty() {
            return None;
        }

        if raw.contains("://") {
            let url = Url::parse(raw).ok()?;
            if url.scheme() != "file" {
                return None;
            }
            return url.to_file_path().ok().map(Self::new);
        }

        Some(Self::new(raw))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Extension as received, case preserved.
    pub fn extension(&self) -> Option<&str> {
        self.path.extension().and_then(|ext| ext.to_str())
    }
}

impl fmt::Display for FileReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path.display())
    }
}

/// A bridge-owned durable copy of an externally referenced file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct StagedFile {
    #[schema(value_type = String)]
    pub origin_path: PathBuf,
    #[schema(value_type = String)]
    pub staged_path: PathBuf,
    pub extension: String,
    pub staged_at: DateTime<Utc>,
}

impl StagedFile {
    /// The staged path in the string form handed to the application runtime.
    pub fn staged_path_string(&self) -> String {
        self.staged_path.to_string_lossy().into_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain_path() {
        let reference = FileReference::parse("/tmp/dives/log.UDDF").unwrap();
        assert_eq!(reference.path(), Path::new("/tmp/dives/log.UDDF"));
        assert_eq!(reference.extension(), Some("UDDF"));
    }

    #[cfg(unix)]
    #[test]
    fn test_parse_file_url() {
        let reference = FileReference::parse("file:///tmp/My%20Dives/export.xml").unwrap();
        assert_eq!(reference.path(), Path::new("/tmp/My Dives/export.xml"));
        assert_eq!(reference.extension(), Some("xml"));
    }

    #[test]
    fn test_parse_rejects_remote_and_empty() {
        assert!(FileReference::parse("https://example.com/export.xml").is_none());
        assert!(FileReference::parse("   ").is_none());
    }

    #[test]
    fn test_extension_missing() {
        let reference = FileReference::new("/tmp/README");
        assert_eq!(reference.extension(), None);
    }
}
