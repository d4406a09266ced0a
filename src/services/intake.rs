use crate::models::{FileReference, StagedFile};
use crate::services::access::{AccessControl, AccessGrant};
use crate::utils::validation::accepted_extension;
use chrono::Utc;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tokio::fs::{self, File, OpenOptions};
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum IntakeError {
    /// Not one of ours; the caller should fall through to default handling.
    #[error("Unsupported file type: {}", .extension.as_deref().unwrap_or("<none>"))]
    UnsupportedType { extension: Option<String> },

    #[error("Access denied for {}", .reference.display())]
    AccessDenied { reference: PathBuf },

    #[error("Failed to stage {}: {source}", .reference.display())]
    CopyFailed {
        reference: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Validates incoming references and copies them into the staging directory.
pub struct ReferenceIntake {
    staging_dir: PathBuf,
    accepted_extensions: Vec<String>,
    access: Arc<dyn AccessControl>,
}

impl ReferenceIntake {
    pub fn new(
        staging_dir: impl Into<PathBuf>,
        accepted_extensions: Vec<String>,
        access: Arc<dyn AccessControl>,
    ) -> Self {
        Self {
            staging_dir: staging_dir.into(),
            accepted_extensions,
            access,
        }
    }

    pub fn staging_dir(&self) -> &Path {
        &self.staging_dir
    }

    pub async fn intake(&self, reference: &FileReference) -> Result<StagedFile, IntakeError> {
        let extension = accepted_extension(reference.extension(), &self.accepted_extensions)
            .ok_or_else(|| IntakeError::UnsupportedType {
                extension: reference.extension().map(str::to_string),
            })?;

        let origin = reference.path();
        let _grant = AccessGrant::acquire(self.access.as_ref(), origin).ok_or_else(|| {
            IntakeError::AccessDenied {
                reference: origin.to_path_buf(),
            }
        })?;

        let staged_path = self
            .staging_dir
            .join(format!("import_{}.{}", Uuid::new_v4(), extension));

        copy_into_staging(origin, &self.staging_dir, &staged_path)
            .await
            .map_err(|source| IntakeError::CopyFailed {
                reference: origin.to_path_buf(),
                source,
            })?;

        tracing::info!(
            origin = %origin.display(),
            staged = %staged_path.display(),
            "Staged incoming file"
        );

        Ok(StagedFile {
            origin_path: origin.to_path_buf(),
            staged_path,
            extension,
            staged_at: Utc::now(),
        })
    }
}

/// Copies `origin` to a freshly created `destination`. The destination is
/// only removed on failure if this call created it.
async fn copy_into_staging(origin: &Path, staging_dir: &Path, destination: &Path) -> io::Result<()> {
    fs::create_dir_all(staging_dir).await?;
    let mut source = File::open(origin).await?;
    let mut target = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(destination)
        .await?;

    let copied = async {
        tokio::io::copy(&mut source, &mut target).await?;
        target.flush().await?;
        target.sync_all().await
    }
    .await;

    if copied.is_err() {
        drop(target);
        if let Err(e) = fs::remove_file(destination).await {
            tracing::warn!(
                "Failed to remove partial staged file {}: {}",
                destination.display(),
                e
            );
        }
    }

    copied
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingAccess {
        grant: bool,
        acquired: AtomicUsize,
        released: AtomicUsize,
    }

    impl CountingAccess {
        fn new(grant: bool) -> Arc<Self> {
            Arc::new(Self {
                grant,
                acquired: AtomicUsize::new(0),
                released: AtomicUsize::new(0),
            })
        }
    }

    impl AccessControl for CountingAccess {
        fn acquire_access(&self, _reference: &Path) -> bool {
            self.acquired.fetch_add(1, Ordering::SeqCst);
            self.grant
        }

        fn release_access(&self, _reference: &Path) {
            self.released.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn defaults() -> Vec<String> {
        vec!["xml".to_string(), "ssrf".to_string(), "uddf".to_string()]
    }

    fn staged_entries(dir: &Path) -> usize {
        match std::fs::read_dir(dir) {
            Ok(entries) => entries.count(),
            Err(_) => 0,
        }
    }

    #[tokio::test]
    async fn test_intake_accepts_mixed_case_extension() {
        let inbox = tempfile::tempdir().unwrap();
        let staging = tempfile::tempdir().unwrap();
        let origin = inbox.path().join("Dive Log.XML");
        std::fs::write(&origin, b"<dives/>").unwrap();

        let access = CountingAccess::new(true);
        let intake = ReferenceIntake::new(staging.path(), defaults(), access.clone());
        let staged = intake.intake(&FileReference::new(&origin)).await.unwrap();

        assert_eq!(staged.extension, "xml");
        assert_eq!(staged.origin_path, origin);
        assert!(staged.staged_path.starts_with(staging.path()));
        let name = staged.staged_path.file_name().unwrap().to_str().unwrap();
        assert!(name.starts_with("import_"));
        assert!(name.ends_with(".xml"));
        assert_eq!(std::fs::read(&staged.staged_path).unwrap(), b"<dives/>");
        assert_eq!(access.acquired.load(Ordering::SeqCst), 1);
        assert_eq!(access.released.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_intake_rejects_pdf_without_side_effects() {
        let inbox = tempfile::tempdir().unwrap();
        let staging = tempfile::tempdir().unwrap();
        let origin = inbox.path().join("manual.pdf");
        std::fs::write(&origin, b"%PDF-1.7").unwrap();

        let access = CountingAccess::new(true);
        let intake = ReferenceIntake::new(staging.path(), defaults(), access.clone());
        let err = intake.intake(&FileReference::new(&origin)).await.unwrap_err();

        assert!(matches!(
            err,
            IntakeError::UnsupportedType { extension: Some(ref ext) } if ext == "pdf"
        ));
        assert_eq!(staged_entries(staging.path()), 0);
        assert_eq!(access.acquired.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_intake_rejects_png_and_creates_nothing() {
        let inbox = tempfile::tempdir().unwrap();
        let staging_root = tempfile::tempdir().unwrap();
        let staging_dir = staging_root.path().join("imports");
        let origin = inbox.path().join("photo.png");
        std::fs::write(&origin, [0x89, 0x50, 0x4E, 0x47]).unwrap();

        let intake = ReferenceIntake::new(&staging_dir, defaults(), CountingAccess::new(true));
        let err = intake.intake(&FileReference::new(&origin)).await.unwrap_err();

        assert!(matches!(err, IntakeError::UnsupportedType { .. }));
        assert!(!staging_dir.exists());
    }

    #[tokio::test]
    async fn test_intake_rejects_missing_extension() {
        let staging = tempfile::tempdir().unwrap();
        let intake = ReferenceIntake::new(staging.path(), defaults(), CountingAccess::new(true));
        let err = intake
            .intake(&FileReference::new("/tmp/no-extension"))
            .await
            .unwrap_err();

        assert!(matches!(err, IntakeError::UnsupportedType { extension: None }));
    }

    #[tokio::test]
    async fn test_staged_copy_survives_origin_removal() {
        let inbox = tempfile::tempdir().unwrap();
        let staging = tempfile::tempdir().unwrap();
        let origin = inbox.path().join("export.uddf");
        std::fs::write(&origin, b"<uddf version=\"3.2.0\"/>").unwrap();

        let intake = ReferenceIntake::new(staging.path(), defaults(), CountingAccess::new(true));
        let staged = intake.intake(&FileReference::new(&origin)).await.unwrap();

        std::fs::write(&origin, b"overwritten").unwrap();
        std::fs::remove_file(&origin).unwrap();
        drop(inbox);

        assert_eq!(
            std::fs::read(&staged.staged_path).unwrap(),
            b"<uddf version=\"3.2.0\"/>"
        );
    }

    #[tokio::test]
    async fn test_repeated_intake_never_collides() {
        let inbox = tempfile::tempdir().unwrap();
        let staging = tempfile::tempdir().unwrap();
        let origin = inbox.path().join("log.ssrf");
        std::fs::write(&origin, b"ssrf").unwrap();

        let intake = ReferenceIntake::new(staging.path(), defaults(), CountingAccess::new(true));
        let reference = FileReference::new(&origin);
        let first = intake.intake(&reference).await.unwrap();
        let second = intake.intake(&reference).await.unwrap();

        assert_ne!(first.staged_path, second.staged_path);
        assert_eq!(staged_entries(staging.path()), 2);
    }

    #[tokio::test]
    async fn test_access_denied_stages_nothing() {
        let inbox = tempfile::tempdir().unwrap();
        let staging = tempfile::tempdir().unwrap();
        let origin = inbox.path().join("log.xml");
        std::fs::write(&origin, b"<dives/>").unwrap();

        let access = CountingAccess::new(false);
        let intake = ReferenceIntake::new(staging.path(), defaults(), access.clone());
        let err = intake.intake(&FileReference::new(&origin)).await.unwrap_err();

        assert!(matches!(err, IntakeError::AccessDenied { .. }));
        assert_eq!(staged_entries(staging.path()), 0);
        assert_eq!(access.released.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_copy_failure_releases_grant() {
        let inbox = tempfile::tempdir().unwrap();
        let staging = tempfile::tempdir().unwrap();
        let origin = inbox.path().join("vanished.xml");

        let access = CountingAccess::new(true);
        let intake = ReferenceIntake::new(staging.path(), defaults(), access.clone());
        let err = intake.intake(&FileReference::new(&origin)).await.unwrap_err();

        assert!(matches!(err, IntakeError::CopyFailed { .. }));
        assert_eq!(access.acquired.load(Ordering::SeqCst), 1);
        assert_eq!(access.released.load(Ordering::SeqCst), 1);
        assert_eq!(staged_entries(staging.path()), 0);
    }

    #[tokio::test]
    async fn test_unwritable_staging_dir_is_copy_failure() {
        let inbox = tempfile::tempdir().unwrap();
        let origin = inbox.path().join("log.xml");
        std::fs::write(&origin, b"<dives/>").unwrap();
        // A regular file where the staging directory should be
        let blocker = inbox.path().join("not-a-dir");
        std::fs::write(&blocker, b"").unwrap();

        let access = CountingAccess::new(true);
        let intake = ReferenceIntake::new(&blocker, defaults(), access.clone());
        let err = intake.intake(&FileReference::new(&origin)).await.unwrap_err();

        assert!(matches!(err, IntakeError::CopyFailed { .. }));
        assert_eq!(access.released.load(Ordering::SeqCst), 1);
    }
}
