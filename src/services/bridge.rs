use crate::models::{FileReference, StagedFile};
use crate::services::intake::{IntakeError, ReferenceIntake};
use crate::services::relay::{Delivery, HandoffRelay, Subscription};
use crate::services::updater::UpdateChecker;
use std::sync::Arc;

/// Entry point shared by the OS delivery side and the application runtime.
pub struct FileBridge {
    intake: ReferenceIntake,
    relay: Arc<HandoffRelay>,
    updater: Arc<dyn UpdateChecker>,
}

impl FileBridge {
    pub fn new(intake: ReferenceIntake, updater: Arc<dyn UpdateChecker>) -> Self {
        Self {
            intake,
            relay: Arc::new(HandoffRelay::new()),
            updater,
        }
    }

    pub fn intake(&self) -> &ReferenceIntake {
        &self.intake
    }

    pub fn relay(&self) -> &HandoffRelay {
        &self.relay
    }

    /// Stages `reference` and hands it to the relay.
    pub async fn open_file(
        &self,
        reference: &FileReference,
    ) -> Result<(StagedFile, Delivery), IntakeError> {
        let staged = match self.intake.intake(reference).await {
            Ok(staged) => staged,
            Err(e) => {
                match &e {
                    IntakeError::UnsupportedType { .. } => {
                        tracing::debug!("Ignoring {}: {}", reference, e)
                    }
                    IntakeError::AccessDenied { .. } => tracing::warn!("{}", e),
                    IntakeError::CopyFailed { .. } => tracing::error!("{}", e),
                }
                return Err(e);
            }
        };

        let delivery = self.relay.deliver(staged.clone());
        Ok((staged, delivery))
    }

    /// Boolean form of [`open_file`](Self::open_file) for OS callbacks:
    /// `false` tells the platform to fall back to its default handling.
    pub async fn handles(&self, reference: &FileReference) -> bool {
        self.open_file(reference).await.is_ok()
    }

    /// Stages references passed at launch, before any receiver can exist.
    /// Returns how many were handed off.
    pub async fn stage_startup_references(&self, references: &[String]) -> usize {
        let mut staged = 0;
        for raw in references {
            match FileReference::parse(raw) {
                Some(reference) => {
                    if self.handles(&reference).await {
                        tracing::info!("📥 Startup file staged: {}", reference);
                        staged += 1;
                    }
                }
                None => tracing::warn!("Ignoring invalid startup reference: {}", raw),
            }
        }
        staged
    }

    pub fn request_pending_file(&self) -> Option<String> {
        self.relay
            .query_pending()
            .map(|file| file.staged_path_string())
    }

    pub fn register_receiver(&self) -> Subscription {
        self.relay.register_receiver()
    }

    pub fn trigger_update_check(&self) {
        self.updater.trigger_update_check();
    }
}
