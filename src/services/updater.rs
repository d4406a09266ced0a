use tokio::process::Command;

/// Self-update collaborator. Triggering is fire-and-forget: no result, no
/// error surfaced, and overlapping checks are the collaborator's concern.
pub trait UpdateChecker: Send + Sync {
    fn trigger_update_check(&self);
}

/// Runs an external updater command, e.g. a Sparkle or winsparkle CLI.
pub struct CommandUpdateChecker {
    program: String,
    args: Vec<String>,
}

impl CommandUpdateChecker {
    /// Splits `command` on whitespace. Returns `None` for an empty command.
    pub fn from_command_line(command: &str) -> Option<Self> {
        let mut parts = command.split_whitespace().map(str::to_string);
        let program = parts.next()?;
        Some(Self {
            program,
            args: parts.collect(),
        })
    }

    pub fn program(&self) -> &str {
        &self.program
    }
}

impl UpdateChecker for CommandUpdateChecker {
    /// Must be called from within a tokio runtime; the child is reaped on a
    /// background task.
    fn trigger_update_check(&self) {
        match Command::new(&self.program).args(&self.args).spawn() {
            Ok(mut child) => {
                tracing::info!("🔄 Update check started: {}", self.program);
                let program = self.program.clone();
                tokio::spawn(async move {
                    match child.wait().await {
                        Ok(status) if status.success() => {
                            tracing::info!("Update check finished: {}", program)
                        }
                        Ok(status) => {
                            tracing::warn!("Update check {} exited with {}", program, status)
                        }
                        Err(e) => tracing::warn!("Failed to wait on {}: {}", program, e),
                    }
                });
            }
            Err(e) => {
                tracing::error!("Failed to start update check {}: {}", self.program, e);
            }
        }
    }
}

/// Used when no updater is configured.
pub struct NoOpUpdateChecker;

impl UpdateChecker for NoOpUpdateChecker {
    fn trigger_update_check(&self) {
        tracing::debug!("Update check requested but no updater is configured");
    }
}
