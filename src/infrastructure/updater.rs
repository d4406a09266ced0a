use crate::config::BridgeConfig;
use crate::services::updater::{CommandUpdateChecker, NoOpUpdateChecker, UpdateChecker};
use std::sync::Arc;
use tracing::info;

pub fn setup_update_checker(config: &BridgeConfig) -> Arc<dyn UpdateChecker> {
    match config
        .update_check_command
        .as_deref()
        .and_then(CommandUpdateChecker::from_command_line)
    {
        Some(checker) => {
            info!("🔄 Update checker: {}", checker.program());
            Arc::new(checker)
        }
        None => {
            info!("🔄 Update checker: none configured");
            Arc::new(NoOpUpdateChecker)
        }
    }
}
