use crate::config::BridgeConfig;
use crate::services::access::UnscopedAccess;
use crate::services::intake::ReferenceIntake;
use anyhow::Context;
use std::sync::Arc;
use tracing::info;

pub async fn setup_intake(config: &BridgeConfig) -> anyhow::Result<ReferenceIntake> {
    tokio::fs::create_dir_all(&config.staging_dir)
        .await
        .with_context(|| {
            format!(
                "failed to create staging directory {}",
                config.staging_dir.display()
            )
        })?;

    info!(
        "📂 Staging directory: {} (accepting: {})",
        config.staging_dir.display(),
        config.accepted_extensions.join(", ")
    );

    Ok(ReferenceIntake::new(
        config.staging_dir.clone(),
        config.accepted_extensions.clone(),
        Arc::new(UnscopedAccess),
    ))
}
