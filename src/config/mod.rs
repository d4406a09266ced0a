use std::env;
use std::path::PathBuf;

use crate::utils::validation::parse_extension_list;

/// Runtime configuration for the handoff bridge
#[derive(Debug, Clone)]
pub struct BridgeConfig {
    /// Directory the bridge copies incoming files into (default: "data/imports")
    pub staging_dir: PathBuf,

    /// Lower-cased extensions accepted at intake (default: xml, ssrf, uddf)
    pub accepted_extensions: Vec<String>,

    /// Command run by the update check, whitespace separated (default: none)
    pub update_check_command: Option<String>,

    /// Port for the local HTTP surface (default: 3717)
    pub port: u16,
}

pub const DEFAULT_ACCEPTED_EXTENSIONS: &[&str] = &["xml", "ssrf", "uddf"];

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            staging_dir: PathBuf::from("data/imports"),
            accepted_extensions: DEFAULT_ACCEPTED_EXTENSIONS
                .iter()
                .map(|ext| ext.to_string())
                .collect(),
            update_check_command: None,
            port: 3717,
        }
    }
}

impl BridgeConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let default = Self::default();

        Self {
            staging_dir: env::var("STAGING_DIR")
                .ok()
                .filter(|v| !v.trim().is_empty())
                .map(PathBuf::from)
                .unwrap_or(default.staging_dir),

            accepted_extensions: env::var("ACCEPTED_EXTENSIONS")
                .ok()
                .map(|v| parse_extension_list(&v))
                .filter(|list| !list.is_empty())
                .unwrap_or(default.accepted_extensions),

            update_check_command: env::var("UPDATE_CHECK_COMMAND")
                .ok()
                .filter(|v| !v.trim().is_empty()),

            port: env::var("BRIDGE_PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.port),
        }
    }
}
