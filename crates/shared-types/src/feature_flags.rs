use serde::{Deserialize, Serialize};

/// Feature flags controlling optional server behavior.
///
/// Loaded from `config.toml` at startup. `registration` defaults to `true`
/// so a fresh checkout can create accounts; the others default to `false`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FeatureFlags {
    #[serde(default)]
    pub telemetry: bool,
    #[serde(default)]
    pub rate_limit: bool,
    #[serde(default = "default_registration")]
    pub registration: bool,
}

fn default_registration() -> bool {
    true
}

impl Default for FeatureFlags {
    fn default() -> Self {
        Self {
            telemetry: false,
            rate_limit: false,
            registration: default_registration(),
        }
    }
}

/// Top-level config file structure matching `config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub features: FeatureFlags,
}
