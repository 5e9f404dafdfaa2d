//! Configuration for the task data codec.

use grid_codec::{CodeWidth, GridCodecConfig};
use serde::{Deserialize, Serialize};

/// Codec settings. Everything has a working default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CodecConfig {
    /// Zone reduction and binary layout settings.
    #[serde(default)]
    pub grid: GridCodecConfig,

    /// Number of decimals written on value presentations.
    #[serde(default = "default_vpn_decimals")]
    pub vpn_decimals: u8,

    /// Reduce prescriptions on the rayon pool in `encode_all`.
    #[serde(default = "default_parallel")]
    pub parallel: bool,
}

fn default_vpn_decimals() -> u8 {
    2
}

fn default_parallel() -> bool {
    true
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            grid: GridCodecConfig::default(),
            vpn_decimals: default_vpn_decimals(),
            parallel: default_parallel(),
        }
    }
}

impl CodecConfig {
    /// Load configuration from environment variables.
    ///
    /// Unset or unparsable variables keep their defaults.
    pub fn from_env() -> Self {
        let mut config = Self {
            grid: GridCodecConfig::from_env(),
            ..Self::default()
        };

        if let Ok(val) = std::env::var("ISOXML_VPN_DECIMALS") {
            if let Ok(decimals) = val.parse() {
                config.vpn_decimals = decimals;
            }
        }

        if let Ok(val) = std::env::var("ISOXML_PARALLEL") {
            config.parallel = matches!(val.to_lowercase().as_str(), "1" | "true" | "yes" | "on");
        }

        config
    }

    pub fn with_max_code_width(mut self, width: CodeWidth) -> Self {
        self.grid.max_code_width = width;
        self
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), String> {
        self.grid.validate()?;

        if self.vpn_decimals > 7 {
            return Err("vpn_decimals must be at most 7".to_string());
        }

        Ok(())
    }
}
