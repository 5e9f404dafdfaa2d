//! Configuration for the grid codec.

use crate::binary::CodeWidth;
use serde::{Deserialize, Serialize};

/// Configuration for zone reduction and binary grid encoding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridCodecConfig {
    /// Widest code the binary layout may use. Grids needing more are refused.
    pub max_code_width: CodeWidth,

    /// File name prefix of the binary grid artifacts.
    pub grid_file_prefix: String,
}

impl Default for GridCodecConfig {
    fn default() -> Self {
        Self {
            max_code_width: CodeWidth::Two,
            grid_file_prefix: "GRD".to_string(),
        }
    }
}

impl GridCodecConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(val) = std::env::var("ISOXML_MAX_CODE_WIDTH") {
            if let Some(width) = CodeWidth::from_str(&val) {
                config.max_code_width = width;
            }
        }

        if let Ok(val) = std::env::var("ISOXML_GRID_FILE_PREFIX") {
            config.grid_file_prefix = val;
        }

        config
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.grid_file_prefix.len() != 3 {
            return Err("grid_file_prefix must be exactly 3 characters".to_string());
        }

        if !self
            .grid_file_prefix
            .chars()
            .all(|c| c.is_ascii_uppercase())
        {
            return Err("grid_file_prefix must be upper-case ASCII letters".to_string());
        }

        Ok(())
    }
}
