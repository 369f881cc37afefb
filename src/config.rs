use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::analysis::kde::KdeSettings;
use crate::analysis::terms::TermSettings;
use crate::data::model::{CategoricalField, NumericField};

/// Environment variable naming a JSON config file.
pub const CONFIG_ENV: &str = "VERIFICATION_VOID_CONFIG";

/// Startup defaults for the dashboard. Every key is optional in the file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    /// Dataset opened at startup, if any.
    pub dataset_path: Option<PathBuf>,
    /// Columns of the content-journey diagram, left to right.
    pub flow_fields: Vec<CategoricalField>,
    pub default_x: NumericField,
    pub default_y: NumericField,
    /// Measurement compared on the duration page.
    pub density_value: NumericField,
    /// Column whose values get one density curve each.
    pub density_group: CategoricalField,
    pub kde: KdeSettings,
    pub terms: TermSettings,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            dataset_path: None,
            flow_fields: CategoricalField::ALL.to_vec(),
            default_x: NumericField::VideoViewCount,
            default_y: NumericField::VideoLikeCount,
            density_value: NumericField::VideoDurationSec,
            density_group: CategoricalField::ClaimStatus,
            kde: KdeSettings::default(),
            terms: TermSettings::default(),
        }
    }
}

impl DashboardConfig {
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let config: DashboardConfig = serde_json::from_str(&text)
            .with_context(|| format!("parsing config {}", path.display()))?;
        Ok(config)
    }

    /// Read the file named by [`CONFIG_ENV`], or fall back to defaults when
    /// the variable is unset.
    pub fn load() -> Result<Self> {
        match std::env::var_os(CONFIG_ENV) {
            Some(path) => {
                let path = PathBuf::from(path);
                log::info!("Reading config from {}", path.display());
                Self::load_from_path(&path)
            }
            None => Ok(Self::default()),
        }
    }
}
