//! Analysis settings: the literal values both analyses run with, optionally
//! overridden by a JSON file and the command line.

use crate::data::DEFAULT_CAKE_CUTOFF;
use log::info;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("Failed to read settings {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Invalid settings JSON in {path}: {source}")]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisSettings {
    pub csv_path: PathBuf,
    pub output_dir: PathBuf,
    pub cake_cutoff: f64,
    pub bar_width: f64,
    /// Open each rendered figure in the system viewer.
    pub show: bool,
    /// Also write the statistics as JSON here.
    pub report_path: Option<PathBuf>,
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        Self {
            csv_path: PathBuf::from("older_adult_data.csv"),
            output_dir: PathBuf::from("."),
            cake_cutoff: DEFAULT_CAKE_CUTOFF,
            bar_width: 0.2,
            show: true,
            report_path: None,
        }
    }
}

impl AnalysisSettings {
    pub fn from_json_str(text: &str, path: &Path) -> Result<Self, SettingsError> {
        serde_json::from_str(text).map_err(|source| SettingsError::Json {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        let text = std::fs::read_to_string(path).map_err(|source| SettingsError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let settings = Self::from_json_str(&text, path)?;
        info!("Loaded settings from {}", path.display());
        Ok(settings)
    }

    /// Build settings from command-line arguments: `[CSV] [SETTINGS.json]`.
    ///
    /// The CSV argument wins over `csv_path` from the settings file.
    pub fn from_args<I>(args: I) -> Result<Self, SettingsError>
    where
        I: IntoIterator<Item = String>,
    {
        let mut args = args.into_iter();
        let csv = args.next();
        let mut settings = match args.next() {
            Some(file) => Self::load(Path::new(&file))?,
            None => Self::default(),
        };
        if let Some(csv) = csv {
            settings.csv_path = PathBuf::from(csv);
        }
        Ok(settings)
    }

    pub fn output_file(&self, name: &str) -> PathBuf {
        self.output_dir.join(name)
    }
}
