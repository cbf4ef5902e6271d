//! Run configuration, read from a TOML file.
//!
//! Every field has a default matching the laboratory export we were given, so an empty file
//! (or no file at all) is a valid configuration.
use qu::ick_use::*;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::util;

/// The config file looked for when none is given on the command line.
pub const DEFAULT_CONFIG_PATH: &str = "antibiogram.toml";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub isolates: IsolatesConfig,
    pub ast: AstConfig,
    pub report: ReportConfig,
}

/// Where the isolates table is and what its columns are called.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct IsolatesConfig {
    pub path: PathBuf,
    pub specimen: String,
    pub organism: String,
    pub patient: String,
    pub created_on: String,
    pub sample_type: String,
    /// Read `01/02/2024` as 1st February rather than 2nd January.
    pub day_first: bool,
}

impl Default for IsolatesConfig {
    fn default() -> Self {
        Self {
            path: crate::input_path(Path::new("isolates.csv")),
            specimen: "Specimen".into(),
            organism: "Organism".into(),
            patient: "Patient".into(),
            created_on: "Created on".into(),
            sample_type: "Sample Type".into(),
            day_first: false,
        }
    }
}

/// Where the AST results table is and what its columns are called.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AstConfig {
    pub path: PathBuf,
    pub specimen: String,
    pub antimicrobial: String,
    pub interpretation: String,
}

impl Default for AstConfig {
    fn default() -> Self {
        Self {
            path: crate::input_path(Path::new("ast.csv")),
            specimen: "Specimen".into(),
            antimicrobial: "Antimicrobial".into(),
            interpretation: "Interpretation".into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReportConfig {
    pub output_dir: PathBuf,
    /// File name of the HTML report inside `output_dir`.
    pub html: PathBuf,
    /// File name of the JSON export inside `output_dir`.
    pub json: PathBuf,
    /// How many of the most common sample types get their own section.
    pub top_sample_types: usize,
    /// Organisms with fewer tested isolates than this are flagged in the report.
    pub low_count_threshold: usize,
    pub title: String,
    pub institution: Option<String>,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            output_dir: crate::output_path(Path::new("")),
            html: "Antibiogram_Report.html".into(),
            json: "antibiogram.json".into(),
            top_sample_types: 5,
            low_count_threshold: 30,
            title: "Cumulative Antibiogram Report".into(),
            institution: None,
        }
    }
}

impl ReportConfig {
    pub fn html_path(&self) -> PathBuf {
        self.output_dir.join(&self.html)
    }

    pub fn json_path(&self) -> PathBuf {
        self.output_dir.join(&self.json)
    }
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        fn inner(path: &Path) -> Result<Config> {
            let raw = fs::read_to_string(path)?;
            Config::from_toml(&raw)
        }

        let path = path.as_ref();
        inner(path).with_context(|| format!("loading config from \"{}\"", path.display()))
    }

    /// Load the named config file, or fall back to `DEFAULT_CONFIG_PATH` and then to the
    /// defaults.
    ///
    /// A file that was asked for by name must exist.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        if let Some(path) = path {
            return Self::load(path);
        }
        let default_path = Path::new(DEFAULT_CONFIG_PATH);
        if util::path_exists(default_path)? {
            Self::load(default_path)
        } else {
            event!(
                Level::INFO,
                "no config file at \"{}\", using defaults",
                default_path.display()
            );
            Ok(Self::default())
        }
    }

    pub fn from_toml(raw: &str) -> Result<Self> {
        let config: Config = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result {
        for (section, column) in [
            ("isolates", &self.isolates.specimen),
            ("isolates", &self.isolates.organism),
            ("isolates", &self.isolates.patient),
            ("isolates", &self.isolates.created_on),
            ("isolates", &self.isolates.sample_type),
            ("ast", &self.ast.specimen),
            ("ast", &self.ast.antimicrobial),
            ("ast", &self.ast.interpretation),
        ] {
            ensure!(
                !column.trim().is_empty(),
                "column names in [{}] must not be empty",
                section
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::Config;
    use std::path::Path;

    #[test]
    fn empty_file_is_defaults() {
        let config = Config::from_toml("").unwrap();
        assert_eq!(config.isolates.specimen, "Specimen");
        assert_eq!(config.isolates.created_on, "Created on");
        assert_eq!(config.ast.antimicrobial, "Antimicrobial");
        assert_eq!(config.report.top_sample_types, 5);
        assert_eq!(config.report.low_count_threshold, 30);
        assert!(!config.isolates.day_first);
    }

    #[test]
    fn overrides() {
        let config = Config::from_toml(
            r#"
            [isolates]
            path = "lab/isolates.csv"
            specimen = "Specimen ID"
            day_first = true

            [ast]
            interpretation = "Result"

            [report]
            output_dir = "out"
            top_sample_types = 3
            institution = "Example Hospital"
            "#,
        )
        .unwrap();
        assert_eq!(config.isolates.path, Path::new("lab/isolates.csv"));
        assert_eq!(config.isolates.specimen, "Specimen ID");
        assert_eq!(config.isolates.organism, "Organism");
        assert!(config.isolates.day_first);
        assert_eq!(config.ast.interpretation, "Result");
        assert_eq!(config.report.top_sample_types, 3);
        assert_eq!(config.report.html_path(), Path::new("out/Antibiogram_Report.html"));
        assert_eq!(config.report.institution.as_deref(), Some("Example Hospital"));
    }

    #[test]
    fn rejects_unknown_and_empty() {
        assert!(Config::from_toml("[isolates]\npatinet = \"Patient\"").is_err());
        assert!(Config::from_toml("[ast]\nspecimen = \"\"").is_err());
    }
}
