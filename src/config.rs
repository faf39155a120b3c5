//! Conversion options
//!
//! Defaults can come from a JSON file passed with `--config`; flags given on
//! the command line win over the file.

use std::fs;
use std::path::Path;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::chart::ChartLayout;
use crate::container::DEFAULT_VERSION;
use crate::error::{ChartError, Result};
use crate::notes::Dialect;

/// File format a conversion writes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// DJ Hero 1 binary chart
    Fsgmub,
    /// DJ Hero 2 binary chart
    Xmk,
    /// Editable CSV rows
    Csv,
    /// Sectioned `.chart` text
    Chart,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Fsgmub => "fsgmub",
            OutputFormat::Xmk => "xmk",
            OutputFormat::Csv => "csv",
            OutputFormat::Chart => "chart",
        }
    }

    /// Binary dialect written by this format, if it is a binary one
    pub fn dialect(&self) -> Option<Dialect> {
        match self {
            OutputFormat::Fsgmub => Some(Dialect::Djh1),
            OutputFormat::Xmk => Some(Dialect::Djh2),
            OutputFormat::Csv | OutputFormat::Chart => None,
        }
    }
}

impl From<Dialect> for OutputFormat {
    fn from(dialect: Dialect) -> Self {
        match dialect {
            Dialect::Djh1 => OutputFormat::Fsgmub,
            Dialect::Djh2 => OutputFormat::Xmk,
        }
    }
}

/// Options shared by every conversion
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConvertOptions {
    /// Output format; `None` picks the default for the input type
    pub target: Option<OutputFormat>,
    /// Section layout for `.chart` conversions
    pub layout: ChartLayout,
    /// Version tag written to binary headers
    pub version_tag: u32,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            target: None,
            layout: ChartLayout::Dj,
            version_tag: DEFAULT_VERSION,
        }
    }
}

impl ConvertOptions {
    /// Load options from a JSON file
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| ChartError::FileReadError {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::from_json(&content)
    }

    /// Parse options from JSON text; missing fields keep their defaults
    pub fn from_json(content: &str) -> Result<Self> {
        Ok(serde_json::from_str(content)?)
    }

    /// Override file values with whatever was given on the command line
    pub fn with_overrides(
        mut self,
        target: Option<OutputFormat>,
        layout: Option<ChartLayout>,
    ) -> Self {
        if target.is_some() {
            self.target = target;
        }
        if let Some(layout) = layout {
            self.layout = layout;
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults() {
        let options = ConvertOptions::default();
        assert_eq!(options.target, None);
        assert_eq!(options.layout, ChartLayout::Dj);
        assert_eq!(options.version_tag, 2);
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let options = ConvertOptions::from_json(r#"{"layout": "guitar"}"#).unwrap();
        assert_eq!(options.layout, ChartLayout::Guitar);
        assert_eq!(options.version_tag, 2);
        assert_eq!(options.target, None);
    }

    #[test]
    fn test_full_json() {
        let options =
            ConvertOptions::from_json(r#"{"target": "csv", "layout": "dj", "version_tag": 1}"#)
                .unwrap();
        assert_eq!(options.target, Some(OutputFormat::Csv));
        assert_eq!(options.version_tag, 1);
    }

    #[test]
    fn test_invalid_json() {
        let err = ConvertOptions::from_json(r#"{"target": "mp3"}"#).unwrap_err();
        assert_eq!(err.error_code(), "CONFIG_ERROR");
    }

    #[test]
    fn test_load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, r#"{{"target": "xmk"}}"#).unwrap();

        let options = ConvertOptions::load(file.path()).unwrap();
        assert_eq!(options.target, Some(OutputFormat::Xmk));
    }

    #[test]
    fn test_load_missing_file() {
        let err = ConvertOptions::load(Path::new("/nonexistent/chartconv.json")).unwrap_err();
        assert_eq!(err.error_code(), "IO_ERROR");
    }

    #[test]
    fn test_overrides_win() {
        let options = ConvertOptions::from_json(r#"{"target": "csv", "layout": "guitar"}"#)
            .unwrap()
            .with_overrides(Some(OutputFormat::Chart), None);
        assert_eq!(options.target, Some(OutputFormat::Chart));
        assert_eq!(options.layout, ChartLayout::Guitar);
    }

    #[test]
    fn test_format_dialects() {
        assert_eq!(OutputFormat::Xmk.dialect(), Some(Dialect::Djh2));
        assert_eq!(OutputFormat::Csv.dialect(), None);
        assert_eq!(OutputFormat::from(Dialect::Djh1), OutputFormat::Fsgmub);
    }
}
