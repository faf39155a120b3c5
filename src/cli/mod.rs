//! CLI Module
//!
//! Command-line interface for chartconv.

pub mod commands;

use clap::Parser;
use std::path::PathBuf;

use crate::chart::ChartLayout;
use crate::config::{ConvertOptions, OutputFormat};
use crate::error::Result;

/// chartconv - DJ Hero chart converter (FSGMUB / XMK / CSV / CHART)
#[derive(Parser, Debug)]
#[command(name = "chartconv")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Input chart (.fsgmub, .xmk, .csv or .chart)
    pub input: PathBuf,

    /// Output format
    #[arg(short = 't', long = "to", value_enum)]
    pub to: Option<OutputFormat>,

    /// Section layout for .chart conversions [default: dj]
    #[arg(short, long, value_enum)]
    pub layout: Option<ChartLayout>,

    /// JSON file with default conversion options
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    /// Conversion options from the config file (if any) and the flags
    pub fn options(&self) -> Result<ConvertOptions> {
        let base = match &self.config {
            Some(path) => ConvertOptions::load(path)?,
            None => ConvertOptions::default(),
        };
        Ok(base.with_overrides(self.to, self.layout))
    }
}
