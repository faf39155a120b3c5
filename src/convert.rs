//! Conversion front end
//!
//! Picks a pipeline from the input file's extension and the requested
//! output format, runs it and writes the result next to the input.
//!
//! | input     | default  | also          |
//! |-----------|----------|---------------|
//! | `.fsgmub` | `.xmk`   | `csv`, `chart`|
//! | `.xmk`    | `.fsgmub`| `csv`, `chart`|
//! | `.csv`    | `.fsgmub`| `xmk`         |
//! | `.chart`  | `.fsgmub`| `xmk`         |
//!
//! `.chart` sections hold DJH1 codes, so `.xmk` charts are migrated down
//! before export and imported charts are migrated up when writing `.xmk`.
//! Guitar layouts have no DJH2 form.

use std::fmt;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use log::{info, warn};
use tempfile::NamedTempFile;

use crate::chart::{export_chart, import_chart, ChartLayout, TRACK_END_CODES};
use crate::config::{ConvertOptions, OutputFormat};
use crate::container::{decode, encode, Container, Padding};
use crate::error::{ChartError, Result};
use crate::migrate::migrate;
use crate::notes::Dialect;
use crate::tabular::{export_csv, import_csv};

/// Kind of file a conversion reads
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputFormat {
    Binary(Dialect),
    Csv,
    Chart,
}

impl InputFormat {
    /// Detect the input format from a path's extension, ignoring case
    pub fn from_path(path: &Path) -> Option<Self> {
        if let Some(dialect) = Dialect::from_path(path) {
            return Some(InputFormat::Binary(dialect));
        }
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "csv" => Some(InputFormat::Csv),
            "chart" => Some(InputFormat::Chart),
            _ => None,
        }
    }

    /// Output format used when none is requested
    pub fn default_target(&self) -> OutputFormat {
        match self {
            InputFormat::Binary(dialect) => OutputFormat::from(dialect.other()),
            InputFormat::Csv | InputFormat::Chart => OutputFormat::Fsgmub,
        }
    }
}

/// Pipeline a conversion runs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// Binary to binary across dialects
    Migrate { from: Dialect, to: Dialect },
    /// Binary to CSV
    ExportCsv,
    /// Binary to `.chart`, migrating `from` down to DJH1 first if needed
    ExportChart { layout: ChartLayout, from: Dialect },
    /// CSV to binary
    ImportCsv,
    /// `.chart` to binary, migrating up when `to` is DJH2
    ImportChart { layout: ChartLayout, to: Dialect },
}

/// Header fields of a binary chart, as shown to the user
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContainerSummary {
    pub version: u32,
    pub checksum: u32,
    pub entry_count: u32,
    pub string_blob_size: u32,
}

impl From<&Container> for ContainerSummary {
    fn from(container: &Container) -> Self {
        Self {
            version: container.version,
            checksum: container.checksum,
            entry_count: container.entry_count(),
            string_blob_size: container.string_blob_size(),
        }
    }
}

impl fmt::Display for ContainerSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Version: {}", self.version)?;
        writeln!(f, "Hash: {:x}", self.checksum)?;
        writeln!(f, "Length: {}", self.entry_count)?;
        write!(f, "String data length: {}", self.string_blob_size)
    }
}

/// What a finished conversion read and wrote
#[derive(Debug)]
pub struct ConversionSummary {
    pub output_path: PathBuf,
    /// Header of the binary input, if the input was binary
    pub input: Option<ContainerSummary>,
    /// Header of the binary output, if the output is binary
    pub output: Option<ContainerSummary>,
    /// Non-fatal diagnostics raised along the way
    pub warnings: Vec<ChartError>,
}

/// A resolved conversion request
#[derive(Debug, Clone)]
pub struct Conversion {
    pub input: PathBuf,
    pub output: PathBuf,
    pub target: OutputFormat,
    pub route: Route,
    pub version_tag: u32,
}

impl Conversion {
    /// Resolve the route for `input` under `options`
    ///
    /// # Errors
    /// * `UnsupportedConversion` - unknown input extension, a target the
    ///   input cannot be converted to, or a guitar layout with `.xmk`
    pub fn resolve(input: &Path, options: &ConvertOptions) -> Result<Self> {
        let unsupported = |target: &str| ChartError::UnsupportedConversion {
            path: input.to_path_buf(),
            target: target.to_string(),
        };

        let format = InputFormat::from_path(input).ok_or_else(|| unsupported("any format"))?;
        let target = options.target.unwrap_or_else(|| format.default_target());
        let layout = options.layout;

        let route = match (format, target) {
            (InputFormat::Binary(from), _) => match target {
                OutputFormat::Csv => Route::ExportCsv,
                OutputFormat::Chart if chart_supports(layout, from) => {
                    Route::ExportChart { layout, from }
                }
                OutputFormat::Chart => return Err(unsupported(target.extension())),
                binary => match binary.dialect() {
                    Some(to) if to != from => Route::Migrate { from, to },
                    _ => return Err(unsupported(target.extension())),
                },
            },
            (InputFormat::Csv, OutputFormat::Fsgmub | OutputFormat::Xmk) => Route::ImportCsv,
            (InputFormat::Chart, binary) => match binary.dialect() {
                Some(to) if chart_supports(layout, to) => Route::ImportChart { layout, to },
                _ => return Err(unsupported(target.extension())),
            },
            _ => return Err(unsupported(target.extension())),
        };

        Ok(Self {
            input: input.to_path_buf(),
            output: input.with_extension(target.extension()),
            target,
            route,
            version_tag: options.version_tag,
        })
    }

    /// Run the conversion and write the output file
    ///
    /// Nothing is written unless the whole conversion succeeds.
    pub fn run(&self) -> Result<ConversionSummary> {
        info!(
            "Converting {} -> {}",
            self.input.display(),
            self.output.display()
        );

        let bytes = fs::read(&self.input).map_err(|e| ChartError::FileReadError {
            path: self.input.clone(),
            source: e,
        })?;

        let mut summary = ConversionSummary {
            output_path: self.output.clone(),
            input: None,
            output: None,
            warnings: Vec::new(),
        };

        let output = match self.route {
            Route::Migrate { from, to } => {
                let source = decode(&bytes)?;
                summary.input = Some(ContainerSummary::from(&source));
                let container = migrate_into(&source, from, to, &mut summary)?;
                self.finish_binary(container, Padding::default(), &mut summary)
            }
            Route::ExportCsv => {
                let source = decode(&bytes)?;
                summary.input = Some(ContainerSummary::from(&source));
                let mut out = Vec::new();
                export_csv(&source, &mut out)?;
                out
            }
            Route::ExportChart { layout, from } => {
                let mut source = decode(&bytes)?;
                summary.input = Some(ContainerSummary::from(&source));
                if from == Dialect::Djh2 {
                    source = migrate_into(&source, from, Dialect::Djh1, &mut summary)?;
                }
                let export = export_chart(&source, layout);
                summary.warnings.extend(export.unknown);
                export.text.into_bytes()
            }
            Route::ImportCsv => {
                let container = import_csv(bytes.as_slice(), self.version_tag)?;
                self.finish_binary(container, Padding::default(), &mut summary)
            }
            Route::ImportChart { layout, to } => {
                let text = std::str::from_utf8(&bytes).map_err(|source| {
                    ChartError::InvalidString {
                        offset: source.valid_up_to(),
                        source,
                    }
                })?;
                let mut import = import_chart(text, layout);
                if import.skipped > 0 {
                    warn!("Skipped {} unusable chart lines", import.skipped);
                }
                match to {
                    Dialect::Djh1 => {
                        self.finish_binary(import.container, Padding::EvenCountRow, &mut summary)
                    }
                    Dialect::Djh2 => {
                        // Track end markers only exist in DJH1
                        import
                            .container
                            .entries
                            .retain(|entry| !TRACK_END_CODES.contains(&entry.note_type));
                        let container =
                            migrate_into(&import.container, Dialect::Djh1, to, &mut summary)?;
                        self.finish_binary(container, Padding::default(), &mut summary)
                    }
                }
            }
        };

        write_atomic(&self.output, &output)?;
        info!("Wrote {} bytes to {}", output.len(), self.output.display());
        Ok(summary)
    }

    fn finish_binary(
        &self,
        mut container: Container,
        padding: Padding,
        summary: &mut ConversionSummary,
    ) -> Vec<u8> {
        container.version = self.version_tag;
        summary.output = Some(ContainerSummary::from(&container));
        encode(&container, padding)
    }
}

/// `.chart` layouts hold DJH1 codes; only the DJ layout has a DJH2 form
fn chart_supports(layout: ChartLayout, dialect: Dialect) -> bool {
    dialect == Dialect::Djh1 || layout == ChartLayout::Dj
}

/// Migrate a container, collecting the diagnostics into `summary`
fn migrate_into(
    source: &Container,
    from: Dialect,
    to: Dialect,
    summary: &mut ConversionSummary,
) -> Result<Container> {
    let migration = migrate(source, from, to)?;
    summary.warnings.extend(migration.report.dropped);
    summary.warnings.extend(migration.report.overlaps);
    Ok(migration.container)
}

/// Write `bytes` to `path` through a temporary file in the same directory
///
/// The destination only changes once the data is fully written.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let write_error = |e: std::io::Error| ChartError::FileWriteError {
        path: path.to_path_buf(),
        source: e,
    };

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut file = NamedTempFile::new_in(dir).map_err(write_error)?;
    file.write_all(bytes).map_err(write_error)?;
    file.flush().map_err(write_error)?;
    file.persist(path).map_err(|e| write_error(e.error))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    fn options(target: Option<OutputFormat>) -> ConvertOptions {
        ConvertOptions {
            target,
            ..ConvertOptions::default()
        }
    }

    #[test_case("song.fsgmub", None, "song.xmk" ; "fsgmub default")]
    #[test_case("song.xmk", None, "song.fsgmub" ; "xmk default")]
    #[test_case("song.FSGMUB", Some(OutputFormat::Csv), "song.csv" ; "upper case extension")]
    #[test_case("song.xmk", Some(OutputFormat::Chart), "song.chart" ; "xmk to chart")]
    #[test_case("song.csv", None, "song.fsgmub" ; "csv default")]
    #[test_case("song.csv", Some(OutputFormat::Xmk), "song.xmk" ; "csv to xmk")]
    #[test_case("song.chart", None, "song.fsgmub" ; "chart default")]
    fn test_output_paths(input: &str, target: Option<OutputFormat>, expected: &str) {
        let conversion = Conversion::resolve(Path::new(input), &options(target)).unwrap();
        assert_eq!(conversion.output, PathBuf::from(expected));
    }

    #[test]
    fn test_routes() {
        let resolve = |input: &str, target| {
            Conversion::resolve(Path::new(input), &options(target))
                .unwrap()
                .route
        };

        assert_eq!(
            resolve("a.fsgmub", None),
            Route::Migrate {
                from: Dialect::Djh1,
                to: Dialect::Djh2
            }
        );
        assert_eq!(resolve("a.xmk", Some(OutputFormat::Csv)), Route::ExportCsv);
        assert_eq!(resolve("a.csv", Some(OutputFormat::Xmk)), Route::ImportCsv);
        assert_eq!(
            resolve("a.chart", None),
            Route::ImportChart {
                layout: ChartLayout::Dj,
                to: Dialect::Djh1
            }
        );
        assert_eq!(
            resolve("a.xmk", Some(OutputFormat::Chart)),
            Route::ExportChart {
                layout: ChartLayout::Dj,
                from: Dialect::Djh2
            }
        );
    }

    #[test_case("song.chart", OutputFormat::Xmk ; "guitar chart to xmk")]
    #[test_case("song.xmk", OutputFormat::Chart ; "xmk to guitar chart")]
    fn test_guitar_layout_has_no_djh2_form(input: &str, target: OutputFormat) {
        let options = ConvertOptions {
            target: Some(target),
            layout: ChartLayout::Guitar,
            ..ConvertOptions::default()
        };
        let err = Conversion::resolve(Path::new(input), &options).unwrap_err();
        assert_eq!(err.error_code(), "ARGUMENT_ERROR");

        let fsgmub = ConvertOptions {
            target: None,
            layout: ChartLayout::Guitar,
            ..ConvertOptions::default()
        };
        assert!(Conversion::resolve(Path::new("song.chart"), &fsgmub).is_ok());
    }

    #[test_case("song.fsgmub", Some(OutputFormat::Fsgmub) ; "same dialect")]
    #[test_case("song.csv", Some(OutputFormat::Chart) ; "csv to chart")]
    #[test_case("song.chart", Some(OutputFormat::Csv) ; "chart to csv")]
    #[test_case("song.mp3", None ; "unknown input")]
    #[test_case("song", None ; "no extension")]
    fn test_unsupported(input: &str, target: Option<OutputFormat>) {
        let err = Conversion::resolve(Path::new(input), &options(target)).unwrap_err();
        assert_eq!(err.error_code(), "ARGUMENT_ERROR");
        assert!(err.is_usage_error());
    }

    #[test]
    fn test_write_atomic_replaces_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.xmk");
        fs::write(&path, b"old").unwrap();

        write_atomic(&path, b"new contents").unwrap();
        assert_eq!(fs::read(&path).unwrap(), b"new contents");
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_summary_display() {
        let summary = ContainerSummary {
            version: 2,
            checksum: 0xABCDEF01,
            entry_count: 3,
            string_blob_size: 7,
        };
        assert_eq!(
            summary.to_string(),
            "Version: 2\nHash: abcdef01\nLength: 3\nString data length: 7"
        );
    }
}
