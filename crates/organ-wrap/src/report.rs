//! CSV reports.

use std::fs::File;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use serde::{Serialize, Serializer};

use crate::error::{BatchError, BatchResult};

/// Factor applied to mesh volumes before they are reported.
pub const VOLUME_SCALE: f64 = 1e9;

/// A CSV row type with a fixed header.
pub trait ReportRecord: Serialize {
    const HEADER: &'static [&'static str];
}

/// One row of the per-structure report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportRow {
    pub organ: String,
    #[serde(rename = "AS")]
    pub structure: String,
    #[serde(serialize_with = "serialize_volume")]
    pub volume: f64,
    #[serde(
        rename = "is_fully_watertight_before_shrink_wrap",
        serialize_with = "serialize_yes_no"
    )]
    pub before: bool,
    #[serde(
        rename = "is_fully_watertight_after_shrink_wrap",
        serialize_with = "serialize_yes_no"
    )]
    pub after: bool,
}

impl ReportRow {
    /// Marker row for a structure that could not be processed.
    pub fn failed(organ: impl Into<String>, structure: impl Into<String>) -> Self {
        Self {
            organ: organ.into(),
            structure: structure.into(),
            volume: 0.0,
            before: false,
            after: false,
        }
    }
}

impl ReportRecord for ReportRow {
    const HEADER: &'static [&'static str] = &[
        "organ",
        "AS",
        "volume",
        "is_fully_watertight_before_shrink_wrap",
        "is_fully_watertight_after_shrink_wrap",
    ];
}

/// One row of the per-organ volume report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrganRow {
    pub organ: String,
    #[serde(serialize_with = "serialize_volume")]
    pub volume: f64,
}

impl ReportRecord for OrganRow {
    const HEADER: &'static [&'static str] = &["organ", "volume"];
}

fn serialize_yes_no<S: Serializer>(flag: &bool, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(if *flag { "Yes" } else { "No" })
}

/// Shortest decimal that reads back to the same value, without a trailing
/// `.0` on integers.
fn serialize_volume<S: Serializer>(volume: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(volume)
}

/// Writes report rows to a CSV file, one flush per row.
///
/// The header is written when the file is created, so a run that produces
/// no rows still leaves a valid report. The file is closed on drop.
pub struct ReportWriter<R> {
    writer: csv::Writer<File>,
    path: PathBuf,
    rows: usize,
    _record: PhantomData<R>,
}

impl<R: ReportRecord> ReportWriter<R> {
    /// Create (or truncate) the report at `path` and write its header.
    pub fn create(path: &Path) -> BatchResult<Self> {
        let report_error = |source| BatchError::Report {
            path: path.to_path_buf(),
            source,
        };

        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_path(path)
            .map_err(report_error)?;
        writer.write_record(R::HEADER).map_err(report_error)?;
        writer
            .flush()
            .map_err(|e| report_error(csv::Error::from(e)))?;

        Ok(Self {
            writer,
            path: path.to_path_buf(),
            rows: 0,
            _record: PhantomData,
        })
    }

    /// Append one row and flush it to disk.
    pub fn write(&mut self, row: &R) -> BatchResult<()> {
        let report_error = |source| BatchError::Report {
            path: self.path.clone(),
            source,
        };

        self.writer.serialize(row).map_err(report_error)?;
        self.writer
            .flush()
            .map_err(|e| report_error(csv::Error::from(e)))?;
        self.rows += 1;
        Ok(())
    }

    /// Number of rows written so far.
    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_structure_rows() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("table_s8.csv");

        let mut writer = ReportWriter::<ReportRow>::create(&path).unwrap();
        writer
            .write(&ReportRow {
                organ: "kidney".to_string(),
                structure: "cortex".to_string(),
                volume: 1000.0 * VOLUME_SCALE,
                before: true,
                after: true,
            })
            .unwrap();
        writer.write(&ReportRow::failed("kidney", "broken")).unwrap();
        assert_eq!(writer.rows(), 2);

        // Rows are flushed as they are written.
        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(
            text,
            "organ,AS,volume,is_fully_watertight_before_shrink_wrap,is_fully_watertight_after_shrink_wrap\n\
             kidney,cortex,1000000000000,Yes,Yes\n\
             kidney,broken,0,No,No\n"
        );
    }

    #[test]
    fn test_header_only_report() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("volume_of_organ.csv");

        drop(ReportWriter::<OrganRow>::create(&path).unwrap());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "organ,volume\n");
    }

    #[test]
    fn test_fractional_volume() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("organs.csv");

        let mut writer = ReportWriter::<OrganRow>::create(&path).unwrap();
        writer
            .write(&OrganRow {
                organ: "heart".to_string(),
                volume: 1.25,
            })
            .unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.ends_with("heart,1.25\n"));
    }

    #[test]
    fn test_unwritable_path() {
        let result = ReportWriter::<OrganRow>::create(Path::new("/nonexistent/dir/report.csv"));
        assert!(matches!(result, Err(BatchError::Report { .. })));
    }
}
