mod csv_export;

use std::path::{Path, PathBuf};

use chrono::{NaiveDate, Utc};
use tracing::info;

use crate::error::ExportError;

pub use csv_export::{export_groups_csv, export_items_csv, BOM};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportKind {
    /// One row per fixture.
    Groups,
    /// One row per photograph.
    Items,
}

impl ReportKind {
    pub fn file_name(&self, date: NaiveDate) -> String {
        let stem = match self {
            ReportKind::Groups => "LumiCheck_Consolidado",
            ReportKind::Items => "LumiCheck_Fotos",
        };
        format!("{}_{}.csv", stem, date.format("%Y-%m-%d"))
    }
}

/// Writes `contents` into `dir` under today's report name and returns the path.
pub fn write_report(dir: &Path, kind: ReportKind, contents: &str) -> Result<PathBuf, ExportError> {
    std::fs::create_dir_all(dir).map_err(|e| ExportError::Io(dir.to_path_buf(), e))?;

    let path = dir.join(kind.file_name(Utc::now().date_naive()));
    std::fs::write(&path, contents).map_err(|e| ExportError::Io(path.clone(), e))?;

    info!("Wrote {:?} report to {}", kind, path.display());
    Ok(path)
}
