pub mod csv;
pub mod report;
pub mod text;
#[cfg(feature = "xlsx")]
pub mod xlsx;

use crate::series::IntervalSeries;
use anyhow::{bail, Result};
use std::path::Path;

/// Load an RR recording, picking the reader from the file extension.
pub fn load_series(path: &Path) -> Result<IntervalSeries> {
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();
    let values = match ext.as_str() {
        "txt" => text::read_rr_text(path)?,
        "csv" => csv::read_rr_csv(path)?,
        #[cfg(feature = "xlsx")]
        "xls" | "xlsx" => xlsx::read_rr_xlsx(path)?,
        #[cfg(not(feature = "xlsx"))]
        "xls" | "xlsx" => bail!("spreadsheet support needs the `xlsx` feature"),
        other => bail!("unsupported input extension {other:?} for {}", path.display()),
    };
    if values.is_empty() {
        bail!("no RR intervals found in {}", path.display());
    }
    log::info!("loaded {} RR intervals from {}", values.len(), path.display());
    Ok(IntervalSeries::from_values(values))
}
