use anyhow::{Context, Result};
use calamine::{open_workbook_auto, Data, Reader};
use std::path::Path;

/// First column of the first worksheet below the header row. Empty and
/// non-numeric cells are dropped; values are truncated to whole
/// milliseconds.
pub fn read_rr_xlsx(path: &Path) -> Result<Vec<f64>> {
    let mut workbook =
        open_workbook_auto(path).with_context(|| format!("opening {}", path.display()))?;
    let range = workbook
        .worksheet_range_at(0)
        .with_context(|| format!("no worksheets found in {}", path.display()))?
        .with_context(|| format!("reading first worksheet of {}", path.display()))?;
    let mut out = Vec::new();
    for (row, cells) in range.rows().enumerate().skip(1) {
        let value = match cells.first() {
            Some(Data::Float(v)) => Some(*v),
            Some(Data::Int(v)) => Some(*v as f64),
            Some(Data::String(s)) => s.trim().parse::<f64>().ok(),
            _ => None,
        };
        match value.filter(|v| v.is_finite()) {
            Some(v) => out.push(v.trunc()),
            None => log::debug!("worksheet row {} dropped", row + 1),
        }
    }
    Ok(out)
}
