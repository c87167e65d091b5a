use anyhow::{Context, Result};
use csv::ReaderBuilder;
use std::io::Read;
use std::path::Path;

/// Values of the last column of a headed CSV. Missing and non-numeric cells
/// are dropped; values are truncated to whole milliseconds.
pub fn parse_rr_csv<R: Read>(source: R) -> Result<Vec<f64>> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(source);
    let width = reader.headers().context("reading CSV header")?.len();
    let column = width.checked_sub(1).context("CSV header has no columns")?;
    let mut out = Vec::new();
    for (row, record) in reader.records().enumerate() {
        let record = record.with_context(|| format!("reading CSV row {}", row + 1))?;
        let cell = record.get(column).map(str::trim).unwrap_or_default();
        match cell.parse::<f64>() {
            Ok(v) if v.is_finite() => out.push(v.trunc()),
            _ => log::debug!("CSV row {} dropped: {cell:?}", row + 1),
        }
    }
    Ok(out)
}

pub fn read_rr_csv(path: &Path) -> Result<Vec<f64>> {
    let file = std::fs::File::open(path).with_context(|| format!("opening {}", path.display()))?;
    parse_rr_csv(file).with_context(|| format!("in {}", path.display()))
}
