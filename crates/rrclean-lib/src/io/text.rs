use anyhow::{Context, Result};
use std::path::Path;

/// Parse one RR interval per line. Only lines made of digits and `.` count;
/// headers, comments and anything else are skipped. Values are truncated to
/// whole milliseconds.
pub fn parse_rr_text(text: &str) -> Vec<f64> {
    let mut out = Vec::new();
    for (idx, line) in text.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        if !trimmed.chars().all(|c| c.is_ascii_digit() || c == '.') {
            log::debug!("line {} skipped: {trimmed:?}", idx + 1);
            continue;
        }
        match trimmed.parse::<f64>() {
            Ok(v) => out.push(v.trunc()),
            Err(_) => log::debug!("line {} is not a number: {trimmed:?}", idx + 1),
        }
    }
    out
}

/// Read a plain-text RR file from disk.
pub fn read_rr_text(path: &Path) -> Result<Vec<f64>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    Ok(parse_rr_text(&text))
}
