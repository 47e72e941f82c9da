/*!
 * Run tally and the companion CSV report.
 */

use std::fmt;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::warn;
use serde::Serialize;

use crate::document::TranslationItem;
use crate::text::{RawText, Sanitizer};

/// UTF-8 byte order mark
const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Counts for one document run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunReport {
    /// Text elements discovered in the visited containers
    pub total: usize,
    /// Elements whose translation was written back
    pub translated: usize,
    /// Elements skipped as ineligible
    pub skipped: usize,
    /// Elements kept in their original text after a backend failure
    pub fallback: usize,
    /// Elements whose translation equals their text
    pub unchanged: usize,
    /// Elements that refused the translated value
    pub write_failures: usize,
    /// Elements rewritten by the cleanup sweeps
    pub swept: usize,
}

impl RunReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Elements that went through the orchestrator
    pub fn processed(&self) -> usize {
        self.translated + self.fallback + self.unchanged + self.write_failures
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} text elements: {} translated, {} skipped, {} kept after backend failure",
            self.total, self.translated, self.skipped, self.fallback
        )?;
        if self.unchanged > 0 {
            write!(f, ", {} unchanged", self.unchanged)?;
        }
        if self.write_failures > 0 {
            write!(f, ", {} write failures", self.write_failures)?;
        }
        Ok(())
    }
}

/// One line of the CSV report
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportRow {
    pub layer: String,
    pub location: String,
    pub original_text: String,
    pub translated_text: String,
}

impl ReportRow {
    pub fn from_item(item: &TranslationItem, sanitizer: &Sanitizer) -> Self {
        let original_text = sanitizer.scrub(&item.original);
        let translated_text = item
            .translated
            .as_ref()
            .map(|t| t.to_string())
            .unwrap_or_else(|| original_text.clone());
        Self {
            layer: sanitizer.scrub(&RawText::from(item.layer.as_str())),
            location: sanitizer.scrub(&RawText::from(item.location.as_str())),
            original_text,
            translated_text,
        }
    }
}

/// Report path next to the output document: `<stem>_report.csv`
pub fn report_path(output: &Path) -> PathBuf {
    let stem = output
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string());
    output.with_file_name(format!("{}_report.csv", stem))
}

/// Write the CSV report, UTF-8 with BOM
pub fn write_csv(path: &Path, rows: &[ReportRow]) -> Result<()> {
    let mut file = File::create(path).with_context(|| format!("Failed to create report {}", path.display()))?;
    file.write_all(UTF8_BOM)?;

    let mut writer = csv::Writer::from_writer(file);
    for row in rows {
        if let Err(e) = writer.serialize(row) {
            warn!("Skipping report row for '{}': {}", row.location, e);
        }
    }
    writer
        .flush()
        .with_context(|| format!("Failed to write report {}", path.display()))?;
    Ok(())
}
