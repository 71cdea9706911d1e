//! Tabular export of classified messages.
//!
//! # Format
//! - Delimiter: `,`
//! - Columns: `Date`, `Sentiment`, `Content`, always in that order
//! - `Date` is the normalized timestamp string as extracted
//! - `Sentiment` is empty for unclassified messages
//! - No index column
//! - Encoding: UTF-8

use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

use crate::error::Result;
use crate::message::Message;

/// Header row of the export.
pub const HEADER: [&str; 3] = ["Date", "Sentiment", "Content"];

/// Writes one row per message to `path`.
///
/// Missing parent directories are created. An existing file is replaced,
/// never appended to.
pub fn export_table(messages: &[Message], path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let file = File::create(path)?;
    write_table(messages, file)?;

    tracing::info!(path = %path.display(), rows = messages.len(), "Table exported");
    Ok(())
}

/// Renders the export to a string.
pub fn to_csv(messages: &[Message]) -> Result<String> {
    let mut buffer = Vec::new();
    write_table(messages, &mut buffer)?;
    Ok(String::from_utf8_lossy(&buffer).into_owned())
}

fn write_table<W: Write>(messages: &[Message], sink: W) -> Result<()> {
    let mut writer = csv::WriterBuilder::new().delimiter(b',').from_writer(sink);
    writer.write_record(HEADER)?;

    for msg in messages {
        let sentiment = msg.mood.map(|m| m.label()).unwrap_or_default();
        writer.write_record([msg.timestamp.as_str(), sentiment, msg.content()])?;
    }

    writer.flush()?;
    Ok(())
}
