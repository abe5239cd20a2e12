use crate::domain::model::{MangaDetails, ResolvedChapter};
use crate::utils::error::{FeedError, Result};
use serde::{Deserialize, Serialize};
use std::io::Write;

const CHAPTER_HEADERS: [&str; 8] = [
    "id",
    "name",
    "number",
    "volume",
    "branch",
    "scanlator",
    "upload_date",
    "url",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Json,
    Csv,
    Tsv,
}

pub fn write_chapters<W: Write>(
    writer: &mut W,
    chapters: &[ResolvedChapter],
    format: ExportFormat,
) -> Result<()> {
    match format {
        ExportFormat::Json => {
            serde_json::to_writer_pretty(&mut *writer, chapters)?;
            writer.write_all(b"\n")?;
        }
        ExportFormat::Csv => write_delimited(writer, chapters, b',')?,
        ExportFormat::Tsv => write_delimited(writer, chapters, b'\t')?,
    }
    Ok(())
}

/// JSON carries the whole record; the tabular formats only the chapter rows.
pub fn write_details<W: Write>(
    writer: &mut W,
    details: &MangaDetails,
    format: ExportFormat,
) -> Result<()> {
    match format {
        ExportFormat::Json => {
            serde_json::to_writer_pretty(&mut *writer, details)?;
            writer.write_all(b"\n")?;
            Ok(())
        }
        tabular => write_chapters(writer, &details.chapters, tabular),
    }
}

pub fn render_chapters(chapters: &[ResolvedChapter], format: ExportFormat) -> Result<String> {
    let mut buffer = Vec::new();
    write_chapters(&mut buffer, chapters, format)?;
    String::from_utf8(buffer).map_err(|e| FeedError::Io(std::io::Error::other(e)))
}

// header is written by hand so an empty list still yields one
fn write_delimited<W: Write>(
    writer: &mut W,
    chapters: &[ResolvedChapter],
    delimiter: u8,
) -> Result<()> {
    let mut csv_writer = csv::WriterBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .from_writer(writer);
    csv_writer.write_record(CHAPTER_HEADERS)?;
    for chapter in chapters {
        csv_writer.serialize(chapter)?;
    }
    csv_writer.flush()?;
    Ok(())
}
