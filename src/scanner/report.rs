//! Console and CSV output for scan results.

use super::{RowKind, SdRow};
use serde::Serialize;
use std::collections::HashSet;
use std::io::Write;
use std::path::Path;

/// Column layout of the full CSV export.
#[derive(Debug, Serialize)]
struct CsvSdRecord<'a> {
    library: &'a str,
    #[serde(rename = "type")]
    kind: &'a str,
    title: &'a str,
    year: Option<i32>,
    show_title: &'a str,
    season: Option<u32>,
    episode: Option<u32>,
    episode_title: &'a str,
    max_height: u32,
    #[serde(rename = "ratingKey")]
    rating_key: &'a str,
    key: &'a str,
}

impl<'a> From<&'a SdRow> for CsvSdRecord<'a> {
    fn from(row: &'a SdRow) -> Self {
        Self {
            library: &row.library,
            kind: row.kind.as_str(),
            title: &row.title,
            year: row.year,
            show_title: row.show_title.as_deref().unwrap_or_default(),
            season: row.season,
            episode: row.episode,
            episode_title: row.episode_title.as_deref().unwrap_or_default(),
            max_height: row.max_height,
            rating_key: row.rating_key.as_str(),
            key: &row.key,
        }
    }
}

#[derive(Debug, Serialize)]
struct CsvPathRecord<'a> {
    path: &'a str,
}

/// File paths of all rows, first occurrence kept, blanks dropped.
pub fn unique_paths(rows: &[SdRow]) -> Vec<String> {
    let mut seen = HashSet::new();
    rows.iter()
        .flat_map(|r| r.paths.iter())
        .filter(|p| !p.is_empty())
        .filter(|p| seen.insert(p.as_str()))
        .cloned()
        .collect()
}

/// One console line per row.
pub fn format_row(row: &SdRow) -> String {
    match row.kind {
        RowKind::Movie => format!(
            "[MOVIE] {} ({}) - max height {} - ratingKey {}",
            row.title,
            row.year.map(|y| y.to_string()).unwrap_or_default(),
            row.max_height,
            row.rating_key
        ),
        RowKind::Episode => {
            let label = match (row.season, row.episode) {
                (Some(s), Some(e)) => format!("S{:02}E{:02}", s, e),
                _ => String::new(),
            };
            format!(
                "[EPISODE] {} {} - {} - max height {} - ratingKey {}",
                row.show_title.as_deref().unwrap_or(&row.title),
                label,
                row.episode_title.as_deref().unwrap_or_default(),
                row.max_height,
                row.rating_key
            )
        }
    }
}

/// Write the full row export with a header.
pub fn write_rows<W: Write>(writer: W, rows: &[SdRow]) -> csv::Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    if rows.is_empty() {
        // serialize() writes the header lazily; emit it for empty exports
        wtr.write_record([
            "library",
            "type",
            "title",
            "year",
            "show_title",
            "season",
            "episode",
            "episode_title",
            "max_height",
            "ratingKey",
            "key",
        ])?;
    }
    for row in rows {
        wtr.serialize(CsvSdRecord::from(row))?;
    }
    wtr.flush()?;
    Ok(())
}

/// Write a one-column `path` export.
pub fn write_paths<W: Write>(writer: W, paths: &[String]) -> csv::Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    if paths.is_empty() {
        wtr.write_record(["path"])?;
    }
    for path in paths {
        wtr.serialize(CsvPathRecord { path })?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn write_rows_csv(path: &Path, rows: &[SdRow]) -> csv::Result<()> {
    write_rows(std::fs::File::create(path)?, rows)
}

pub fn write_paths_csv(path: &Path, paths: &[String]) -> csv::Result<()> {
    write_paths(std::fs::File::create(path)?, paths)
}
