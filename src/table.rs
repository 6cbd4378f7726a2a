// src/table.rs

use crate::error::{Result, VqmError};
use crate::metrics::Metric;
use crate::stats::MetricSummary;
use std::fs;
use std::path::{Path, PathBuf};

pub const TIME_TAKEN_LABEL: &str = "Encoding Time (s)";
/// Cell for a metric the table has a column for but an encode's report lacked.
pub const SKIPPED_CELL: &str = "N/A";

/// Leading columns of a row when the run is transcoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodeInfo {
    /// Header of the parameter column, e.g. "CRF" or "Preset".
    pub parameter_label: String,
    pub parameter: String,
    /// Formatted encoding time in seconds.
    pub time_taken: String,
}

/// One row of the comparison table, with the header label of each cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComparisonTableRow {
    pub columns: Vec<String>,
    pub values: Vec<String>,
}

/// Builds a row from summaries in requested-metric order.
///
/// With `encode` present the parameter and the encoding time come first.
pub fn build_row(summaries: &[MetricSummary], encode: Option<&EncodeInfo>) -> ComparisonTableRow {
    let mut columns = Vec::with_capacity(summaries.len() + 2);
    let mut values = Vec::with_capacity(summaries.len() + 2);

    if let Some(encode) = encode {
        columns.push(encode.parameter_label.clone());
        values.push(encode.parameter.clone());
        columns.push(TIME_TAKEN_LABEL.to_string());
        values.push(encode.time_taken.clone());
    }

    for summary in summaries {
        columns.push(summary.metric.name().to_string());
        values.push(summary.cell());
    }

    ComparisonTableRow { columns, values }
}

/// Title line describing the cell format and the metrics included.
pub fn table_title(requested: &[Metric]) -> String {
    let names: Vec<&str> = requested.iter().map(|m| m.name()).collect();
    format!(
        "{} values are in the format: Min | Standard Deviation | Mean",
        names.join("/")
    )
}

/// Running comparison of every encode evaluated in a run.
///
/// The file on disk is always a full rendering of this value; it is never
/// appended to in place.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ComparisonTable {
    title: Option<String>,
    columns: Vec<String>,
    rows: Vec<Vec<String>>,
    info: Vec<(String, String)>,
}

impl ComparisonTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn info(&self) -> &[(String, String)] {
        &self.info
    }

    /// Replaces the footer describing the run (source file, encoder, ...).
    pub fn set_info(&mut self, info: Vec<(String, String)>) {
        self.info = info;
    }

    /// Checks that `row` fits the table's schema without modifying anything.
    ///
    /// The first row fixes both the title and the column headers; later rows
    /// must match them exactly.
    pub fn check(&self, row: &ComparisonTableRow, requested: &[Metric]) -> Result<()> {
        if row.columns.len() != row.values.len() {
            return Err(VqmError::TableSchema(format!(
                "row has {} headers but {} values",
                row.columns.len(),
                row.values.len()
            )));
        }

        let title = table_title(requested);
        match &self.title {
            Some(existing) if *existing != title => {
                return Err(VqmError::TableSchema(format!(
                    "title would change from '{}' to '{}'",
                    existing, title
                )));
            }
            _ => {}
        }

        if !self.columns.is_empty() && self.columns != row.columns {
            return Err(VqmError::TableSchema(format!(
                "row columns [{}] do not match table columns [{}]",
                row.columns.join(", "),
                self.columns.join(", ")
            )));
        }
        Ok(())
    }

    /// Lines `row` up with the table's columns.
    ///
    /// A metric column the table already has but the row lacks (the report
    /// did not carry that metric) gets a [`SKIPPED_CELL`]. Rows that cannot
    /// be lined up are returned unchanged for [`ComparisonTable::check`] to
    /// reject.
    pub fn conform(&self, row: ComparisonTableRow) -> ComparisonTableRow {
        if self.columns.is_empty() || self.columns == row.columns {
            return row;
        }

        let mut values = Vec::with_capacity(self.columns.len());
        let mut next = 0;
        for column in &self.columns {
            if row.columns.get(next) == Some(column) {
                values.push(row.values[next].clone());
                next += 1;
            } else if Metric::ALL.iter().any(|m| m.name() == column) {
                values.push(SKIPPED_CELL.to_string());
            } else {
                return row;
            }
        }
        if next != row.columns.len() || row.columns.len() != row.values.len() {
            return row;
        }

        ComparisonTableRow {
            columns: self.columns.clone(),
            values,
        }
    }

    /// Appends `row` in memory after [`ComparisonTable::check`] accepts it.
    pub fn append(&mut self, row: ComparisonTableRow, requested: &[Metric]) -> Result<()> {
        self.check(&row, requested)?;
        let title = table_title(requested);
        if self.columns.is_empty() {
            self.columns = row.columns;
        }

        self.title = Some(title);
        self.rows.push(row.values);
        Ok(())
    }

    /// Renders the title line, the grid and the info footer.
    pub fn render(&self) -> String {
        let mut out = String::new();
        if let Some(title) = &self.title {
            out.push_str(title);
            out.push('\n');
        }

        if !self.columns.is_empty() {
            let widths: Vec<usize> = (0..self.columns.len())
                .map(|i| {
                    self.rows
                        .iter()
                        .map(|r| r[i].chars().count())
                        .chain(std::iter::once(self.columns[i].chars().count()))
                        .max()
                        .unwrap_or(0)
                })
                .collect();

            let border = render_border(&widths);
            out.push_str(&border);
            out.push_str(&render_line(&self.columns, &widths));
            out.push_str(&border);
            for row in &self.rows {
                out.push_str(&render_line(row, &widths));
            }
            out.push_str(&border);
        }

        if !self.info.is_empty() {
            out.push('\n');
            for (key, value) in &self.info {
                out.push_str(&format!("{}: {}\n", key, value));
            }
        }

        out
    }

    /// Writes the full table to `path`, replacing whatever was there.
    ///
    /// The text goes to a sibling temporary file first and is renamed over
    /// `path`, so a failed write leaves the previous table intact.
    pub fn persist(&self, path: &Path) -> Result<()> {
        let write_err = |source: std::io::Error| VqmError::TableWrite {
            path: path.to_path_buf(),
            source,
        };

        let tmp_path = temporary_path(path);
        fs::write(&tmp_path, self.render()).map_err(write_err)?;
        if let Err(e) = fs::rename(&tmp_path, path) {
            let _ = fs::remove_file(&tmp_path);
            return Err(write_err(e));
        }
        Ok(())
    }

    /// Reads a table previously written by [`ComparisonTable::persist`].
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self> {
        let mut lines = content.lines().peekable();
        let mut table = ComparisonTable::new();

        let title = lines
            .next()
            .ok_or_else(|| VqmError::TableParse("file is empty".to_string()))?;
        table.title = Some(title.to_string());

        if let Some(border) = lines.next_if(|l| l.starts_with('+')) {
            let separators: Vec<usize> = border
                .chars()
                .enumerate()
                .filter(|(_, c)| *c == '+')
                .map(|(i, _)| i)
                .collect();
            if separators.len() < 2 {
                return Err(VqmError::TableParse(format!("invalid border line '{}'", border)));
            }

            let header = lines
                .next()
                .ok_or_else(|| VqmError::TableParse("missing header line".to_string()))?;
            table.columns = split_cells(header, &separators)?;
            match lines.next() {
                Some(l) if l == border => {}
                _ => return Err(VqmError::TableParse("missing header separator".to_string())),
            }

            loop {
                let line = lines
                    .next()
                    .ok_or_else(|| VqmError::TableParse("grid is not terminated".to_string()))?;
                if line == border {
                    break;
                }
                table.rows.push(split_cells(line, &separators)?);
            }
        }

        for line in lines.filter(|l| !l.trim().is_empty()) {
            let (key, value) = line
                .split_once(": ")
                .ok_or_else(|| VqmError::TableParse(format!("invalid info line '{}'", line)))?;
            table.info.push((key.to_string(), value.to_string()));
        }

        Ok(table)
    }
}

/// Appends `row` and rewrites the whole table file.
///
/// When the write fails the in-memory table is rolled back, so it keeps
/// matching what is on disk.
pub fn append_and_persist(
    table: &mut ComparisonTable,
    row: ComparisonTableRow,
    requested: &[Metric],
    table_path: &Path,
) -> Result<()> {
    let previous = (table.title.clone(), table.columns.clone());
    table.append(row, requested)?;

    if let Err(e) = table.persist(table_path) {
        table.rows.pop();
        (table.title, table.columns) = previous;
        return Err(e);
    }
    Ok(())
}

// --- Helper Functions ---

fn temporary_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| "table".into());
    name.push(".tmp");
    path.with_file_name(name)
}

fn render_border(widths: &[usize]) -> String {
    let mut line = String::from("+");
    for width in widths {
        line.push_str(&"-".repeat(width + 2));
        line.push('+');
    }
    line.push('\n');
    line
}

fn render_line(cells: &[String], widths: &[usize]) -> String {
    let mut line = String::from("|");
    for (cell, width) in cells.iter().zip(widths) {
        line.push_str(&format!(" {:<width$} |", cell, width = width));
    }
    line.push('\n');
    line
}

// Metric cells contain '|' themselves, so cells are cut at the border's '+' positions.
fn split_cells(line: &str, separators: &[usize]) -> Result<Vec<String>> {
    let chars: Vec<char> = line.chars().collect();
    let last = separators[separators.len() - 1];
    if chars.len() != last + 1 || separators.iter().any(|&i| chars[i] != '|') {
        return Err(VqmError::TableParse(format!("row does not match grid: '{}'", line)));
    }

    Ok(separators
        .windows(2)
        .map(|w| chars[w[0] + 1..w[1]].iter().collect::<String>().trim().to_string())
        .collect())
}
