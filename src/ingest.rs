//! Boundary between the scraper's positional rows and [`TranscriptRow`].
//!
//! Layout v1 column order:
//!
//! | col | field |
//! |----:|-------|
//! | 0 | academic year |
//! | 1 | term |
//! | 2 | subject name |
//! | 3 | attempt number |
//! | 4 | midterm score |
//! | 5 | continuous score |
//! | 6 | final exam score |
//! | 7 | final score |
//! | 8 | letter grade |
//! | 9 | credits |
//! | 10 | manual-edit flag |
//!
//! Anything past column 10 is carried in [`TranscriptRow::extra`].

use std::collections::{HashMap, VecDeque};
use std::io::{Read, Write};

use crate::error::EngineError;
use crate::models::{Field, TranscriptRow};
use crate::normalize::normalize;

pub const LAYOUT_VERSION: u32 = 1;

const FLAG_COLUMN: usize = 10;
const KNOWN_WIDTH: usize = FLAG_COLUMN + 1;

/// Column of `field` under layout v1.
pub fn column_of(field: Field) -> usize {
    match field {
        Field::AcademicYear => 0,
        Field::Term => 1,
        Field::SubjectName => 2,
        Field::AttemptNumber => 3,
        Field::MidtermScore => 4,
        Field::ContinuousScore => 5,
        Field::FinalExamScore => 6,
        Field::FinalScore => 7,
        Field::LetterGrade => 8,
        Field::Credits => 9,
        Field::Extra(n) => KNOWN_WIDTH + n,
    }
}

/// Builds a row from positional cells; short rows default the rest to
/// empty. Cells are kept verbatim. A fresh id is assigned.
pub fn row_from_cells(cells: &[String]) -> TranscriptRow {
    let cell = |i: usize| cells.get(i).cloned().unwrap_or_default();
    let mut row = TranscriptRow::new(cell(column_of(Field::SubjectName)));
    for field in Field::NAMED {
        if field != Field::SubjectName {
            row.set(field, cell(column_of(field)));
        }
    }
    row.manually_edited = parse_flag(&cell(FLAG_COLUMN));
    row.extra = cells.iter().skip(KNOWN_WIDTH).cloned().collect();
    row
}

pub fn rows_from_cells(rows: &[Vec<String>]) -> Vec<TranscriptRow> {
    rows.iter().map(|cells| row_from_cells(cells)).collect()
}

/// Inverse of [`row_from_cells`], minus the id.
pub fn row_to_cells(row: &TranscriptRow) -> Vec<String> {
    let mut cells = vec![String::new(); KNOWN_WIDTH];
    for field in Field::NAMED {
        cells[column_of(field)] = row.get(field).unwrap_or_default().to_string();
    }
    cells[FLAG_COLUMN] = if row.manually_edited { "true" } else { "" }.to_string();
    cells.extend(row.extra.iter().cloned());
    cells
}

fn parse_flag(cell: &str) -> bool {
    matches!(
        cell.trim().to_ascii_lowercase().as_str(),
        "true" | "1" | "x" | "yes"
    )
}

/// Reads header-less, possibly ragged CSV as produced by the scraper.
pub fn read_csv<R: Read>(reader: R) -> Result<Vec<TranscriptRow>, EngineError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(reader);

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| EngineError::csv("read transcript csv", e))?;
        let cells: Vec<String> = record.iter().map(str::to_string).collect();
        if cells.iter().all(|c| c.trim().is_empty()) {
            continue;
        }
        rows.push(row_from_cells(&cells));
    }
    Ok(rows)
}

pub fn write_csv<W: Write>(writer: W, rows: &[TranscriptRow]) -> Result<(), EngineError> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_writer(writer);
    for row in rows {
        writer
            .write_record(row_to_cells(row))
            .map_err(|e| EngineError::csv("write transcript csv", e))?;
    }
    writer
        .flush()
        .map_err(|e| EngineError::io("flush transcript csv", e))
}

type ScrapeKey = (String, String, String, String);

fn scrape_key(row: &TranscriptRow) -> ScrapeKey {
    (
        row.academic_year.trim().to_string(),
        row.term.trim().to_string(),
        normalize(&row.subject_name),
        row.attempt_number.trim().to_string(),
    )
}

/// Replaces `previous` with a fresh scrape while keeping user edits.
///
/// Each fresh row whose (year, term, subject, attempt) matches an edited
/// row is swapped for that edited row; edited rows sharing a key are used
/// up in their `previous` order. Edited rows left unused are appended at
/// the end, also in `previous` order.
pub fn merge_fresh_scrape(
    previous: &[TranscriptRow],
    fresh: Vec<TranscriptRow>,
) -> Vec<TranscriptRow> {
    let mut edited: HashMap<ScrapeKey, VecDeque<usize>> = HashMap::new();
    for (index, row) in previous.iter().enumerate() {
        if row.manually_edited {
            edited.entry(scrape_key(row)).or_default().push_back(index);
        }
    }

    let mut used = vec![false; previous.len()];
    let mut kept = 0usize;
    let mut merged: Vec<TranscriptRow> = fresh
        .into_iter()
        .map(|row| {
            let slot = edited
                .get_mut(&scrape_key(&row))
                .and_then(VecDeque::pop_front);
            match slot {
                Some(index) => {
                    used[index] = true;
                    kept += 1;
                    previous[index].clone()
                }
                None => row,
            }
        })
        .collect();

    let before = merged.len();
    merged.extend(
        previous
            .iter()
            .zip(&used)
            .filter(|(row, used)| row.manually_edited && !**used)
            .map(|(row, _)| row.clone()),
    );
    let orphans = merged.len() - before;

    tracing::info!(
        rows = merged.len(),
        edits_kept = kept,
        edits_orphaned = orphans,
        "ingest: merged fresh scrape"
    );
    merged
}
