use crate::models::record::{DedupKey, Record, COLUMNS, COLUMN_COUNT};
use crate::utils::csv_line::{split_line, SplitError};
use serde::Serialize;
use std::collections::HashSet;

/// Phrase the assistant is told to answer with when the knowledge base has
/// nothing relevant.
pub const NOT_FOUND_SENTINEL: &str = "Not found in knowledge text";

pub const FIELD_SEPARATOR: char = ',';

/// Longest run of physical lines joined while looking for a closing quote.
const MAX_CONTINUATION_LINES: usize = 12;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, thiserror::Error)]
#[serde(rename_all = "snake_case")]
pub enum ReconcileError {
    #[error("response contained no usable data")]
    NoData,
    #[error("response has no header line")]
    MissingHeader,
}

impl ReconcileError {
    pub fn kind(&self) -> &'static str {
        match self {
            ReconcileError::NoData => "no_data",
            ReconcileError::MissingHeader => "missing_header",
        }
    }
}

/// Rows recovered from one raw payload, before merging.
#[derive(Debug, Default)]
pub struct ParsedBatch {
    pub records: Vec<Record>,
    pub skipped_rows: usize,
    pub truncated_rows: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReconcileSummary {
    pub parsed: usize,
    pub added: usize,
    pub duplicates: usize,
    pub overflow: usize,
    pub skipped_rows: usize,
}

pub fn parse_batch(text: &str) -> Result<ParsedBatch, ReconcileError> {
    if text.trim().is_empty() || text.contains(NOT_FOUND_SENTINEL) {
        return Err(ReconcileError::NoData);
    }

    let lines: Vec<&str> = text.lines().collect();
    let header_idx = lines
        .iter()
        .position(|line| is_header_line(line))
        .ok_or(ReconcileError::MissingHeader)?;

    let mut batch = ParsedBatch::default();
    let mut idx = header_idx + 1;
    while idx < lines.len() {
        let line = lines[idx];
        let line_no = idx + 1;
        if is_noise(line) {
            idx += 1;
            continue;
        }

        let (fields, consumed) = match split_line(line, FIELD_SEPARATOR) {
            Ok(fields) => (fields, 1),
            Err(SplitError::UnterminatedQuote) => match join_continuation(&lines, idx) {
                Some(found) => found,
                None => {
                    tracing::warn!(line = line_no, "parse_row_skipped: unterminated quote");
                    batch.skipped_rows += 1;
                    idx += 1;
                    continue;
                }
            },
        };
        idx += consumed;

        if is_repeated_header(&fields) {
            continue;
        }
        if fields.len() > COLUMN_COUNT {
            tracing::warn!(
                line = line_no,
                fields = fields.len(),
                expected = COLUMN_COUNT,
                "discarding extra columns"
            );
            batch.truncated_rows += 1;
        }

        let record = build_record(&fields);
        if record.is_viable() {
            batch.records.push(record);
        } else {
            tracing::warn!(line = line_no, "parse_row_skipped: no question text or options");
            batch.skipped_rows += 1;
        }
    }

    Ok(batch)
}

fn is_header_line(line: &str) -> bool {
    let anchors = [COLUMNS[0].header(), COLUMNS[1].header()];
    anchors.iter().all(|anchor| line.contains(anchor.as_str()))
}

fn is_repeated_header(fields: &[String]) -> bool {
    fields.len() >= 2
        && fields[0].trim() == COLUMNS[0].header()
        && fields[1].trim() == COLUMNS[1].header()
}

fn is_noise(line: &str) -> bool {
    let trimmed = line.trim();
    trimmed.is_empty() || trimmed.starts_with("```")
}

/// Joins following lines onto an open-quoted row until it closes. Gives up
/// after a bounded number of lines, or at a line that is a complete row by
/// itself, so a stray quote damages one row only.
fn join_continuation(lines: &[&str], start: usize) -> Option<(Vec<String>, usize)> {
    let mut buffer = lines[start].to_string();
    let end = (start + MAX_CONTINUATION_LINES).min(lines.len());
    for (offset, next) in lines[start + 1..end].iter().enumerate() {
        if starts_new_row(next) {
            return None;
        }
        buffer.push('\n');
        buffer.push_str(next);
        if let Ok(fields) = split_line(&buffer, FIELD_SEPARATOR) {
            return Some((fields, offset + 2));
        }
    }
    None
}

fn starts_new_row(line: &str) -> bool {
    matches!(split_line(line, FIELD_SEPARATOR), Ok(fields) if fields.len() >= COLUMN_COUNT)
}

fn build_record(fields: &[String]) -> Record {
    let mut record = Record::default();
    for (column, raw) in COLUMNS.iter().zip(fields.iter()) {
        record.set(*column, raw);
    }
    record
}

/// Deduplicated accumulation of accepted records for one run. Never holds
/// more than its capacity.
#[derive(Debug, Clone, Default)]
pub struct ResultSet {
    records: Vec<Record>,
    seen: HashSet<DedupKey>,
    capacity: Option<usize>,
}

impl ResultSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity_limit(limit: usize) -> Self {
        Self {
            capacity: Some(limit),
            ..Self::default()
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.capacity.is_some_and(|cap| self.records.len() >= cap)
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn into_records(self) -> Vec<Record> {
        self.records
    }

    /// Appends records whose key has not been seen, keeping the first
    /// occurrence. Returns how many were added.
    pub fn merge(&mut self, incoming: Vec<Record>, summary: &mut ReconcileSummary) -> usize {
        let before = self.records.len();
        for record in incoming {
            let key = record.dedup_key();
            if self.seen.contains(&key) {
                summary.duplicates += 1;
                continue;
            }
            if self.is_full() {
                summary.overflow += 1;
                continue;
            }
            self.seen.insert(key);
            self.records.push(record);
        }
        self.records.len() - before
    }
}

/// Parses one raw payload and folds it into `set`.
pub fn reconcile(text: &str, set: &mut ResultSet) -> Result<ReconcileSummary, ReconcileError> {
    let batch = parse_batch(text)?;
    let mut summary = ReconcileSummary {
        parsed: batch.records.len(),
        skipped_rows: batch.skipped_rows,
        ..Default::default()
    };
    let added = set.merge(batch.records, &mut summary);
    summary.added = added;
    tracing::debug!(
        parsed = summary.parsed,
        added = summary.added,
        duplicates = summary.duplicates,
        skipped = summary.skipped_rows,
        "batch reconciled"
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::record::{header_line, Language};

    fn row(question: &str) -> String {
        let mut cells = vec![String::new(); COLUMN_COUNT];
        cells[0] = "History".into();
        cells[1] = "Modern History".into();
        cells[3] = "Multiple Choice".into();
        cells[4] = question.into();
        for i in 0..4 {
            cells[6 + i] = format!("opt {}", i);
        }
        cells[14] = "opt 0".into();
        cells[21] = "12".into();
        crate::utils::csv_line::join_row(&cells, ',')
    }

    #[test]
    fn empty_and_sentinel_payloads_are_no_data() {
        assert_eq!(parse_batch("   \n").unwrap_err(), ReconcileError::NoData);
        assert_eq!(
            parse_batch("Not found in knowledge text.").unwrap_err(),
            ReconcileError::NoData
        );
    }

    #[test]
    fn missing_header_is_reported() {
        let err = parse_batch("Sure! Here are some questions:\n1. What?").unwrap_err();
        assert_eq!(err, ReconcileError::MissingHeader);
        assert_eq!(err.kind(), "missing_header");
    }

    #[test]
    fn header_anchors_are_case_sensitive() {
        let text = format!("subject,topic\n{}", row("Q1"));
        assert_eq!(parse_batch(&text).unwrap_err(), ReconcileError::MissingHeader);
    }

    #[test]
    fn skips_commentary_fences_and_repeated_headers() {
        let text = format!(
            "Here you go\n```csv\n{}\n{}\n\n{}\n{}\n```\n",
            header_line(),
            row("Q1"),
            header_line(),
            row("Q2")
        );
        let batch = parse_batch(&text).unwrap();
        assert_eq!(batch.records.len(), 2);
        assert_eq!(batch.records[1].question_text.english, "Q2");
        assert_eq!(batch.records[0].source_page_number, 12);
    }

    #[test]
    fn short_rows_are_padded_and_long_rows_truncated() {
        let short = "Polity,General,,MCQ,Who appoints the CAG?";
        let long = format!("{},extra,more", row("Q9"));
        let text = format!("{}\n{}\n{}", header_line(), short, long);
        let batch = parse_batch(&text).unwrap();
        assert_eq!(batch.records.len(), 2);
        assert_eq!(batch.records[0].question_text.english, "Who appoints the CAG?");
        assert_eq!(batch.records[0].explanation.hindi, "");
        assert_eq!(batch.records[0].year_of_original_question, 0);
        assert_eq!(batch.truncated_rows, 1);
    }

    #[test]
    fn quoted_field_may_span_lines() {
        let mut cells = vec![String::new(); COLUMN_COUNT];
        cells[4] = "Which river?".into();
        cells[16] = "First paragraph.\nSecond, with a comma.".into();
        let text = format!(
            "{}\n{}\n{}",
            header_line(),
            crate::utils::csv_line::join_row(&cells, ','),
            row("Q2")
        );
        let batch = parse_batch(&text).unwrap();
        assert_eq!(batch.records.len(), 2);
        assert_eq!(
            batch.records[0].explanation.get(Language::English),
            "First paragraph.\nSecond, with a comma."
        );
    }

    #[test]
    fn stray_quote_only_costs_one_row() {
        let text = format!(
            "{}\n{}\nHistory,\"broken row\n{}",
            header_line(),
            row("Q1"),
            row("Q2")
        );
        let batch = parse_batch(&text).unwrap();
        assert_eq!(batch.records.len(), 2);
        assert_eq!(batch.skipped_rows, 1);
    }

    #[test]
    fn stray_quote_does_not_swallow_a_row_with_a_literal_quote() {
        let mut cells = vec![String::new(); COLUMN_COUNT];
        cells[0] = "Science".into();
        cells[4] = "Which is a 5\" floppy?".into();
        cells[6] = "5\" disk".into();
        cells[7] = "3.5\" disk".into();
        cells[21] = "40".into();
        let literal_quote_row = cells.join(",");

        let text = format!(
            "{}\n{}\nHistory,\"broken row\n{}\n{}",
            header_line(),
            row("Q1?"),
            literal_quote_row,
            row("Q3?")
        );
        let batch = parse_batch(&text).unwrap();
        let questions: Vec<&str> = batch
            .records
            .iter()
            .map(|r| r.question_text.english.as_str())
            .collect();
        assert_eq!(questions, vec!["Q1?", "Which is a 5\" floppy?", "Q3?"]);
        assert_eq!(batch.records[1].options[0].english, "5\" disk");
        assert_eq!(batch.records[1].source_page_number, 40);
        assert_eq!(batch.skipped_rows, 1);
    }

    #[test]
    fn merge_dedupes_and_respects_capacity() {
        let mut set = ResultSet::with_capacity_limit(3);
        let text = format!("{}\n{}\n{}\n{}", header_line(), row("Q1"), row("Q1"), row("Q2"));
        let first = reconcile(&text, &mut set).unwrap();
        assert_eq!(first.added, 2);
        assert_eq!(first.duplicates, 1);

        let text = format!("{}\n{}\n{}\n{}", header_line(), row("Q2"), row("Q3"), row("Q4"));
        let second = reconcile(&text, &mut set).unwrap();
        assert_eq!(second.added, 1);
        assert_eq!(second.duplicates, 1);
        assert_eq!(second.overflow, 1);
        assert_eq!(set.len(), 3);
        assert!(set.is_full());
    }
}
