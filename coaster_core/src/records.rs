//! In-memory record log.
//!
//! Records are kept in insertion order. Appends are ignored while logging is
//! paused; reads and deletions always work. Pages are rendered as compact JSON
//! with fields in wire order and grams printed with six decimals.

use std::fmt::Write as _;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordKind {
    Measurement,
    Sip,
    Refill,
}

impl RecordKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            RecordKind::Measurement => "measurement",
            RecordKind::Sip => "sip",
            RecordKind::Refill => "refill",
        }
    }
}

impl std::fmt::Display for RecordKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One logged interval. `end_time == 0` marks an open measurement.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Record {
    pub start_time: i64,
    pub end_time: i64,
    pub grams: f32,
    pub kind: RecordKind,
}

impl Record {
    /// Build a record; a non-zero `end_time` is raised to `start_time` if it
    /// precedes it (the corrected clock can move backwards on `setTime`).
    pub fn new(kind: RecordKind, start_time: i64, end_time: i64, grams: f32) -> Self {
        let end_time = if end_time == 0 {
            0
        } else {
            end_time.max(start_time)
        };
        Self {
            start_time,
            end_time,
            grams,
            kind,
        }
    }

    pub fn measurement(start_time: i64, end_time: i64, grams: f32) -> Self {
        Self::new(RecordKind::Measurement, start_time, end_time, grams)
    }

    pub fn sip(start_time: i64, end_time: i64, grams: f32) -> Self {
        Self::new(RecordKind::Sip, start_time, end_time, grams)
    }

    pub fn refill(start_time: i64, end_time: i64, grams: f32) -> Self {
        Self::new(RecordKind::Refill, start_time, end_time, grams)
    }

    pub fn is_open(&self) -> bool {
        self.kind == RecordKind::Measurement && self.end_time == 0
    }

    /// Append `{"start_time":..,"end_time":..,"grams":..,"type":".."}` to `out`.
    pub fn write_json(&self, out: &mut String) {
        let grams = if self.grams.is_finite() {
            self.grams
        } else {
            0.0
        };
        let _ = write!(
            out,
            r#"{{"start_time":{},"end_time":{},"grams":{:.6},"type":"{}"}}"#,
            self.start_time, self.end_time, grams, self.kind
        );
    }

    pub fn to_json(&self) -> String {
        let mut s = String::with_capacity(80);
        self.write_json(&mut s);
        s
    }
}

/// Render a page as `{"length":N,"records":[...]}`.
pub fn page_json(records: &[Record]) -> String {
    let mut out = String::with_capacity(32 + records.len() * 80);
    let _ = write!(out, r#"{{"length":{},"records":["#, records.len());
    for (i, r) in records.iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        r.write_json(&mut out);
    }
    out.push_str("]}");
    out
}

#[derive(Debug, Clone)]
pub struct RecordStore {
    records: Vec<Record>,
    logging: bool,
}

impl Default for RecordStore {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordStore {
    /// Empty store with logging enabled.
    pub fn new() -> Self {
        Self {
            records: Vec::new(),
            logging: true,
        }
    }

    /// Append when logging is enabled. Returns whether the record was kept.
    pub fn append(&mut self, record: Record) -> bool {
        if !self.logging {
            return false;
        }
        self.records.push(record);
        true
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn is_logging(&self) -> bool {
        self.logging
    }

    pub fn set_logging(&mut self, on: bool) {
        self.logging = on;
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn last(&self) -> Option<&Record> {
        self.records.last()
    }

    /// Up to `length` records starting at `offset`, with their count.
    /// An offset at or past the end yields an empty page.
    pub fn paginate(&self, offset: usize, length: usize) -> (&[Record], usize) {
        let start = offset.min(self.records.len());
        let end = start.saturating_add(length).min(self.records.len());
        let page = &self.records[start..end];
        (page, page.len())
    }

    /// Delete up to `length` records starting at `offset`, truncated at the
    /// end of the store. Returns `false` without change if `offset` is past
    /// the last record.
    pub fn drop_range(&mut self, offset: usize, length: usize) -> bool {
        if offset >= self.records.len() {
            return false;
        }
        let end = offset.saturating_add(length).min(self.records.len());
        self.records.drain(offset..end);
        true
    }

    /// Close the trailing open measurement at `now` if its weight is within
    /// `tolerance` of `grams`. Returns whether a record was closed.
    pub fn close_last_measurement(&mut self, now: i64, grams: f32, tolerance: f32) -> bool {
        match self.records.last_mut() {
            Some(last) if last.is_open() && (last.grams - grams).abs() <= tolerance => {
                last.end_time = now.max(last.start_time);
                true
            }
            _ => false,
        }
    }
}
