use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::Marker;

/// Number of records shown in a preview table.
pub const MAX_PREVIEW_ROWS: usize = 10;

/// Full-width comma used in place of escaped commas so that fields never
/// collide with the CSV delimiter.
const FULLWIDTH_COMMA: &str = "\u{FF0C}";

#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Calendar {
    pub events: Vec<EventRecord>,
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Vec::is_empty"))]
    pub diagnostics: Vec<Diagnostic>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct EventRecord {
    pub start: String,
    pub end: String,
    pub title: String,
    #[cfg_attr(feature = "serde", serde(rename = "detail"))]
    pub more: String,
}

/// Something odd noticed while scanning. Never affects the produced records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "kind", rename_all = "snake_case"))]
pub enum Diagnostic {
    /// `found` showed up on `line` while the scanner still waited for `expected`.
    OutOfOrder {
        line: usize,
        found: Marker,
        expected: Marker,
    },
    /// Input ended inside the block that began on `line`; the block was dropped.
    Incomplete { line: usize, expected: Marker },
}

impl EventRecord {
    pub fn new<S: AsRef<str>>(start: S, end: S, title: S, more: S) -> Self {
        Self {
            start: start.as_ref().trim().to_string(),
            end: end.as_ref().trim().to_string(),
            title: unescape_commas(title.as_ref().trim()),
            more: unescape_commas(more.as_ref().trim()),
        }
    }

    /// Numeric value of the first eight characters of `start`.
    ///
    /// An empty prefix counts as zero. Anything containing a non-digit has no
    /// key at all.
    pub fn date_key(&self) -> Option<u64> {
        let prefix: String = self.start.chars().take(8).collect();
        if prefix.is_empty() {
            return Some(0);
        }

        if !prefix.chars().all(|c| c.is_ascii_digit()) {
            return None;
        }

        prefix.parse().ok()
    }
}

impl Calendar {
    /// Orders events by calendar date only. Records sharing a date keep their
    /// scan order, and records without a numeric date go last.
    pub fn sort_by_date(&mut self) {
        self.events.sort_by_key(|event| match event.date_key() {
            Some(key) => (false, key),
            None => (true, 0),
        });
    }

    #[must_use]
    pub fn preview(&self, rows: usize) -> &[EventRecord] {
        &self.events[..self.events.len().min(rows)]
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::OutOfOrder {
                line,
                found,
                expected,
            } => write!(
                f,
                "line {line}: found `{}` while expecting `{}`",
                found.keyword(),
                expected.keyword()
            ),
            Diagnostic::Incomplete { line, expected } => write!(
                f,
                "line {line}: event block ends before `{}`, dropped",
                expected.keyword()
            ),
        }
    }
}

fn unescape_commas(s: &str) -> String {
    s.replace("\\,", FULLWIDTH_COMMA)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(start: &str) -> EventRecord {
        EventRecord::new(start, "", start, "")
    }

    #[test]
    fn new_trims_and_unescapes() {
        let event = EventRecord::new(
            " 20141101T210000Z\r",
            "20141101T220000Z\r",
            " Dinner\\, drinks ",
            "Bring wine\\, cheese\\, bread\r",
        );

        assert_eq!(event.start, "20141101T210000Z");
        assert_eq!(event.end, "20141101T220000Z");
        assert_eq!(event.title, "Dinner\u{FF0C} drinks");
        assert_eq!(event.more, "Bring wine\u{FF0C} cheese\u{FF0C} bread");
    }

    #[test]
    fn unescape_leaves_dates_alone() {
        let event = EventRecord::new("2014\\,", "x\\,", "", "");
        assert_eq!(event.start, "2014\\,");
        assert_eq!(event.end, "x\\,");
    }

    #[test]
    fn date_key() {
        assert_eq!(record("20141101T210000").date_key(), Some(20141101));
        assert_eq!(record("20230101").date_key(), Some(20230101));
        assert_eq!(record("2023").date_key(), Some(2023));
        assert_eq!(record("").date_key(), Some(0));
        assert_eq!(record("TZID=Asia/Taipei:20141101").date_key(), None);
    }

    #[test]
    fn sort_orders_by_date_only() {
        let mut calendar = Calendar {
            events: vec![
                EventRecord::new("20230102T090000", "", "b", ""),
                EventRecord::new("20230101T230000", "", "late", ""),
                EventRecord::new("20230101T080000", "", "early", ""),
            ],
            diagnostics: Vec::new(),
        };

        calendar.sort_by_date();

        let titles: Vec<_> = calendar.events.iter().map(|e| e.title.as_str()).collect();
        // Same date keeps scan order, time of day is ignored.
        assert_eq!(titles, ["late", "early", "b"]);
    }

    #[test]
    fn sort_puts_unkeyed_records_last() {
        let mut calendar = Calendar {
            events: vec![
                record("garbage"),
                record("20240101"),
                record("TZID=X:2023"),
                record("20230101"),
            ],
            diagnostics: Vec::new(),
        };

        calendar.sort_by_date();

        let starts: Vec<_> = calendar.events.iter().map(|e| e.start.as_str()).collect();
        assert_eq!(starts, ["20230101", "20240101", "garbage", "TZID=X:2023"]);
    }

    #[test]
    fn preview_is_capped() {
        let calendar = Calendar {
            events: (0..25).map(|i| record(&format!("2023{i:04}"))).collect(),
            diagnostics: Vec::new(),
        };

        assert_eq!(calendar.preview(MAX_PREVIEW_ROWS).len(), 10);
        assert_eq!(calendar.preview(MAX_PREVIEW_ROWS)[0].start, "20230000");
        assert_eq!(calendar.preview(100).len(), 25);
        assert!(Calendar::default().preview(MAX_PREVIEW_ROWS).is_empty());
    }

    #[test]
    fn diagnostic_display() {
        let diagnostic = Diagnostic::Incomplete {
            line: 4,
            expected: Marker::Finish,
        };
        assert_eq!(
            diagnostic.to_string(),
            "line 4: event block ends before `END:VEVENT`, dropped"
        );
    }
}
