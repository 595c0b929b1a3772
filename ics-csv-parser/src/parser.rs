use log::debug;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{Calendar, Diagnostic, EventRecord};

/// Prefix of a start/end value carrying a `VALUE=DATE:` parameter.
const ALL_DAY_PREFIX: &str = "VALUE";
const ALL_DAY_PREFIX_LEN: usize = 11;

/// The lines an event block is assembled from, in the order they must appear.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Marker {
    Begin,
    Start,
    End,
    Description,
    Summary,
    Finish,
}

impl Marker {
    pub const SEQUENCE: [Marker; 6] = [
        Marker::Begin,
        Marker::Start,
        Marker::End,
        Marker::Description,
        Marker::Summary,
        Marker::Finish,
    ];

    #[must_use]
    pub fn keyword(self) -> &'static str {
        match self {
            Marker::Begin => "BEGIN:VEVENT",
            Marker::Start => "DTSTART",
            Marker::End => "DTEND",
            Marker::Description => "DESCRIPTION",
            Marker::Summary => "SUMMARY",
            Marker::Finish => "END:VEVENT",
        }
    }

    /// Characters cut from the front of a matching line to get its value.
    #[must_use]
    pub fn prefix_len(self) -> usize {
        match self {
            Marker::Begin | Marker::Finish => 0,
            Marker::Start | Marker::Summary => 8,
            Marker::End => 6,
            Marker::Description => 12,
        }
    }

    #[must_use]
    pub fn next(self) -> Marker {
        match self {
            Marker::Begin => Marker::Start,
            Marker::Start => Marker::End,
            Marker::End => Marker::Description,
            Marker::Description => Marker::Summary,
            Marker::Summary => Marker::Finish,
            Marker::Finish => Marker::Begin,
        }
    }

    /// Literal prefix check, anything may follow the keyword.
    #[must_use]
    pub fn matches(self, line: &str) -> bool {
        line.starts_with(self.keyword())
    }

    #[must_use]
    pub fn extract(self, line: &str) -> Option<&str> {
        self.matches(line)
            .then(|| skip_chars(line, self.prefix_len()))
    }
}

/// Raw values collected for the block currently being scanned.
#[derive(Debug, Default)]
struct Fields<'a> {
    opened_at: usize,
    start: &'a str,
    end: &'a str,
    description: &'a str,
    summary: &'a str,
}

struct Assembler<'a> {
    expected: Marker,
    fields: Fields<'a>,
    calendar: Calendar,
}

impl<'a> Assembler<'a> {
    fn new() -> Self {
        Self {
            expected: Marker::Begin,
            fields: Fields::default(),
            calendar: Calendar::default(),
        }
    }

    fn feed(&mut self, line_number: usize, line: &'a str) {
        let Some(value) = self.expected.extract(line) else {
            self.check_order(line_number, line);
            return;
        };

        match self.expected {
            Marker::Begin => self.fields.opened_at = line_number,
            Marker::Start => self.fields.start = value,
            Marker::End => self.fields.end = value,
            Marker::Description => self.fields.description = value,
            Marker::Summary => self.fields.summary = value,
            Marker::Finish => {
                let fields = std::mem::take(&mut self.fields);
                self.calendar.events.push(fields.into_record());
            }
        }

        self.expected = self.expected.next();
    }

    /// Records lines that belong to the sequence but arrive too early. They are
    /// still skipped.
    fn check_order(&mut self, line_number: usize, line: &str) {
        if self.expected == Marker::Begin {
            return;
        }

        let Some(found) = Marker::SEQUENCE
            .into_iter()
            .find(|marker| marker.matches(line))
        else {
            return;
        };

        if found == Marker::Begin || found > self.expected {
            self.calendar.diagnostics.push(Diagnostic::OutOfOrder {
                line: line_number,
                found,
                expected: self.expected,
            });
        }
    }

    fn finish(mut self) -> Calendar {
        if self.expected != Marker::Begin {
            debug!(
                "dropping event block opened at line {} (missing {})",
                self.fields.opened_at,
                self.expected.keyword()
            );
            self.calendar.diagnostics.push(Diagnostic::Incomplete {
                line: self.fields.opened_at,
                expected: self.expected,
            });
        }

        self.calendar
    }
}

impl Fields<'_> {
    fn into_record(self) -> EventRecord {
        EventRecord::new(
            strip_all_day(self.start),
            strip_all_day(self.end),
            self.summary,
            self.description,
        )
    }
}

/// Scans `s` line by line and returns the events in the order they appear.
///
/// Malformed input never fails the scan: unrecognised lines are skipped and a
/// block cut short by the end of input is dropped, see
/// [`Calendar::diagnostics`].
pub fn parse_calendar<S: AsRef<str>>(s: S) -> Calendar {
    let mut assembler = Assembler::new();

    for (idx, line) in s.as_ref().split('\n').enumerate() {
        assembler.feed(idx + 1, line);
    }

    assembler.finish()
}

fn strip_all_day(value: &str) -> &str {
    if value.starts_with(ALL_DAY_PREFIX) {
        skip_chars(value, ALL_DAY_PREFIX_LEN)
    } else {
        value
    }
}

fn skip_chars(s: &str, n: usize) -> &str {
    s.char_indices().nth(n).map_or("", |(idx, _)| &s[idx..])
}
