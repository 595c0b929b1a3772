use std::fmt::Write;

use chrono::{Local, NaiveDateTime};

use crate::{parse_calendar, Calendar, EventRecord, MAX_PREVIEW_ROWS};

pub const UTF8_BOM: &str = "\u{FEFF}";
pub const CSV_HEADER: &str = "#, start, end, title, detail";

const FILE_PREFIX: &str = "Google_calendar";

/// Result of converting one uploaded file.
#[derive(Debug, Clone)]
pub struct Conversion {
    /// Sorted events and any diagnostics raised while scanning.
    pub calendar: Calendar,
    /// Downloadable document, BOM included.
    pub csv: String,
    pub file_name: String,
}

impl Conversion {
    #[must_use]
    pub fn preview(&self) -> &[EventRecord] {
        self.calendar.preview(MAX_PREVIEW_ROWS)
    }
}

impl Calendar {
    /// CSV body without the byte order mark. Rows are numbered from 1 and keep
    /// the trailing delimiter older exports had.
    #[must_use]
    pub fn to_csv(&self) -> String {
        let mut content = String::from(CSV_HEADER);
        content.push('\n');

        for (idx, event) in self.events.iter().enumerate() {
            // Writing into a String cannot fail.
            let _ = writeln!(
                content,
                "{},{},{},{},{},",
                idx + 1,
                event.start,
                event.end,
                event.title,
                event.more
            );
        }

        content
    }
}

/// `Google_calendar` followed by `YYYYMMDD_HHMMSS` of `at`.
#[must_use]
pub fn file_name(at: NaiveDateTime) -> String {
    format!("{FILE_PREFIX}{}.csv", at.format("%Y%m%d_%H%M%S"))
}

/// Parses, sorts and exports `ics`, naming the file after the current local time.
pub fn convert<S: AsRef<str>>(ics: S) -> Conversion {
    convert_at(ics, Local::now().naive_local())
}

pub fn convert_at<S: AsRef<str>>(ics: S, at: NaiveDateTime) -> Conversion {
    let mut calendar = parse_calendar(ics);
    calendar.sort_by_date();

    let csv = format!("{UTF8_BOM}{}", calendar.to_csv());

    Conversion {
        calendar,
        csv,
        file_name: file_name(at),
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    fn at(h: u32, m: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2014, 11, 1)
            .unwrap()
            .and_hms_opt(h, m, s)
            .unwrap()
    }

    fn block(start: &str, title: &str) -> String {
        format!(
            "BEGIN:VEVENT\nDTSTART:{start}\nDTEND:{start}\nDESCRIPTION:about {title}\nSUMMARY:{title}\nEND:VEVENT\n"
        )
    }

    #[test]
    fn file_name_is_zero_padded() {
        assert_eq!(file_name(at(21, 7, 2)), "Google_calendar20141101_210702.csv");
        assert_eq!(file_name(at(0, 0, 0)), "Google_calendar20141101_000000.csv");
    }

    #[test]
    fn csv_layout() {
        let calendar = Calendar {
            events: vec![
                EventRecord::new("20230101", "20230102", "Holiday", "New Year"),
                EventRecord::new("20230105T090000", "20230105T100000", "A\\, B", ""),
            ],
            diagnostics: Vec::new(),
        };

        assert_eq!(
            calendar.to_csv(),
            "#, start, end, title, detail\n\
             1,20230101,20230102,Holiday,New Year,\n\
             2,20230105T090000,20230105T100000,A\u{FF0C} B,,\n"
        );
    }

    #[test]
    fn empty_calendar_has_header_only() {
        assert_eq!(Calendar::default().to_csv(), "#, start, end, title, detail\n");
    }

    #[test]
    fn convert_sorts_and_numbers_rows() {
        let input = [
            block("20230301T100000", "march"),
            block("20230101T100000", "january"),
            block("20230201T100000", "february"),
        ]
        .concat();

        let conversion = convert_at(input, at(21, 7, 2));

        assert!(conversion.csv.starts_with(UTF8_BOM));
        assert_eq!(conversion.file_name, "Google_calendar20141101_210702.csv");

        let lines: Vec<_> = conversion
            .csv
            .trim_start_matches(UTF8_BOM)
            .lines()
            .collect();
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0], CSV_HEADER);
        assert!(lines[1].starts_with("1,20230101T100000,"));
        assert!(lines[2].starts_with("2,20230201T100000,"));
        assert!(lines[3].starts_with("3,20230301T100000,"));
        assert!(lines[3].ends_with(",march,about march,"));
    }

    #[test]
    fn preview_is_capped_but_csv_is_not() {
        let input: String = (1..=12)
            .rev()
            .map(|day| block(&format!("202301{day:02}"), &format!("day {day}")))
            .collect();

        let conversion = convert_at(input, at(8, 0, 0));

        assert_eq!(conversion.calendar.len(), 12);
        assert_eq!(conversion.preview().len(), MAX_PREVIEW_ROWS);
        assert_eq!(conversion.preview()[0].title, "day 1");
        assert_eq!(conversion.preview()[9].title, "day 10");
        assert_eq!(conversion.csv.lines().count(), 13);
    }

    #[test]
    fn escaped_commas_never_reach_the_delimiter() {
        let input = "BEGIN:VEVENT\nDTSTART:20230101\nDTEND:20230101\nDESCRIPTION:x\\,y\nSUMMARY:a\\,b\\,c\nEND:VEVENT\n";
        let conversion = convert_at(input, at(8, 0, 0));

        let row = conversion.csv.lines().nth(1).unwrap();
        assert_eq!(row, "1,20230101,20230101,a\u{FF0C}b\u{FF0C}c,x\u{FF0C}y,");
        assert_eq!(row.matches(',').count(), 5);
    }
}
