mod csv;
mod parser;
mod structs;

pub use csv::{convert, convert_at, file_name, Conversion, CSV_HEADER, UTF8_BOM};
pub use parser::{parse_calendar, Marker};
pub use structs::{Calendar, Diagnostic, EventRecord, MAX_PREVIEW_ROWS};
