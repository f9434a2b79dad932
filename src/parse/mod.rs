pub mod date;
pub mod line_parser;
pub mod line_serializer;

pub use date::{format_date, parse_date_token};
pub use line_parser::{parse_file, parse_line, strip_tokens};
pub use line_serializer::{format_file, format_line};
