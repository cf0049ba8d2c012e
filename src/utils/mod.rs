mod format;

pub use format::{format_bytes, format_count, format_duration, format_number, format_percent};
