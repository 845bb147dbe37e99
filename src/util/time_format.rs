use chrono::DateTime;

/// Renders milliseconds since the Unix epoch as UTC wall clock time in the format
///  `DD MM YYYY HH:MM:SS`, dropping sub-second precision. Returns `None` for values outside
///  the representable range.
pub fn format_unix_millis(unix_millis: i64) -> Option<String> {
    DateTime::from_timestamp_millis(unix_millis)
        .map(|t| t.format("%d %m %Y %H:%M:%S").to_string())
}
