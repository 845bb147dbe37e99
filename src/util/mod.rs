pub mod random;
pub mod time_format;
