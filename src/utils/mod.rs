pub mod csv_line;
pub mod time;
