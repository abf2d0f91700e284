//! Table input and output.

pub mod csv;

pub use self::csv::{read_table, read_table_path, write_table, write_table_path, CsvError, TableLayout};
