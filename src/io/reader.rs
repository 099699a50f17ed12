//! Synchronous CSV readers for the replay files
//!
//! Provides `read_containers`, which loads the whole containers file and fails
//! on the first bad row, and `OperationReader`, a streaming iterator over the
//! operations file that reports bad rows individually and keeps going.
//!
//! ```no_run
//! use treasury_engine::io::OperationReader;
//! use std::path::Path;
//!
//! let reader = OperationReader::new(Path::new("operations.csv")).unwrap();
//! for row in reader {
//!     match row {
//!         Ok(row) => println!("line {}: {:?}", row.line, row.operation),
//!         Err(e) => eprintln!("Error: {}", e),
//!     }
//! }
//! ```
//!
//! # Error Handling
//!
//! - Fatal errors (file not found, I/O errors) are returned from `new()`
//! - Row errors carry the line number of the offending row

use crate::core::MoneyContainer;
use crate::io::csv_format::{
    convert_container_record, convert_operation_record, ContainerRecord, Operation,
    OperationRecord,
};
use crate::types::EngineError;
use csv::{ReaderBuilder, StringRecord, Trim};
use serde::de::DeserializeOwned;
use std::fs::File;
use std::io::ErrorKind;
use std::path::Path;

/// An operation together with the file line it came from
#[derive(Debug, Clone, PartialEq)]
pub struct OperationRow {
    pub line: u64,
    pub operation: Operation,
}

/// Open a CSV file with the reader settings shared by both replay files
///
/// Whitespace around fields is trimmed and rows may omit trailing columns.
fn open_csv(path: &Path) -> Result<(csv::Reader<File>, StringRecord), EngineError> {
    let file = File::open(path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => EngineError::FileNotFound {
            path: path.display().to_string(),
        },
        _ => EngineError::from(e),
    })?;

    let mut reader = ReaderBuilder::new()
        .trim(Trim::All)
        .flexible(true)
        .buffer_capacity(8 * 1024)
        .from_reader(file);
    let headers = reader.headers()?.clone();

    Ok((reader, headers))
}

/// Attach a line number to a parse error that has none yet
fn at_line(error: EngineError, line: u64) -> EngineError {
    match error {
        EngineError::ParseError { line: None, message } => EngineError::ParseError {
            line: Some(line),
            message,
        },
        other => other,
    }
}

/// Deserialize one row by header name
fn deserialize_row<T: DeserializeOwned>(
    record: &StringRecord,
    headers: &StringRecord,
    line: u64,
) -> Result<T, EngineError> {
    record
        .deserialize(Some(headers))
        .map_err(|e| EngineError::parse_error(Some(line), &e.to_string()))
}

/// Load every container in the containers file
///
/// # Errors
///
/// Returns the first error encountered: a missing or unreadable file, or a
/// row that does not describe a valid container.
pub fn read_containers(path: &Path) -> Result<Vec<Box<dyn MoneyContainer>>, EngineError> {
    let (mut reader, headers) = open_csv(path)?;
    let mut containers = Vec::new();
    let mut record = StringRecord::new();

    while reader.read_record(&mut record)? {
        let line = record.position().map_or(0, |pos| pos.line());
        let row: ContainerRecord = deserialize_row(&record, &headers, line)?;
        let container = convert_container_record(row).map_err(|e| at_line(e, line))?;
        containers.push(container);
    }

    Ok(containers)
}

/// Streaming reader over the operations file
#[derive(Debug)]
pub struct OperationReader {
    reader: csv::Reader<File>,
    headers: StringRecord,
    record: StringRecord,
    finished: bool,
}

impl OperationReader {
    /// Open an operations file
    ///
    /// # Errors
    ///
    /// `FileNotFound` or `IoError` if the file cannot be opened, `ParseError`
    /// if its header row cannot be read.
    pub fn new(path: &Path) -> Result<Self, EngineError> {
        let (reader, headers) = open_csv(path)?;
        Ok(Self {
            reader,
            headers,
            record: StringRecord::new(),
            finished: false,
        })
    }

    fn parse_current(&self) -> Result<OperationRow, EngineError> {
        let line = self.record.position().map_or(0, |pos| pos.line());
        let row: OperationRecord = deserialize_row(&self.record, &self.headers, line)?;
        let operation = convert_operation_record(row).map_err(|e| at_line(e, line))?;
        Ok(OperationRow { line, operation })
    }
}

impl Iterator for OperationReader {
    type Item = Result<OperationRow, EngineError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        match self.reader.read_record(&mut self.record) {
            Ok(true) => Some(self.parse_current()),
            Ok(false) => {
                self.finished = true;
                None
            }
            Err(e) => {
                // The underlying file is unusable; report once and stop
                if e.is_io_error() {
                    self.finished = true;
                }
                Some(Err(e.into()))
            }
        }
    }
}
