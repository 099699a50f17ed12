//! I/O module
//!
//! Handles CSV parsing and output for the replay shell.
//!
//! # Components
//!
//! - `csv_format` - CSV format handling (record conversion, output serialization)
//! - `reader` - Container loader and streaming operation reader

pub mod csv_format;
pub mod reader;

pub use csv_format::{
    convert_container_record, convert_operation_record, write_balances_csv,
    write_reconciliations_csv, write_transfers_csv, ContainerRecord, Operation, OperationRecord,
};
pub use reader::{read_containers, OperationReader, OperationRow};
