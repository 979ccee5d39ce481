//! Aggregates merchant card transaction summaries into one invoice
//! spreadsheet per partner merchant.

pub mod aggregate;
pub mod diagnostics;
pub mod error;
pub mod partner;
pub mod render;
pub mod report;
pub mod scanner;
pub mod table;
pub mod transaction;
pub mod workbook;
