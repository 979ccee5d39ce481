use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum Error {
    #[error("failed to read workbook, reason: `{0}`")]
    Workbook(String),
    #[error("workbook has no sheet at index {0}")]
    MissingSheet(usize),
    #[error("invalid cell at row {row}, column {col}: {reason}")]
    InvalidCell {
        row: usize,
        col: usize,
        reason: String,
    },
    #[error("cannot parse statement period from `{0}`")]
    InvalidStatementPeriod(String),
    #[error("invalid configuration: {0}")]
    Config(String),
    #[error("i/o failure: {0}")]
    Io(String),
    #[error("failed to write report, reason: `{0}`")]
    Report(String),
}

impl From<std::io::Error> for Error {
    fn from(error: std::io::Error) -> Self {
        Error::Io(error.to_string())
    }
}
