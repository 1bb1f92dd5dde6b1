use thiserror::Error;

#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("I/O error: {0}")]
    Io(String),

    #[error("cannot read workbook: {0}")]
    Read(String),

    #[error("cannot write workbook: {0}")]
    Write(String),
}
