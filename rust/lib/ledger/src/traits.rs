use crate::error::LedgerError;
use crate::model::{Ledger, Row};
use crate::submission::Submission;

/// LedgerStore is the file-backed table behind the inward ledger.
///
/// Every operation goes back to durable storage: there is no row cache, so
/// the backing file is the only source of truth. The default implementation
/// (`XlsxStore`) keeps the table in a single xlsx workbook.
pub trait LedgerStore: Send + Sync {
    /// Create the table with only the fixed header if it does not exist yet.
    /// No-op when the table already exists.
    fn ensure_initialized(&self) -> Result<(), LedgerError>;

    /// Read the full table.
    fn load(&self) -> Result<Ledger, LedgerError>;

    /// Map a submission to one row, append it, and rewrite the table.
    /// Returns the row as written.
    fn append(&self, submission: &Submission) -> Result<Row, LedgerError>;

    /// Return the raw bytes of the persisted table.
    fn export(&self) -> Result<Vec<u8>, LedgerError>;
}
