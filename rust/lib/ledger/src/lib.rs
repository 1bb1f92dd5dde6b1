pub mod error;
pub mod model;
pub mod submission;
pub mod traits;
pub mod xlsx;

pub use error::LedgerError;
pub use model::{CellValue, Ledger, Row, COLUMNS, EXPORT_FILE_NAME, SHEET_NAME};
pub use submission::Submission;
pub use traits::LedgerStore;
pub use xlsx::XlsxStore;
