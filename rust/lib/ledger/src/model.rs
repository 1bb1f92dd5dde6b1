//! Ledger table model: columns, rows and cell values.

use std::fmt;

/// Name of the sheet holding the ledger.
pub const SHEET_NAME: &str = "Inward Ledger";

/// File name used when the ledger is downloaded.
pub const EXPORT_FILE_NAME: &str = "Inward_Ledger.xlsx";

pub const SL_NO: &str = "Sl No";
pub const INWARD_DATE: &str = "Inward Date";
pub const INVOICE_DATE: &str = "Invoice / Delivery Date";
pub const TO_WHOM: &str = "To Whom";
pub const DEPARTMENT: &str = "Department";
pub const ITEM_DESCRIPTION: &str = "Item Description";
pub const MAKE: &str = "Make";
pub const OTHER_DESCRIPTION: &str = "Other Description";
pub const IMEI: &str = "IMEI";
pub const COMMENTS: &str = "Comments";

/// Header written when the ledger is created, in column order.
pub const COLUMNS: [&str; 10] = [
    SL_NO,
    INWARD_DATE,
    INVOICE_DATE,
    TO_WHOM,
    DEPARTMENT,
    ITEM_DESCRIPTION,
    MAKE,
    OTHER_DESCRIPTION,
    IMEI,
    COMMENTS,
];

/// A single cell value.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Text(String),
    Number(f64),
    Bool(bool),
}

impl CellValue {
    pub fn empty() -> Self {
        CellValue::Text(String::new())
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            CellValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            CellValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// True for empty text. Such cells are left blank on disk.
    pub fn is_blank(&self) -> bool {
        matches!(self, CellValue::Text(s) if s.is_empty())
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Text(s) => f.write_str(s),
            CellValue::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => {
                write!(f, "{}", *n as i64)
            }
            CellValue::Number(n) => write!(f, "{}", n),
            CellValue::Bool(b) => write!(f, "{}", b),
        }
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::Text(s.to_string())
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        CellValue::Text(s)
    }
}

impl From<f64> for CellValue {
    fn from(n: f64) -> Self {
        CellValue::Number(n)
    }
}

/// One ledger row: column name to value, in insertion order.
///
/// Key order matters. When the table is rewritten, the header is rebuilt
/// from the keys of all rows in first-appearance order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    cells: Vec<(String, CellValue)>,
}

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a cell. Replaces the value in place if the key is already present.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<CellValue>) {
        let key = key.into();
        let value = value.into();
        match self.cells.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.cells.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&CellValue> {
        self.cells.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.cells.iter().map(|(k, _)| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &CellValue)> {
        self.cells.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

/// The ledger table: header columns plus data rows in append order.
#[derive(Debug, Clone, PartialEq)]
pub struct Ledger {
    /// Header as read from (or first written to) storage.
    pub columns: Vec<String>,
    pub rows: Vec<Row>,
}

impl Ledger {
    /// A ledger with the fixed header and no data rows.
    pub fn empty() -> Self {
        Self {
            columns: COLUMNS.iter().map(|c| c.to_string()).collect(),
            rows: Vec::new(),
        }
    }

    pub fn push(&mut self, row: Row) {
        self.rows.push(row);
    }

    /// Number of data rows (the header is not counted).
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Header to write on the next rewrite.
    ///
    /// With rows present this is the union of row keys in first-appearance
    /// order, not `columns`. A row carrying a new key adds a column on disk.
    pub fn header(&self) -> Vec<String> {
        if self.rows.is_empty() {
            return self.columns.clone();
        }
        let mut header: Vec<String> = Vec::new();
        for row in &self.rows {
            for key in row.keys() {
                if !header.iter().any(|h| h == key) {
                    header.push(key.to_string());
                }
            }
        }
        header
    }
}
