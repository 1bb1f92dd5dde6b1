use std::collections::HashMap;
use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use calamine::{Data, Range, Reader, Xlsx};
use tracing::{debug, info};

use crate::error::LedgerError;
use crate::model::{CellValue, Ledger, Row, SHEET_NAME, SL_NO};
use crate::submission::Submission;
use crate::traits::LedgerStore;

/// XlsxStore is a LedgerStore backed by a single xlsx workbook on disk.
///
/// The ledger lives in the `Inward Ledger` sheet: row 1 is the header, every
/// later row is one record. Other sheets in the workbook are carried over
/// (values only) on every rewrite.
///
/// All operations on one store are serialized through an internal mutex, so
/// concurrent appends queue up behind each other instead of overwriting each
/// other's rows. Writers in other processes are not coordinated.
pub struct XlsxStore {
    path: PathBuf,
    lock: Mutex<()>,
}

/// A parsed workbook: sheets in their on-disk order.
struct Workbook {
    sheets: Vec<Sheet>,
}

enum Sheet {
    Ledger(Ledger),
    Other(RawSheet),
}

/// A sheet we do not interpret. Kept as a grid anchored at `origin`.
struct RawSheet {
    name: String,
    origin: (u32, u32),
    cells: Vec<Vec<Option<CellValue>>>,
}

impl XlsxStore {
    /// Create a store for the workbook at `path`. Nothing is touched on disk
    /// until the first operation.
    pub fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
            lock: Mutex::new(()),
        }
    }

    /// Create a store and make sure the workbook exists.
    /// The parent directory is created if it doesn't exist.
    pub fn open(path: &Path) -> Result<Self, LedgerError> {
        let store = Self::new(path);
        store.ensure_initialized()?;
        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn guard(&self) -> MutexGuard<'_, ()> {
        self.lock.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Create the workbook if missing. Caller must hold the lock.
    fn ensure_locked(&self) -> Result<(), LedgerError> {
        let exists = self
            .path
            .try_exists()
            .map_err(|e| LedgerError::Io(e.to_string()))?;
        if exists {
            return Ok(());
        }

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| LedgerError::Io(e.to_string()))?;
            }
        }

        let workbook = Workbook {
            sheets: vec![Sheet::Ledger(Ledger::empty())],
        };
        self.write_workbook(&workbook)?;
        info!(path = %self.path.display(), "created ledger workbook");
        Ok(())
    }

    fn read_workbook(&self) -> Result<Workbook, LedgerError> {
        let bytes = fs::read(&self.path).map_err(|e| LedgerError::Io(e.to_string()))?;
        let mut xlsx: Xlsx<_> =
            Xlsx::new(Cursor::new(bytes)).map_err(|e| LedgerError::Read(e.to_string()))?;

        let mut sheets = Vec::new();
        let mut found = false;
        for name in xlsx.sheet_names() {
            let range = xlsx
                .worksheet_range(&name)
                .map_err(|e| LedgerError::Read(e.to_string()))?;
            if name == SHEET_NAME {
                found = true;
                sheets.push(Sheet::Ledger(parse_ledger(&range)));
            } else {
                sheets.push(Sheet::Other(parse_raw(name, &range)));
            }
        }

        if !found {
            return Err(LedgerError::Read(format!(
                "worksheet {:?} not found",
                SHEET_NAME
            )));
        }
        Ok(Workbook { sheets })
    }

    /// Serialize the workbook and swap it in over the old file.
    ///
    /// The bytes go to a sibling `.tmp` file first, so a failed write leaves
    /// the previous workbook in place.
    fn write_workbook(&self, workbook: &Workbook) -> Result<(), LedgerError> {
        let data = render(workbook)?;
        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, &data).map_err(|e| LedgerError::Io(e.to_string()))?;
        fs::rename(&tmp, &self.path).map_err(|e| LedgerError::Io(e.to_string()))?;
        debug!(path = %self.path.display(), bytes = data.len(), "wrote ledger workbook");
        Ok(())
    }
}

impl LedgerStore for XlsxStore {
    fn ensure_initialized(&self) -> Result<(), LedgerError> {
        let _guard = self.guard();
        self.ensure_locked()
    }

    fn load(&self) -> Result<Ledger, LedgerError> {
        let _guard = self.guard();
        self.ensure_locked()?;
        let workbook = self.read_workbook()?;
        workbook
            .sheets
            .into_iter()
            .find_map(|sheet| match sheet {
                Sheet::Ledger(ledger) => Some(ledger),
                Sheet::Other(_) => None,
            })
            .ok_or_else(|| LedgerError::Read(format!("worksheet {:?} not found", SHEET_NAME)))
    }

    fn append(&self, submission: &Submission) -> Result<Row, LedgerError> {
        let _guard = self.guard();
        self.ensure_locked()?;

        let mut workbook = self.read_workbook()?;
        let ledger = workbook
            .sheets
            .iter_mut()
            .find_map(|sheet| match sheet {
                Sheet::Ledger(ledger) => Some(ledger),
                Sheet::Other(_) => None,
            })
            .ok_or_else(|| LedgerError::Read(format!("worksheet {:?} not found", SHEET_NAME)))?;

        let row = submission.to_row(ledger.len());
        ledger.push(row.clone());
        let count = ledger.len();

        self.write_workbook(&workbook)?;

        let sl_no = row.get(SL_NO).map(|v| v.to_string()).unwrap_or_default();
        info!(sl_no = %sl_no, rows = count, "appended ledger row");
        Ok(row)
    }

    fn export(&self) -> Result<Vec<u8>, LedgerError> {
        let _guard = self.guard();
        self.ensure_locked()?;
        fs::read(&self.path).map_err(|e| LedgerError::Io(e.to_string()))
    }
}

// ── Reading ─────────────────────────────────────────────────────────

fn cell_from_data(data: &Data) -> Option<CellValue> {
    match data {
        Data::Empty => None,
        Data::String(s) => Some(CellValue::Text(s.clone())),
        Data::Float(f) => Some(CellValue::Number(*f)),
        Data::Int(i) => Some(CellValue::Number(*i as f64)),
        Data::Bool(b) => Some(CellValue::Bool(*b)),
        Data::DateTime(dt) => Some(CellValue::Number(dt.as_f64())),
        Data::DateTimeIso(s) | Data::DurationIso(s) => Some(CellValue::Text(s.clone())),
        Data::Error(e) => Some(CellValue::Text(e.to_string())),
    }
}

/// Column names from the header row. Blank headers become `__EMPTY`,
/// repeated names get a `_1`, `_2`, ... suffix. The flag marks columns
/// with a real header.
fn header_names(cells: &[Data]) -> Vec<(String, bool)> {
    let mut seen: HashMap<String, usize> = HashMap::new();
    cells
        .iter()
        .map(|cell| {
            let base = cell_from_data(cell).map(|v| v.to_string()).unwrap_or_default();
            let named = !base.is_empty();
            let base = if named { base } else { "__EMPTY".to_string() };
            let count = seen.entry(base.clone()).or_insert(0);
            let name = if *count == 0 {
                base
            } else {
                format!("{}_{}", base, count)
            };
            *count += 1;
            (name, named)
        })
        .collect()
}

/// Parse the ledger sheet. Row 1 is the header; fully blank rows are
/// skipped. A blank cell under a named column reads as empty text so every
/// row keeps the full header.
fn parse_ledger(range: &Range<Data>) -> Ledger {
    let mut rows = range.rows();
    let Some(header_row) = rows.next() else {
        return Ledger {
            columns: Vec::new(),
            rows: Vec::new(),
        };
    };
    let header = header_names(header_row);

    let mut ledger = Ledger {
        columns: header.iter().map(|(name, _)| name.clone()).collect(),
        rows: Vec::new(),
    };

    for cells in rows {
        if cells.iter().all(|c| matches!(c, Data::Empty)) {
            continue;
        }
        let mut row = Row::new();
        for ((name, named), cell) in header.iter().zip(cells) {
            match cell_from_data(cell) {
                Some(value) => row.set(name.clone(), value),
                None if *named => row.set(name.clone(), CellValue::empty()),
                None => {}
            }
        }
        ledger.push(row);
    }
    ledger
}

fn parse_raw(name: String, range: &Range<Data>) -> RawSheet {
    RawSheet {
        name,
        origin: range.start().unwrap_or((0, 0)),
        cells: range
            .rows()
            .map(|cells| cells.iter().map(cell_from_data).collect())
            .collect(),
    }
}

// ── Writing ─────────────────────────────────────────────────────────

fn render(workbook: &Workbook) -> Result<Vec<u8>, LedgerError> {
    let mut book = rust_xlsxwriter::Workbook::new();
    for sheet in &workbook.sheets {
        let worksheet = book.add_worksheet();
        match sheet {
            Sheet::Ledger(ledger) => {
                worksheet
                    .set_name(SHEET_NAME)
                    .map_err(|e| LedgerError::Write(e.to_string()))?;
                write_ledger(worksheet, ledger)?;
            }
            Sheet::Other(raw) => {
                worksheet
                    .set_name(&raw.name)
                    .map_err(|e| LedgerError::Write(e.to_string()))?;
                write_raw(worksheet, raw)?;
            }
        }
    }
    book.save_to_buffer()
        .map_err(|e| LedgerError::Write(e.to_string()))
}

fn write_ledger(
    worksheet: &mut rust_xlsxwriter::Worksheet,
    ledger: &Ledger,
) -> Result<(), LedgerError> {
    let header = ledger.header();
    for (col, name) in header.iter().enumerate() {
        write_cell(worksheet, 0, col_index(col)?, &CellValue::Text(name.clone()))?;
    }

    for (i, row) in ledger.rows.iter().enumerate() {
        let row_num = row_index(i + 1)?;
        for (key, value) in row.iter() {
            // header() is built from these same keys.
            if let Some(col) = header.iter().position(|h| h == key) {
                write_cell(worksheet, row_num, col_index(col)?, value)?;
            }
        }
    }
    Ok(())
}

fn write_raw(worksheet: &mut rust_xlsxwriter::Worksheet, raw: &RawSheet) -> Result<(), LedgerError> {
    let (row0, col0) = raw.origin;
    for (r, cells) in raw.cells.iter().enumerate() {
        for (c, cell) in cells.iter().enumerate() {
            if let Some(value) = cell {
                let row_num = row0 + row_index(r)?;
                let col = col_index(c + col0 as usize)?;
                write_cell(worksheet, row_num, col, value)?;
            }
        }
    }
    Ok(())
}

fn write_cell(
    worksheet: &mut rust_xlsxwriter::Worksheet,
    row: u32,
    col: u16,
    value: &CellValue,
) -> Result<(), LedgerError> {
    let result = match value {
        CellValue::Text(s) if s.is_empty() => return Ok(()),
        CellValue::Text(s) => worksheet.write_string(row, col, s),
        CellValue::Number(n) => worksheet.write_number(row, col, *n),
        CellValue::Bool(b) => worksheet.write_boolean(row, col, *b),
    };
    result
        .map(|_| ())
        .map_err(|e| LedgerError::Write(e.to_string()))
}

fn row_index(i: usize) -> Result<u32, LedgerError> {
    u32::try_from(i).map_err(|_| LedgerError::Write(format!("row {} out of range", i)))
}

fn col_index(i: usize) -> Result<u16, LedgerError> {
    u16::try_from(i).map_err(|_| LedgerError::Write(format!("column {} out of range", i)))
}
