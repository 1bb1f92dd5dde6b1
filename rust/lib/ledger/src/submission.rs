//! Form submission and its mapping onto one ledger row.

use serde::Deserialize;
use serde_json::Value;

use crate::model::*;

/// One inbound form submission.
///
/// Every field is optional and kept as raw JSON: the row mapping decides how
/// each shape is coerced instead of rejecting it.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Submission {
    #[serde(default)]
    pub sl_no: Option<Value>,
    #[serde(default)]
    pub inward_date: Option<Value>,
    #[serde(default)]
    pub invoice_date: Option<Value>,
    #[serde(default)]
    pub person_name: Option<Value>,
    #[serde(default)]
    pub department: Option<Value>,
    #[serde(default)]
    pub item: Option<Value>,
    #[serde(default)]
    pub make: Option<Value>,
    #[serde(default)]
    pub other_desc: Option<Value>,
    #[serde(default)]
    pub imei: Option<Value>,
    #[serde(default)]
    pub comments: Option<Value>,
}

impl Submission {
    /// Build the row for this submission given the current data row count.
    ///
    /// `Sl No` falls back to `existing_rows + 1`. The number is derived from
    /// the row count, so it can repeat or skip if rows are edited elsewhere.
    pub fn to_row(&self, existing_rows: usize) -> Row {
        let mut row = Row::new();
        row.set(
            SL_NO,
            scalar(self.sl_no.as_ref())
                .unwrap_or(CellValue::Number((existing_rows + 1) as f64)),
        );
        row.set(INWARD_DATE, text_or_empty(self.inward_date.as_ref()));
        row.set(INVOICE_DATE, text_or_empty(self.invoice_date.as_ref()));
        row.set(TO_WHOM, text_or_empty(self.person_name.as_ref()));
        row.set(DEPARTMENT, text_or_empty(self.department.as_ref()));
        row.set(ITEM_DESCRIPTION, join_list(self.item.as_ref()));
        row.set(MAKE, join_list(self.make.as_ref()));
        row.set(OTHER_DESCRIPTION, text_or_empty(self.other_desc.as_ref()));
        row.set(IMEI, text_or_empty(self.imei.as_ref()));
        row.set(COMMENTS, text_or_empty(self.comments.as_ref()));
        row
    }
}

/// `null`, `false`, `0` and `""` count as absent.
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Cell for a scalar field, or `None` when the field is absent or falsy.
fn scalar(value: Option<&Value>) -> Option<CellValue> {
    let value = value.filter(|v| is_truthy(v))?;
    Some(match value {
        Value::String(s) => CellValue::Text(s.clone()),
        Value::Number(n) => CellValue::Number(n.as_f64().unwrap_or_default()),
        Value::Bool(b) => CellValue::Bool(*b),
        other => CellValue::Text(other.to_string()),
    })
}

fn text_or_empty(value: Option<&Value>) -> CellValue {
    scalar(value).unwrap_or_else(CellValue::empty)
}

/// Join an array field with ", ". Anything that is not an array, a single
/// string included, yields empty text.
fn join_list(value: Option<&Value>) -> CellValue {
    match value {
        Some(Value::Array(items)) => CellValue::Text(
            items
                .iter()
                .map(element_text)
                .collect::<Vec<_>>()
                .join(", "),
        ),
        _ => CellValue::empty(),
    }
}

fn element_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => match n.as_f64() {
            Some(f) => number_text(f),
            None => n.to_string(),
        },
        Value::Array(items) => items.iter().map(element_text).collect::<Vec<_>>().join(","),
        Value::Object(_) => "[object Object]".to_string(),
    }
}

/// Shortest decimal form of a number, as `Array.join` prints it: no `.0`
/// on whole numbers, exponent notation below 1e-6 and from 1e21 up.
fn number_text(f: f64) -> String {
    let abs = f.abs();
    if abs != 0.0 && (abs < 1e-6 || abs >= 1e21) {
        let s = format!("{:e}", f);
        match s.split_once('e') {
            Some((mantissa, exp)) if !exp.starts_with('-') => format!("{}e+{}", mantissa, exp),
            _ => s,
        }
    } else if f == 0.0 {
        "0".to_string()
    } else {
        format!("{}", f)
    }
}
