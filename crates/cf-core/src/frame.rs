//! Column-major tabular data with CSV serialization
//!
//! `Frame` is the in-memory representation of one partition's data: a set of
//! equally-long named columns holding loosely-typed values. Types are
//! inferred per cell when reading CSV (int, then float, then text; empty
//! fields are null), which matches how the upstream sources deliver data.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::Path;

use crate::error::{CoreError, CoreResult};

/// A single cell value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Int(i64),
    Float(f64),
    Str(String),
}

impl Value {
    /// Whether this value is null.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Numeric view of the value, if it has one.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Parse a CSV field into a value using int → float → text precedence.
    pub fn infer(field: &str) -> Value {
        if field.is_empty() {
            return Value::Null;
        }
        if let Ok(i) = field.parse::<i64>() {
            return Value::Int(i);
        }
        if let Ok(f) = field.parse::<f64>() {
            return Value::Float(f);
        }
        Value::Str(field.to_string())
    }

    /// Convert a JSON value (as delivered by row sources) into a cell value.
    pub fn from_json(json: &serde_json::Value) -> Value {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Int(i64::from(*b)),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Value::Int(i)
                } else {
                    Value::Float(n.as_f64().unwrap_or(f64::NAN))
                }
            }
            serde_json::Value::String(s) => Value::Str(s.clone()),
            other => Value::Str(other.to_string()),
        }
    }

    /// Render the value as a CSV field.
    ///
    /// Whole-number floats keep a trailing `.0` so the float type survives a
    /// round trip through inference.
    pub fn to_csv_field(&self) -> String {
        match self {
            Value::Null => String::new(),
            Value::Int(i) => i.to_string(),
            Value::Float(f) => {
                if f.is_finite() && f.fract() == 0.0 {
                    format!("{:.1}", f)
                } else {
                    format!("{}", f)
                }
            }
            Value::Str(s) => s.clone(),
        }
    }

    /// Stable string key used for distinct counting and row dedup.
    fn sort_key(&self) -> String {
        match self {
            Value::Null => "\u{0}null".to_string(),
            Value::Int(i) => format!("i:{}", i),
            Value::Float(f) => format!("f:{}", f),
            Value::Str(s) => format!("s:{}", s),
        }
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Int(i) => write!(f, "{}", i),
            Value::Float(x) => write!(f, "{}", x),
            Value::Str(s) => f.write_str(s),
        }
    }
}

/// A named column of values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    pub values: Vec<Value>,
}

impl Column {
    /// Create a column from a name and values.
    pub fn new(name: impl Into<String>, values: Vec<Value>) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the column has no rows.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Number of null cells.
    pub fn null_count(&self) -> usize {
        self.values.iter().filter(|v| v.is_null()).count()
    }

    /// Percentage of null cells, rounded to two decimals.
    pub fn missing_pct(&self) -> f64 {
        if self.values.is_empty() {
            return 0.0;
        }
        let pct = self.null_count() as f64 / self.values.len() as f64 * 100.0;
        (pct * 100.0).round() / 100.0
    }

    /// Number of distinct non-null values.
    pub fn distinct_count(&self) -> usize {
        self.values
            .iter()
            .filter(|v| !v.is_null())
            .map(|v| v.sort_key())
            .collect::<HashSet<_>>()
            .len()
    }

    /// True when every value is distinct and none are null.
    pub fn all_unique(&self) -> bool {
        !self.values.is_empty()
            && self.null_count() == 0
            && self.distinct_count() == self.values.len()
    }

    /// Most frequent non-null value; ties break toward the smaller key so
    /// the result is deterministic. `None` for an empty or all-null column.
    pub fn mode(&self) -> Option<Value> {
        let mut counts: HashMap<String, (usize, &Value)> = HashMap::new();
        for v in self.values.iter().filter(|v| !v.is_null()) {
            let entry = counts.entry(v.sort_key()).or_insert((0, v));
            entry.0 += 1;
        }
        counts
            .into_iter()
            .max_by(|(ka, (ca, _)), (kb, (cb, _))| ca.cmp(cb).then(kb.cmp(ka)))
            .map(|(_, (_, v))| v.clone())
    }

    /// True when every non-null value is numeric and at least one exists.
    pub fn is_numeric(&self) -> bool {
        let mut any = false;
        for v in &self.values {
            match v {
                Value::Null => {}
                Value::Int(_) | Value::Float(_) => any = true,
                Value::Str(_) => return false,
            }
        }
        any
    }

    /// Median of the non-null numeric values.
    pub fn median(&self) -> Option<f64> {
        let mut nums: Vec<f64> = self.values.iter().filter_map(|v| v.as_f64()).collect();
        if nums.is_empty() {
            return None;
        }
        nums.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
        let mid = nums.len() / 2;
        if nums.len() % 2 == 1 {
            Some(nums[mid])
        } else {
            Some((nums[mid - 1] + nums[mid]) / 2.0)
        }
    }

    /// A human-readable type label for reports.
    pub fn type_label(&self) -> &'static str {
        let mut saw_int = false;
        let mut saw_float = false;
        let mut saw_str = false;
        for v in &self.values {
            match v {
                Value::Null => {}
                Value::Int(_) => saw_int = true,
                Value::Float(_) => saw_float = true,
                Value::Str(_) => saw_str = true,
            }
        }
        match (saw_str, saw_float, saw_int) {
            (true, false, false) => "text",
            (false, true, _) => "float",
            (false, false, true) => "integer",
            (false, false, false) => "empty",
            _ => "mixed",
        }
    }
}

/// Column-major tabular data.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Frame {
    columns: Vec<Column>,
}

impl Frame {
    /// Create an empty frame.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a frame with the given (empty) columns.
    pub fn with_columns(names: &[&str]) -> Self {
        Self {
            columns: names.iter().map(|n| Column::new(*n, Vec::new())).collect(),
        }
    }

    /// Number of rows.
    pub fn n_rows(&self) -> usize {
        self.columns.first().map(|c| c.len()).unwrap_or(0)
    }

    /// Number of columns.
    pub fn n_cols(&self) -> usize {
        self.columns.len()
    }

    /// Column names in order.
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    /// All columns in order.
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Look up a column by name.
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Look up a column by name or fail.
    pub fn require_column(&self, name: &str) -> CoreResult<&Column> {
        self.column(name).ok_or_else(|| CoreError::ColumnNotFound {
            name: name.to_string(),
        })
    }

    /// Whether a column exists.
    pub fn has_column(&self, name: &str) -> bool {
        self.column(name).is_some()
    }

    /// Append a row. Fails on arity mismatch.
    pub fn push_row(&mut self, row: Vec<Value>) -> CoreResult<()> {
        if row.len() != self.columns.len() {
            return Err(CoreError::FrameShape {
                message: format!(
                    "row has {} values but frame has {} columns",
                    row.len(),
                    self.columns.len()
                ),
            });
        }
        for (col, value) in self.columns.iter_mut().zip(row) {
            col.values.push(value);
        }
        Ok(())
    }

    /// Add a new column. Fails on duplicate name or length mismatch.
    pub fn add_column(&mut self, name: impl Into<String>, values: Vec<Value>) -> CoreResult<()> {
        let name = name.into();
        if self.has_column(&name) {
            return Err(CoreError::FrameShape {
                message: format!("duplicate column '{}'", name),
            });
        }
        if !self.columns.is_empty() && values.len() != self.n_rows() {
            return Err(CoreError::FrameShape {
                message: format!(
                    "column '{}' has {} values but frame has {} rows",
                    name,
                    values.len(),
                    self.n_rows()
                ),
            });
        }
        self.columns.push(Column::new(name, values));
        Ok(())
    }

    /// Drop columns by name, case-insensitively. Missing names are ignored.
    /// Returns the names actually dropped.
    pub fn drop_columns(&mut self, names: &[String]) -> Vec<String> {
        let targets: HashSet<String> = names.iter().map(|n| n.to_lowercase()).collect();
        let mut dropped = Vec::new();
        self.columns.retain(|c| {
            if targets.contains(&c.name.to_lowercase()) {
                dropped.push(c.name.clone());
                false
            } else {
                true
            }
        });
        dropped
    }

    /// Replace a column's values in place.
    pub fn set_column(&mut self, name: &str, values: Vec<Value>) -> CoreResult<()> {
        if values.len() != self.n_rows() {
            return Err(CoreError::FrameShape {
                message: format!(
                    "replacement for '{}' has {} values but frame has {} rows",
                    name,
                    values.len(),
                    self.n_rows()
                ),
            });
        }
        let col = self
            .columns
            .iter_mut()
            .find(|c| c.name == name)
            .ok_or_else(|| CoreError::ColumnNotFound {
                name: name.to_string(),
            })?;
        col.values = values;
        Ok(())
    }

    /// One row as a vector of value references.
    pub fn row(&self, idx: usize) -> Vec<&Value> {
        self.columns.iter().map(|c| &c.values[idx]).collect()
    }

    /// Drop exact duplicate rows, keeping the first occurrence.
    /// Returns the number of rows removed.
    pub fn dedup_rows(&mut self) -> usize {
        let n = self.n_rows();
        let mut seen: HashSet<String> = HashSet::with_capacity(n);
        let mut keep: Vec<bool> = Vec::with_capacity(n);
        for i in 0..n {
            let key = self
                .columns
                .iter()
                .map(|c| c.values[i].sort_key())
                .collect::<Vec<_>>()
                .join("\u{1f}");
            keep.push(seen.insert(key));
        }
        let removed = keep.iter().filter(|k| !**k).count();
        if removed > 0 {
            for col in &mut self.columns {
                let mut idx = 0;
                col.values.retain(|_| {
                    let k = keep[idx];
                    idx += 1;
                    k
                });
            }
        }
        removed
    }

    // -- CSV ---------------------------------------------------------------

    /// Serialize the frame as CSV with a header row.
    pub fn to_csv_string(&self) -> String {
        let mut out = String::new();
        let header: Vec<String> = self
            .columns
            .iter()
            .map(|c| escape_csv_field(&c.name))
            .collect();
        out.push_str(&header.join(","));
        out.push('\n');
        for i in 0..self.n_rows() {
            let row: Vec<String> = self
                .columns
                .iter()
                .map(|c| escape_csv_field(&c.values[i].to_csv_field()))
                .collect();
            out.push_str(&row.join(","));
            out.push('\n');
        }
        out
    }

    /// Write the frame as CSV to a file.
    pub fn write_csv(&self, path: &Path) -> CoreResult<()> {
        std::fs::write(path, self.to_csv_string()).map_err(|e| CoreError::IoWithPath {
            path: path.display().to_string(),
            source: e,
        })
    }

    /// Read a CSV file into a frame, inferring cell types.
    pub fn read_csv(path: &Path) -> CoreResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| CoreError::IoWithPath {
            path: path.display().to_string(),
            source: e,
        })?;
        Self::parse_csv(&content, &path.display().to_string())
    }

    /// Parse CSV content into a frame.
    pub fn parse_csv(content: &str, origin: &str) -> CoreResult<Self> {
        let mut lines = content.lines();
        let header_line = lines.next().ok_or_else(|| CoreError::CsvParse {
            path: origin.to_string(),
            message: "empty file".to_string(),
        })?;
        let header = split_csv_record(header_line);
        let mut frame = Frame {
            columns: header.into_iter().map(|n| Column::new(n, Vec::new())).collect(),
        };
        for (lineno, line) in lines.enumerate() {
            if line.is_empty() {
                continue;
            }
            let fields = split_csv_record(line);
            if fields.len() != frame.n_cols() {
                return Err(CoreError::CsvParse {
                    path: origin.to_string(),
                    message: format!(
                        "line {} has {} fields, expected {}",
                        lineno + 2,
                        fields.len(),
                        frame.n_cols()
                    ),
                });
            }
            let row: Vec<Value> = fields.iter().map(|f| Value::infer(f)).collect();
            // push_row cannot fail here: arity was checked above
            let _ = frame.push_row(row);
        }
        Ok(frame)
    }
}

/// Quote a CSV field when it contains a delimiter, quote, or newline.
fn escape_csv_field(field: &str) -> String {
    if field.contains(',') || field.contains('"') || field.contains('\n') {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

/// Split one CSV record, honoring double-quoted fields.
fn split_csv_record(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();
    while let Some(ch) = chars.next() {
        match ch {
            '"' if in_quotes => {
                if chars.peek() == Some(&'"') {
                    chars.next();
                    current.push('"');
                } else {
                    in_quotes = false;
                }
            }
            '"' => in_quotes = true,
            ',' if !in_quotes => {
                fields.push(std::mem::take(&mut current));
            }
            _ => current.push(ch),
        }
    }
    fields.push(current);
    fields
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_frame() -> Frame {
        let mut frame = Frame::with_columns(&["id", "score", "label"]);
        frame
            .push_row(vec![
                Value::Int(1),
                Value::Float(0.5),
                Value::Str("a".into()),
            ])
            .unwrap();
        frame
            .push_row(vec![Value::Int(2), Value::Null, Value::Str("b".into())])
            .unwrap();
        frame
            .push_row(vec![
                Value::Int(3),
                Value::Float(1.5),
                Value::Str("a".into()),
            ])
            .unwrap();
        frame
    }

    #[test]
    fn test_infer_types() {
        assert_eq!(Value::infer(""), Value::Null);
        assert_eq!(Value::infer("42"), Value::Int(42));
        assert_eq!(Value::infer("-7"), Value::Int(-7));
        assert_eq!(Value::infer("3.25"), Value::Float(3.25));
        assert_eq!(Value::infer("hello"), Value::Str("hello".into()));
    }

    #[test]
    fn test_csv_round_trip_preserves_types() {
        let frame = sample_frame();
        let csv = frame.to_csv_string();
        let parsed = Frame::parse_csv(&csv, "test").unwrap();
        assert_eq!(parsed, frame);
    }

    #[test]
    fn test_whole_float_survives_round_trip() {
        let mut frame = Frame::with_columns(&["x"]);
        frame.push_row(vec![Value::Float(2.0)]).unwrap();
        let parsed = Frame::parse_csv(&frame.to_csv_string(), "test").unwrap();
        assert_eq!(parsed.column("x").unwrap().values[0], Value::Float(2.0));
    }

    #[test]
    fn test_quoted_fields() {
        let csv = "name,note\nalice,\"hello, world\"\nbob,\"say \"\"hi\"\"\"\n";
        let frame = Frame::parse_csv(csv, "test").unwrap();
        assert_eq!(
            frame.column("note").unwrap().values[0],
            Value::Str("hello, world".into())
        );
        assert_eq!(
            frame.column("note").unwrap().values[1],
            Value::Str("say \"hi\"".into())
        );
    }

    #[test]
    fn test_ragged_row_rejected() {
        let csv = "a,b\n1,2\n3\n";
        assert!(Frame::parse_csv(csv, "test").is_err());
    }

    #[test]
    fn test_missing_pct_rounds_two_decimals() {
        let col = Column::new(
            "x",
            vec![Value::Null, Value::Int(1), Value::Int(2)],
        );
        assert_eq!(col.missing_pct(), 33.33);
    }

    #[test]
    fn test_distinct_and_unique() {
        let frame = sample_frame();
        assert_eq!(frame.column("id").unwrap().distinct_count(), 3);
        assert!(frame.column("id").unwrap().all_unique());
        assert!(!frame.column("label").unwrap().all_unique());
        // null makes a column non-unique even if non-nulls are distinct
        assert!(!frame.column("score").unwrap().all_unique());
    }

    #[test]
    fn test_mode() {
        let frame = sample_frame();
        assert_eq!(
            frame.column("label").unwrap().mode(),
            Some(Value::Str("a".into()))
        );
        let empty = Column::new("e", vec![Value::Null, Value::Null]);
        assert_eq!(empty.mode(), None);
    }

    #[test]
    fn test_median() {
        let odd = Column::new("x", vec![Value::Int(3), Value::Int(1), Value::Int(2)]);
        assert_eq!(odd.median(), Some(2.0));
        let even = Column::new(
            "x",
            vec![Value::Int(1), Value::Int(2), Value::Int(3), Value::Int(4)],
        );
        assert_eq!(even.median(), Some(2.5));
    }

    #[test]
    fn test_dedup_rows() {
        let mut frame = Frame::with_columns(&["a", "b"]);
        frame.push_row(vec![Value::Int(1), Value::Int(2)]).unwrap();
        frame.push_row(vec![Value::Int(1), Value::Int(2)]).unwrap();
        frame.push_row(vec![Value::Int(1), Value::Int(3)]).unwrap();
        let removed = frame.dedup_rows();
        assert_eq!(removed, 1);
        assert_eq!(frame.n_rows(), 2);
    }

    #[test]
    fn test_dedup_no_change_when_no_duplicates() {
        let mut frame = sample_frame();
        assert_eq!(frame.dedup_rows(), 0);
        assert_eq!(frame.n_rows(), 3);
    }

    #[test]
    fn test_drop_columns_tolerant() {
        let mut frame = sample_frame();
        let dropped = frame.drop_columns(&["Label".to_string(), "missing".to_string()]);
        assert_eq!(dropped, vec!["label".to_string()]);
        assert_eq!(frame.n_cols(), 2);
    }

    #[test]
    fn test_add_column_length_checked() {
        let mut frame = sample_frame();
        assert!(frame.add_column("extra", vec![Value::Int(1)]).is_err());
        assert!(frame
            .add_column("extra", vec![Value::Int(1), Value::Int(2), Value::Int(3)])
            .is_ok());
        assert!(frame
            .add_column("extra", vec![Value::Int(1), Value::Int(2), Value::Int(3)])
            .is_err());
    }

    #[test]
    fn test_type_label() {
        let frame = sample_frame();
        assert_eq!(frame.column("id").unwrap().type_label(), "integer");
        assert_eq!(frame.column("score").unwrap().type_label(), "float");
        assert_eq!(frame.column("label").unwrap().type_label(), "text");
    }
}
