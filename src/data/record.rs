//! Record model fed into the graph builder: typed, timestamped log messages,
//! the variable table of latest messages, and record sources.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::fs::File;
use std::io::{BufRead, BufReader, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::error::{GraphError, Result};

/// A single attribute value carried by a record, or produced by an expression.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Number(f64),
    Text(String),
    Bool(bool),
    Array(Vec<Value>),
}

impl Value {
    /// Numeric view of the value; booleans count as 0/1, text and arrays have none.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(v) => Some(*v),
            Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            Value::Text(_) | Value::Array(_) => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn is_text(&self) -> bool {
        matches!(self, Value::Text(_))
    }

    /// Truthiness used by conditions and logical operators.
    pub fn truthy(&self) -> bool {
        match self {
            Value::Number(v) => *v != 0.0 && !v.is_nan(),
            Value::Bool(b) => *b,
            Value::Text(s) => !s.is_empty(),
            Value::Array(a) => !a.is_empty(),
        }
    }

    /// Key used for instance lookups: integral numbers render without a
    /// fractional part so `GPS[0]` and an instance value of `0.0` agree.
    pub fn key_string(&self) -> String {
        match self {
            Value::Number(v) if v.fract() == 0.0 && v.abs() < 1e15 => format!("{}", *v as i64),
            Value::Number(v) => format!("{v}"),
            Value::Text(s) => s.clone(),
            Value::Bool(b) => if *b { "1".into() } else { "0".into() },
            Value::Array(_) => self.to_string(),
        }
    }

    /// Convert a JSON value; `null` and objects have no record representation.
    pub fn from_json(v: &serde_json::Value) -> Option<Value> {
        match v {
            serde_json::Value::Number(n) => n.as_f64().map(Value::Number),
            serde_json::Value::String(s) => Some(Value::Text(s.clone())),
            serde_json::Value::Bool(b) => Some(Value::Bool(*b)),
            serde_json::Value::Array(items) => {
                Some(Value::Array(items.iter().filter_map(Value::from_json).collect()))
            }
            serde_json::Value::Null | serde_json::Value::Object(_) => None,
        }
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Number(v) => write!(f, "{v}"),
            Value::Text(s) => write!(f, "{s}"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Array(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
        }
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Number(v)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

/// One timestamped log message.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub msg_type: String,
    /// Seconds since the UNIX epoch.
    pub timestamp: f64,
    pub fields: BTreeMap<String, Value>,
    /// Name of the attribute that distinguishes multiple instances of this type.
    pub instance_field: Option<String>,
}

impl Record {
    pub fn new<S: Into<String>>(msg_type: S, timestamp: f64) -> Self {
        Self {
            msg_type: msg_type.into(),
            timestamp,
            fields: BTreeMap::new(),
            instance_field: None,
        }
    }

    /// Builder-style attribute setter.
    pub fn with<S: Into<String>, V: Into<Value>>(mut self, name: S, value: V) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    pub fn with_instance_field<S: Into<String>>(mut self, name: S) -> Self {
        self.instance_field = Some(name.into());
        self
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// Value of the declared instance attribute, if both exist.
    pub fn instance_value(&self) -> Option<&Value> {
        self.instance_field.as_deref().and_then(|f| self.fields.get(f))
    }
}

/// Latest message for a type, or per-instance latest messages.
#[derive(Debug, Clone, PartialEq)]
pub enum VarEntry {
    Latest(Record),
    Instances(BTreeMap<String, Record>),
}

/// Variable table: message type name to the most recent message of that type.
///
/// Mutated on every record received and never rolled back, so expressions can
/// always reference the current value of any other message type.
#[derive(Debug, Clone, Default)]
pub struct VarTable {
    entries: HashMap<String, VarEntry>,
}

impl VarTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `record` as the latest of its type, unless that type already holds
    /// per-instance entries (those are only updated via [`insert_instance`](Self::insert_instance)).
    pub fn insert_latest(&mut self, record: &Record) {
        match self.entries.get(&record.msg_type) {
            Some(VarEntry::Instances(_)) => {}
            _ => {
                self.entries
                    .insert(record.msg_type.clone(), VarEntry::Latest(record.clone()));
            }
        }
    }

    /// Store `record` under `(msg_type, key)`, converting a plain entry into an instance map.
    pub fn insert_instance(&mut self, key: String, record: &Record) {
        let entry = self
            .entries
            .entry(record.msg_type.clone())
            .or_insert_with(|| VarEntry::Instances(BTreeMap::new()));
        if let VarEntry::Latest(_) = entry {
            *entry = VarEntry::Instances(BTreeMap::new());
        }
        if let VarEntry::Instances(map) = entry {
            map.insert(key, record.clone());
        }
    }

    pub fn get(&self, name: &str) -> Option<&VarEntry> {
        self.entries.get(name)
    }

    /// Latest plain (non-instanced) record of a type.
    pub fn latest(&self, name: &str) -> Option<&Record> {
        match self.entries.get(name) {
            Some(VarEntry::Latest(r)) => Some(r),
            _ => None,
        }
    }
}

/// A stream of records, typically one log file.
pub trait RecordSource {
    /// Display name (usually the file path).
    fn name(&self) -> &str;

    /// Next record whose type is in `types`; an empty set matches every type.
    /// Returns `None` at end of stream.
    fn next_record(&mut self, types: &HashSet<String>) -> Option<Record>;

    /// Restart the stream from the first record.
    fn rewind(&mut self) -> Result<()>;
}

fn type_matches(types: &HashSet<String>, msg_type: &str) -> bool {
    types.is_empty() || types.contains(msg_type)
}

/// In-memory record source.
#[derive(Debug, Clone, Default)]
pub struct VecSource {
    name: String,
    records: Vec<Record>,
    pos: usize,
}

impl VecSource {
    pub fn new<S: Into<String>>(name: S, records: Vec<Record>) -> Self {
        Self {
            name: name.into(),
            records,
            pos: 0,
        }
    }
}

impl RecordSource for VecSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn next_record(&mut self, types: &HashSet<String>) -> Option<Record> {
        while let Some(r) = self.records.get(self.pos) {
            self.pos += 1;
            if type_matches(types, &r.msg_type) {
                return Some(r.clone());
            }
        }
        None
    }

    fn rewind(&mut self) -> Result<()> {
        self.pos = 0;
        Ok(())
    }
}

/// JSON-lines log reader.
///
/// Each line is an object with a `"type"` string, a `"t"` timestamp in seconds
/// and any number of attributes. A line of the form
/// `{"fmt": "GPS", "instance_field": "I"}` declares the instance attribute for
/// a type once, like a format descriptor; a record may also carry its own
/// `"instance_field"`. Malformed lines are skipped with a warning.
pub struct JsonlLog {
    path: PathBuf,
    name: String,
    reader: BufReader<File>,
    line_no: usize,
    instance_fields: HashMap<String, String>,
}

impl JsonlLog {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = File::open(&path)?;
        log::info!("opened log {}", path.display());
        Ok(Self {
            name: path.display().to_string(),
            path,
            reader: BufReader::new(file),
            line_no: 0,
            instance_fields: HashMap::new(),
        })
    }

    /// Parse one line. `Ok(None)` for blank lines and format declarations.
    fn parse_line(&mut self, line: &str) -> Result<Option<Record>> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(None);
        }
        let (path, line_no) = (self.path.clone(), self.line_no);
        let err = |msg: String| GraphError::LogParse {
            path: path.clone(),
            line: line_no,
            msg,
        };
        let json: serde_json::Value =
            serde_json::from_str(line).map_err(|e| err(e.to_string()))?;
        let obj = json
            .as_object()
            .ok_or_else(|| err("expected a JSON object".into()))?;

        if let Some(fmt) = obj.get("fmt").and_then(|v| v.as_str()) {
            if let Some(field) = obj.get("instance_field").and_then(|v| v.as_str()) {
                self.instance_fields.insert(fmt.to_string(), field.to_string());
            }
            return Ok(None);
        }

        let msg_type = obj
            .get("type")
            .and_then(|v| v.as_str())
            .ok_or_else(|| err("missing \"type\"".into()))?;
        let timestamp = obj
            .get("t")
            .or_else(|| obj.get("timestamp"))
            .and_then(|v| v.as_f64())
            .ok_or_else(|| err("missing numeric \"t\"".into()))?;

        let mut record = Record::new(msg_type, timestamp);
        for (k, v) in obj {
            if matches!(k.as_str(), "type" | "t" | "timestamp" | "instance_field") {
                continue;
            }
            if let Some(value) = Value::from_json(v) {
                record.fields.insert(k.clone(), value);
            }
        }
        record.instance_field = obj
            .get("instance_field")
            .and_then(|v| v.as_str())
            .map(str::to_string)
            .or_else(|| self.instance_fields.get(msg_type).cloned());
        Ok(Some(record))
    }
}

impl RecordSource for JsonlLog {
    fn name(&self) -> &str {
        &self.name
    }

    fn next_record(&mut self, types: &HashSet<String>) -> Option<Record> {
        let mut line = String::new();
        loop {
            line.clear();
            match self.reader.read_line(&mut line) {
                Ok(0) => return None,
                Ok(_) => {}
                Err(e) => {
                    log::warn!("{}: read failed: {e}", self.name);
                    return None;
                }
            }
            self.line_no += 1;
            match self.parse_line(&line) {
                Ok(Some(r)) if type_matches(types, &r.msg_type) => return Some(r),
                Ok(_) => {}
                Err(e) => log::warn!("{e}"),
            }
        }
    }

    fn rewind(&mut self) -> Result<()> {
        self.reader.seek(SeekFrom::Start(0))?;
        self.line_no = 0;
        Ok(())
    }
}

/// Source adapter that rebases timestamps so the first record is at `t = 0`.
pub struct ZeroTimeBase<S> {
    inner: S,
    base: Option<f64>,
}

impl<S: RecordSource> ZeroTimeBase<S> {
    pub fn new(inner: S) -> Self {
        Self { inner, base: None }
    }
}

impl<S: RecordSource> RecordSource for ZeroTimeBase<S> {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn next_record(&mut self, types: &HashSet<String>) -> Option<Record> {
        let mut r = self.inner.next_record(types)?;
        let base = *self.base.get_or_insert(r.timestamp);
        r.timestamp -= base;
        Some(r)
    }

    fn rewind(&mut self) -> Result<()> {
        // keep the base so later passes line up with the first
        self.inner.rewind()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_string_drops_integral_fraction() {
        assert_eq!(Value::Number(1.0).key_string(), "1");
        assert_eq!(Value::Number(1.5).key_string(), "1.5");
        assert_eq!(Value::from("A").key_string(), "A");
    }

    #[test]
    fn instance_entry_replaces_latest() {
        let mut vars = VarTable::new();
        let r = Record::new("GPS", 1.0).with("I", 0.0).with_instance_field("I");
        vars.insert_latest(&r);
        assert!(vars.latest("GPS").is_some());
        vars.insert_instance("0".into(), &r);
        assert!(vars.latest("GPS").is_none());
        // Plain inserts no longer clobber the instance map.
        vars.insert_latest(&r);
        assert!(matches!(vars.get("GPS"), Some(VarEntry::Instances(_))));
    }

    #[test]
    fn vec_source_filters_types() {
        let mut src = VecSource::new(
            "mem",
            vec![Record::new("A", 0.0), Record::new("B", 1.0), Record::new("A", 2.0)],
        );
        let types: HashSet<String> = ["A".to_string()].into_iter().collect();
        assert_eq!(src.next_record(&types).map(|r| r.timestamp), Some(0.0));
        assert_eq!(src.next_record(&types).map(|r| r.timestamp), Some(2.0));
        assert!(src.next_record(&types).is_none());
        src.rewind().unwrap();
        assert_eq!(src.next_record(&HashSet::new()).map(|r| r.msg_type), Some("A".into()));
    }
}
