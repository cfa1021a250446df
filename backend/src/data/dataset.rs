use json::JsonValue;

use super::path::Path;
use crate::error::DatasetError;

/// Where an object is being evaluated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Context {
    /// Outside any record collection.
    Constant,
    /// For record `i` of the collection the evaluating object iterates.
    Record(usize),
}

impl Context {
    pub fn record(&self) -> Option<usize> {
        match self {
            Context::Record(i) => Some(*i),
            Context::Constant => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    Number(f64),
    Text(String),
    Bool(bool),
}

impl Scalar {
    /// Numeric value, rejecting NaN and infinities.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Scalar::Number(n) if n.is_finite() => Some(*n),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Number,
    Text,
    Bool,
    Collection,
    Object,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Schema {
    pub kind: FieldKind,
}

impl Schema {
    pub fn is_numeric(&self) -> bool {
        self.kind == FieldKind::Number
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Statistics {
    pub min: f64,
    pub max: f64,
    pub range: f64,
}

/// Read access to the loaded data.
pub trait Dataset {
    /// Scalar at `path` for the record selected by `ctx`, `None` when missing.
    fn resolve(&self, path: &Path, ctx: Context) -> Option<Scalar>;

    fn schema(&self, path: &Path) -> Option<Schema>;

    /// Number of records a multi-record object bound to `path` iterates.
    fn record_count(&self, path: &Path) -> usize;

    /// Every path whose value is numeric, in document order.
    fn numeric_fields(&self) -> Vec<Path>;

    /// Min, max and range over the numeric records of `path`. Non-numeric records are ignored.
    fn basic_statistics(&self, path: &Path) -> Option<Statistics> {
        let (min, max) = (0..self.record_count(path))
            .filter_map(|i| self.resolve(path, Context::Record(i))?.as_number())
            .fold(None, |acc: Option<(f64, f64)>, v| match acc {
                Some((min, max)) => Some((min.min(v), max.max(v))),
                None => Some((v, v)),
            })?;

        Some(Statistics { min, max, range: max - min })
    }
}

/// Dataset backed by a parsed JSON document.
///
/// Paths address object members. The first array met while walking a path is
/// the record collection, indexed by the evaluation context.
pub struct JsonDataset {
    root: JsonValue,
}

impl JsonDataset {
    pub fn new(root: JsonValue) -> Self {
        Self { root }
    }

    pub fn from_str(source: &str) -> Result<Self, DatasetError> {
        Ok(Self::new(json::parse(source)?))
    }

    pub fn from_file<P: AsRef<std::path::Path>>(file: P) -> Result<Self, DatasetError> {
        let source = std::fs::read_to_string(file.as_ref())?;
        let dataset = Self::from_str(&source)?;
        log::info!("loaded dataset `{}`", file.as_ref().display());
        Ok(dataset)
    }

    fn lookup(&self, path: &Path, ctx: Context) -> Option<&JsonValue> {
        let mut record = ctx.record();
        let mut node = &self.root;

        for segment in path.segments() {
            if node.is_array() {
                node = &node[record.take()?];
            }
            if !node.is_object() {
                return None;
            }
            node = &node[segment.as_str()];
        }
        if node.is_array() {
            if let Some(i) = record {
                node = &node[i];
            }
        }

        (!node.is_null()).then_some(node)
    }

    fn collect_numeric(node: &JsonValue, path: Path, out: &mut Vec<Path>) {
        match node {
            JsonValue::Number(_) if !path.is_root() => out.push(path),
            JsonValue::Object(_) => node
                .entries()
                .for_each(|(key, child)| Self::collect_numeric(child, path.join(key), out)),
            JsonValue::Array(items) => {
                if let Some(first) = items.first() {
                    Self::collect_numeric(first, path, out);
                }
            }
            _ => {}
        }
    }
}

impl Dataset for JsonDataset {
    fn resolve(&self, path: &Path, ctx: Context) -> Option<Scalar> {
        let node = self.lookup(path, ctx)?;

        if let Some(n) = node.as_f64() {
            Some(Scalar::Number(n))
        } else if let Some(b) = node.as_bool() {
            Some(Scalar::Bool(b))
        } else {
            node.as_str().map(|s| Scalar::Text(s.to_string()))
        }
    }

    fn schema(&self, path: &Path) -> Option<Schema> {
        let mut node = &self.root;

        for segment in path.segments() {
            if node.is_array() {
                node = node.members().next()?;
            }
            node = &node[segment.as_str()];
        }

        let kind = match node {
            JsonValue::Number(_) => FieldKind::Number,
            JsonValue::Short(_) | JsonValue::String(_) => FieldKind::Text,
            JsonValue::Boolean(_) => FieldKind::Bool,
            JsonValue::Array(_) => FieldKind::Collection,
            JsonValue::Object(_) => FieldKind::Object,
            JsonValue::Null => return None,
        };
        Some(Schema { kind })
    }

    fn record_count(&self, path: &Path) -> usize {
        let mut node = &self.root;

        for segment in path.segments() {
            if node.is_array() {
                return node.len();
            }
            node = &node[segment.as_str()];
            if node.is_null() {
                return 0;
            }
        }

        if node.is_array() { node.len() } else { 1 }
    }

    fn numeric_fields(&self) -> Vec<Path> {
        let mut out = Vec::new();
        Self::collect_numeric(&self.root, Path::root(), &mut out);
        out
    }
}
