//! Core in-memory table types.
//!
//! Raw input files are loaded into an all-text [`DataSet`]; the transformer and the batch
//! aggregator produce typed long-format [`DataSet`]s described by a [`Schema`].

/// Logical data type for a schema field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataType {
    /// 64-bit signed integer.
    Int64,
    /// 64-bit floating point number.
    Float64,
    /// Boolean.
    Bool,
    /// UTF-8 string.
    Utf8,
}

/// A single named, typed field in a [`Schema`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    /// Field/column name.
    pub name: String,
    /// Field data type.
    pub data_type: DataType,
}

impl Field {
    /// Create a new field.
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            data_type,
        }
    }
}

/// An ordered list of fields describing the shape of a table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Schema {
    /// Ordered list of fields.
    pub fields: Vec<Field>,
}

impl Schema {
    /// Create a new schema from fields.
    pub fn new(fields: Vec<Field>) -> Self {
        Self { fields }
    }

    /// Iterate field names in order.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.name.as_str())
    }

    /// Returns the index of a field by name, if present.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name)
    }

    /// Returns the field with `name`, if present.
    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }
}

/// A single typed value in a [`DataSet`].
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Missing/empty value.
    Null,
    /// 64-bit signed integer.
    Int64(i64),
    /// 64-bit float.
    Float64(f64),
    /// Boolean.
    Bool(bool),
    /// UTF-8 string.
    Utf8(String),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Borrow the string payload of a [`Value::Utf8`].
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Utf8(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Numeric view of the value; integers widen to `f64`.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Int64(v) => Some(*v as f64),
            Self::Float64(v) => Some(*v),
            _ => None,
        }
    }

    /// Wrap an optional float, mapping `None` to [`Value::Null`].
    pub fn from_f64(v: Option<f64>) -> Self {
        v.map(Self::Float64).unwrap_or(Self::Null)
    }

    /// Wrap an optional string, mapping `None` to [`Value::Null`].
    pub fn from_string(v: Option<String>) -> Self {
        v.map(Self::Utf8).unwrap_or(Self::Null)
    }
}

/// In-memory tabular dataset.
///
/// Rows are stored as `Vec<Vec<Value>>` in the same order as the [`Schema`] fields.
#[derive(Debug, Clone, PartialEq)]
pub struct DataSet {
    /// Schema describing row shape.
    pub schema: Schema,
    /// Row-major value storage.
    pub rows: Vec<Vec<Value>>,
}

impl DataSet {
    /// Create a dataset from schema and rows.
    pub fn new(schema: Schema, rows: Vec<Vec<Value>>) -> Self {
        Self { schema, rows }
    }

    /// Create a dataset with no fields and no rows.
    pub fn empty() -> Self {
        Self::new(Schema::default(), Vec::new())
    }

    /// Number of rows in the dataset.
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Borrow the cell at `row`/`column`, if both exist.
    pub fn value(&self, row: usize, column: &str) -> Option<&Value> {
        let idx = self.schema.index_of(column)?;
        self.rows.get(row)?.get(idx)
    }

    /// Iterate every cell of `column` in row order. Yields nothing if the column is absent.
    pub fn column_values<'a>(&'a self, column: &str) -> impl Iterator<Item = &'a Value> + use<'a> {
        let idx = self.schema.index_of(column);
        self.rows
            .iter()
            .filter_map(move |row| idx.and_then(|i| row.get(i)))
    }

    /// Create a new dataset containing only rows that match `predicate`.
    ///
    /// The returned dataset preserves the original schema.
    pub fn filter_rows<F>(&self, mut predicate: F) -> Self
    where
        F: FnMut(&[Value]) -> bool,
    {
        let rows = self
            .rows
            .iter()
            .filter(|row| predicate(row.as_slice()))
            .cloned()
            .collect();
        Self {
            schema: self.schema.clone(),
            rows,
        }
    }

    /// Create a new dataset with only the named columns, in the order given.
    ///
    /// Names missing from the schema are skipped.
    pub fn select_columns<S: AsRef<str>>(&self, names: &[S]) -> Self {
        let idxs: Vec<usize> = names
            .iter()
            .filter_map(|n| self.schema.index_of(n.as_ref()))
            .collect();
        let schema = Schema::new(idxs.iter().map(|&i| self.schema.fields[i].clone()).collect());
        let rows = self
            .rows
            .iter()
            .map(|row| idxs.iter().map(|&i| row[i].clone()).collect())
            .collect();
        Self { schema, rows }
    }

    /// Vertically concatenate datasets.
    ///
    /// The result schema is the union of the input schemas in order of first appearance. Cells for
    /// columns a part does not carry are [`Value::Null`]. If two parts disagree on a column's type
    /// the first type wins and mismatching cells are rendered as text for `Utf8` columns or
    /// nulled otherwise.
    pub fn concat(parts: Vec<DataSet>) -> Self {
        let mut fields: Vec<Field> = Vec::new();
        for part in &parts {
            for f in &part.schema.fields {
                if !fields.iter().any(|existing| existing.name == f.name) {
                    fields.push(f.clone());
                }
            }
        }
        let schema = Schema::new(fields);

        let total = parts.iter().map(DataSet::row_count).sum();
        let mut rows: Vec<Vec<Value>> = Vec::with_capacity(total);
        for part in parts {
            let mapping: Vec<Option<usize>> = schema
                .fields
                .iter()
                .map(|f| part.schema.index_of(&f.name))
                .collect();
            for mut row in part.rows {
                let out = schema
                    .fields
                    .iter()
                    .zip(mapping.iter())
                    .map(|(field, src)| match src {
                        Some(i) => conform(std::mem::replace(&mut row[*i], Value::Null), field.data_type),
                        None => Value::Null,
                    })
                    .collect();
                rows.push(out);
            }
        }

        Self { schema, rows }
    }
}

fn conform(value: Value, data_type: DataType) -> Value {
    match (value, data_type) {
        (Value::Null, _) => Value::Null,
        (v @ Value::Int64(_), DataType::Int64)
        | (v @ Value::Float64(_), DataType::Float64)
        | (v @ Value::Bool(_), DataType::Bool)
        | (v @ Value::Utf8(_), DataType::Utf8) => v,
        (Value::Int64(i), DataType::Float64) => Value::Float64(i as f64),
        (Value::Int64(i), DataType::Utf8) => Value::Utf8(i.to_string()),
        (Value::Float64(f), DataType::Utf8) => Value::Utf8(f.to_string()),
        (Value::Bool(b), DataType::Utf8) => Value::Utf8(b.to_string()),
        _ => Value::Null,
    }
}
