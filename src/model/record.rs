use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde::Deserialize;
use serde::Serialize;
use serde::Serializer;
use serde::ser::SerializeMap;

/// A single decoded cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Bool(bool),
    Number(f64),
    Text(String),
}

impl Value {
    /// Numbers first, then booleans, everything else stays text. Empty cells are `Null`.
    pub fn coerce(cell: &str) -> Self {
        let trimmed = cell.trim();
        if trimmed.is_empty() {
            return Value::Null;
        }
        if looks_numeric(trimmed) {
            if let Ok(number) = trimmed.parse::<f64>() {
                if number.is_finite() {
                    return Value::Number(number);
                }
            }
        }
        if trimmed.eq_ignore_ascii_case("true") {
            return Value::Bool(true);
        }
        if trimmed.eq_ignore_ascii_case("false") {
            return Value::Bool(false);
        }
        Value::Text(cell.to_string())
    }

    pub fn is_null(&self) -> bool { matches!(self, Value::Null) }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            Value::Text(s) => s.trim().parse::<f64>().ok().filter(|n| n.is_finite()),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Text rendering of any non-null value, numbers included.
    pub fn as_text(&self) -> Option<String> {
        match self {
            Value::Null => None,
            Value::Bool(b) => Some(b.to_string()),
            Value::Number(n) => Some(n.to_string()),
            Value::Text(s) => Some(s.clone()),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Number(n) => write!(f, "{}", n),
            Value::Text(s) => f.write_str(s),
        }
    }
}

// Signs, digits, one decimal point and an exponent only. Rejects "inf", "NaN" and friends.
fn looks_numeric(cell: &str) -> bool {
    let body = cell.strip_prefix(['-', '+']).unwrap_or(cell);
    let (mantissa, exponent) = match body.find(['e', 'E']) {
        Some(pos) => (&body[..pos], Some(&body[pos + 1..])),
        None => (body, None),
    };
    let digits = mantissa.bytes().filter(|b| b.is_ascii_digit()).count();
    let dots = mantissa.bytes().filter(|b| *b == b'.').count();
    let mantissa_ok = digits > 0 && dots <= 1 && digits + dots == mantissa.len();
    let exponent_ok = match exponent {
        Some(exp) => {
            let exp = exp.strip_prefix(['-', '+']).unwrap_or(exp);
            !exp.is_empty() && exp.bytes().all(|b| b.is_ascii_digit())
        },
        None => true,
    };
    mantissa_ok && exponent_ok
}

/// Ordered field list bound once from a header row.
#[derive(Debug, Clone, PartialEq)]
pub struct Schema {
    fields: Vec<String>,
    index: HashMap<String, usize>,
}

impl Schema {
    pub fn from_header<I, S>(header: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let fields: Vec<String> = header.into_iter().map(|f| f.into().trim().to_string()).collect();
        let mut index = HashMap::with_capacity(fields.len());
        for (position, field) in fields.iter().enumerate() {
            // Duplicate header names keep the first column
            index.entry(field.clone()).or_insert(position);
        }
        Self { fields, index }
    }

    pub fn len(&self) -> usize { self.fields.len() }

    pub fn is_empty(&self) -> bool { self.fields.is_empty() }

    pub fn fields(&self) -> &[String] { &self.fields }

    pub fn position(
        &self,
        field: &str,
    ) -> Option<usize> {
        self.index.get(field).copied()
    }

    pub fn contains(
        &self,
        field: &str,
    ) -> bool {
        self.index.contains_key(field)
    }
}

/// One decoded row, read through its schema. The source text of every cell is kept
/// next to its coerced value so identifiers survive numeric coercion.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    schema: Arc<Schema>,
    values: Vec<Value>,
    raw: Vec<String>,
}

impl Record {
    /// Callers guarantee `values.len() == schema.len()`; the decoder enforces it.
    pub fn new(
        schema: Arc<Schema>,
        values: Vec<Value>,
    ) -> Self {
        let raw = values.iter().map(Value::to_string).collect();
        Self::with_raw(schema, values, raw)
    }

    /// Like `new`, with the source text of each cell supplied by the caller.
    pub fn with_raw(
        schema: Arc<Schema>,
        values: Vec<Value>,
        raw: Vec<String>,
    ) -> Self {
        debug_assert_eq!(schema.len(), values.len());
        debug_assert_eq!(values.len(), raw.len());
        Self { schema, values, raw }
    }

    /// Coerces each cell and keeps its text.
    pub fn from_cells(
        schema: Arc<Schema>,
        cells: Vec<String>,
    ) -> Self {
        let values = cells.iter().map(|cell| Value::coerce(cell)).collect();
        Self::with_raw(schema, values, cells)
    }

    /// Builds a record from name/cell pairs, coercing each cell. Handy for fixtures.
    pub fn from_pairs(pairs: &[(&str, &str)]) -> Self {
        let schema = Arc::new(Schema::from_header(pairs.iter().map(|(name, _)| *name)));
        let cells = pairs.iter().map(|(_, cell)| cell.to_string()).collect();
        Self::from_cells(schema, cells)
    }

    pub fn schema(&self) -> &Arc<Schema> { &self.schema }

    pub fn values(&self) -> &[Value] { &self.values }

    /// Non-null value of a field.
    pub fn get(
        &self,
        field: &str,
    ) -> Option<&Value> {
        self.schema
            .position(field)
            .and_then(|i| self.values.get(i))
            .filter(|v| !v.is_null())
    }

    /// Text of a field. Numeric cells come back exactly as written, so `000123` stays `000123`.
    pub fn text(
        &self,
        field: &str,
    ) -> Option<String> {
        let position = self.schema.position(field)?;
        let text = match self.values.get(position)? {
            Value::Null => return None,
            Value::Number(_) => self.raw.get(position).map(|raw| raw.trim().to_string()),
            value => value.as_text(),
        };
        text.filter(|s| !s.trim().is_empty())
    }

    pub fn number(
        &self,
        field: &str,
    ) -> Option<f64> {
        self.get(field).and_then(Value::as_f64)
    }

    pub fn flag(
        &self,
        field: &str,
    ) -> Option<bool> {
        self.get(field).and_then(Value::as_bool)
    }

    pub fn first_text(
        &self,
        aliases: &[&str],
    ) -> Option<String> {
        aliases.iter().find_map(|field| self.text(field))
    }

    pub fn first_number(
        &self,
        aliases: &[&str],
    ) -> Option<f64> {
        aliases.iter().find_map(|field| self.number(field))
    }
}

impl Serialize for Record {
    fn serialize<S>(
        &self,
        serializer: S,
    ) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.values.len()))?;
        for (field, value) in self.schema.fields().iter().zip(self.values.iter()) {
            map.serialize_entry(field, value)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case("42", Value::Number(42.0))]
    #[case("-3.5", Value::Number(-3.5))]
    #[case("1e3", Value::Number(1000.0))]
    #[case(".5", Value::Number(0.5))]
    #[case("TRUE", Value::Bool(true))]
    #[case("False", Value::Bool(false))]
    #[case("", Value::Null)]
    #[case("   ", Value::Null)]
    #[case("NaN", Value::Text("NaN".to_string()))]
    #[case("inf", Value::Text("inf".to_string()))]
    #[case("12abc", Value::Text("12abc".to_string()))]
    #[case("cosmos1abc", Value::Text("cosmos1abc".to_string()))]
    #[case("1.2.3", Value::Text("1.2.3".to_string()))]
    fn test_value_coercion(
        #[case] cell: &str,
        #[case] expected: Value,
    ) {
        assert_eq!(Value::coerce(cell), expected);
    }

    #[test]
    fn test_schema_keeps_first_duplicate() {
        let schema = Schema::from_header(["a", "b", "a"]);
        assert_eq!(schema.len(), 3);
        assert_eq!(schema.position("a"), Some(0));
        assert_eq!(schema.position("b"), Some(1));
        assert_eq!(schema.position("c"), None);
    }

    #[test]
    fn test_record_accessors() {
        let record = Record::from_pairs(&[("address", "osmo1xyz"), ("sent_tx_count", "7"), ("flag", "true"), ("empty", "")]);
        assert_eq!(record.text("address"), Some("osmo1xyz".to_string()));
        assert_eq!(record.number("sent_tx_count"), Some(7.0));
        assert_eq!(record.flag("flag"), Some(true));
        assert_eq!(record.get("empty"), None);
        assert_eq!(record.first_text(&["id", "address"]), Some("osmo1xyz".to_string()));
        assert_eq!(record.first_number(&["missing", "sent_tx_count"]), Some(7.0));
    }

    #[rstest]
    #[case("000123")]
    #[case("12345678901234567890123")]
    #[case("1e3")]
    fn test_numeric_cell_keeps_source_text(#[case] cell: &str) {
        let record = Record::from_pairs(&[("id", cell)]);
        assert!(record.number("id").is_some());
        assert_eq!(record.text("id"), Some(cell.to_string()));
    }

    #[test]
    fn test_record_serializes_as_map() {
        let record = Record::from_pairs(&[("id", "a"), ("n", "1")]);
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json, serde_json::json!({"id": "a", "n": 1.0}));
    }
}
