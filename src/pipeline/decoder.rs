use std::sync::Arc;

use serde::Deserialize;
use serde::Serialize;
use tracing::debug;

use crate::config::IngestConfig;
use crate::error::DecodeError;
use crate::model::record::Record;
use crate::model::record::Schema;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DecoderConfig {
    pub delimiter: char,
    // Rows with a null value in any of these columns are skipped
    pub required_fields: Vec<String>,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            delimiter: ',',
            required_fields: Vec::new(),
        }
    }
}

impl From<&IngestConfig> for DecoderConfig {
    fn from(config: &IngestConfig) -> Self {
        Self {
            delimiter: config.delimiter,
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DecodeReport {
    pub decoded: usize,
    pub skipped: usize,
}

impl DecodeReport {
    pub fn merge(
        &mut self,
        other: DecodeReport,
    ) {
        self.decoded += other.decoded;
        self.skipped += other.skipped;
    }
}

/// Turns complete delimited lines into records against a schema bound from the header row.
#[derive(Debug, Clone)]
pub struct RecordDecoder {
    config: DecoderConfig,
    schema: Option<Arc<Schema>>,
    required: Vec<(String, Option<usize>)>,
}

impl RecordDecoder {
    pub fn new(config: DecoderConfig) -> Self {
        Self {
            config,
            schema: None,
            required: Vec::new(),
        }
    }

    /// Decoder with a schema already bound; every line is treated as data.
    pub fn with_schema(
        config: DecoderConfig,
        schema: Arc<Schema>,
    ) -> Self {
        let mut decoder = Self::new(config);
        decoder.bind(schema);
        decoder
    }

    pub fn schema(&self) -> Option<&Arc<Schema>> { self.schema.as_ref() }

    fn bind(
        &mut self,
        schema: Arc<Schema>,
    ) {
        self.required = self
            .config
            .required_fields
            .iter()
            .map(|field| (field.clone(), schema.position(field)))
            .collect();
        debug!("decoder::schema_bound::fields::{}", schema.fields().join("|"));
        self.schema = Some(schema);
    }

    /// Decodes every complete line in `text`, appending good rows to `out`.
    ///
    /// The first non-blank line seen by a fresh decoder is the header. Blank lines are
    /// ignored and not counted as skipped.
    pub fn decode_chunk(
        &mut self,
        text: &str,
        out: &mut Vec<Record>,
    ) -> DecodeReport {
        let mut report = DecodeReport::default();

        for line in text.split('\n') {
            let line = line.strip_suffix('\r').unwrap_or(line);
            if line.trim().is_empty() {
                continue;
            }

            if self.schema.is_none() {
                let header = split_row(line, self.config.delimiter);
                self.bind(Arc::new(Schema::from_header(header)));
                continue;
            }

            match self.decode_line(line) {
                Ok(record) => {
                    out.push(record);
                    report.decoded += 1;
                },
                Err(e) => {
                    debug!("decoder::row_skipped::error::{}", e);
                    report.skipped += 1;
                },
            }
        }

        report
    }

    /// Decodes one data line. Fails when no schema is bound yet.
    pub fn decode_line(
        &self,
        line: &str,
    ) -> Result<Record, DecodeError> {
        let schema = self
            .schema
            .as_ref()
            .ok_or_else(|| DecodeError::MissingField("header".to_string()))?;

        let cells = split_row(line, self.config.delimiter);
        if cells.len() != schema.len() {
            return Err(DecodeError::ColumnCountMismatch {
                expected: schema.len(),
                found: cells.len(),
            });
        }

        let record = Record::from_cells(schema.clone(), cells);

        for (field, position) in &self.required {
            let present = position.map(|i| !record.values()[i].is_null()).unwrap_or(false);
            if !present {
                return Err(DecodeError::MissingField(field.clone()));
            }
        }

        Ok(record)
    }
}

/// Splits one line on `delimiter`, honouring double quotes (`""` is an escaped quote).
/// Unquoted cells are trimmed; quoted cells are kept verbatim.
pub fn split_row(
    line: &str,
    delimiter: char,
) -> Vec<String> {
    let mut cells = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut was_quoted = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        if in_quotes {
            if c == '"' {
                if chars.peek() == Some(&'"') {
                    current.push('"');
                    chars.next();
                } else {
                    in_quotes = false;
                }
            } else {
                current.push(c);
            }
        } else if c == '"' && current.trim().is_empty() && !was_quoted {
            current.clear();
            in_quotes = true;
            was_quoted = true;
        } else if c == delimiter {
            cells.push(finish_cell(&mut current, was_quoted));
            was_quoted = false;
        } else if !was_quoted {
            current.push(c);
        }
        // Text after a closing quote and before the delimiter is dropped
    }
    cells.push(finish_cell(&mut current, was_quoted));
    cells
}

fn finish_cell(
    current: &mut String,
    quoted: bool,
) -> String {
    let cell = std::mem::take(current);
    if quoted { cell } else { cell.trim().to_string() }
}
