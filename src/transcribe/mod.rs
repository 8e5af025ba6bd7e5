//! Table transcription from photographs of lab notebooks.
//!
//! The service call itself lives behind [`TableTranscriber`]; everything
//! around it (upload checks, the prompt, parsing the model's reply) is plain
//! code that can be tested offline.

pub mod groq;

pub use groq::VisionClient;

use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::{FitRequest, Mode};
use crate::error::{AppError, FitError};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TranscribeError {
    #[error("{0}")]
    InvalidUpload(String),
    #[error("GROQ_API_KEY is not set. Add it to your environment or a .env file.")]
    MissingApiKey,
    /// The image was read but no usable table came back.
    #[error("{0}")]
    NoTable(String),
    #[error("{0}")]
    InvalidResponse(String),
    #[error("API rate limit exceeded. Please wait a moment and try again.")]
    RateLimited,
    #[error("Transcription request failed: {0}")]
    Service(String),
}

impl From<TranscribeError> for AppError {
    fn from(err: TranscribeError) -> Self {
        let exit_code = match err {
            TranscribeError::InvalidUpload(_) | TranscribeError::MissingApiKey => 2,
            _ => 5,
        };
        AppError::new(exit_code, err.to_string())
    }
}

/// Raw image bytes plus their MIME type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageUpload {
    pub bytes: Vec<u8>,
    pub mime_type: String,
}

impl ImageUpload {
    pub fn new(bytes: Vec<u8>, mime_type: impl Into<String>) -> Self {
        Self {
            bytes,
            mime_type: mime_type.into(),
        }
    }

    /// Read an image file, taking the MIME type from its extension.
    pub fn from_path(path: &Path) -> Result<Self, AppError> {
        let bytes = std::fs::read(path)
            .map_err(|e| AppError::new(2, format!("Failed to read image '{}': {e}", path.display())))?;
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();
        Ok(Self::new(bytes, mime_from_extension(&ext)))
    }

    /// Reject non-image MIME types and empty payloads.
    pub fn validate(&self) -> Result<(), TranscribeError> {
        if !self.mime_type.starts_with("image/") {
            return Err(TranscribeError::InvalidUpload("Uploaded file is not an image.".into()));
        }
        if self.bytes.is_empty() {
            return Err(TranscribeError::InvalidUpload("Uploaded file is empty.".into()));
        }
        Ok(())
    }
}

fn mime_from_extension(ext: &str) -> &'static str {
    match ext {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "bmp" => "image/bmp",
        "heic" => "image/heic",
        _ => "application/octet-stream",
    }
}

/// A transcribed table. Cells that could not be read as numbers are `None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Table {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Option<f64>>>,
}

impl Table {
    /// Turn the table into a fit request once every cell is numeric.
    pub fn into_request(self, mode: Mode) -> Result<FitRequest, FitError> {
        let mut points = Vec::with_capacity(self.rows.len());
        for (i, row) in self.rows.into_iter().enumerate() {
            let mut out = Vec::with_capacity(row.len());
            for (j, cell) in row.into_iter().enumerate() {
                let Some(v) = cell else {
                    return Err(FitError::validation(format!(
                        "Row {}, column {} could not be read as a number.",
                        i + 1,
                        j + 1
                    )));
                };
                out.push(v);
            }
            points.push(out);
        }
        Ok(FitRequest {
            mode: mode.as_str().to_string(),
            points,
            columns: self.columns,
        })
    }
}

/// Image → table.
pub trait TableTranscriber {
    fn transcribe(&self, image: &ImageUpload, mode: Mode) -> Result<Table, TranscribeError>;
}

/// Extraction prompt for `mode`, including its column hint.
pub fn build_prompt(mode: Mode) -> String {
    format!(
        r#"You are a precise data-extraction assistant.

Look at this image. It should contain a data table (handwritten or printed).

{hint}

Your task:
1. Identify every column header and every row of numeric data in the table.
2. Return ONLY valid JSON in this exact format (no markdown, no explanation):

{{"columns": ["column_name_1", "column_name_2"], "rows": [[number, number], [number, number], ...]}}

Rules:
- Every value in "rows" must be a number (int or float), not a string.
- If a value looks like scientific notation (e.g. 2.5×10⁻³), convert it to a decimal (0.0025).
- Preserve the order of rows as they appear in the table.
- If you cannot find a data table in the image, return exactly: {{"error": "No data table found"}}
"#,
        hint = mode.column_hint()
    )
}

fn strip_code_fence(raw: &str) -> &str {
    let text = raw.trim();
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest).trim_start();
    rest.strip_suffix("```").unwrap_or(rest).trim_end()
}

fn coerce_cell(value: &Value) -> Option<f64> {
    let v = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }?;
    v.is_finite().then_some(v)
}

/// Parse the model's reply into a [`Table`].
pub fn parse_table_response(raw: &str) -> Result<Table, TranscribeError> {
    let text = strip_code_fence(raw);
    let data: Value = serde_json::from_str(text).map_err(|_| {
        TranscribeError::InvalidResponse(format!(
            "Vision model returned invalid JSON. Raw response:\n{text}"
        ))
    })?;

    if let Some(err) = data.get("error") {
        let msg = match err {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        return Err(TranscribeError::NoTable(msg));
    }

    let (Some(columns), Some(rows)) = (data.get("columns"), data.get("rows")) else {
        return Err(TranscribeError::InvalidResponse(
            "Response missing 'columns' or 'rows' fields.".into(),
        ));
    };

    let rows = match rows.as_array() {
        Some(rows) if !rows.is_empty() => rows,
        _ => return Err(TranscribeError::NoTable("No data rows found in the table.".into())),
    };

    let columns = columns
        .as_array()
        .map(|cols| {
            cols.iter()
                .map(|c| match c {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                })
                .collect()
        })
        .unwrap_or_default();

    let mut cleaned = Vec::with_capacity(rows.len());
    for (i, row) in rows.iter().enumerate() {
        let Some(cells) = row.as_array() else {
            return Err(TranscribeError::InvalidResponse(format!("Row {} is not a list.", i + 1)));
        };
        cleaned.push(cells.iter().map(coerce_cell).collect());
    }

    Ok(Table {
        columns,
        rows: cleaned,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_fences_and_coerces_cells() {
        let raw = "```json\n{\"columns\": [\"x\", \"y\"], \"rows\": [[1, \"2.5\"], [\"3e-3\", \"n/a\"]]}\n```";
        let table = parse_table_response(raw).unwrap();
        assert_eq!(table.columns, vec!["x", "y"]);
        assert_eq!(table.rows[0], vec![Some(1.0), Some(2.5)]);
        assert_eq!(table.rows[1], vec![Some(0.003), None]);
    }

    #[test]
    fn error_payload_means_no_table() {
        let err = parse_table_response(r#"{"error": "No data table found"}"#).unwrap_err();
        assert_eq!(err, TranscribeError::NoTable("No data table found".into()));
    }

    #[test]
    fn empty_rows_are_rejected() {
        let err = parse_table_response(r#"{"columns": ["x"], "rows": []}"#).unwrap_err();
        assert!(matches!(err, TranscribeError::NoTable(_)));
    }

    #[test]
    fn missing_fields_and_bad_json_are_invalid_responses() {
        let err = parse_table_response(r#"{"columns": ["x"]}"#).unwrap_err();
        assert!(matches!(err, TranscribeError::InvalidResponse(_)));
        let err = parse_table_response("here is your table!").unwrap_err();
        assert!(matches!(err, TranscribeError::InvalidResponse(msg) if msg.contains("invalid JSON")));
    }

    #[test]
    fn uploads_are_checked_before_any_request() {
        let pdf = ImageUpload::new(vec![1, 2, 3], "application/pdf");
        assert!(matches!(pdf.validate(), Err(TranscribeError::InvalidUpload(_))));
        let empty = ImageUpload::new(Vec::new(), "image/png");
        assert_eq!(
            empty.validate(),
            Err(TranscribeError::InvalidUpload("Uploaded file is empty.".into()))
        );
        assert!(ImageUpload::new(vec![0x89], "image/png").validate().is_ok());
    }

    #[test]
    fn prompt_carries_the_mode_hint() {
        let prompt = build_prompt(Mode::NewtonsRings);
        assert!(prompt.contains("ring number n"));
        assert!(prompt.contains(r#"{"error": "No data table found"}"#));
    }

    #[test]
    fn unreadable_cells_block_fitting() {
        let table = Table {
            columns: vec!["x".into(), "y".into()],
            rows: vec![vec![Some(1.0), Some(2.0)], vec![Some(2.0), None]],
        };
        let err = table.into_request(Mode::StraightLine).unwrap_err();
        assert_eq!(err, FitError::validation("Row 2, column 2 could not be read as a number."));
    }
}
