//! JSON exports: fit responses and transcribed tables.

use std::fs::File;
use std::path::Path;

use serde::Serialize;

use crate::error::AppError;

/// Write any serializable payload as pretty JSON.
pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::new(2, format!("Failed to create '{}': {e}", path.display())))?;
    serde_json::to_writer_pretty(file, value)
        .map_err(|e| AppError::new(2, format!("Failed to write JSON '{}': {e}", path.display())))?;
    log::info!("wrote {}", path.display());
    Ok(())
}

/// Pretty JSON as a string, for stdout.
pub fn to_json_string<T: Serialize>(value: &T) -> Result<String, AppError> {
    serde_json::to_string_pretty(value).map_err(|e| AppError::new(2, format!("Failed to encode JSON: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transcribe::Table;

    #[test]
    fn table_round_trips_through_a_file() {
        let table = Table {
            columns: vec!["n".into(), "D".into()],
            rows: vec![vec![Some(1.0), Some(2.0)], vec![Some(2.0), None]],
        };
        let path = std::env::temp_dir().join(format!("graphfit-export-{}.json", std::process::id()));
        write_json(&path, &table).unwrap();
        let back: Table = serde_json::from_reader(File::open(&path).unwrap()).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(back, table);
    }

    #[test]
    fn null_cells_stay_null() {
        let table = Table {
            columns: vec!["x".into()],
            rows: vec![vec![None]],
        };
        let s = to_json_string(&table).unwrap();
        assert!(s.contains("null"));
    }
}
