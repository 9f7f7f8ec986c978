//! The `dsn` config file: one non-empty line holding the store location.

use std::fs;
use std::path::Path;

use crate::error::AppError;

pub const DEFAULT_DSN_FILE: &str = "dsn";

pub fn read_dsn(path: &Path) -> Result<String, AppError> {
    let text = fs::read_to_string(path)
        .map_err(|e| AppError::io(format!("failed to open dsn file '{}': {e}", path.display())))?;

    let lines: Vec<&str> = text.lines().map(str::trim).filter(|l| !l.is_empty()).collect();
    match lines.as_slice() {
        [dsn] => Ok((*dsn).to_string()),
        _ => Err(AppError::format("dsn file must contain exactly one non-empty line")),
    }
}
