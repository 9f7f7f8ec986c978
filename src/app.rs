//! Top-level orchestration for the three binaries.
//!
//! Each `src/bin/*.rs` is a thin wrapper; the modules here do the real work:
//! - parse CLI arguments (after loading `.env`)
//! - connect to the node and, where needed, the store
//! - run the tool and write its output to stdout

pub mod daily;
pub mod rebuild;
pub mod report;

use std::io::Write;

use tracing::error;

use crate::error::{AppError, ErrorKind};

/// Load a `.env` file if one exists. Missing files are not an error.
fn load_env() {
    dotenvy::dotenv().ok();
}

/// Map a tool's outcome to the process exit code.
///
/// A bare exit code passes through without output. Any other error is logged
/// at error level and exits with `fatal_code`, or with its kind's code when
/// that is `None`.
pub fn exit_code(result: Result<(), AppError>, fatal_code: Option<u8>) -> u8 {
    match result {
        Ok(()) => 0,
        Err(err) if err.kind() == ErrorKind::Exit => err.exit_code(),
        Err(err) => {
            error!("{err}");
            fatal_code.unwrap_or(err.exit_code())
        }
    }
}

fn emit<W: Write>(out: &mut W, text: impl std::fmt::Display) -> Result<(), AppError> {
    writeln!(out, "{text}").map_err(|e| AppError::io(format!("write output: {e}")))
}
