#![warn(missing_docs)]
//! # ponto-contract-tests
//!
//! Locates the frozen wire contracts under the workspace `contracts/`
//! directory. The validation itself lives in `tests/`.

use std::io;
use std::path::PathBuf;

/// Workspace `contracts/` directory.
pub fn contracts_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("..")
        .join("contracts")
}

/// Reads one contract file by its path relative to [`contracts_dir`].
///
/// # Errors
/// Returns the underlying I/O error when the file is missing or unreadable.
pub fn read_contract(relative: &str) -> io::Result<String> {
    std::fs::read_to_string(contracts_dir().join(relative))
}
