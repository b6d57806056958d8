//! Loading IntCode programs
//!
//! A program is one line of comma-separated base-10 integers.

use std::fs;
use std::path::Path;

use crate::error::VmError;
use crate::word::Word;

/// Parse comma-separated integers of any size, ignoring surrounding whitespace
pub fn parse_program(source: &str) -> Result<Vec<Word>, VmError> {
    let source = source.trim();
    if source.is_empty() {
        return Err(VmError::Parse {
            index: 0,
            token: String::new(),
            message: "empty program".to_string(),
        });
    }

    source
        .split(',')
        .enumerate()
        .map(|(index, token)| {
            let token = token.trim();
            token.parse::<Word>().map_err(|e| VmError::Parse {
                index,
                token: token.to_string(),
                message: e.to_string(),
            })
        })
        .collect()
}

/// Parse a comma-separated list of input values; an empty string yields none
pub fn parse_values(source: &str) -> Result<Vec<Word>, VmError> {
    if source.trim().is_empty() {
        return Ok(Vec::new());
    }
    parse_program(source)
}

/// Read and parse a program file
pub fn load_program(path: &Path) -> Result<Vec<Word>, VmError> {
    let contents = fs::read_to_string(path).map_err(|e| VmError::Io {
        message: format!("{}: {}", path.display(), e),
    })?;
    let program = parse_program(&contents)?;
    log::debug!("Loaded {} words from {}", program.len(), path.display());
    Ok(program)
}
