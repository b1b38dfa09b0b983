//! Program file loader
//!
//! Programs are plain text, one byte per line written as eight binary digits.
//! Anything after a `#` is a comment, and blank lines are skipped:
//!
//! ```text
//! # print8.ls8
//! 10000010 # LDI R0,8
//! 00000000
//! 00001000
//! 01000111 # PRN R0
//! 00000000
//! 00000001 # HLT
//! ```

use std::fs;
use std::path::Path;

use crate::error::LoadError;
use crate::runtime::memory::MEMORY_SIZE;

pub fn parse_program(src: &str) -> Result<Vec<u8>, LoadError> {
    let mut image = Vec::new();

    for (i, raw) in src.lines().enumerate() {
        let code = raw.split_once('#').map_or(raw, |(code, _)| code).trim();
        if code.is_empty() {
            continue;
        }

        let byte = parse_byte(code).ok_or_else(|| LoadError::MalformedLine {
            line: i + 1,
            text: code.to_string(),
        })?;
        image.push(byte);
    }

    if image.len() > MEMORY_SIZE {
        return Err(LoadError::CapacityOverflow {
            len: image.len(),
            capacity: MEMORY_SIZE,
        });
    }

    log::debug!("parsed {} program bytes", image.len());
    Ok(image)
}

pub fn load_program(path: impl AsRef<Path>) -> Result<Vec<u8>, LoadError> {
    let path = path.as_ref();
    let src = fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    log::debug!("loading program from {}", path.display());
    parse_program(&src)
}

fn parse_byte(code: &str) -> Option<u8> {
    if code.len() != 8 || !code.bytes().all(|c| c == b'0' || c == b'1') {
        return None;
    }
    u8::from_str_radix(code, 2).ok()
}
