use std::fmt;

use miette::Diagnostic;
use thiserror::Error;

/// Upper bound for VM memory, in MB (128GB).
pub const MAX_MEMORY_MB: u32 = 128_000;

/// Upper bound for the VM disk, in MB (2TB).
pub const MAX_DISK_MB: u32 = 2_000_000;

/// Which size input failed validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SizeField {
    Memory,
    Disk,
}

impl fmt::Display for SizeField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Memory => f.write_str("Memory"),
            Self::Disk => f.write_str("Disk"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error, Diagnostic)]
pub enum ValidationError {
    #[error("{field} size must be a valid integer.")]
    NotANumber { field: SizeField },

    #[error("{field} size must be a positive integer.")]
    NotPositive { field: SizeField },

    #[error("{field} size must not exceed {limit}.")]
    TooLarge { field: SizeField, limit: &'static str },

    #[error("VM name must not be empty.")]
    EmptyName,
}

/// Validate a memory size in MB: an integer in `1..=128000`.
pub fn validate_memory(input: &str) -> Result<u32, ValidationError> {
    validate_size(input, SizeField::Memory, MAX_MEMORY_MB, "128GB")
}

/// Validate a disk size in MB: an integer in `1..=2000000`.
pub fn validate_disk(input: &str) -> Result<u32, ValidationError> {
    validate_size(input, SizeField::Disk, MAX_DISK_MB, "2TB")
}

/// A VM name is used both as a tool identifier and a directory name, so it
/// must contain something besides whitespace. Otherwise it is passed through.
pub fn validate_name(input: &str) -> Result<String, ValidationError> {
    if input.trim().is_empty() {
        return Err(ValidationError::EmptyName);
    }
    Ok(input.to_string())
}

fn validate_size(
    input: &str,
    field: SizeField,
    max: u32,
    limit: &'static str,
) -> Result<u32, ValidationError> {
    let value = parse_integer(input).ok_or(ValidationError::NotANumber { field })?;

    match value {
        Magnitude::Value(v) if v <= 0 => Err(ValidationError::NotPositive { field }),
        Magnitude::Value(v) if v > i64::from(max) => {
            Err(ValidationError::TooLarge { field, limit })
        }
        Magnitude::Value(v) => {
            u32::try_from(v).map_err(|_| ValidationError::TooLarge { field, limit })
        }
        Magnitude::Overflow { negative: true } => Err(ValidationError::NotPositive { field }),
        Magnitude::Overflow { negative: false } => Err(ValidationError::TooLarge { field, limit }),
    }
}

enum Magnitude {
    Value(i64),
    /// Syntactically an integer, but too wide for i64.
    Overflow { negative: bool },
}

/// Parse an optionally signed decimal integer with surrounding whitespace.
fn parse_integer(input: &str) -> Option<Magnitude> {
    let s = input.trim();
    let (negative, digits) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };

    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    match s.parse::<i64>() {
        Ok(v) => Some(Magnitude::Value(v)),
        Err(_) => Some(Magnitude::Overflow { negative }),
    }
}
