use crate::checksum::{self, CHECK_POSITION, FORBIDDEN, VIN_LENGTH};
use crate::model_year;
use crate::vin::SEQUENCE_DIGITS;
use serde::{Deserialize, Serialize};

/// Outcome of [`validate_code`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub valid: bool,
    pub errors: Vec<String>,
}

impl ValidationReport {
    fn from_errors(errors: Vec<String>) -> Self {
        Self {
            valid: errors.is_empty(),
            errors,
        }
    }
}

/// Checks a candidate VIN end to end without touching any sequence store.
///
/// Unlike [`checksum::compute_check`], characters outside the VIN alphabet
/// are reported as errors here. All problems are collected, not just the
/// first one.
pub fn validate_code(code: &str) -> ValidationReport {
    let code = code.trim().to_ascii_uppercase();
    let chars: Vec<char> = code.chars().collect();
    let mut errors = Vec::new();

    if chars.len() != VIN_LENGTH {
        errors.push(format!(
            "expected {VIN_LENGTH} characters, got {}",
            chars.len()
        ));
    }

    for (index, &c) in chars.iter().enumerate() {
        if FORBIDDEN.contains(&c) {
            errors.push(format!("position {}: forbidden character '{c}'", index + 1));
        } else if !checksum::is_vin_char(c) {
            errors.push(format!("position {}: invalid character '{c}'", index + 1));
        }
    }

    if chars.len() != VIN_LENGTH {
        return ValidationReport::from_errors(errors);
    }

    let year_code = chars[CHECK_POSITION + 1];
    if model_year::decode(year_code).is_none() {
        errors.push(format!(
            "position {}: '{year_code}' is not a supported model-year code",
            CHECK_POSITION + 2
        ));
    }

    let serial = &chars[VIN_LENGTH - SEQUENCE_DIGITS..];
    if !serial.iter().all(char::is_ascii_digit) {
        errors.push("sequence section must be six digits".to_string());
    } else if serial.iter().all(|&c| c == '0') {
        errors.push("sequence section must not be 000000".to_string());
    }

    let found = chars[CHECK_POSITION];
    match checksum::compute_check(&code) {
        Ok(expected) if expected != found => errors.push(format!(
            "check character mismatch: expected '{expected}', found '{found}'"
        )),
        Ok(_) => {}
        Err(e) => errors.push(e.to_string()),
    }

    ValidationReport::from_errors(errors)
}
