//! Model-year encoding (VIN position 10).
//!
//! One full 30-year cycle is supported so that every year maps to a distinct
//! character. Letters `I`, `O`, `Q`, `U`, `Z` and the digit `0` are skipped.

use crate::error::{Result, VinError};

/// First supported model year.
pub const FIRST_YEAR: i32 = 2001;

/// Last supported model year.
pub const LAST_YEAR: i32 = 2030;

const YEAR_CODES: [char; 30] = [
    '1', '2', '3', '4', '5', '6', '7', '8', '9', // 2001..=2009
    'A', 'B', 'C', 'D', 'E', 'F', 'G', 'H', 'J', 'K', // 2010..=2019
    'L', 'M', 'N', 'P', 'R', 'S', 'T', 'V', 'W', 'X', // 2020..=2029
    'Y', // 2030
];

/// Returns the single-character code for `year`.
pub fn encode(year: i32) -> Result<char> {
    if !(FIRST_YEAR..=LAST_YEAR).contains(&year) {
        return Err(VinError::UnsupportedYear(year));
    }
    Ok(YEAR_CODES[(year - FIRST_YEAR) as usize])
}

/// Returns the model year represented by `code`, if any.
pub fn decode(code: char) -> Option<i32> {
    let upper = code.to_ascii_uppercase();
    YEAR_CODES
        .iter()
        .position(|&c| c == upper)
        .map(|index| FIRST_YEAR + index as i32)
}
