//! Check-digit computation for 17-character vehicle identification numbers.
//!
//! Each character is transliterated to a number, multiplied by a positional
//! weight and summed. The check character is `sum % 11`, written as `X` when
//! the remainder is 10.

use crate::error::{Result, VinError};

/// Total length of a VIN.
pub const VIN_LENGTH: usize = 17;

/// Zero-based index of the check character.
pub const CHECK_POSITION: usize = 8;

/// Per-position multipliers. The check position carries weight 0.
pub const WEIGHTS: [u32; VIN_LENGTH] = [8, 7, 6, 5, 4, 3, 2, 10, 0, 9, 8, 7, 6, 5, 4, 3, 2];

/// Letters that are never valid in a VIN because they read like `1` and `0`.
pub const FORBIDDEN: [char; 3] = ['I', 'O', 'Q'];

/// Numeric value of a VIN character, case-insensitive.
///
/// Returns `None` for characters outside the VIN alphabet, including the
/// forbidden letters `I`, `O` and `Q`.
pub fn transliterate(c: char) -> Option<u32> {
    let value = match c.to_ascii_uppercase() {
        d @ '0'..='9' => d as u32 - '0' as u32,
        'A' | 'J' => 1,
        'B' | 'K' | 'S' => 2,
        'C' | 'L' | 'T' => 3,
        'D' | 'M' | 'U' => 4,
        'E' | 'N' | 'V' => 5,
        'F' | 'W' => 6,
        'G' | 'P' | 'X' => 7,
        'H' | 'Y' => 8,
        'R' | 'Z' => 9,
        _ => return None,
    };
    Some(value)
}

/// Returns `true` if `c` belongs to the VIN alphabet.
pub fn is_vin_char(c: char) -> bool {
    transliterate(c).is_some()
}

/// Computes the check character for a 17-character code.
///
/// The character currently at [`CHECK_POSITION`] is ignored. Characters
/// outside the alphabet count as 0 instead of failing; use
/// [`crate::validate::validate_code`] when untrusted input must be rejected.
pub fn compute_check(code: &str) -> Result<char> {
    let chars: Vec<char> = code.chars().collect();
    if chars.len() != VIN_LENGTH {
        return Err(VinError::Length {
            field: "code",
            expected: VIN_LENGTH,
            actual: chars.len(),
        });
    }

    let sum: u32 = chars
        .iter()
        .zip(WEIGHTS)
        .map(|(&c, weight)| transliterate(c).unwrap_or(0) * weight)
        .sum();

    Ok(match sum % 11 {
        10 => 'X',
        // remainder is 0..=9 here
        r => char::from(b'0' + r as u8),
    })
}
