use crate::checksum::{self, CHECK_POSITION, FORBIDDEN, VIN_LENGTH};
use crate::error::{Result, VinError};
use crate::model_year;
use crate::validate::validate_code;
use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// Length of the manufacturer identifier (WMI).
pub const MANUFACTURER_ID_LENGTH: usize = 3;
/// Length of the vehicle descriptor section.
pub const DESCRIPTOR_LENGTH: usize = 5;
/// Length of the plant code.
pub const PLANT_CODE_LENGTH: usize = 1;
/// Length of a [`Prefix`].
pub const PREFIX_LENGTH: usize = 10;
/// Number of digits in the serial section.
pub const SEQUENCE_DIGITS: usize = 6;
/// Highest sequence number that fits the serial section.
pub const MAX_SEQUENCE: u64 = 999_999;

/// Key identifying one sequence counter.
///
/// A prefix is the manufacturer id, descriptor, model-year code and plant
/// code concatenated. Every part has a fixed width, so two different field
/// combinations can never produce the same prefix.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Prefix(String);

impl Prefix {
    /// Parses a prefix string, normalising it to upper case.
    pub fn new(prefix: impl Into<String>) -> Result<Self> {
        let prefix = prefix.into().to_ascii_uppercase();
        let len = prefix.chars().count();
        if len != PREFIX_LENGTH {
            return Err(VinError::InvalidPrefix(format!(
                "expected {PREFIX_LENGTH} characters, got {len}: '{prefix}'"
            )));
        }
        if let Some(c) = prefix.chars().find(|&c| !checksum::is_vin_char(c)) {
            return Err(VinError::InvalidPrefix(format!(
                "character '{c}' is not allowed: '{prefix}'"
            )));
        }
        // position 9 of the prefix is the model-year code
        let year_code = prefix.as_bytes()[PREFIX_LENGTH - 2] as char;
        if model_year::decode(year_code).is_none() {
            return Err(VinError::InvalidPrefix(format!(
                "'{year_code}' is not a model-year code: '{prefix}'"
            )));
        }
        Ok(Self(prefix))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for Prefix {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Prefix {
    type Error = VinError;

    fn try_from(value: String) -> Result<Self> {
        Self::new(value)
    }
}

impl From<Prefix> for String {
    fn from(value: Prefix) -> Self {
        value.0
    }
}

/// Validated structural fields of a VIN, everything except the check
/// character and the serial number.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VinFields {
    manufacturer_id: String,
    descriptor: String,
    model_year: i32,
    year_code: char,
    plant_code: String,
}

impl VinFields {
    /// Validates field lengths, the character set and the model year.
    pub fn new(
        manufacturer_id: impl AsRef<str>,
        descriptor: impl AsRef<str>,
        model_year: i32,
        plant_code: impl AsRef<str>,
    ) -> Result<Self> {
        let manufacturer_id = check_field(
            "manufacturer id",
            manufacturer_id.as_ref(),
            MANUFACTURER_ID_LENGTH,
        )?;
        let descriptor = check_field("descriptor", descriptor.as_ref(), DESCRIPTOR_LENGTH)?;
        let year_code = model_year::encode(model_year)?;
        let plant_code = check_field("plant code", plant_code.as_ref(), PLANT_CODE_LENGTH)?;

        Ok(Self {
            manufacturer_id,
            descriptor,
            model_year,
            year_code,
            plant_code,
        })
    }

    pub fn manufacturer_id(&self) -> &str {
        &self.manufacturer_id
    }

    pub fn descriptor(&self) -> &str {
        &self.descriptor
    }

    pub fn model_year(&self) -> i32 {
        self.model_year
    }

    pub fn plant_code(&self) -> &str {
        &self.plant_code
    }

    /// Returns the counter key for these fields.
    pub fn prefix(&self) -> Prefix {
        Prefix(format!(
            "{}{}{}{}",
            self.manufacturer_id, self.descriptor, self.year_code, self.plant_code
        ))
    }

    /// Builds the VIN for `sequence` with its computed check character.
    pub fn assemble(&self, sequence: u64) -> Result<Vin> {
        if !(1..=MAX_SEQUENCE).contains(&sequence) {
            return Err(VinError::SequenceOutOfRange(sequence));
        }

        let mut code = format!(
            "{}{}0{}{}{:0width$}",
            self.manufacturer_id,
            self.descriptor,
            self.year_code,
            self.plant_code,
            sequence,
            width = SEQUENCE_DIGITS,
        );
        let check = checksum::compute_check(&code)?;
        code.replace_range(CHECK_POSITION..CHECK_POSITION + 1, &check.to_string());

        Ok(Vin(code))
    }

    /// Like [`VinFields::assemble`], then recomputes the check character of
    /// the finished code.
    ///
    /// A mismatch means the codec itself is broken and is reported as
    /// [`VinError::InvariantViolation`].
    pub fn assemble_verified(&self, sequence: u64) -> Result<Vin> {
        let vin = self.assemble(sequence)?;
        let recomputed = checksum::compute_check(vin.as_str())
            .map_err(|e| VinError::InvariantViolation(format!("assembled code {vin}: {e}")))?;
        if recomputed != vin.check_char() {
            return Err(VinError::InvariantViolation(format!(
                "assembled code {vin} carries check character '{}' but recomputation gives '{recomputed}'",
                vin.check_char()
            )));
        }
        Ok(vin)
    }
}

fn check_field(field: &'static str, value: &str, expected: usize) -> Result<String> {
    let actual = value.chars().count();
    if actual != expected {
        return Err(VinError::Length {
            field,
            expected,
            actual,
        });
    }

    let value = value.to_ascii_uppercase();
    for character in value.chars() {
        if FORBIDDEN.contains(&character) {
            return Err(VinError::ForbiddenCharacter { field, character });
        }
        if !checksum::is_vin_char(character) {
            return Err(VinError::InvalidField {
                field,
                reason: format!("character '{character}' is not alphanumeric"),
            });
        }
    }
    Ok(value)
}

/// Assembles a VIN from raw fields in one step.
pub fn assemble(
    manufacturer_id: &str,
    descriptor: &str,
    model_year: i32,
    plant_code: &str,
    sequence: u64,
) -> Result<Vin> {
    VinFields::new(manufacturer_id, descriptor, model_year, plant_code)?.assemble(sequence)
}

/// A complete, checksummed 17-character VIN.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Vin(String);

impl Vin {
    /// Parses and fully validates a VIN, including its check character.
    /// Surrounding whitespace is dropped.
    pub fn parse(code: impl Into<String>) -> Result<Self> {
        let code = code.into().trim().to_ascii_uppercase();
        let report = validate_code(&code);
        if !report.valid {
            return Err(VinError::InvalidField {
                field: "code",
                reason: report.errors.join("; "),
            });
        }
        Ok(Self(code))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }

    /// The counter key this VIN was issued under.
    pub fn prefix(&self) -> Prefix {
        let mut key = String::with_capacity(PREFIX_LENGTH);
        key.push_str(&self.0[..CHECK_POSITION]);
        key.push_str(&self.0[CHECK_POSITION + 1..VIN_LENGTH - SEQUENCE_DIGITS]);
        Prefix(key)
    }

    pub fn check_char(&self) -> char {
        self.0.as_bytes()[CHECK_POSITION] as char
    }

    pub fn model_year(&self) -> Option<i32> {
        model_year::decode(self.0.as_bytes()[CHECK_POSITION + 1] as char)
    }

    /// The serial number embedded in the last six positions.
    pub fn sequence(&self) -> u64 {
        self.0[VIN_LENGTH - SEQUENCE_DIGITS..]
            .bytes()
            .fold(0, |acc, b| acc * 10 + u64::from(b - b'0'))
    }
}

impl Display for Vin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Vin {
    type Error = VinError;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(value)
    }
}

impl From<Vin> for String {
    fn from(value: Vin) -> Self {
        value.0
    }
}
