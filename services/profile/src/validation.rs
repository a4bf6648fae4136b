//! Input validation for registration fields
//!
//! Every check runs even after an earlier one fails so the caller can report
//! all problems with a field at once.

use regex::Regex;
use std::sync::OnceLock;

pub const PHONE_NOT_NUMERIC: &str = "phone number must be numeric";
pub const PHONE_BAD_LENGTH: &str = "phone number must be 10-13 digits";
pub const PHONE_BAD_PREFIX: &str = "phone number must start with 62";
pub const FULL_NAME_BAD_LENGTH: &str = "full name must be 3-60 characters";
pub const PASSWORD_BAD_LENGTH: &str = "password must be 6-64 characters";
pub const PASSWORD_BAD_COMPOSITION: &str =
    "password must contain at least 1 uppercase letter, 1 number, and 1 special character";

const PHONE_PREFIX: &str = "62";
const PASSWORD_SPECIAL_CHARS: &[char] = &['!', '@', '#', '$', '%', '^', '&'];

/// Messages for every rule a value broke
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Validation {
    pub messages: Vec<String>,
}

impl Validation {
    pub fn is_valid(&self) -> bool {
        self.messages.is_empty()
    }

    fn reject(&mut self, message: &str) {
        self.messages.push(message.to_string());
    }
}

/// Field rules applied before a user is registered
pub trait Validator: Send + Sync {
    fn validate_phone_number(&self, phone_number: &str) -> Validation;
    fn validate_full_name(&self, full_name: &str) -> Validation;
    fn validate_password(&self, password: &str) -> Validation;
}

/// Validator implementing the registration rules
#[derive(Debug, Clone, Copy, Default)]
pub struct FieldValidator;

impl Validator for FieldValidator {
    fn validate_phone_number(&self, phone_number: &str) -> Validation {
        validate_phone_number(phone_number)
    }

    fn validate_full_name(&self, full_name: &str) -> Validation {
        validate_full_name(full_name)
    }

    fn validate_password(&self, password: &str) -> Validation {
        validate_password(password)
    }
}

/// Validate phone number
pub fn validate_phone_number(phone_number: &str) -> Validation {
    let mut result = Validation::default();

    static NUMERIC_REGEX: OnceLock<Regex> = OnceLock::new();
    let regex = NUMERIC_REGEX
        .get_or_init(|| Regex::new(r"^[0-9]*$").expect("Failed to compile phone number regex"));

    if !regex.is_match(phone_number) {
        result.reject(PHONE_NOT_NUMERIC);
    }

    let length = phone_number.chars().count();
    if !(10..=13).contains(&length) {
        result.reject(PHONE_BAD_LENGTH);
    }

    if !phone_number.starts_with(PHONE_PREFIX) {
        result.reject(PHONE_BAD_PREFIX);
    }

    result
}

/// Validate full name
pub fn validate_full_name(full_name: &str) -> Validation {
    let mut result = Validation::default();

    let length = full_name.chars().count();
    if !(3..=60).contains(&length) {
        result.reject(FULL_NAME_BAD_LENGTH);
    }

    result
}

/// Validate password
///
/// Length is measured in bytes so an accepted password always fits the
/// hasher's input limit.
pub fn validate_password(password: &str) -> Validation {
    let mut result = Validation::default();

    if !(6..=64).contains(&password.len()) {
        result.reject(PASSWORD_BAD_LENGTH);
    }

    let mut has_upper = false;
    let mut has_digit = false;
    let mut has_special = false;

    for c in password.chars() {
        if c.is_ascii_uppercase() {
            has_upper = true;
        } else if c.is_ascii_digit() {
            has_digit = true;
        } else if PASSWORD_SPECIAL_CHARS.contains(&c) {
            has_special = true;
        }
    }

    if !(has_upper && has_digit && has_special) {
        result.reject(PASSWORD_BAD_COMPOSITION);
    }

    result
}
