//! # Formatting and Validation
//!
//! Masks and checks for Brazilian document and contact formats. Every
//! function here is pure: masks are meant to be re-applied on each
//! keystroke, so they accept partial input and truncate anything beyond
//! the maximum digit count.

use std::sync::OnceLock;

use regex::Regex;

const CPF_DIGITS: usize = 11;
const PHONE_DIGITS: usize = 11;
const CEP_DIGITS: usize = 8;

/// Strip every character that is not an ASCII digit.
pub fn clean_numbers(value: &str) -> String {
    value.chars().filter(|c| c.is_ascii_digit()).collect()
}

fn digits_up_to(value: &str, max: usize) -> String {
    let mut digits = clean_numbers(value);
    digits.truncate(max);
    digits
}

/// Progressive CPF mask: `123.456.789-01`.
pub fn format_cpf(value: &str) -> String {
    let d = digits_up_to(value, CPF_DIGITS);
    match d.len() {
        0..=3 => d,
        4..=6 => format!("{}.{}", &d[..3], &d[3..]),
        7..=9 => format!("{}.{}.{}", &d[..3], &d[3..6], &d[6..]),
        _ => format!("{}.{}.{}-{}", &d[..3], &d[3..6], &d[6..9], &d[9..]),
    }
}

/// Progressive phone mask.
///
/// Landlines (10 digits) render as `(XX) XXXX-XXXX`, mobiles (11 digits)
/// as `(XX) XXXXX-XXXX`.
pub fn format_phone(value: &str) -> String {
    let d = digits_up_to(value, PHONE_DIGITS);
    match d.len() {
        0 => d,
        1..=2 => format!("({d}"),
        3..=6 => format!("({}) {}", &d[..2], &d[2..]),
        7..=10 => format!("({}) {}-{}", &d[..2], &d[2..6], &d[6..]),
        _ => format!("({}) {}-{}", &d[..2], &d[2..7], &d[7..]),
    }
}

/// Progressive CEP (postal code) mask: `12345-678`.
pub fn format_cep(value: &str) -> String {
    let d = digits_up_to(value, CEP_DIGITS);
    if d.len() <= 5 {
        d
    } else {
        format!("{}-{}", &d[..5], &d[5..])
    }
}

/// Modulo-11 check digit over `digits`, weighting from `first_weight` down to 2.
fn check_digit(digits: &[u32], first_weight: u32) -> u32 {
    let sum: u32 = digits
        .iter()
        .zip((2..=first_weight).rev())
        .map(|(digit, weight)| digit * weight)
        .sum();
    let remainder = sum % 11;
    if remainder < 2 { 0 } else { 11 - remainder }
}

/// Validate a CPF, punctuated or not, against both check digits.
pub fn validate_cpf(value: &str) -> bool {
    let digits: Vec<u32> = value.chars().filter_map(|c| c.to_digit(10)).collect();
    if digits.len() != CPF_DIGITS {
        return false;
    }
    if digits.iter().all(|d| *d == digits[0]) {
        return false;
    }

    let first = check_digit(&digits[..9], 10);
    let second = check_digit(&digits[..10], 11);
    digits[9] == first && digits[10] == second
}

static EMAIL_RE: OnceLock<Regex> = OnceLock::new();

fn email_regex() -> &'static Regex {
    EMAIL_RE.get_or_init(|| {
        let pattern = r"^[^\s@]+@[^\s@]+\.[^\s@]+$";
        Regex::new(pattern).unwrap_or_else(|error| panic!("email regex failed to compile: {error}"))
    })
}

/// Permissive e-mail check: `local@domain.tld`, no whitespace, a single `@`.
pub fn validate_email(email: &str) -> bool {
    email_regex().is_match(email)
}

/// A phone number is valid when it carries 10 (landline) or 11 (mobile) digits.
pub fn validate_phone(value: &str) -> bool {
    matches!(clean_numbers(value).len(), 10 | 11)
}
