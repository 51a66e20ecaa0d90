use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::errors::AppError;

pub fn hash_password(password: &str) -> Result<String, AppError> {
    Argon2::default()
        .hash_password(password.as_bytes(), &SaltString::generate(&mut OsRng))
        .map(|hash| hash.to_string())
        .map_err(|e| {
            log::error!("Failed to hash password: {}", e);
            AppError::PasswordError(e.to_string())
        })
}

pub fn verify_password(provided: &str, stored_hash: &str) -> Result<bool, AppError> {
    let parsed =
        PasswordHash::new(stored_hash).map_err(|e| AppError::PasswordError(e.to_string()))?;
    Ok(Argon2::default()
        .verify_password(provided.as_bytes(), &parsed)
        .is_ok())
}

/// Password policy for new accounts: 12-128 chars with a digit, a letter and a symbol.
pub fn check_password_strength(password: &str) -> Result<(), AppError> {
    if password.len() < 12 {
        return Err(AppError::validation(
            "Password must be at least 12 characters long",
        ));
    }
    if password.len() > 128 {
        return Err(AppError::validation(
            "Password must be at most 128 characters long",
        ));
    }
    if !password.chars().any(|c| c.is_ascii_digit())
        || !password.chars().any(|c| c.is_alphabetic())
        || !password
            .chars()
            .any(|c| "!@#$%^&*()_+-=[]{}|;':\",.<>?/".contains(c))
    {
        return Err(AppError::validation(
            "Password must contain at least one number, one letter and one special character",
        ));
    }
    Ok(())
}

pub fn now() -> String {
    chrono::Utc::now().to_rfc3339()
}

/// Integer coercion matching what the web forms send: numbers are truncated,
/// strings keep their leading integer prefix ("12 hojas" -> 12), and anything
/// that yields no digits, or zero, falls back to `default`.
pub fn coerce_int(value: &Value, default: i64) -> i64 {
    let parsed = match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f.trunc() as i64)),
        Value::String(s) => parse_int_prefix(s),
        _ => None,
    };
    match parsed {
        Some(0) | None => default,
        Some(n) => n,
    }
}

fn parse_int_prefix(raw: &str) -> Option<i64> {
    let trimmed = raw.trim_start();
    let (negative, rest) = match trimmed.as_bytes().first() {
        Some(b'-') => (true, &trimmed[1..]),
        Some(b'+') => (false, &trimmed[1..]),
        _ => (false, trimmed),
    };
    let digits: String = rest.chars().take_while(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return None;
    }
    let magnitude = digits.parse::<i64>().ok()?;
    Some(if negative { -magnitude } else { magnitude })
}

/// Truthiness of a loosely typed flag: `true`, non-zero numbers, `"1"` and `"true"`.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => matches!(s.trim(), "1" | "true" | "TRUE" | "True"),
        _ => false,
    }
}

pub fn deserialize_truthy<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(is_truthy(&value))
}

pub fn trimmed(value: &str) -> Option<String> {
    let t = value.trim();
    if t.is_empty() {
        None
    } else {
        Some(t.to_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn coerce_int_follows_form_semantics() {
        assert_eq!(coerce_int(&json!(9), 0), 9);
        assert_eq!(coerce_int(&json!(9.8), 0), 9);
        assert_eq!(coerce_int(&json!("12"), 0), 12);
        assert_eq!(coerce_int(&json!("  7 copias"), 0), 7);
        assert_eq!(coerce_int(&json!("abc"), 0), 0);
        assert_eq!(coerce_int(&json!(null), 1), 1);
        assert_eq!(coerce_int(&json!(true), 1), 1);
        // zero is falsy, so the multiplier default wins
        assert_eq!(coerce_int(&json!(0), 1), 1);
        assert_eq!(coerce_int(&json!("-3"), 0), -3);
    }

    #[test]
    fn truthiness() {
        assert!(is_truthy(&json!(1)));
        assert!(is_truthy(&json!(true)));
        assert!(is_truthy(&json!("1")));
        assert!(!is_truthy(&json!(0)));
        assert!(!is_truthy(&json!("0")));
        assert!(!is_truthy(&json!(null)));
    }

    #[test]
    fn password_round_trip() {
        let hash = hash_password("correct horse 9!").unwrap();
        assert!(verify_password("correct horse 9!", &hash).unwrap());
        assert!(!verify_password("wrong horse 9!", &hash).unwrap());
    }

    #[test]
    fn password_policy() {
        assert!(check_password_strength("short1!").is_err());
        assert!(check_password_strength("nodigitsatall!!").is_err());
        assert!(check_password_strength("abcdefgh1234").is_err());
        assert!(check_password_strength("abcdefgh123!").is_ok());
    }
}
