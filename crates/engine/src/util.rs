//! Internal helpers for name and text normalization.
//!
//! These utilities are **not** part of the public API.

use unicode_normalization::{UnicodeNormalization, char::is_combining_mark};

use crate::{EngineError, ResultEngine};

/// Trim and collapse inner whitespace of a user-facing name.
pub(crate) fn normalize_display_name(input: &str, label: &str) -> ResultEngine<String> {
    let collapsed = input.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.is_empty() {
        return Err(EngineError::InvalidName(format!(
            "{label} name must not be empty"
        )));
    }
    Ok(collapsed)
}

/// Lookup key for a name: lowercase, accents stripped, punctuation folded
/// into single spaces.
pub(crate) fn normalize_name_key(input: &str) -> ResultEngine<String> {
    let mut out = String::new();
    let mut prev_space = false;
    for ch in input.trim().nfkd() {
        if is_combining_mark(ch) {
            continue;
        }
        if ch.is_alphanumeric() {
            out.extend(ch.to_lowercase());
            prev_space = false;
        } else if !out.is_empty() && !prev_space {
            out.push(' ');
            prev_space = true;
        }
    }
    let key = out.trim_end().to_string();
    if key.is_empty() {
        return Err(EngineError::InvalidName(
            "name must contain letters or digits".to_string(),
        ));
    }
    Ok(key)
}

/// Emails are compared lowercased.
pub(crate) fn normalize_email(input: &str) -> ResultEngine<String> {
    let email = input.trim().to_lowercase();
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && domain.contains('.') => Ok(email),
        _ => Err(EngineError::InvalidValue(format!("invalid email: {input}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_name_collapses_whitespace() {
        assert_eq!(
            normalize_display_name("  Eating   out ", "category").unwrap(),
            "Eating out"
        );
        assert!(normalize_display_name("   ", "category").is_err());
    }

    #[test]
    fn name_key_folds_case_and_accents() {
        assert_eq!(normalize_name_key("Café  Crème").unwrap(), "cafe creme");
        assert_eq!(normalize_name_key("Rent/Mortgage").unwrap(), "rent mortgage");
        assert!(normalize_name_key("--").is_err());
    }

    #[test]
    fn email_is_lowercased() {
        assert_eq!(normalize_email(" Ada@Example.COM ").unwrap(), "ada@example.com");
        assert!(normalize_email("nobody").is_err());
    }
}
