// Anti-forgery tokens
//
// 32 random bytes from the system CSPRNG, lowercase hex. Rotated on every rendered step.

use ring::rand::{SecureRandom, SystemRandom};

use crate::error::WizardError;

const TOKEN_BYTES: usize = 32;

/// Name of the form field carrying the token.
pub const TOKEN_FIELD: &str = "csrf_token";

pub fn mint_token() -> Result<String, WizardError> {
    let mut bytes = [0u8; TOKEN_BYTES];
    SystemRandom::new()
        .fill(&mut bytes)
        .map_err(|_| WizardError::configuration("system random generator unavailable"))?;
    Ok(bytes.iter().map(|b| format!("{:02x}", b)).collect())
}

/// Constant-time comparison. Missing or empty tokens never match.
pub fn verify_token(stored: Option<&str>, submitted: Option<&str>) -> bool {
    match (stored, submitted) {
        (Some(stored), Some(submitted)) if !stored.is_empty() && !submitted.is_empty() => {
            ring::constant_time::verify_slices_are_equal(stored.as_bytes(), submitted.as_bytes())
                .is_ok()
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minted_tokens_are_hex_and_unique() {
        let a = mint_token().unwrap();
        let b = mint_token().unwrap();
        assert_eq!(a.len(), TOKEN_BYTES * 2);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
        assert_ne!(a, b);
    }

    #[test]
    fn verification_rules() {
        assert!(verify_token(Some("abc"), Some("abc")));
        assert!(!verify_token(Some("abc"), Some("abd")));
        assert!(!verify_token(Some("abc"), Some("abcd")));
        assert!(!verify_token(None, Some("abc")));
        assert!(!verify_token(Some("abc"), None));
        assert!(!verify_token(Some(""), Some("")));
    }
}
