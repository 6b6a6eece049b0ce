//! Local credential shape checks

use crate::ProbeError;

/// Prefix every provider key carries
pub const REQUIRED_PREFIX: &str = "sk-";

/// Shortest credential considered plausible, in characters
pub const MIN_LENGTH: usize = 20;

/// Validate the shape of a credential without touching the network
pub fn check_format(credential: Option<&str>) -> Result<(), ProbeError> {
    let credential = match credential {
        Some(value) if !value.is_empty() => value,
        _ => return Err(ProbeError::MissingCredential),
    };

    if !credential.starts_with(REQUIRED_PREFIX) {
        return Err(ProbeError::InvalidPrefix {
            prefix: REQUIRED_PREFIX.to_string(),
        });
    }

    let length = credential.chars().count();
    if length < MIN_LENGTH {
        return Err(ProbeError::TooShort {
            length,
            minimum: MIN_LENGTH,
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_or_empty_credential() {
        assert_eq!(check_format(None), Err(ProbeError::MissingCredential));
        assert_eq!(check_format(Some("")), Err(ProbeError::MissingCredential));
    }

    #[test]
    fn test_prefix_is_checked_before_length() {
        for credential in ["abc", "pk-1234567890abcdefghijkl", "SK-1234567890abcdefghijkl", " sk-1234567890abcdefghij"] {
            assert!(
                matches!(check_format(Some(credential)), Err(ProbeError::InvalidPrefix { .. })),
                "{credential} should fail the prefix check"
            );
        }
    }

    #[test]
    fn test_short_credentials() {
        let err = check_format(Some("sk-short")).unwrap_err();
        assert_eq!(err, ProbeError::TooShort { length: 8, minimum: MIN_LENGTH });

        // 19 characters
        assert!(matches!(
            check_format(Some("sk-1234567890123456")),
            Err(ProbeError::TooShort { length: 19, .. })
        ));
    }

    #[test]
    fn test_boundary_length_passes() {
        // exactly 20 characters
        assert_eq!(check_format(Some("sk-12345678901234567")), Ok(()));
        assert_eq!(check_format(Some("sk-proj-abcdefghijklmnopqrstuvwxyz0123")), Ok(()));
    }
}
