use serde::{Deserialize, Serialize};

use crate::models::options::Department;
use crate::provisioning::ProvisioningError;

/// Minimum password length, counted in characters.
pub const MIN_PASSWORD_CHARS: usize = 8;

/// Profile-completion form. The password replaces the one-time link as the
/// account's login credential.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileForm {
    pub name: String,
    pub department: Department,
    pub password: String,
    pub confirm_password: String,
}

/// Accepts `local@domain` where `domain` is the institutional domain or one
/// of its subdomains, compared case-insensitively.
pub fn validate_institutional_email(email: &str, domain: &str) -> Result<(), ProvisioningError> {
    let email = email.trim();
    if email.is_empty() || email.chars().any(char::is_whitespace) {
        return Err(ProvisioningError::MalformedEmail);
    }

    let mut parts = email.split('@');
    let (Some(local), Some(host), None) = (parts.next(), parts.next(), parts.next()) else {
        return Err(ProvisioningError::MalformedEmail);
    };
    if local.is_empty() || host.split('.').any(str::is_empty) {
        return Err(ProvisioningError::MalformedEmail);
    }

    let host = host.to_ascii_lowercase();
    let domain = domain.trim_start_matches('@').to_ascii_lowercase();
    let institutional = host == domain || host.ends_with(&format!(".{domain}"));
    if !institutional {
        return Err(ProvisioningError::NonInstitutionalEmail);
    }
    Ok(())
}

/// Local checks run before any remote call.
pub fn validate_profile_form(form: &ProfileForm) -> Result<(), ProvisioningError> {
    if form.name.trim().is_empty() {
        return Err(ProvisioningError::MissingName);
    }
    if form.password.chars().count() < MIN_PASSWORD_CHARS {
        return Err(ProvisioningError::PasswordTooShort {
            min: MIN_PASSWORD_CHARS,
        });
    }
    if form.password != form.confirm_password {
        return Err(ProvisioningError::PasswordMismatch);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOMAIN: &str = "example-u.ac.jp";

    fn form(name: &str, password: &str, confirm: &str) -> ProfileForm {
        ProfileForm {
            name: name.to_string(),
            department: Department::Informatics,
            password: password.to_string(),
            confirm_password: confirm.to_string(),
        }
    }

    #[test]
    fn test_institutional_address_accepted() {
        assert!(validate_institutional_email("taro@example-u.ac.jp", DOMAIN).is_ok());
        assert!(validate_institutional_email("Taro@EXAMPLE-U.AC.JP", DOMAIN).is_ok());
        assert!(validate_institutional_email("s2301@stu.example-u.ac.jp", DOMAIN).is_ok());
    }

    #[test]
    fn test_other_domains_rejected() {
        for email in [
            "taro@gmail.com",
            "taro@example-u.ac.jp.evil.com",
            "taro@notexample-u.ac.jp",
        ] {
            assert!(
                matches!(
                    validate_institutional_email(email, DOMAIN),
                    Err(ProvisioningError::NonInstitutionalEmail)
                ),
                "{email} must be rejected"
            );
        }
    }

    #[test]
    fn test_malformed_addresses_rejected() {
        for email in [
            "",
            "example-u.ac.jp",
            "@example-u.ac.jp",
            "a@b@example-u.ac.jp",
            "ta ro@example-u.ac.jp",
            "taro@",
            "taro@stu..example-u.ac.jp",
            "taro@.example-u.ac.jp",
        ] {
            assert!(
                matches!(
                    validate_institutional_email(email, DOMAIN),
                    Err(ProvisioningError::MalformedEmail)
                ),
                "{email:?} must be malformed"
            );
        }
    }

    #[test]
    fn test_short_password_rejected() {
        let err = validate_profile_form(&form("山田", "short7!", "short7!")).unwrap_err();
        assert!(matches!(err, ProvisioningError::PasswordTooShort { min: 8 }));
    }

    #[test]
    fn test_password_length_counts_characters() {
        // 8 multibyte characters are long enough even though they are 24 bytes.
        assert!(validate_profile_form(&form("山田", "ぱすわーどです", "ぱすわーどです")).is_err());
        assert!(validate_profile_form(&form("山田", "ぱすわーどですよ", "ぱすわーどですよ")).is_ok());
    }

    #[test]
    fn test_mismatched_confirmation_rejected() {
        let err = validate_profile_form(&form("山田", "password1", "password2")).unwrap_err();
        assert!(matches!(err, ProvisioningError::PasswordMismatch));
    }

    #[test]
    fn test_blank_name_rejected() {
        let err = validate_profile_form(&form("  ", "password1", "password1")).unwrap_err();
        assert!(matches!(err, ProvisioningError::MissingName));
    }
}
