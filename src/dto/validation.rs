//! Validation helpers for DTOs.

use validator::{ValidateUrl, ValidationError};

const USERNAME_MIN: usize = 3;
const USERNAME_MAX: usize = 20;

/// Validates that a username is 3 to 20 ASCII letters, digits or underscores.
///
/// # Examples
///
/// ```ignore
/// validate_username("team_01") // Ok
/// validate_username("ab")      // Err - too short
/// validate_username("bad-name") // Err - dash
/// ```
pub fn validate_username(username: &str) -> Result<(), ValidationError> {
    let len = username.chars().count();
    if !(USERNAME_MIN..=USERNAME_MAX).contains(&len) {
        let mut err = ValidationError::new("username_length");
        err.message = Some(
            format!("Username must be between {USERNAME_MIN} and {USERNAME_MAX} characters (got {len})")
                .into(),
        );
        return Err(err);
    }

    if !username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_')
    {
        let mut err = ValidationError::new("username_format");
        err.message = Some("Username may only contain letters, digits and underscores".into());
        return Err(err);
    }

    Ok(())
}

/// Validates that every image reference is an absolute `http(s)` URL.
pub fn validate_image_urls(images: &[String]) -> Result<(), ValidationError> {
    for image in images {
        let valid = (image.starts_with("http://") || image.starts_with("https://"))
            && image.validate_url();
        if !valid {
            let mut err = ValidationError::new("image_url");
            err.message = Some(format!("`{image}` is not a valid http(s) URL").into());
            return Err(err);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_username_valid() {
        assert!(validate_username("abc").is_ok());
        assert!(validate_username("Team_Alpha_2024").is_ok());
        assert!(validate_username("a_b_c_d_e_f_g_h_i_jk").is_ok()); // 20 chars
    }

    #[test]
    fn test_validate_username_invalid_length() {
        assert!(validate_username("ab").is_err());
        assert!(validate_username("abcdefghijklmnopqrstu").is_err()); // 21 chars
        assert!(validate_username("").is_err());
    }

    #[test]
    fn test_validate_username_invalid_format() {
        assert!(validate_username("bad-name").is_err());
        assert!(validate_username("with space").is_err());
        assert!(validate_username("émile").is_err());
    }

    #[test]
    fn test_validate_image_urls() {
        assert!(validate_image_urls(&[]).is_ok());
        assert!(
            validate_image_urls(&["https://cdn.example.org/q1.png".to_string()]).is_ok()
        );
        assert!(validate_image_urls(&["ftp://example.org/q1.png".to_string()]).is_err());
        assert!(validate_image_urls(&["not a url".to_string()]).is_err());
    }
}
