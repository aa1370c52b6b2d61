//! Field checks shared by the content models. Each returns a `VALIDATION_ERROR` naming the field.

use crate::errors::{Error, Result};

/// Non-blank and at most `max` characters
pub fn validate_required(field: &str, value: &str, max: usize) -> Result<()> {
    if value.trim().is_empty() {
        return Err(Error::BadRequest {
            message: format!("{field} is required"),
        });
    }
    validate_max(field, value, max)
}

pub fn validate_max(field: &str, value: &str, max: usize) -> Result<()> {
    if value.chars().count() > max {
        return Err(Error::BadRequest {
            message: format!("{field} must be at most {max} characters"),
        });
    }
    Ok(())
}

/// Lowercase ASCII letters, digits and single hyphens, at most `max` characters
pub fn validate_slug(slug: &str, max: usize) -> Result<()> {
    validate_required("slug", slug, max)?;
    let well_formed = slug.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
        && !slug.starts_with('-')
        && !slug.ends_with('-')
        && !slug.contains("--");
    if !well_formed {
        return Err(Error::BadRequest {
            message: "slug may only contain lowercase letters, digits and single hyphens".to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugs() {
        assert!(validate_slug("rust-2024", 255).is_ok());
        assert!(validate_slug("", 255).is_err());
        assert!(validate_slug("Has Caps", 255).is_err());
        assert!(validate_slug("-leading", 255).is_err());
        assert!(validate_slug("double--hyphen", 255).is_err());
        assert!(validate_slug("abcdef", 5).is_err());
    }

    #[test]
    fn test_required_text() {
        assert_eq!(validate_required("title", "  ", 10).unwrap_err().user_message(), "title is required");
        assert!(validate_required("title", "ok", 10).is_ok());
        assert!(validate_max("excerpt", &"x".repeat(11), 10).is_err());
    }
}
