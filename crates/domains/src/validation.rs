//! Field rules shared by every entry point (API payloads, admin tools, the
//! CSV importer). Each function returns the typed error the core promises.

use chrono::{Datelike, Utc};

use crate::errors::{DomainError, DomainResult};

pub const USERNAME_MAX_LEN: usize = 150;
pub const EMAIL_MAX_LEN: usize = 254;
pub const PERSON_NAME_MAX_LEN: usize = 150;
pub const NAME_MAX_LEN: usize = 256;
pub const SLUG_MAX_LEN: usize = 50;
pub const MIN_YEAR: i32 = -3000;
pub const RESERVED_USERNAME: &str = "me";

/// Word characters plus `.`, `@`, `+` and `-`.
fn is_username_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '_' | '.' | '@' | '+' | '-')
}

pub fn validate_username(username: &str) -> DomainResult<()> {
    if username.is_empty() {
        return Err(DomainError::Validation("username must not be empty".into()));
    }
    if username == RESERVED_USERNAME {
        return Err(DomainError::ReservedUsername);
    }
    if username.chars().count() > USERNAME_MAX_LEN {
        return Err(DomainError::Validation(format!(
            "username must be at most {USERNAME_MAX_LEN} characters"
        )));
    }

    let mut offending: Vec<char> = Vec::new();
    for c in username.chars().filter(|c| !is_username_char(*c)) {
        if !offending.contains(&c) {
            offending.push(c);
        }
    }
    if offending.is_empty() {
        Ok(())
    } else {
        Err(DomainError::InvalidUsername(offending))
    }
}

pub fn validate_email(email: &str) -> DomainResult<()> {
    if email.chars().count() > EMAIL_MAX_LEN {
        return Err(DomainError::Validation(format!(
            "email must be at most {EMAIL_MAX_LEN} characters"
        )));
    }
    match email.split_once('@') {
        Some((local, domain))
            if !local.is_empty()
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !domain.contains('@')
                && !email.chars().any(char::is_whitespace) =>
        {
            Ok(())
        }
        _ => Err(DomainError::Validation(format!(
            "`{email}` is not a valid email address"
        ))),
    }
}

/// Non-empty, bounded display name (titles, categories, genres).
pub fn validate_name(value: &str) -> DomainResult<()> {
    if value.trim().is_empty() {
        return Err(DomainError::Validation("name must not be empty".into()));
    }
    if value.chars().count() > NAME_MAX_LEN {
        return Err(DomainError::Validation(format!(
            "name must be at most {NAME_MAX_LEN} characters"
        )));
    }
    Ok(())
}

/// Optional first/last name on a profile.
pub fn validate_person_name(field: &str, value: &str) -> DomainResult<()> {
    if value.chars().count() > PERSON_NAME_MAX_LEN {
        return Err(DomainError::Validation(format!(
            "{field} must be at most {PERSON_NAME_MAX_LEN} characters"
        )));
    }
    Ok(())
}

/// Slugs follow `^[-a-zA-Z0-9_]+$`.
pub fn validate_slug(slug: &str) -> DomainResult<()> {
    if slug.is_empty() || slug.len() > SLUG_MAX_LEN {
        return Err(DomainError::Validation(format!(
            "slug must be between 1 and {SLUG_MAX_LEN} characters"
        )));
    }
    if let Some(bad) = slug
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || *c == '-' || *c == '_'))
    {
        return Err(DomainError::Validation(format!(
            "slug contains forbidden character '{bad}'"
        )));
    }
    Ok(())
}

pub fn validate_year(year: i32) -> DomainResult<()> {
    validate_year_at(year, Utc::now().year())
}

/// Same as [`validate_year`] with an explicit upper bound.
pub fn validate_year_at(year: i32, current_year: i32) -> DomainResult<()> {
    if (MIN_YEAR..=current_year).contains(&year) {
        Ok(())
    } else {
        Err(DomainError::Validation(format!(
            "year must be between {MIN_YEAR} and {current_year}, got {year}"
        )))
    }
}

/// Review and comment bodies must carry some text.
pub fn validate_text(text: &str) -> DomainResult<()> {
    if text.trim().is_empty() {
        Err(DomainError::Validation("text must not be empty".into()))
    } else {
        Ok(())
    }
}
