//! Input validation utilities
//!
//! Field-level checks run in the handlers before anything reaches the
//! lifecycle engine or the database. Each validator reports a
//! caller-facing message.

use regex::Regex;
use std::sync::OnceLock;

/// Validate username: required, 6 to 32 characters, word characters only
pub fn validate_username(username: &str) -> Result<(), String> {
    if username.is_empty() {
        return Err("Username is required".to_string());
    }

    if username.len() < 6 {
        return Err("Username must be at least 6 characters long".to_string());
    }

    if username.len() > 32 {
        return Err("Username must be at most 32 characters long".to_string());
    }

    static USERNAME_REGEX: OnceLock<Regex> = OnceLock::new();
    let regex = USERNAME_REGEX
        .get_or_init(|| Regex::new(r"^[a-zA-Z0-9_]+$").expect("Failed to compile username regex"));

    if !regex.is_match(username) {
        return Err("Username can only contain letters, numbers, and underscores".to_string());
    }

    Ok(())
}

/// Validate email format
pub fn validate_email(email: &str) -> Result<(), String> {
    if email.is_empty() {
        return Err("Email is required".to_string());
    }

    if email.len() > 254 {
        return Err("Email must be at most 254 characters long".to_string());
    }

    static EMAIL_REGEX: OnceLock<Regex> = OnceLock::new();
    let regex = EMAIL_REGEX.get_or_init(|| {
        Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$")
            .expect("Failed to compile email regex")
    });

    if !regex.is_match(email) {
        return Err("Invalid email format".to_string());
    }

    Ok(())
}

/// Validate password and its confirmation
pub fn validate_password(password: &str, confirm_password: &str) -> Result<(), String> {
    if password.is_empty() {
        return Err("Password is required".to_string());
    }

    if password.len() < 6 {
        return Err("Password must be at least 6 characters long".to_string());
    }

    if password.len() > 128 {
        return Err("Password must be at most 128 characters long".to_string());
    }

    if password != confirm_password {
        return Err("Passwords must match".to_string());
    }

    Ok(())
}

/// Validate a person or book name field that only has to be present
pub fn validate_required(value: &str, field: &str) -> Result<(), String> {
    if value.trim().is_empty() {
        return Err(format!("{} is required", field));
    }
    Ok(())
}

/// Validate book author: required, at least 4 characters
pub fn validate_author(author: &str) -> Result<(), String> {
    validate_required(author, "Author")?;

    if author.trim().len() < 4 {
        return Err("Author must be at least 4 characters long".to_string());
    }

    Ok(())
}

/// Validate a lending duration preference, days in [1, 100]
pub fn validate_duration(duration: i32) -> Result<(), String> {
    if !(1..=100).contains(&duration) {
        return Err("Invalid duration value".to_string());
    }
    Ok(())
}

/// Validate a free-text search query: present and not whitespace-only.
///
/// A blank query is bad input, distinct from a query with zero matches.
pub fn validate_search_query(query: Option<&str>) -> Result<&str, String> {
    match query {
        Some(q) if !q.is_empty() && !q.chars().all(char::is_whitespace) => Ok(q),
        _ => Err("Wrong input".to_string()),
    }
}

/// Title-case a name: first letter of every word upper-cased, the rest
/// lower-cased. Applied to first/last names at registration and to authors
/// at book creation.
pub fn title_case(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut at_word_start = true;
    for c in value.chars() {
        if c.is_alphabetic() {
            if at_word_start {
                out.extend(c.to_uppercase());
            } else {
                out.extend(c.to_lowercase());
            }
            at_word_start = false;
        } else {
            out.push(c);
            at_word_start = true;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_username() {
        assert!(validate_username("juhanv").is_ok());
        assert!(validate_username("juhan_v2").is_ok());

        assert!(validate_username("").is_err());
        assert!(validate_username("juhan").is_err()); // too short
        assert!(validate_username(&"a".repeat(33)).is_err());
        assert!(validate_username("juhan v").is_err());
        assert!(validate_username("juhan-v!").is_err());
    }

    #[test]
    fn test_validate_email() {
        assert!(validate_email("juhan.viik@gmail.com").is_ok());

        assert!(validate_email("").is_err());
        assert!(validate_email("not-an-email").is_err());
        assert!(validate_email("missing@tld").is_err());
    }

    #[test]
    fn test_validate_password() {
        assert!(validate_password("123456", "123456").is_ok());

        assert!(validate_password("", "").is_err());
        assert!(validate_password("12345", "12345").is_err());
        assert!(validate_password("123456", "654321").is_err());
    }

    #[test]
    fn test_validate_author() {
        assert!(validate_author("Robert Kiyosaki").is_ok());

        assert!(validate_author("").is_err());
        assert!(validate_author("   ").is_err());
        assert!(validate_author("Bo").is_err());
    }

    #[test]
    fn test_validate_duration_range() {
        assert!(validate_duration(1).is_ok());
        assert!(validate_duration(28).is_ok());
        assert!(validate_duration(100).is_ok());

        assert!(validate_duration(0).is_err());
        assert!(validate_duration(101).is_err());
        assert!(validate_duration(-3).is_err());
    }

    #[test]
    fn test_validate_search_query() {
        // Scenario D: whitespace-only is bad input, not an empty result
        assert_eq!(validate_search_query(Some("kiyosaki")), Ok("kiyosaki"));

        assert!(validate_search_query(None).is_err());
        assert!(validate_search_query(Some("")).is_err());
        assert!(validate_search_query(Some(" ")).is_err());
        assert!(validate_search_query(Some("\t  \n")).is_err());
    }

    #[test]
    fn test_title_case() {
        assert_eq!(title_case("robert kiyosaki"), "Robert Kiyosaki");
        assert_eq!(title_case("ROBERT KIYOSAKI"), "Robert Kiyosaki");
        assert_eq!(title_case("anne-mai o'neill"), "Anne-Mai O'Neill");
        assert_eq!(title_case(""), "");
    }
}
