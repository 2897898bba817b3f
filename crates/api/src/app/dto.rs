//! Request DTOs and field validation.
//!
//! Validation mirrors the stored-record constraints: email shape, display
//! name length 3..=30, password length >= 8. Violations surface as
//! `validation_error` (HTTP 400) at the handler boundary.

use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub name: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// In-body credential channel, accepted by `GET /users/me` when the header
/// channel is absent.
#[derive(Debug, Deserialize)]
pub struct TokenBody {
    pub token: Option<String>,
}

/// Full replacement of a user's mutable fields (`PUT`).
#[derive(Debug, Deserialize)]
pub struct ModifyUserRequest {
    pub email: String,
    pub name: String,
    pub password: String,
}

/// Partial update (`PATCH`); absent fields keep their value. The secret is
/// re-hashed only when `password` is present.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateUserRequest {
    pub email: Option<String>,
    pub name: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreatePollRequest {
    pub question: String,
    pub options: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct VoteRequest {
    pub option: usize,
}

#[derive(Debug, Deserialize)]
pub struct CreateCommentRequest {
    pub body: String,
}

pub fn validate_email(email: &str) -> Result<(), String> {
    let email = email.trim();
    if email.is_empty() || !email.contains('@') || email.starts_with('@') || email.ends_with('@') {
        return Err("invalid email format".to_string());
    }
    Ok(())
}

pub fn validate_name(name: &str) -> Result<(), String> {
    let len = name.trim().chars().count();
    if !(3..=30).contains(&len) {
        return Err("name must be between 3 and 30 characters".to_string());
    }
    Ok(())
}

pub fn validate_password(password: &str) -> Result<(), String> {
    if password.chars().count() < 8 {
        return Err("password must be at least 8 characters".to_string());
    }
    Ok(())
}

pub fn validate_poll(req: &CreatePollRequest) -> Result<(), String> {
    if req.question.trim().is_empty() {
        return Err("question cannot be empty".to_string());
    }
    if !(2..=10).contains(&req.options.len()) {
        return Err("a poll needs between 2 and 10 options".to_string());
    }
    if req.options.iter().any(|o| o.trim().is_empty()) {
        return Err("options cannot be empty".to_string());
    }
    Ok(())
}

pub fn validate_comment(body: &str) -> Result<(), String> {
    let len = body.trim().chars().count();
    if len == 0 || len > 500 {
        return Err("comment must be between 1 and 500 characters".to_string());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_shape() {
        assert!(validate_email("alice@example.com").is_ok());
        assert!(validate_email("").is_err());
        assert!(validate_email("no-at-sign").is_err());
        assert!(validate_email("@example.com").is_err());
        assert!(validate_email("alice@").is_err());
    }

    #[test]
    fn name_length_bounds() {
        assert!(validate_name("Al").is_err());
        assert!(validate_name("Ali").is_ok());
        assert!(validate_name(&"x".repeat(30)).is_ok());
        assert!(validate_name(&"x".repeat(31)).is_err());
    }

    #[test]
    fn password_minimum_length() {
        assert!(validate_password("short").is_err());
        assert!(validate_password("longenough").is_ok());
    }

    #[test]
    fn poll_shape() {
        let ok = CreatePollRequest {
            question: "Tabs or spaces?".to_string(),
            options: vec!["tabs".to_string(), "spaces".to_string()],
        };
        assert!(validate_poll(&ok).is_ok());

        let one_option = CreatePollRequest {
            question: "Really?".to_string(),
            options: vec!["yes".to_string()],
        };
        assert!(validate_poll(&one_option).is_err());
    }
}
