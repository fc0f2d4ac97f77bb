// src/utils/validation.rs

use std::borrow::Cow;
use std::sync::LazyLock;

use regex::Regex;
use validator::ValidationError;

use crate::config::{COMMENT_MAX_CHARS, NICKNAME_MAX_CHARS, POST_CONTENT_MAX_CHARS, TITLE_MAX_CHARS};

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").expect("valid email regex")
});

static PASSWORD_CHARSET_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z\d@$!%*?&]{8,20}$").expect("valid password regex"));

const PASSWORD_SYMBOLS: &str = "@$!%*?&";

/// The form user text is stored in: trimmed, with CRLF collapsed to LF.
pub fn normalize_text(value: &str) -> String {
    value.trim().replace("\r\n", "\n")
}

/// Number of characters of the normalized text.
/// Counts Unicode scalar values, so multi-byte text is measured correctly.
pub fn char_length(value: &str) -> usize {
    normalize_text(value).chars().count()
}

fn error(code: &'static str, message: &'static str) -> ValidationError {
    ValidationError::new(code).with_message(Cow::Borrowed(message))
}

fn bounded_text(
    value: &str,
    max: usize,
    code: &'static str,
    message: &'static str,
) -> Result<(), ValidationError> {
    let len = char_length(value);
    if len == 0 || len > max {
        return Err(error(code, message));
    }
    Ok(())
}

pub fn validate_title(title: &str) -> Result<(), ValidationError> {
    bounded_text(
        title,
        TITLE_MAX_CHARS,
        "title",
        "Title must be between 1 and 26 characters",
    )
}

pub fn validate_post_content(content: &str) -> Result<(), ValidationError> {
    bounded_text(
        content,
        POST_CONTENT_MAX_CHARS,
        "content",
        "Content must be between 1 and 500 characters",
    )
}

pub fn validate_comment(content: &str) -> Result<(), ValidationError> {
    bounded_text(
        content,
        COMMENT_MAX_CHARS,
        "comment",
        "Comment must be between 1 and 300 characters",
    )
}

pub fn validate_email(email: &str) -> Result<(), ValidationError> {
    if EMAIL_RE.is_match(email.trim()) {
        Ok(())
    } else {
        Err(error("email", "Email address is not valid"))
    }
}

/// 8-20 characters with at least one lowercase, uppercase, digit and symbol (`@$!%*?&`).
/// Checked exactly as sent: surrounding spaces are outside the charset and rejected.
pub fn validate_password(password: &str) -> Result<(), ValidationError> {
    let valid = PASSWORD_CHARSET_RE.is_match(password)
        && password.chars().any(|c| c.is_ascii_lowercase())
        && password.chars().any(|c| c.is_ascii_uppercase())
        && password.chars().any(|c| c.is_ascii_digit())
        && password.chars().any(|c| PASSWORD_SYMBOLS.contains(c));

    if valid {
        Ok(())
    } else {
        Err(error(
            "password",
            "Password must be 8-20 characters with upper and lower case letters, a digit and a symbol",
        ))
    }
}

pub fn validate_nickname(nickname: &str) -> Result<(), ValidationError> {
    let nickname = nickname.trim();
    if nickname.is_empty()
        || nickname.chars().count() > NICKNAME_MAX_CHARS
        || nickname.chars().any(char::is_whitespace)
    {
        return Err(error(
            "nickname",
            "Nickname must be 1-10 characters without spaces",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn title_boundary_is_26_characters() {
        assert!(validate_title(&"a".repeat(26)).is_ok());
        assert!(validate_title(&"a".repeat(27)).is_err());
    }

    #[test]
    fn lengths_count_characters_not_bytes() {
        let korean = "가".repeat(26);
        assert_eq!(korean.len(), 78);
        assert!(validate_title(&korean).is_ok());
        assert!(validate_comment(&"글".repeat(300)).is_ok());
        assert!(validate_comment(&"글".repeat(301)).is_err());
    }

    #[test]
    fn blank_text_is_rejected() {
        assert!(validate_title("   ").is_err());
        assert!(validate_post_content("").is_err());
        assert!(validate_comment("\n\t").is_err());
    }

    #[test]
    fn crlf_counts_as_one_character() {
        let content = format!("{}\r\n{}", "a".repeat(249), "b".repeat(250));
        assert_eq!(char_length(&content), 500);
        assert!(validate_post_content(&content).is_ok());
    }

    #[test]
    fn normalized_text_is_what_gets_measured() {
        let padded = format!("  {}\r\n  ", "a".repeat(26));
        assert_eq!(normalize_text(&padded), "a".repeat(26));
        assert!(validate_title(&padded).is_ok());
        assert_eq!(normalize_text("a\r\nb"), "a\nb");
    }

    #[test]
    fn email_syntax() {
        assert!(validate_email("someone@example.com").is_ok());
        assert!(validate_email(" someone.else+tag@mail.example.kr ").is_ok());
        assert!(validate_email("no-at-sign.com").is_err());
        assert!(validate_email("x@y").is_err());
        assert!(validate_email("").is_err());
    }

    #[test]
    fn password_rules() {
        assert!(validate_password("Passw0rd!").is_ok());
        assert!(validate_password("Pa0!").is_err());
        assert!(validate_password("password0!").is_err());
        assert!(validate_password("PASSWORD0!").is_err());
        assert!(validate_password("Password!!").is_err());
        assert!(validate_password("Password00").is_err());
        assert!(validate_password("Passw0rd!#").is_err());
        assert!(validate_password("Passw0rd!Passw0rd!abc").is_err());
        assert!(validate_password(" Passw0rd! ").is_err());
        assert!(validate_password("Passw0rd! ").is_err());
    }

    #[test]
    fn nickname_rules() {
        assert!(validate_nickname("startup").is_ok());
        assert!(validate_nickname("열글자닉네임입니다요").is_ok());
        assert!(validate_nickname("elevenchars").is_err());
        assert!(validate_nickname("two words").is_err());
        assert!(validate_nickname("  ").is_err());
    }
}
