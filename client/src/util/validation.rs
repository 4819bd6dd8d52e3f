//! Form validation shared by every front end.
//!
//! Checks run locally before anything is sent; a form with errors never
//! reaches the API client. Field keys follow the backend's camelCase names
//! so views can map messages straight onto inputs.

#[cfg(test)]
#[path = "validation_test.rs"]
mod validation_test;

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;

use crate::net::types::{ActivityLevel, BreedInput, BreedSize, Credentials, PostInput, RegisterRequest};

pub const PASSWORD_MIN: usize = 6;
pub const POST_TITLE_MAX: usize = 100;
pub const POST_CONTENT_MIN: usize = 10;
pub const POST_CONTENT_MAX: usize = 5000;
pub const COMMENT_MAX: usize = 1000;

const STRENGTH_LABELS: [&str; 5] = ["Very weak", "Weak", "Medium", "Strong", "Very strong"];

static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern compiles"));

static NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-ZÀ-ÿ\s-]{2,}$").expect("name pattern compiles"));

/// Field → message map. Empty means valid.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FormErrors(BTreeMap<&'static str, String>);

impl FormErrors {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `message` for `field`; the first message per field wins.
    pub fn insert(&mut self, field: &'static str, message: impl Into<String>) {
        self.0.entry(field).or_insert_with(|| message.into());
    }

    #[must_use]
    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &str)> {
        self.0.iter().map(|(field, message)| (*field, message.as_str()))
    }

    /// One line listing every message, for toasts and terminals.
    #[must_use]
    pub fn summary(&self) -> String {
        self.0.values().map(String::as_str).collect::<Vec<_>>().join("; ")
    }

    /// `Ok(())` when valid.
    ///
    /// # Errors
    ///
    /// Returns `self` when any field failed.
    pub fn into_result(self) -> Result<(), Self> {
        if self.is_valid() { Ok(()) } else { Err(self) }
    }
}

#[must_use]
pub fn validate_email(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}

#[must_use]
pub fn validate_password(password: &str) -> bool {
    password.chars().count() >= PASSWORD_MIN
}

/// Letters (accented included), spaces and hyphens, at least two of them.
#[must_use]
pub fn validate_name(name: &str) -> bool {
    NAME_RE.is_match(name)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PasswordStrength {
    /// 0 to 5.
    pub score: u8,
    /// Empty for an empty password.
    pub label: &'static str,
}

/// One point each for length ≥ 6, length ≥ 10, an uppercase letter, a digit
/// and a non-alphanumeric character.
#[must_use]
pub fn password_strength(password: &str) -> PasswordStrength {
    if password.is_empty() {
        return PasswordStrength { score: 0, label: "" };
    }
    let len = password.chars().count();
    let checks = [
        len >= 6,
        len >= 10,
        password.chars().any(|c| c.is_ascii_uppercase()),
        password.chars().any(|c| c.is_ascii_digit()),
        password.chars().any(|c| !c.is_ascii_alphanumeric()),
    ];
    let score = u8::try_from(checks.iter().filter(|passed| **passed).count()).unwrap_or(u8::MAX);
    let label = STRENGTH_LABELS[usize::from(score).min(STRENGTH_LABELS.len() - 1)];
    PasswordStrength { score, label }
}

#[must_use]
pub fn validate_register_form(form: &RegisterRequest) -> FormErrors {
    let mut errors = FormErrors::new();
    if !validate_name(&form.first_name) {
        errors.insert("firstName", "Invalid first name (at least 2 letters)");
    }
    if !validate_name(&form.last_name) {
        errors.insert("lastName", "Invalid last name (at least 2 letters)");
    }
    if !validate_email(&form.email) {
        errors.insert("email", "Invalid email");
    }
    if !validate_password(&form.password) {
        errors.insert("password", "Password too short (at least 6 characters)");
    }
    if form.password != form.confirm_password {
        errors.insert("confirmPassword", "Passwords do not match");
    }
    errors
}

#[must_use]
pub fn validate_login_form(form: &Credentials) -> FormErrors {
    let mut errors = FormErrors::new();
    if !validate_email(&form.email) {
        errors.insert("email", "Invalid email");
    }
    if form.password.is_empty() {
        errors.insert("password", "Password is required");
    }
    errors
}

/// Comma-separated tag input: trimmed, empties dropped, order kept.
#[must_use]
pub fn parse_tags(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|tag| !tag.is_empty())
        .map(str::to_owned)
        .collect()
}

/// Community post as typed into the form; `tags` is the raw comma list.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PostForm {
    pub title: String,
    pub content: String,
    pub tags: String,
}

impl PostForm {
    /// Prefill an edit form from an existing post.
    #[must_use]
    pub fn from_post(title: &str, content: &str, tags: &[String]) -> Self {
        Self { title: title.to_owned(), content: content.to_owned(), tags: tags.join(", ") }
    }

    #[must_use]
    pub fn validate(&self) -> FormErrors {
        validate_post_form(&self.title, &self.content)
    }

    #[must_use]
    pub fn to_input(&self) -> PostInput {
        PostInput {
            title: self.title.trim().to_owned(),
            content: self.content.trim().to_owned(),
            tags: parse_tags(&self.tags),
        }
    }
}

#[must_use]
pub fn validate_post_form(title: &str, content: &str) -> FormErrors {
    let mut errors = FormErrors::new();
    let title = title.trim();
    let content = content.trim();
    if title.is_empty() {
        errors.insert("title", "Title is required");
    } else if title.chars().count() > POST_TITLE_MAX {
        errors.insert("title", format!("Title must be at most {POST_TITLE_MAX} characters"));
    }
    let content_len = content.chars().count();
    if content.is_empty() {
        errors.insert("content", "Content is required");
    } else if content_len < POST_CONTENT_MIN {
        errors.insert("content", format!("Content must be at least {POST_CONTENT_MIN} characters"));
    } else if content_len > POST_CONTENT_MAX {
        errors.insert("content", format!("Content must be at most {POST_CONTENT_MAX} characters"));
    }
    errors
}

#[must_use]
pub fn validate_comment(content: &str) -> FormErrors {
    let mut errors = FormErrors::new();
    let content = content.trim();
    if content.is_empty() {
        errors.insert("content", "Comment cannot be empty");
    } else if content.chars().count() > COMMENT_MAX {
        errors.insert("content", format!("Comment must be at most {COMMENT_MAX} characters"));
    }
    errors
}

/// Admin breed record before it is written.
///
/// Reads map unrecognized enum values to `Unknown`; a write must never send
/// that placeholder back, so it is rejected here with the accepted values.
#[must_use]
pub fn validate_breed_input(input: &BreedInput) -> FormErrors {
    let mut errors = FormErrors::new();
    if input.name.trim().is_empty() {
        errors.insert("name", "Breed name is required");
    }
    if input.characteristics.size == Some(BreedSize::Unknown) {
        errors.insert("size", "Size must be small, medium or large");
    }
    if input.characteristics.activity_level == Some(ActivityLevel::Unknown) {
        errors.insert("activityLevel", "Activity level must be low, moderate, high or very-high");
    }
    errors
}
