/// Form input and validation
///
/// Field rules that need no I/O are declared with `validator`; checks that
/// need the store (group exists, username free) run in the handlers and add
/// to the same [`FormErrors`].
use crate::error::{AppError, Result};
use actix_multipart::Multipart;
use futures_util::{StreamExt, TryStreamExt};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::num::ParseIntError;
use validator::{Validate, ValidationError, ValidationErrors};

pub const REQUIRED: &str = "This field is required.";
pub const INVALID_CHOICE: &str =
    "Select a valid choice. That choice is not one of the available choices.";
pub const INVALID_IMAGE: &str =
    "Upload a valid image. The file you uploaded was either not an image or a corrupted image.";
pub const INVALID_USERNAME: &str = "Enter a valid username. This value may contain only letters, numbers, and @/./+/-/_ characters.";
pub const USERNAME_TAKEN: &str = "A user with that username already exists.";
pub const PASSWORD_TOO_SHORT: &str =
    "This password is too short. It must contain at least 8 characters.";
pub const PASSWORD_MISMATCH: &str = "The two password fields didn't match.";
pub const BAD_CREDENTIALS: &str = "Please enter a correct username and password. Note that both fields may be case-sensitive.";

/// Errors per field plus errors about the form as a whole
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct FormErrors {
    fields: BTreeMap<String, Vec<String>>,
    non_field: Vec<String>,
}

impl FormErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.fields
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    pub fn add_non_field(&mut self, message: impl Into<String>) {
        self.non_field.push(message.into());
    }

    pub fn field(&self, field: &str) -> &[String] {
        self.fields.get(field).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn non_field(&self) -> &[String] {
        &self.non_field
    }

    pub fn has_field(&self, field: &str) -> bool {
        !self.field(field).is_empty()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty() && self.non_field.is_empty()
    }
}

impl From<ValidationErrors> for FormErrors {
    fn from(errors: ValidationErrors) -> Self {
        let mut form_errors = FormErrors::new();
        for (field, errs) in errors.field_errors() {
            for err in errs {
                let message = err
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| err.code.to_string());
                form_errors.add(&field.to_string(), message);
            }
        }
        form_errors
    }
}

/// Run the declarative rules of `form`
pub fn validate_form<T: Validate>(form: &T) -> FormErrors {
    match form.validate() {
        Ok(()) => FormErrors::new(),
        Err(errors) => errors.into(),
    }
}

fn error_with(code: &'static str, message: &'static str) -> ValidationError {
    let mut err = ValidationError::new(code);
    err.message = Some(message.into());
    err
}

fn not_blank(value: &str) -> std::result::Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(error_with("required", REQUIRED));
    }
    Ok(())
}

fn valid_username(value: &str) -> std::result::Result<(), ValidationError> {
    if value.is_empty() {
        return Err(error_with("required", REQUIRED));
    }
    let allowed = |c: char| c.is_alphanumeric() || matches!(c, '@' | '.' | '+' | '-' | '_');
    if !value.chars().all(allowed) {
        return Err(error_with("invalid", INVALID_USERNAME));
    }
    Ok(())
}

/// An uploaded file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Upload {
    pub filename: Option<String>,
    pub bytes: Vec<u8>,
}

/// Create / edit post form
#[derive(Debug, Clone, Default, Validate)]
pub struct PostForm {
    #[validate(custom(function = "not_blank"))]
    pub text: String,
    /// Raw group id; empty means no group
    pub group: String,
    pub image: Option<Upload>,
    /// Edit only: drop the current image
    pub clear_image: bool,
}

impl PostForm {
    /// Form pre-filled from an existing post
    pub fn initial(text: &str, group_id: Option<i64>) -> Self {
        Self {
            text: text.to_string(),
            group: group_id.map(|id| id.to_string()).unwrap_or_default(),
            image: None,
            clear_image: false,
        }
    }

    /// Parsed group id; empty means no group
    pub fn group_id(&self) -> std::result::Result<Option<i64>, ParseIntError> {
        let raw = self.group.trim();
        if raw.is_empty() {
            return Ok(None);
        }
        raw.parse().map(Some)
    }

    /// Read the form from a multipart body
    ///
    /// Files larger than `max_upload_bytes` are rejected as a bad request.
    pub async fn from_multipart(mut payload: Multipart, max_upload_bytes: usize) -> Result<Self> {
        let mut form = PostForm::default();

        while let Some(mut field) = payload.try_next().await? {
            let name = field.name().unwrap_or_default().to_string();
            let filename = field
                .content_disposition()
                .and_then(|cd| cd.get_filename())
                .map(str::to_string);

            let mut bytes = Vec::new();
            while let Some(chunk) = field.next().await {
                let chunk = chunk?;
                if bytes.len() + chunk.len() > max_upload_bytes {
                    return Err(AppError::BadRequest(format!(
                        "field '{}' exceeds {} bytes",
                        name, max_upload_bytes
                    )));
                }
                bytes.extend_from_slice(&chunk);
            }

            match name.as_str() {
                "text" => form.text = String::from_utf8_lossy(&bytes).into_owned(),
                "group" => form.group = String::from_utf8_lossy(&bytes).into_owned(),
                "clear_image" => form.clear_image = true,
                // Browsers send an empty part when no file was chosen
                "image" if !bytes.is_empty() => {
                    form.image = Some(Upload { filename, bytes });
                }
                _ => {}
            }
        }

        Ok(form)
    }
}

/// Comment form
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct CommentForm {
    #[serde(default)]
    #[validate(custom(function = "not_blank"))]
    pub text: String,
}

/// Account creation form
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct SignupForm {
    #[serde(default)]
    #[validate(
        length(max = 150, message = "Ensure this value has at most 150 characters."),
        custom(function = "valid_username")
    )]
    pub username: String,
    #[serde(default)]
    #[validate(length(
        min = 8,
        message = "This password is too short. It must contain at least 8 characters."
    ))]
    pub password1: String,
    #[serde(default)]
    pub password2: String,
}

impl SignupForm {
    /// Declarative rules plus the password confirmation check
    pub fn check(&self) -> FormErrors {
        let mut errors = validate_form(self);
        if self.password2.is_empty() {
            errors.add("password2", REQUIRED);
        } else if self.password1 != self.password2 {
            errors.add("password2", PASSWORD_MISMATCH);
        }
        errors
    }
}

/// Sign-in form
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct LoginForm {
    #[serde(default)]
    #[validate(custom(function = "not_blank"))]
    pub username: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "This field is required."))]
    pub password: String,
    #[serde(default)]
    pub next: Option<String>,
}

/// Only same-site absolute paths are followed after login
pub fn safe_next(next: Option<&str>) -> Option<&str> {
    next.filter(|n| n.starts_with('/') && !n.starts_with("//") && !n.contains('\\'))
}
