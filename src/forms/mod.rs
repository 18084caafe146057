//! HTML form payloads and their validation.
//!
//! Each form has an explicit `validate` that either yields the cleaned values
//! or a `FieldErrors` list to re-render the form with.

pub mod csrf;

use serde::Deserialize;
use validator::{ValidateEmail, ValidateLength};

pub const USERNAME_MIN: usize = 6;
pub const USERNAME_MAX: usize = 50;
pub const EMAIL_MIN: usize = 6;
pub const EMAIL_MAX: usize = 50;
pub const PASSWORD_MAX: usize = 80;
pub const TITLE_MAX: usize = 50;
pub const CONTENT_MAX: usize = 1000;

const REQUIRED: &str = "This field is required.";
const INVALID_EMAIL: &str = "Invalid email address.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldErrors(Vec<FieldError>);

impl FieldErrors {
    pub fn push(&mut self, field: &'static str, message: impl Into<String>) {
        self.0.push(FieldError {
            field,
            message: message.into(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn for_field(&self, field: &str) -> Vec<&str> {
        self.0
            .iter()
            .filter(|e| e.field == field)
            .map(|e| e.message.as_str())
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldError> {
        self.0.iter()
    }

    fn into_result<T>(self, value: T) -> Result<T, FieldErrors> {
        if self.is_empty() { Ok(value) } else { Err(self) }
    }

    /// Combine the CSRF outcome with a form's own validation.
    pub fn merge<T>(
        csrf: Result<(), FieldErrors>,
        form: Result<T, FieldErrors>,
    ) -> Result<T, FieldErrors> {
        match (csrf, form) {
            (Ok(()), form) => form,
            (Err(errors), Ok(_)) => Err(errors),
            (Err(mut errors), Err(more)) => {
                errors.0.extend(more.0);
                Err(errors)
            }
        }
    }
}

/// Checks one field value; validators after a failed required check are skipped.
struct Field<'a> {
    name: &'static str,
    value: &'a str,
    errors: &'a mut FieldErrors,
    stopped: bool,
}

impl<'a> Field<'a> {
    fn new(name: &'static str, value: &'a str, errors: &'a mut FieldErrors) -> Self {
        Self {
            name,
            value,
            errors,
            stopped: false,
        }
    }

    fn required(mut self) -> Self {
        if self.value.trim().is_empty() {
            self.errors.push(self.name, REQUIRED);
            self.stopped = true;
        }
        self
    }

    /// Like `required`, but whitespace counts as input. Used for passwords.
    fn present(mut self) -> Self {
        if self.value.is_empty() {
            self.errors.push(self.name, REQUIRED);
            self.stopped = true;
        }
        self
    }

    fn length(self, min: Option<usize>, max: usize) -> Self {
        if self.stopped {
            return self;
        }
        let within = self
            .value
            .validate_length(min.map(|m| m as u64), Some(max as u64), None);
        if !within {
            let message = match min {
                Some(m) => format!("Field must be between {m} and {max} characters long."),
                None => format!("Field cannot be longer than {max} characters."),
            };
            self.errors.push(self.name, message);
        }
        self
    }

    fn email(self) -> Self {
        if !self.stopped && !self.value.validate_email() {
            self.errors.push(self.name, INVALID_EMAIL);
        }
        self
    }
}

/// Registration form body.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SignupForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub csrf_token: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password: String,
}

impl SignupForm {
    pub fn validate(&self) -> Result<NewUser, FieldErrors> {
        let mut errors = FieldErrors::default();
        let username = self.username.trim();
        let email = self.email.trim();

        Field::new("username", username, &mut errors)
            .required()
            .length(Some(USERNAME_MIN), USERNAME_MAX);
        Field::new("email", email, &mut errors)
            .required()
            .length(Some(EMAIL_MIN), EMAIL_MAX)
            .email();
        Field::new("password", &self.password, &mut errors)
            .present()
            .length(None, PASSWORD_MAX);

        errors.into_result(NewUser {
            username: username.to_string(),
            email: email.to_string(),
            password: self.password.clone(),
        })
    }
}

/// Sign-in form body. `remember` is a checkbox and absent when unticked.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SigninForm {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub remember: Option<String>,
    #[serde(default)]
    pub csrf_token: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Login {
    pub email: String,
    pub password: String,
    pub remember: bool,
}

impl SigninForm {
    pub fn remember(&self) -> bool {
        match self.remember.as_deref() {
            None => false,
            Some(v) => !matches!(v.trim().to_ascii_lowercase().as_str(), "" | "false" | "0" | "off"),
        }
    }

    pub fn validate(&self) -> Result<Login, FieldErrors> {
        let mut errors = FieldErrors::default();
        let email = self.email.trim();

        Field::new("email", email, &mut errors)
            .required()
            .length(None, EMAIL_MAX)
            .email();
        Field::new("password", &self.password, &mut errors)
            .present()
            .length(None, PASSWORD_MAX);

        errors.into_result(Login {
            email: email.to_string(),
            password: self.password.clone(),
            remember: self.remember(),
        })
    }
}

/// New post form body.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewPostForm {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub csrf_token: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPost {
    pub title: String,
    pub content: String,
}

impl NewPostForm {
    pub fn validate(&self) -> Result<NewPost, FieldErrors> {
        let mut errors = FieldErrors::default();
        let title = self.title.trim();
        let content = self.content.trim();

        Field::new("title", title, &mut errors)
            .required()
            .length(None, TITLE_MAX);
        Field::new("content", content, &mut errors)
            .required()
            .length(None, CONTENT_MAX);

        errors.into_result(NewPost {
            title: title.to_string(),
            content: content.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signup(username: &str, email: &str, password: &str) -> SignupForm {
        SignupForm {
            username: username.to_string(),
            email: email.to_string(),
            password: password.to_string(),
            csrf_token: String::new(),
        }
    }

    #[test]
    fn valid_signup_is_trimmed() {
        let user = signup("  alice1 ", " alice@example.com", "password123")
            .validate()
            .unwrap();
        assert_eq!(user.username, "alice1");
        assert_eq!(user.email, "alice@example.com");
        assert_eq!(user.password, "password123");
    }

    #[test]
    fn signup_reports_every_bad_field() {
        let errors = signup("bob", "not-an-email", "").validate().unwrap_err();
        assert_eq!(
            errors.for_field("username"),
            vec!["Field must be between 6 and 50 characters long."]
        );
        assert_eq!(errors.for_field("email"), vec![INVALID_EMAIL]);
        assert_eq!(errors.for_field("password"), vec![REQUIRED]);
        assert_eq!(errors.len(), 3);
    }

    #[test]
    fn required_stops_further_checks() {
        let errors = signup("", "", "pw").validate().unwrap_err();
        assert_eq!(errors.for_field("username"), vec![REQUIRED]);
        assert_eq!(errors.for_field("email"), vec![REQUIRED]);
    }

    #[test]
    fn username_bounds_are_inclusive() {
        assert!(signup("abcdef", "a@b.co", "x").validate().is_ok());
        assert!(signup(&"a".repeat(50), "a@b.co", "x").validate().is_ok());
        assert!(signup(&"a".repeat(51), "a@b.co", "x").validate().is_err());
        assert!(signup("abcde", "a@b.co", "x").validate().is_err());
    }

    #[test]
    fn lengths_count_characters_not_bytes() {
        assert!(signup("ñandúes", "a@b.co", "x").validate().is_ok());
        let password = "é".repeat(80);
        assert!(signup("abcdef", "a@b.co", &password).validate().is_ok());
        let password = "é".repeat(81);
        let errors = signup("abcdef", "a@b.co", &password).validate().unwrap_err();
        assert_eq!(
            errors.for_field("password"),
            vec!["Field cannot be longer than 80 characters."]
        );
    }

    #[test]
    fn long_email_is_rejected() {
        let email = format!("{}@example.com", "a".repeat(40));
        let errors = signup("abcdef", &email, "x").validate().unwrap_err();
        assert_eq!(
            errors.for_field("email"),
            vec!["Field must be between 6 and 50 characters long."]
        );
    }

    #[test]
    fn email_syntax() {
        let check = |email: &str| signup("abcdef", email, "x").validate();
        for ok in ["alice@example.com", "a.b+c@sub.example.org", "x@y.io"] {
            assert!(check(ok).is_ok(), "{ok} should be valid");
        }
        for bad in [
            "alice@",
            "@example.com",
            "alice@@example.com",
            "al ice@example.com",
            "alice@-example.com",
            "alice@example..com",
            "a<b>@example.com",
            "a,b@example.com",
            "a(b)c@example.com",
            "a\"b@example.com",
            "a\\b@example.com",
        ] {
            let errors = check(bad).unwrap_err();
            assert_eq!(errors.for_field("email"), vec![INVALID_EMAIL], "{bad}");
        }
    }

    #[test]
    fn whitespace_passwords_are_kept_verbatim() {
        let user = signup("abcdef", "a@b.co", "        ").validate().unwrap();
        assert_eq!(user.password, "        ");

        let form = SigninForm {
            email: "a@b.co".to_string(),
            password: "        ".to_string(),
            ..Default::default()
        };
        assert_eq!(form.validate().unwrap().password, "        ");
    }

    #[test]
    fn signin_remember_checkbox() {
        let mut form = SigninForm {
            email: "alice@example.com".to_string(),
            password: "password123".to_string(),
            ..Default::default()
        };
        assert!(!form.validate().unwrap().remember);
        form.remember = Some("y".to_string());
        assert!(form.validate().unwrap().remember);
        form.remember = Some("false".to_string());
        assert!(!form.remember());
    }

    #[test]
    fn signin_has_no_minimum_email_length_but_checks_syntax() {
        let form = SigninForm {
            email: "a@b.co".to_string(),
            password: "p".to_string(),
            ..Default::default()
        };
        assert!(form.validate().is_ok());
        let form = SigninForm {
            email: "nope".to_string(),
            password: String::new(),
            ..Default::default()
        };
        let errors = form.validate().unwrap_err();
        assert_eq!(errors.for_field("email"), vec![INVALID_EMAIL]);
        assert_eq!(errors.for_field("password"), vec![REQUIRED]);
    }

    #[test]
    fn post_requires_non_blank_title_and_content() {
        let form = NewPostForm {
            title: "   ".to_string(),
            content: "\n".to_string(),
            csrf_token: String::new(),
        };
        let errors = form.validate().unwrap_err();
        assert_eq!(errors.for_field("title"), vec![REQUIRED]);
        assert_eq!(errors.for_field("content"), vec![REQUIRED]);

        let form = NewPostForm {
            title: "Hello".to_string(),
            content: "World".to_string(),
            csrf_token: String::new(),
        };
        assert_eq!(
            form.validate().unwrap(),
            NewPost {
                title: "Hello".to_string(),
                content: "World".to_string()
            }
        );
    }

    #[test]
    fn post_length_limits() {
        let form = NewPostForm {
            title: "t".repeat(TITLE_MAX + 1),
            content: "c".repeat(CONTENT_MAX + 1),
            csrf_token: String::new(),
        };
        let errors = form.validate().unwrap_err();
        assert_eq!(errors.len(), 2);
    }

    #[test]
    fn merge_keeps_csrf_errors_first() {
        let mut csrf = FieldErrors::default();
        csrf.push("csrf_token", "bad");
        let form: Result<(), FieldErrors> = {
            let mut e = FieldErrors::default();
            e.push("title", REQUIRED);
            Err(e)
        };
        let merged = FieldErrors::merge(Err(csrf), form).unwrap_err();
        let fields: Vec<_> = merged.iter().map(|e| e.field).collect();
        assert_eq!(fields, vec!["csrf_token", "title"]);

        assert_eq!(FieldErrors::merge(Ok(()), Ok(7)), Ok(7));
    }
}
