//! Login/signup form model and client-side validation.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::OnceLock;

use regex::Regex;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormMode {
    Login,
    Signup,
}

impl FormMode {
    pub fn toggle(self) -> Self {
        match self {
            FormMode::Login => FormMode::Signup,
            FormMode::Signup => FormMode::Login,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FormMode::Login => "login",
            FormMode::Signup => "signup",
        }
    }
}

/// Form input. Never persisted and never logged.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    pub email: String,
    pub password: String,
    pub confirm_password: String,
    pub full_name: String,
}

impl Credentials {
    pub fn login(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
            ..Default::default()
        }
    }

    pub fn signup(
        full_name: impl Into<String>,
        email: impl Into<String>,
        password: impl Into<String>,
        confirm_password: impl Into<String>,
    ) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
            confirm_password: confirm_password.into(),
            full_name: full_name.into(),
        }
    }
}

// Passwords stay out of debug output.
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .field("confirm_password", &"[REDACTED]")
            .field("full_name", &self.full_name)
            .finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Field {
    FullName,
    Email,
    Password,
    ConfirmPassword,
}

impl Field {
    pub fn as_str(&self) -> &'static str {
        match self {
            Field::FullName => "full_name",
            Field::Email => "email",
            Field::Password => "password",
            Field::ConfirmPassword => "confirm_password",
        }
    }
}

/// Per-field validation messages, ordered by field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors {
    errors: BTreeMap<Field, &'static str>,
}

impl ValidationErrors {
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn get(&self, field: Field) -> Option<&'static str> {
        self.errors.get(&field).copied()
    }

    pub fn contains(&self, field: Field) -> bool {
        self.errors.contains_key(&field)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Field, &'static str)> + '_ {
        self.errors.iter().map(|(f, m)| (*f, *m))
    }

    /// Editing a field clears its message.
    pub fn clear(&mut self, field: Field) {
        self.errors.remove(&field);
    }

    fn insert(&mut self, field: Field, msg: &'static str) {
        self.errors.insert(field, msg);
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, msg) in self.iter() {
            if !first {
                write!(f, "; ")?;
            }
            write!(f, "{}: {}", field.as_str(), msg)?;
            first = false;
        }
        Ok(())
    }
}

pub const MIN_PASSWORD_LEN: usize = 6;

fn email_pattern() -> &'static Regex {
    static EMAIL: OnceLock<Regex> = OnceLock::new();
    EMAIL.get_or_init(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern"))
}

pub fn is_valid_email(email: &str) -> bool {
    email_pattern().is_match(email)
}

pub fn validate(mode: FormMode, creds: &Credentials) -> Result<(), ValidationErrors> {
    let mut errs = ValidationErrors::default();

    if creds.email.trim().is_empty() {
        errs.insert(Field::Email, "Email is required");
    } else if !is_valid_email(&creds.email) {
        errs.insert(Field::Email, "Please enter a valid email");
    }

    if creds.password.is_empty() {
        errs.insert(Field::Password, "Password is required");
    } else if creds.password.chars().count() < MIN_PASSWORD_LEN {
        errs.insert(Field::Password, "Password must be at least 6 characters");
    }

    if mode == FormMode::Signup {
        if creds.full_name.trim().is_empty() {
            errs.insert(Field::FullName, "Full name is required");
        }
        if creds.confirm_password.is_empty() {
            errs.insert(Field::ConfirmPassword, "Please confirm your password");
        } else if creds.password != creds.confirm_password {
            errs.insert(Field::ConfirmPassword, "Passwords do not match");
        }
    }

    if errs.is_empty() {
        Ok(())
    } else {
        Err(errs)
    }
}
