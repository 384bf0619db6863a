//! Login credential retrieval.
//!
//! Credentials come from a [`SecretSource`] that the pager calls exactly once
//! per session. The password is wrapped in [`Secret`], whose `Debug` and
//! `Display` output is redacted, so it cannot leak through a log field.

use std::fmt;

pub const USERNAME_VAR: &str = "RYM_USERNAME";
pub const PASSWORD_VAR: &str = "RYM_PASSWORD";

/// A value that must never be printed.
#[derive(Clone, PartialEq, Eq)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// The raw value, for handing to the login form only.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Secret(***)")
    }
}

impl fmt::Display for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("***")
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: Secret,
}

/// Supplies login credentials, or `None` when there are none to use.
pub trait SecretSource {
    fn credentials(&self) -> Option<Credentials>;
}

/// Reads credentials from two environment variables.
#[derive(Debug, Clone)]
pub struct EnvSecrets {
    username_var: String,
    password_var: String,
}

impl Default for EnvSecrets {
    fn default() -> Self {
        Self::new(USERNAME_VAR, PASSWORD_VAR)
    }
}

impl EnvSecrets {
    pub fn new(username_var: impl Into<String>, password_var: impl Into<String>) -> Self {
        Self {
            username_var: username_var.into(),
            password_var: password_var.into(),
        }
    }

    fn resolve(&self, lookup: impl Fn(&str) -> Option<String>) -> Option<Credentials> {
        let username = lookup(&self.username_var).filter(|v| !v.is_empty())?;
        let password = lookup(&self.password_var).filter(|v| !v.is_empty())?;
        Some(Credentials {
            username,
            password: Secret::new(password),
        })
    }
}

impl SecretSource for EnvSecrets {
    fn credentials(&self) -> Option<Credentials> {
        self.resolve(|name| std::env::var(name).ok())
    }
}

/// Credentials known up front.
impl SecretSource for Option<Credentials> {
    fn credentials(&self) -> Option<Credentials> {
        self.clone()
    }
}
