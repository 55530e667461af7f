//! String wrapper for credentials such as database connection strings.
//!
//! The contents are zeroed on drop and never printed by `Debug` or
//! `Display`.

use std::fmt;

use zeroize::Zeroizing;

/// A credential-bearing string that zeroes its memory on drop and is
/// redacted in all formatted output.
#[derive(Clone)]
pub struct SecretString(Zeroizing<String>);

impl SecretString {
    #[must_use]
    pub fn new(s: String) -> Self {
        Self(Zeroizing::new(s))
    }

    /// Exposes the secret. Do not log the returned value.
    #[must_use]
    pub fn expose_secret(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for SecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SecretString(<redacted>)")
    }
}

impl fmt::Display for SecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("<redacted>")
    }
}

impl From<String> for SecretString {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<&str> for SecretString {
    fn from(s: &str) -> Self {
        Self::new(s.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formatting_never_shows_contents() {
        let secret = SecretString::from("postgres://app:hunter2@db/orders");
        assert!(!format!("{secret:?}").contains("hunter2"));
        assert_eq!(secret.to_string(), "<redacted>");
    }

    #[test]
    fn expose_returns_original() {
        let secret = SecretString::new("s3cret".to_string());
        assert_eq!(secret.expose_secret(), "s3cret");
    }
}
