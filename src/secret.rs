use std::fmt;

/// A credential value that must never reach logs or response bodies.
///
/// Presented pre-shared keys and raw identity headers travel through the
/// gate wrapped in `Secret`. Formatting always prints `[REDACTED]`; the
/// value is only reachable through [`expose_secret`](Self::expose_secret).
///
/// # Examples
///
/// ```
/// use sources_authz::Secret;
///
/// let psk = Secret::new("shared-key-1".to_string());
///
/// assert_eq!(format!("{:?}", psk), "[REDACTED]");
/// assert_eq!(psk.to_string(), "[REDACTED]");
/// assert_eq!(psk.expose_secret(), "shared-key-1");
/// ```
// Do NOT derive Clone, Copy or Default: credentials should not be duplicated
// casually. Share a context behind `Arc` instead.
pub struct Secret<T> {
    // Must stay private, otherwise redaction is trivially bypassed.
    inner: T,
}

impl<T> Secret<T> {
    /// Wraps a credential.
    pub fn new(value: T) -> Self {
        Self { inner: value }
    }

    /// Returns the raw credential.
    ///
    /// Callers must not log or echo the returned value.
    pub fn expose_secret(&self) -> &T {
        &self.inner
    }
}

impl From<String> for Secret<String> {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl From<&str> for Secret<String> {
    fn from(value: &str) -> Self {
        Self::new(value.to_owned())
    }
}

impl<T> fmt::Debug for Secret<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}

impl<T> fmt::Display for Secret<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}
