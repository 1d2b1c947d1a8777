use std::collections::HashSet;
use std::fmt;

/// The configured set of trusted pre-shared keys.
///
/// Membership is exact, case-sensitive string equality.
///
/// Comparison goes through `HashSet::contains` and is not constant-time.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct TrustedKeys {
    keys: HashSet<String>,
}

impl TrustedKeys {
    /// Creates an empty key set. Every presented key fails to match.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses the comma-separated form used by `SOURCES_PSKS`.
    ///
    /// Entries are trimmed and empty entries are dropped.
    ///
    /// # Examples
    ///
    /// ```
    /// use sources_authz::TrustedKeys;
    ///
    /// let keys = TrustedKeys::from_csv("abc, xyz,,");
    /// assert_eq!(keys.len(), 2);
    /// assert!(keys.matches("xyz"));
    /// ```
    pub fn from_csv(raw: &str) -> Self {
        raw.split(',')
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .map(str::to_owned)
            .collect()
    }

    /// Returns true iff `presented` is one of the trusted keys.
    pub fn matches(&self, presented: &str) -> bool {
        self.keys.contains(presented)
    }

    /// Number of configured keys.
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Returns true if no keys are configured.
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

// Only the count is printed; the keys themselves are secrets.
impl fmt::Debug for TrustedKeys {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TrustedKeys")
            .field("len", &self.keys.len())
            .finish()
    }
}

impl<S: Into<String>> FromIterator<S> for TrustedKeys {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            keys: iter.into_iter().map(Into::into).collect(),
        }
    }
}
