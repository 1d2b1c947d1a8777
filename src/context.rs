//! Per-request credential context.
//!
//! Routing layers populate a [`RequestContext`] before the gate runs, either
//! through the typed builder methods or from the untyped key/value bag they
//! already keep per request ([`RequestContext::from_bag`]). The bag is
//! validated once here; a wrong-shape entry is a contract violation and
//! surfaces as [`AuthzError::MalformedContext`], never as a deny.

use std::collections::HashMap;

use serde::Deserialize;
use serde_json::Value;

use crate::error::AuthzError;
use crate::identity::Identity;
use crate::secret::Secret;

/// Bag key for the presented pre-shared key.
pub const PSK_KEY: &str = "psk";
/// Bag key for the parsed identity document.
pub const IDENTITY_KEY: &str = "identity";
/// Bag key for the raw identity header.
pub const IDENTITY_HEADER_KEY: &str = "x-rh-identity";
/// Bag key for the request correlation id.
pub const REQUEST_ID_KEY: &str = "request_id";

/// Credentials attached to one inbound request.
///
/// Owned by the request and dropped with it. The gate only reads it.
///
/// # Examples
///
/// ```
/// use sources_authz::RequestContext;
///
/// let ctx = RequestContext::new()
///     .with_request_id("req-42")
///     .with_presented_key("abc");
///
/// assert!(ctx.presented_key().is_some());
/// assert!(ctx.identity().is_none());
/// ```
#[derive(Debug, Default)]
pub struct RequestContext {
    request_id: Option<String>,
    presented_key: Option<Secret<String>>,
    identity: Option<Identity>,
    raw_identity_header: Option<Secret<String>>,
}

impl RequestContext {
    /// Creates a context carrying no credentials.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a context from an untyped per-request bag.
    ///
    /// Recognised keys: `"psk"` (string), `"identity"` (identity document),
    /// `"x-rh-identity"` (string), `"request_id"` (string). Absent keys and
    /// JSON `null` both mean "not present"; other keys are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`AuthzError::MalformedContext`] if a recognised key holds a
    /// value of the wrong shape. The error names the key, never the value.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::collections::HashMap;
    /// use serde_json::json;
    /// use sources_authz::RequestContext;
    ///
    /// let mut bag = HashMap::new();
    /// bag.insert("psk".to_string(), json!(42));
    ///
    /// assert!(RequestContext::from_bag(&bag).is_err());
    /// ```
    pub fn from_bag(bag: &HashMap<String, Value>) -> Result<Self, AuthzError> {
        let identity = match present(bag, IDENTITY_KEY) {
            Some(value) => Some(
                Identity::deserialize(value)
                    .map_err(|err| AuthzError::malformed(IDENTITY_KEY, err.to_string()))?,
            ),
            None => None,
        };

        Ok(Self {
            request_id: string_entry(bag, REQUEST_ID_KEY)?,
            presented_key: string_entry(bag, PSK_KEY)?.map(Secret::new),
            identity,
            raw_identity_header: string_entry(bag, IDENTITY_HEADER_KEY)?.map(Secret::new),
        })
    }

    /// Sets the correlation id used in audit events.
    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = Some(request_id.into());
        self
    }

    /// Attaches a presented pre-shared key.
    pub fn with_presented_key(mut self, key: impl Into<Secret<String>>) -> Self {
        self.presented_key = Some(key.into());
        self
    }

    /// Attaches a parsed identity.
    pub fn with_identity(mut self, identity: Identity) -> Self {
        self.identity = Some(identity);
        self
    }

    /// Attaches the raw identity header the identity was parsed from.
    pub fn with_raw_identity_header(mut self, header: impl Into<Secret<String>>) -> Self {
        self.raw_identity_header = Some(header.into());
        self
    }

    /// Correlation id, if any.
    pub fn request_id(&self) -> Option<&str> {
        self.request_id.as_deref()
    }

    /// Presented pre-shared key, if any.
    pub fn presented_key(&self) -> Option<&Secret<String>> {
        self.presented_key.as_ref()
    }

    /// Parsed identity, if any.
    pub fn identity(&self) -> Option<&Identity> {
        self.identity.as_ref()
    }

    /// Raw identity header, if any.
    pub fn raw_identity_header(&self) -> Option<&Secret<String>> {
        self.raw_identity_header.as_ref()
    }
}

fn present<'a>(bag: &'a HashMap<String, Value>, key: &str) -> Option<&'a Value> {
    bag.get(key).filter(|v| !v.is_null())
}

fn string_entry(
    bag: &HashMap<String, Value>,
    key: &'static str,
) -> Result<Option<String>, AuthzError> {
    match present(bag, key) {
        None => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(other) => Err(AuthzError::malformed(
            key,
            format!("expected a string, found {}", kind_of(other)),
        )),
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
