//! Parsed caller identities and the system-principal classifier.
//!
//! Identities arrive already parsed by an upstream layer. The gate never
//! mutates them; it only asks which kind of principal is present.

use serde::Deserialize;

/// A parsed caller identity.
///
/// Exactly one variant is active. Deserializing from the identity document
/// (`{"identity": {...}}`) selects [`Identity::System`] whenever the
/// `identity.system` object is present, and [`Identity::User`] otherwise.
///
/// # Examples
///
/// ```
/// use sources_authz::Identity;
///
/// let doc = serde_json::json!({
///     "identity": {
///         "org_id": "12345",
///         "type": "System",
///         "system": { "cn": "satellite-01", "cert_type": "satellite" }
///     }
/// });
///
/// let identity: Identity = serde_json::from_value(doc).unwrap();
/// assert!(identity.is_system_principal());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "IdentityDocument")]
pub enum Identity {
    /// A trusted machine or service actor
    System(SystemPrincipal),
    /// A human user acting within an organization
    User(UserPrincipal),
}

/// Machine-to-machine principal.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SystemPrincipal {
    /// Tenant the system belongs to
    pub org_id: Option<String>,
    /// Certificate common name
    pub common_name: Option<String>,
    /// Certificate type (e.g. `system`, `satellite`)
    pub cert_type: Option<String>,
    /// Cluster identifier, for cluster-bound systems
    pub cluster_id: Option<String>,
}

/// Human or organization principal.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserPrincipal {
    /// Tenant the user acts within
    pub org_id: Option<String>,
    /// Legacy account number
    pub account_number: Option<String>,
    /// Login name
    pub username: Option<String>,
    /// Whether the user administers the organization
    pub is_org_admin: bool,
}

impl Identity {
    /// Returns true iff this identity carries a system principal.
    pub fn is_system_principal(&self) -> bool {
        matches!(self, Identity::System(_))
    }

    /// Tenant of the principal, if the upstream document carried one.
    pub fn org_id(&self) -> Option<&str> {
        match self {
            Identity::System(system) => system.org_id.as_deref(),
            Identity::User(user) => user.org_id.as_deref(),
        }
    }
}

/// Returns true iff `identity` carries a system principal.
pub fn is_system_principal(identity: &Identity) -> bool {
    identity.is_system_principal()
}

// Wire shape of the parsed identity document. Unknown fields are ignored.
#[derive(Deserialize)]
struct IdentityDocument {
    identity: IdentityBody,
}

#[derive(Deserialize)]
struct IdentityBody {
    #[serde(default)]
    org_id: Option<String>,
    #[serde(default)]
    account_number: Option<String>,
    #[serde(default)]
    internal: Option<InternalBody>,
    #[serde(default)]
    user: Option<UserBody>,
    #[serde(default)]
    system: Option<SystemBody>,
}

#[derive(Deserialize)]
struct InternalBody {
    #[serde(default)]
    org_id: Option<String>,
}

#[derive(Deserialize)]
struct UserBody {
    #[serde(default)]
    username: Option<String>,
    #[serde(default)]
    is_org_admin: bool,
}

#[derive(Deserialize)]
struct SystemBody {
    #[serde(default)]
    cn: Option<String>,
    #[serde(default)]
    cert_type: Option<String>,
    #[serde(default)]
    cluster_id: Option<String>,
}

impl From<IdentityDocument> for Identity {
    fn from(doc: IdentityDocument) -> Self {
        let body = doc.identity;
        // Older documents only carry the tenant under `internal`.
        let org_id = body
            .org_id
            .filter(|id| !id.is_empty())
            .or_else(|| body.internal.and_then(|internal| internal.org_id));

        match body.system {
            Some(system) => Identity::System(SystemPrincipal {
                org_id,
                common_name: system.cn,
                cert_type: system.cert_type,
                cluster_id: system.cluster_id,
            }),
            None => {
                let user = body.user;
                Identity::User(UserPrincipal {
                    org_id,
                    account_number: body.account_number,
                    username: user.as_ref().and_then(|u| u.username.clone()),
                    is_org_admin: user.is_some_and(|u| u.is_org_admin),
                })
            }
        }
    }
}
