use std::fmt;

use crate::{
    audit::{AuditEvent, AuditOutcome, CredentialKind},
    config::AuthzConfig,
    context::RequestContext,
    error::{AuthzError, ConfigError, RbacError},
    identity::Identity,
    rbac::{RbacClient, REQUIRED_PERMISSION},
    rejection::{ErrorDocument, UNAUTHORIZED_STATUS},
    secret::Secret,
};

/// Outcome of a gate evaluation.
///
/// Internal failures are not a variant: they come back as `Err(AuthzError)`
/// from [`WriteGate::evaluate`] so they can never be mistaken for a decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// The caller may proceed
    Allow,
    /// No credential was presented
    DenyUnauthenticated,
    /// A pre-shared key was presented and is not trusted
    DenyBadPsk,
    /// The RBAC service does not grant write access to this identity
    DenyBadRbac,
}

impl Decision {
    /// Whether the request may proceed.
    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allow)
    }

    /// Fixed client-facing message for a deny; `None` for [`Decision::Allow`].
    ///
    /// Messages never include the presented credential.
    pub fn message(&self) -> Option<&'static str> {
        match self {
            Decision::Allow => None,
            Decision::DenyUnauthenticated => {
                Some("Authentication required by either [x-rh-identity] or [x-rh-sources-psk]")
            }
            Decision::DenyBadPsk => Some("Unauthorized Action: Incorrect PSK"),
            Decision::DenyBadRbac => Some("Unauthorized Action: Missing RBAC permissions"),
        }
    }

    /// The 401 body for a deny; `None` for [`Decision::Allow`].
    pub fn rejection(&self) -> Option<ErrorDocument> {
        self.message()
            .map(|msg| ErrorDocument::new(msg, UNAUTHORIZED_STATUS))
    }

    /// Stable label used in audit events.
    pub fn label(&self) -> &'static str {
        match self {
            Decision::Allow => "allow",
            Decision::DenyUnauthenticated => "deny_unauthenticated",
            Decision::DenyBadPsk => "deny_bad_psk",
            Decision::DenyBadRbac => "deny_bad_rbac",
        }
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// The credential that decides a request, in priority order.
enum Credential<'a> {
    Bypass,
    PresharedKey(&'a Secret<String>),
    Identity {
        identity: &'a Identity,
        raw_header: Option<&'a Secret<String>>,
    },
    Anonymous,
}

impl Credential<'_> {
    fn kind(&self) -> CredentialKind {
        match self {
            Credential::Bypass => CredentialKind::Bypass,
            Credential::PresharedKey(_) => CredentialKind::PresharedKey,
            Credential::Identity { identity, .. } if identity.is_system_principal() => {
                CredentialKind::SystemIdentity
            }
            Credential::Identity { .. } => CredentialKind::UserIdentity,
            Credential::Anonymous => CredentialKind::Anonymous,
        }
    }
}

/// The write-access gate.
///
/// Holds read-only configuration and the injected RBAC client. One instance
/// serves every request concurrently; share it behind `Arc`.
///
/// # Examples
///
/// ```
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// use sources_authz::{AuthzConfig, Decision, RequestContext, TrustedKeys, WriteGate};
///
/// let config = AuthzConfig::new().with_trusted_keys(TrustedKeys::from_csv("abc,xyz"));
/// let gate = WriteGate::without_rbac(config);
///
/// let ctx = RequestContext::new().with_presented_key("abc");
/// assert_eq!(gate.evaluate(&ctx).await.unwrap(), Decision::Allow);
///
/// let ctx = RequestContext::new();
/// assert_eq!(gate.evaluate(&ctx).await.unwrap(), Decision::DenyUnauthenticated);
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct WriteGate {
    config: AuthzConfig,
    rbac: Option<RbacClient>,
}

impl WriteGate {
    /// Creates a gate that consults `rbac` for user principals.
    pub fn new(config: AuthzConfig, rbac: RbacClient) -> Self {
        Self {
            config,
            rbac: Some(rbac),
        }
    }

    /// Creates a gate with no RBAC client.
    ///
    /// User principals then fail with [`RbacError::NotConfigured`]. Useful for
    /// bypass or PSK-only deployments.
    pub fn without_rbac(config: AuthzConfig) -> Self {
        Self { config, rbac: None }
    }

    /// Creates a gate with an HTTP RBAC client when an RBAC URL is configured.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the RBAC client cannot be built.
    pub fn from_config(config: AuthzConfig) -> Result<Self, ConfigError> {
        match config.rbac_url() {
            Some(_) => {
                let rbac = RbacClient::from_config(&config)?;
                Ok(Self::new(config, rbac))
            }
            None => Ok(Self::without_rbac(config)),
        }
    }

    /// The gate's configuration.
    pub fn config(&self) -> &AuthzConfig {
        &self.config
    }

    /// Decides whether the request described by `ctx` may write.
    ///
    /// Signals are checked in priority order and the first one present
    /// decides: bypass, then pre-shared key, then identity. An identity
    /// holding a system principal is allowed without an RBAC call; a user
    /// principal is checked against RBAC for `sources:*:*`.
    ///
    /// # Errors
    ///
    /// Returns [`AuthzError`] when no decision can be reached: a user
    /// identity without its raw header, or an RBAC failure or timeout.
    /// Callers must reject the request in that case.
    pub async fn evaluate(&self, ctx: &RequestContext) -> Result<Decision, AuthzError> {
        let credential = self.select_credential(ctx);
        let kind = credential.kind();
        let result = self.decide(credential).await;

        let (outcome, label) = match &result {
            Ok(decision) if decision.is_allowed() => (AuditOutcome::Allowed, decision.label()),
            Ok(decision) => (AuditOutcome::Denied, decision.label()),
            Err(_) => (AuditOutcome::Error, "internal_error"),
        };
        let mut event = AuditEvent::new(kind, outcome, label);
        if let Some(id) = ctx.request_id() {
            event = event.with_request_id(id);
        }
        if let Some(org) = ctx.identity().and_then(Identity::org_id) {
            event = event.with_org_id(org);
        }
        event.emit();

        result
    }

    fn select_credential<'a>(&self, ctx: &'a RequestContext) -> Credential<'a> {
        if self.config.bypass() {
            return Credential::Bypass;
        }
        match (ctx.presented_key(), ctx.identity()) {
            (Some(key), _) => Credential::PresharedKey(key),
            (None, Some(identity)) => Credential::Identity {
                identity,
                raw_header: ctx.raw_identity_header(),
            },
            (None, None) => Credential::Anonymous,
        }
    }

    async fn decide(&self, credential: Credential<'_>) -> Result<Decision, AuthzError> {
        match credential {
            Credential::Bypass => {
                tracing::debug!("authorization check skipped, disabled by configuration");
                Ok(Decision::Allow)
            }
            Credential::PresharedKey(key) => {
                if self.config.trusted_keys().matches(key.expose_secret()) {
                    Ok(Decision::Allow)
                } else {
                    Ok(Decision::DenyBadPsk)
                }
            }
            // System principals are trusted as-is; no RBAC round trip.
            Credential::Identity {
                identity: Identity::System(_),
                ..
            } => Ok(Decision::Allow),
            Credential::Identity {
                identity: Identity::User(_),
                raw_header,
            } => {
                let header = raw_header.ok_or(AuthzError::MissingIdentityHeader)?;
                let rbac = self.rbac.as_ref().ok_or(RbacError::NotConfigured)?;
                let (service, resource_type, verb) = REQUIRED_PERMISSION;

                let allowed = rbac
                    .check_access(header.expose_secret(), service, resource_type, verb)
                    .await?;
                if allowed {
                    Ok(Decision::Allow)
                } else {
                    Ok(Decision::DenyBadRbac)
                }
            }
            Credential::Anonymous => Ok(Decision::DenyUnauthenticated),
        }
    }
}
