//! Write-access gate for the sources API.
//!
//! Before a create, update or delete is dispatched, [`WriteGate`] decides
//! whether the caller may proceed. Three independent signals are consulted
//! in a fixed priority order, and the first one present decides:
//!
//! 1. **Bypass**: a configuration switch that allows everything.
//! 2. **Pre-shared key**: allowed iff the key is in the trusted set.
//! 3. **Identity**: system principals are allowed outright; user principals
//!    are looked up in RBAC and need the `sources:*:*` permission.
//!
//! With none of these present the request is unauthenticated.
//!
//! # Core Types
//!
//! - [`AuthzConfig`]: process-wide, read-only configuration
//! - [`RequestContext`]: credentials attached to one request
//! - [`Identity`]: parsed caller identity (system or user principal)
//! - [`TrustedKeys`]: the pre-shared key matcher
//! - [`rbac::RbacClient`]: deadline-bounded access-list lookups
//! - [`WriteGate`] / [`Decision`]: the decision engine and its outcome
//! - [`web::require_write_access`]: `axum` middleware
//!
//! # Examples
//!
//! ```
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! use sources_authz::{AuthzConfig, Decision, RequestContext, TrustedKeys, WriteGate};
//!
//! let config = AuthzConfig::new().with_trusted_keys(TrustedKeys::from_csv("abc"));
//! let gate = WriteGate::without_rbac(config);
//!
//! let ctx = RequestContext::new().with_presented_key("zzz");
//! let decision = gate.evaluate(&ctx).await.unwrap();
//!
//! assert_eq!(decision, Decision::DenyBadPsk);
//! assert_eq!(decision.rejection().unwrap().errors[0].status, "401");
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod audit;
mod config;
mod context;
mod error;
mod gate;
mod identity;
mod psk;
pub mod rbac;
mod rejection;
mod secret;
pub mod web;

pub use config::{
    AuthzConfig, DEFAULT_RBAC_APPLICATION, ENV_BYPASS, ENV_PSKS, ENV_RBAC_APPLICATION,
    ENV_RBAC_URL,
};
pub use context::{RequestContext, IDENTITY_HEADER_KEY, IDENTITY_KEY, PSK_KEY, REQUEST_ID_KEY};
pub use error::{AuthzError, ConfigError, RbacError};
pub use gate::{Decision, WriteGate};
pub use identity::{is_system_principal, Identity, SystemPrincipal, UserPrincipal};
pub use psk::TrustedKeys;
pub use rejection::{ErrorDocument, ErrorEntry};
pub use secret::Secret;
