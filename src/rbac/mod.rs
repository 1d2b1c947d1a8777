//! Remote access-control lookups.
//!
//! [`RbacClient`] asks the RBAC service which grants an identity holds and
//! evaluates them against a `service:resource_type:verb` requirement. Each
//! lookup is bounded by [`DEFAULT_RBAC_DEADLINE`]; nothing is cached or
//! retried.

mod acl;
mod client;

pub use acl::{Access, AccessList, Permission, REQUIRED_PERMISSION, WILDCARD};
pub use client::{
    AccessSource, HttpAccessSource, RbacClient, DEFAULT_RBAC_DEADLINE, IDENTITY_HEADER,
};
