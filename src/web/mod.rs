//! HTTP integration surface.
//!
//! The gate itself is framework-free; this module wires it into `axum`.
//! Upstream layers parse credentials into a [`RequestContext`] and store it
//! with [`attach_context`]; [`require_write_access`] then decides.
//!
//! # Example Flow
//!
//! ```ignore
//! // In the layer that parses identity headers:
//! let ctx = RequestContext::new()
//!     .with_request_id(request_id)
//!     .with_identity(parsed)
//!     .with_raw_identity_header(raw);
//! attach_context(&mut request, ctx);
//!
//! // On the write routes:
//! router.layer(middleware::from_fn_with_state(gate, require_write_access))
//! ```
//!
//! [`RequestContext`]: crate::RequestContext

mod middleware;

pub use middleware::{attach_context, deny_response, error_response, require_write_access};
