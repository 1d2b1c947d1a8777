//! RBAC lookups with a hard deadline.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use url::Url;

use super::acl::{AccessList, AccessPage};
use crate::config::AuthzConfig;
use crate::error::{ConfigError, RbacError};

/// Deadline for one RBAC lookup, measured from call start.
pub const DEFAULT_RBAC_DEADLINE: Duration = Duration::from_secs(15);

/// Header carrying the caller's identity to RBAC.
pub const IDENTITY_HEADER: &str = "x-rh-identity";

/// Page size requested from the `/access/` listing.
const PAGE_LIMIT: u32 = 1000;

/// Upper bound on followed `next` links, in case the service loops.
const MAX_PAGES: usize = 100;

/// Backend that returns the access list for an identity.
///
/// Implementations do not enforce the deadline themselves; [`RbacClient`]
/// wraps every call and drops the future when the deadline passes.
#[async_trait]
pub trait AccessSource: Send + Sync {
    /// Fetches every grant `identity_header` holds for `application`.
    ///
    /// # Errors
    ///
    /// Returns [`RbacError`] for transport failures, non-success statuses
    /// and undecodable responses.
    async fn fetch_access(
        &self,
        identity_header: &str,
        application: &str,
    ) -> Result<AccessList, RbacError>;
}

/// RBAC service reached over HTTP.
///
/// Holds one `reqwest::Client`, shared read-only by concurrent lookups.
#[derive(Debug, Clone)]
pub struct HttpAccessSource {
    access_url: Url,
    client: Client,
}

impl HttpAccessSource {
    /// Creates a source for the RBAC API rooted at `base_url`
    /// (e.g. `http://rbac:8080/api/rbac/v1`).
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Client`] if the HTTP client cannot be built.
    pub fn new(base_url: &Url) -> Result<Self, ConfigError> {
        let client = Client::builder()
            .build()
            .map_err(|err| ConfigError::Client(err.to_string()))?;
        Self::with_client(base_url, client)
    }

    /// Creates a source that sends requests through `client`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidRbacUrl`] if the access endpoint cannot
    /// be derived from `base_url`.
    pub fn with_client(base_url: &Url, client: Client) -> Result<Self, ConfigError> {
        let raw = format!("{}/access/", base_url.as_str().trim_end_matches('/'));
        let access_url = Url::parse(&raw).map_err(|source| ConfigError::InvalidRbacUrl {
            url: raw.clone(),
            source,
        })?;
        Ok(Self { access_url, client })
    }

    /// The listing endpoint requests are sent to.
    pub fn access_url(&self) -> &Url {
        &self.access_url
    }

    async fn fetch_page(&self, url: Url, identity_header: &str) -> Result<AccessPage, RbacError> {
        let response = self
            .client
            .get(url)
            .header(IDENTITY_HEADER, identity_header)
            .send()
            .await
            .map_err(|err| RbacError::Transport(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(RbacError::Status(status.as_u16()));
        }

        let body = response
            .bytes()
            .await
            .map_err(|err| RbacError::Transport(err.to_string()))?;
        serde_json::from_slice(&body).map_err(|err| RbacError::MalformedResponse(err.to_string()))
    }
}

#[async_trait]
impl AccessSource for HttpAccessSource {
    async fn fetch_access(
        &self,
        identity_header: &str,
        application: &str,
    ) -> Result<AccessList, RbacError> {
        let mut url = self.access_url.clone();
        url.query_pairs_mut()
            .append_pair("application", application)
            .append_pair("limit", &PAGE_LIMIT.to_string());

        let mut acl = AccessList::new();
        for _ in 0..MAX_PAGES {
            let page = self.fetch_page(url, identity_header).await?;
            let next = page.links.next.clone();
            acl.extend(page.into_grants());

            match next.filter(|next| !next.is_empty()) {
                // `next` is usually an absolute path; join handles full URLs too.
                Some(next) => {
                    url = self
                        .access_url
                        .join(&next)
                        .map_err(|err| RbacError::MalformedResponse(err.to_string()))?;
                }
                None => return Ok(acl),
            }
        }

        Err(RbacError::MalformedResponse(format!(
            "pagination exceeded {MAX_PAGES} pages"
        )))
    }
}

/// Deadline-bounded RBAC client.
///
/// Cheap to clone; clones share the underlying [`AccessSource`].
///
/// # Examples
///
/// ```no_run
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// use sources_authz::{AuthzConfig, rbac::RbacClient};
///
/// let config = AuthzConfig::new().with_rbac_url("http://rbac:8080/api/rbac/v1")?;
/// let rbac = RbacClient::from_config(&config)?;
///
/// let allowed = rbac.check_access("eyJpZGVudGl0eSI6e319", "sources", "*", "*").await?;
/// # let _ = allowed;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct RbacClient {
    source: Arc<dyn AccessSource>,
    application: String,
    deadline: Duration,
}

impl std::fmt::Debug for RbacClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RbacClient")
            .field("application", &self.application)
            .field("deadline", &self.deadline)
            .finish_non_exhaustive()
    }
}

impl RbacClient {
    /// Creates a client over `source`, identifying as `application`.
    pub fn new(source: Arc<dyn AccessSource>, application: impl Into<String>) -> Self {
        Self {
            source,
            application: application.into(),
            deadline: DEFAULT_RBAC_DEADLINE,
        }
    }

    /// Creates an HTTP-backed client from configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingRbacUrl`] if no RBAC URL is configured.
    pub fn from_config(config: &AuthzConfig) -> Result<Self, ConfigError> {
        let url = config.rbac_url().ok_or(ConfigError::MissingRbacUrl)?;
        let source = HttpAccessSource::new(url)?;
        Ok(Self::new(Arc::new(source), config.rbac_application()))
    }

    /// Overrides the lookup deadline.
    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = deadline;
        self
    }

    /// The lookup deadline.
    pub fn deadline(&self) -> Duration {
        self.deadline
    }

    /// Fetches the access list for `identity_header`.
    ///
    /// The lookup is cancelled, and its connection released, if it has not
    /// finished within the deadline.
    ///
    /// # Errors
    ///
    /// Returns [`RbacError::Timeout`] when the deadline passes, or the
    /// source's error otherwise. Nothing is retried.
    pub async fn get_access(&self, identity_header: &str) -> Result<AccessList, RbacError> {
        let lookup = self.source.fetch_access(identity_header, &self.application);
        match tokio::time::timeout(self.deadline, lookup).await {
            Ok(result) => result,
            Err(_) => {
                tracing::warn!(
                    deadline_ms = self.deadline.as_millis() as u64,
                    "rbac lookup cancelled at deadline"
                );
                Err(RbacError::Timeout(self.deadline))
            }
        }
    }

    /// Whether `identity_header` holds a grant covering the requested triple.
    ///
    /// # Errors
    ///
    /// See [`get_access`](Self::get_access). An error means "unable to
    /// authorize", never "denied".
    pub async fn check_access(
        &self,
        identity_header: &str,
        service: &str,
        resource_type: &str,
        verb: &str,
    ) -> Result<bool, RbacError> {
        let acl = self.get_access(identity_header).await?;
        let allowed = acl.is_allowed(service, resource_type, verb);
        tracing::debug!(
            grants = acl.len(),
            allowed,
            service,
            resource_type,
            verb,
            "rbac access list evaluated"
        );
        Ok(allowed)
    }
}
