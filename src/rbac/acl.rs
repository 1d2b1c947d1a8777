//! Access lists returned by the RBAC service and their evaluation.

use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

use crate::error::RbacError;

/// Wildcard field value in a permission.
pub const WILDCARD: &str = "*";

/// A `service:resource_type:verb` permission triple.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Permission {
    service: String,
    resource_type: String,
    verb: String,
}

/// The permission a caller needs to write through this API.
pub const REQUIRED_PERMISSION: (&str, &str, &str) = ("sources", WILDCARD, WILDCARD);

impl Permission {
    /// Creates a permission from its three fields.
    pub fn new(
        service: impl Into<String>,
        resource_type: impl Into<String>,
        verb: impl Into<String>,
    ) -> Self {
        Self {
            service: service.into(),
            resource_type: resource_type.into(),
            verb: verb.into(),
        }
    }

    /// Service (application) the permission applies to.
    pub fn service(&self) -> &str {
        &self.service
    }

    /// Resource type, or `*`.
    pub fn resource_type(&self) -> &str {
        &self.resource_type
    }

    /// Verb, or `*`.
    pub fn verb(&self) -> &str {
        &self.verb
    }

    /// Whether this grant covers the requested triple.
    ///
    /// The service must match exactly. A `*` in the grant's resource type or
    /// verb matches any requested value; otherwise the field must be equal.
    /// A `*` in the request is matched literally, so only a wildcard grant
    /// satisfies it.
    ///
    /// # Examples
    ///
    /// ```
    /// use sources_authz::rbac::Permission;
    ///
    /// let grant: Permission = "sources:*:*".parse().unwrap();
    /// assert!(grant.grants("sources", "*", "*"));
    /// assert!(grant.grants("sources", "endpoint", "write"));
    ///
    /// let narrow: Permission = "sources:source:write".parse().unwrap();
    /// assert!(!narrow.grants("sources", "*", "*"));
    /// ```
    pub fn grants(&self, service: &str, resource_type: &str, verb: &str) -> bool {
        self.service == service
            && field_matches(&self.resource_type, resource_type)
            && field_matches(&self.verb, verb)
    }
}

fn field_matches(granted: &str, requested: &str) -> bool {
    granted == WILDCARD || granted == requested
}

/// Parses `service:resource_type:verb`.
///
/// Exactly three fields are required and the service must be non-empty.
/// An empty resource type or verb is kept as a literal value, so it only
/// matches an equally empty request field.
impl FromStr for Permission {
    type Err = RbacError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.split(':');
        match (parts.next(), parts.next(), parts.next(), parts.next()) {
            (Some(service), Some(resource), Some(verb), None) if !service.is_empty() => {
                Ok(Self::new(service, resource, verb))
            }
            _ => Err(RbacError::InvalidPermission(s.to_string())),
        }
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.service, self.resource_type, self.verb)
    }
}

/// One entry of an access list.
///
/// Resource definitions (attribute filters) are kept as returned but do not
/// take part in the write decision.
#[derive(Debug, Clone, PartialEq)]
pub struct Access {
    /// Granted permission
    pub permission: Permission,
    /// Attribute filters attached to the grant
    pub resource_definitions: Vec<serde_json::Value>,
}

impl Access {
    /// A grant with no resource definitions.
    pub fn new(permission: Permission) -> Self {
        Self {
            permission,
            resource_definitions: Vec::new(),
        }
    }
}

/// Grants returned for one identity.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AccessList {
    entries: Vec<Access>,
}

impl AccessList {
    /// Creates an empty list, which allows nothing.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a grant.
    pub fn push(&mut self, access: Access) {
        self.entries.push(access);
    }

    /// Whether any grant covers the requested triple.
    pub fn is_allowed(&self, service: &str, resource_type: &str, verb: &str) -> bool {
        self.entries
            .iter()
            .any(|a| a.permission.grants(service, resource_type, verb))
    }

    /// Iterates over the grants.
    pub fn iter(&self) -> impl Iterator<Item = &Access> {
        self.entries.iter()
    }

    /// Number of grants.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the list holds no grants.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<Access> for AccessList {
    fn from_iter<I: IntoIterator<Item = Access>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

impl Extend<Access> for AccessList {
    fn extend<I: IntoIterator<Item = Access>>(&mut self, iter: I) {
        self.entries.extend(iter);
    }
}

/// One page of the `/access/` listing.
#[derive(Debug, Deserialize)]
pub(crate) struct AccessPage {
    #[serde(default)]
    pub(crate) links: PageLinks,
    pub(crate) data: Vec<AccessEntry>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct PageLinks {
    #[serde(default)]
    pub(crate) next: Option<String>,
}

impl AccessPage {
    /// Converts the page's entries into grants.
    ///
    /// Entries whose permission does not parse are dropped with a warning;
    /// they can never grant anything, and one bad entry for another
    /// application must not fail the whole lookup.
    pub(crate) fn into_grants(self) -> Vec<Access> {
        self.data
            .into_iter()
            .filter_map(|entry| match Access::try_from(entry) {
                Ok(access) => Some(access),
                Err(err) => {
                    tracing::warn!(error = %err, "skipping unparsable rbac grant");
                    None
                }
            })
            .collect()
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct AccessEntry {
    permission: String,
    #[serde(default, rename = "resourceDefinitions")]
    resource_definitions: Vec<serde_json::Value>,
}

impl TryFrom<AccessEntry> for Access {
    type Error = RbacError;

    fn try_from(entry: AccessEntry) -> Result<Self, Self::Error> {
        Ok(Self {
            permission: entry.permission.parse()?,
            resource_definitions: entry.resource_definitions,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn list(perms: &[&str]) -> AccessList {
        perms
            .iter()
            .map(|p| Access::new(p.parse().unwrap()))
            .collect()
    }

    #[test]
    fn full_wildcard_grant_allows_requirement() {
        let (service, resource, verb) = REQUIRED_PERMISSION;
        assert!(list(&["sources:*:*"]).is_allowed(service, resource, verb));
    }

    #[test]
    fn empty_list_allows_nothing() {
        assert!(!AccessList::new().is_allowed("sources", "*", "*"));
    }

    #[test]
    fn other_service_does_not_count() {
        let acl = list(&["cost-management:*:*", "inventory:*:*"]);
        assert!(!acl.is_allowed("sources", "*", "*"));
    }

    #[test]
    fn service_is_never_wildcarded() {
        assert!(!list(&["*:*:*"]).is_allowed("sources", "*", "*"));
    }

    #[test]
    fn narrow_grants_do_not_satisfy_wildcard_request() {
        let acl = list(&["sources:*:read", "sources:source:*", "sources:source:write"]);
        assert!(!acl.is_allowed("sources", "*", "*"));
    }

    #[test]
    fn wildcard_grant_fields_match_specific_requests() {
        let acl = list(&["sources:*:write"]);
        assert!(acl.is_allowed("sources", "endpoint", "write"));
        assert!(!acl.is_allowed("sources", "endpoint", "read"));
    }

    #[test]
    fn any_matching_entry_is_enough() {
        let acl = list(&["inventory:hosts:read", "sources:*:*"]);
        assert!(acl.is_allowed("sources", "*", "*"));
    }

    #[test]
    fn permission_parsing_rejects_bad_shapes() {
        for bad in ["", "sources", "sources:*", "sources:*:*:extra", ":*:*"] {
            assert!(
                matches!(bad.parse::<Permission>(), Err(RbacError::InvalidPermission(_))),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn empty_fields_are_literal() {
        let odd: Permission = "sources::*".parse().unwrap();
        assert_eq!(odd.resource_type(), "");
        assert!(!odd.grants("sources", "*", "*"));
        assert!(odd.grants("sources", "", "write"));
    }

    #[test]
    fn unparsable_entries_are_skipped() {
        let page: AccessPage = serde_json::from_value(json!({
            "data": [
                { "permission": "sources:*:*" },
                { "permission": "inventory" },
                { "permission": "sources::*" }
            ]
        }))
        .unwrap();

        let acl: AccessList = page.into_grants().into_iter().collect();
        assert_eq!(acl.len(), 2);
        assert!(acl.is_allowed("sources", "*", "*"));
    }

    #[test]
    fn page_of_only_bad_entries_allows_nothing() {
        let page: AccessPage =
            serde_json::from_value(json!({ "data": [{ "permission": "sources:*" }] })).unwrap();

        let acl: AccessList = page.into_grants().into_iter().collect();
        assert!(acl.is_empty());
        assert!(!acl.is_allowed("sources", "*", "*"));
    }

    #[test]
    fn permission_display_is_wire_form() {
        let p = Permission::new("sources", "*", "*");
        assert_eq!(p.to_string(), "sources:*:*");
    }

    #[test]
    fn page_decodes_wire_format() {
        let page: AccessPage = serde_json::from_value(json!({
            "meta": { "count": 2, "limit": 1000, "offset": 0 },
            "links": { "first": "/x", "next": null, "previous": null, "last": "/x" },
            "data": [
                { "permission": "sources:*:*", "resourceDefinitions": [] },
                {
                    "permission": "sources:source:read",
                    "resourceDefinitions": [{ "attributeFilter": { "key": "k", "value": "v", "operation": "equal" } }]
                }
            ]
        }))
        .unwrap();

        assert!(page.links.next.is_none());
        let acl: AccessList = page
            .data
            .into_iter()
            .map(Access::try_from)
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(acl.len(), 2);
        assert_eq!(acl.iter().nth(1).unwrap().resource_definitions.len(), 1);
    }

    #[test]
    fn page_without_links_has_no_next() {
        let page: AccessPage = serde_json::from_value(json!({ "data": [] })).unwrap();
        assert!(page.links.next.is_none());
        assert!(page.data.is_empty());
    }
}
