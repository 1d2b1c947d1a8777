//! End-to-end decision scenarios for the write gate.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use sources_authz::{
    rbac::{Access, AccessList, AccessSource, Permission, RbacClient},
    AuthzConfig, AuthzError, Decision, Identity, RbacError, RequestContext, SystemPrincipal,
    TrustedKeys, UserPrincipal, WriteGate,
};

/// RBAC stand-in that returns a fixed list and counts calls.
struct CountingSource {
    acl: AccessList,
    calls: AtomicUsize,
}

impl CountingSource {
    fn granting(perms: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            acl: perms
                .iter()
                .map(|p| Access::new(p.parse::<Permission>().unwrap()))
                .collect(),
            calls: AtomicUsize::new(0),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AccessSource for CountingSource {
    async fn fetch_access(&self, header: &str, application: &str) -> Result<AccessList, RbacError> {
        assert_eq!(application, "sources");
        assert_eq!(header, "h1");
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.acl.clone())
    }
}

/// RBAC stand-in that never answers; records when its call is dropped.
struct StalledSource {
    cancelled: Arc<AtomicBool>,
}

struct CancelFlag(Arc<AtomicBool>);

impl Drop for CancelFlag {
    fn drop(&mut self) {
        self.0.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl AccessSource for StalledSource {
    async fn fetch_access(&self, _: &str, _: &str) -> Result<AccessList, RbacError> {
        let _flag = CancelFlag(self.cancelled.clone());
        tokio::time::sleep(Duration::from_secs(3600)).await;
        Ok(AccessList::new())
    }
}

fn gate(config: AuthzConfig, source: Arc<dyn AccessSource>) -> WriteGate {
    WriteGate::new(config, RbacClient::new(source, "sources"))
}

fn user() -> Identity {
    Identity::User(UserPrincipal {
        org_id: Some("11789772".to_string()),
        account_number: Some("540155".to_string()),
        username: Some("jdoe".to_string()),
        is_org_admin: false,
    })
}

fn system() -> Identity {
    Identity::System(SystemPrincipal {
        org_id: Some("11789772".to_string()),
        common_name: Some("c87dcb4c-8af1-40dd-878e-60c744edddd0".to_string()),
        cert_type: Some("system".to_string()),
        cluster_id: None,
    })
}

#[tokio::test]
async fn scenario_a_bypass_with_empty_psk_allows() {
    let source = CountingSource::granting(&[]);
    let gate = gate(AuthzConfig::new().with_bypass(true), source.clone());
    let ctx = RequestContext::new().with_presented_key("");

    assert_eq!(gate.evaluate(&ctx).await.unwrap(), Decision::Allow);
    assert_eq!(source.calls(), 0);
}

#[tokio::test]
async fn scenario_b_trusted_psk_allows() {
    let config = AuthzConfig::new().with_trusted_keys(TrustedKeys::from_csv("abc,xyz"));
    let gate = gate(config, CountingSource::granting(&[]));
    let ctx = RequestContext::new().with_presented_key("abc");

    assert_eq!(gate.evaluate(&ctx).await.unwrap(), Decision::Allow);
}

#[tokio::test]
async fn scenario_c_untrusted_psk_is_rejected_with_401_body() {
    let config = AuthzConfig::new().with_trusted_keys(TrustedKeys::from_csv("abc"));
    let gate = gate(config, CountingSource::granting(&[]));
    let ctx = RequestContext::new().with_presented_key("zzz");

    let decision = gate.evaluate(&ctx).await.unwrap();
    assert_eq!(decision, Decision::DenyBadPsk);

    let body = serde_json::to_string(&decision.rejection().unwrap()).unwrap();
    assert!(body.contains("\"401\""));
    assert!(!body.contains("zzz"));
}

#[tokio::test]
async fn scenario_d_system_principal_allows_without_rbac_call() {
    let source = CountingSource::granting(&[]);
    let gate = gate(AuthzConfig::new(), source.clone());
    let ctx = RequestContext::new().with_identity(system());

    assert_eq!(gate.evaluate(&ctx).await.unwrap(), Decision::Allow);
    assert_eq!(source.calls(), 0);
}

#[tokio::test]
async fn scenario_e_user_with_wildcard_grant_allows() {
    let source = CountingSource::granting(&["sources:*:*"]);
    let gate = gate(AuthzConfig::new(), source.clone());
    let ctx = RequestContext::new()
        .with_identity(user())
        .with_raw_identity_header("h1");

    assert_eq!(gate.evaluate(&ctx).await.unwrap(), Decision::Allow);
    assert_eq!(source.calls(), 1);
}

#[tokio::test]
async fn scenario_f_user_with_empty_acl_is_rejected() {
    let source = CountingSource::granting(&[]);
    let gate = gate(AuthzConfig::new(), source.clone());
    let ctx = RequestContext::new()
        .with_identity(user())
        .with_raw_identity_header("h1");

    assert_eq!(gate.evaluate(&ctx).await.unwrap(), Decision::DenyBadRbac);
    assert_eq!(source.calls(), 1);
}

#[tokio::test]
async fn user_with_narrow_grants_is_rejected() {
    let source = CountingSource::granting(&["sources:source:read", "sources:*:read"]);
    let gate = gate(AuthzConfig::new(), source);
    let ctx = RequestContext::new()
        .with_identity(user())
        .with_raw_identity_header("h1");

    assert_eq!(gate.evaluate(&ctx).await.unwrap(), Decision::DenyBadRbac);
}

#[tokio::test]
async fn no_credentials_is_unauthenticated() {
    let gate = gate(AuthzConfig::new(), CountingSource::granting(&["sources:*:*"]));

    let decision = gate.evaluate(&RequestContext::new()).await.unwrap();
    assert_eq!(decision, Decision::DenyUnauthenticated);
    assert_eq!(
        decision.message(),
        Some("Authentication required by either [x-rh-identity] or [x-rh-sources-psk]")
    );
}

#[tokio::test(start_paused = true)]
async fn stalled_rbac_fails_at_deadline_and_cancels_call() {
    let cancelled = Arc::new(AtomicBool::new(false));
    let source = Arc::new(StalledSource {
        cancelled: cancelled.clone(),
    });
    let gate = gate(AuthzConfig::new(), source);
    let ctx = RequestContext::new()
        .with_identity(user())
        .with_raw_identity_header("h1");

    let started = tokio::time::Instant::now();
    let err = gate.evaluate(&ctx).await.unwrap_err();

    assert!(matches!(err, AuthzError::Rbac(RbacError::Timeout(_))));
    assert!(started.elapsed() >= Duration::from_secs(15));
    assert!(started.elapsed() < Duration::from_secs(16));
    assert!(cancelled.load(Ordering::SeqCst));
}

#[tokio::test(start_paused = true)]
async fn custom_deadline_is_honoured() {
    let cancelled = Arc::new(AtomicBool::new(false));
    let rbac = RbacClient::new(
        Arc::new(StalledSource {
            cancelled: cancelled.clone(),
        }),
        "sources",
    )
    .with_deadline(Duration::from_millis(250));
    let gate = WriteGate::new(AuthzConfig::new(), rbac);
    let ctx = RequestContext::new()
        .with_identity(user())
        .with_raw_identity_header("h1");

    let started = tokio::time::Instant::now();
    let err = gate.evaluate(&ctx).await.unwrap_err();

    assert!(matches!(err, AuthzError::Rbac(RbacError::Timeout(d)) if d == Duration::from_millis(250)));
    assert!(started.elapsed() < Duration::from_secs(1));
    assert!(cancelled.load(Ordering::SeqCst));
}

#[tokio::test]
async fn repeated_evaluation_is_stable() {
    let source = CountingSource::granting(&["sources:*:*"]);
    let gate = gate(AuthzConfig::new(), source.clone());
    let ctx = RequestContext::new()
        .with_identity(user())
        .with_raw_identity_header("h1");

    let first = gate.evaluate(&ctx).await.unwrap();
    let second = gate.evaluate(&ctx).await.unwrap();

    assert_eq!(first, second);
    assert_eq!(source.calls(), 2);
}

#[tokio::test]
async fn gate_is_shareable_across_tasks() {
    let source = CountingSource::granting(&["sources:*:*"]);
    let gate = Arc::new(gate(AuthzConfig::new(), source.clone()));

    let mut handles = Vec::new();
    for _ in 0..8 {
        let gate = gate.clone();
        handles.push(tokio::spawn(async move {
            let ctx = RequestContext::new()
                .with_identity(user())
                .with_raw_identity_header("h1");
            gate.evaluate(&ctx).await.unwrap()
        }));
    }

    for handle in handles {
        assert_eq!(handle.await.unwrap(), Decision::Allow);
    }
    assert_eq!(source.calls(), 8);
}
