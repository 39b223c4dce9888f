//! Disclosure scenarios against the shipped v1 policy file.

use field_policy::{
    redact, Decision, DenyReason, Disclosure, FieldAuthorizer, Grant, PolicyError,
    PolicyFingerprint, PolicyTable, Resource, UnknownFieldPolicy, Viewer,
};
use serde_json::json;

fn shipped_policy() -> FieldAuthorizer {
    let path = concat!(env!("CARGO_MANIFEST_DIR"), "/config/field_policy.yaml");
    FieldAuthorizer::new(PolicyTable::from_file(path).expect("shipped policy loads"))
}

fn owner() -> Viewer {
    Viewer::new("7")
}

fn admin() -> Viewer {
    Viewer::with_roles("9", ["admin"])
}

fn stranger() -> Viewer {
    Viewer::new("8")
}

#[test]
fn shipped_policy_is_fail_closed() {
    let auth = shipped_policy();
    assert_eq!(auth.table().unknown_field(), UnknownFieldPolicy::Deny);
}

// ── Documented scenario ──────────────────────────────────────────

#[test]
fn owner_sees_verification_documents() {
    let auth = shipped_policy();
    let resource = Resource::owned_by("7").with_status("pending");
    assert!(auth.can_view(Some(&owner()), &resource, "verification_documents"));
}

#[test]
fn owner_does_not_see_internal_moderation_notes() {
    let auth = shipped_policy();
    let resource = Resource::owned_by("7").with_status("pending");
    assert!(!auth.can_view(Some(&owner()), &resource, "internal_moderation_notes"));
}

#[test]
fn admin_sees_internal_moderation_notes() {
    let auth = shipped_policy();
    let resource = Resource::owned_by("7").with_status("pending");
    assert!(auth.can_view(Some(&admin()), &resource, "internal_moderation_notes"));
}

#[test]
fn unknown_field_is_withheld() {
    let auth = shipped_policy();
    let resource = Resource::owned_by("7").with_status("pending");
    for viewer in [None, Some(owner()), Some(admin())] {
        assert!(!auth.can_view(viewer.as_ref(), &resource, "nonexistent_field"));
    }
}

// ── Status-conditional fields ────────────────────────────────────

#[test]
fn rejection_reason_after_rejection() {
    let auth = shipped_policy();
    let rejected = Resource::owned_by("7").with_status("rejected");
    assert!(auth.can_view(Some(&owner()), &rejected, "rejection_reason"));
    assert!(!auth.can_view(Some(&stranger()), &rejected, "rejection_reason"));
}

#[test]
fn rejection_reason_hidden_while_pending() {
    let auth = shipped_policy();
    let pending = Resource::owned_by("7").with_status("pending");
    assert_eq!(
        auth.decide(Some(&owner()), &pending, "rejection_reason"),
        Decision::deny(DenyReason::StatusMismatch)
    );
}

#[test]
fn kind_specific_status_list() {
    let auth = shipped_policy();
    let listing = |status: &str| {
        Resource::owned_by("7")
            .with_kind("roof_marketplace")
            .with_status(status)
    };
    assert!(auth.can_view(Some(&owner()), &listing("published"), "contact_email"));
    assert!(auth.can_view(Some(&owner()), &listing("reserved"), "contact_email"));
    assert!(!auth.can_view(Some(&owner()), &listing("draft"), "contact_email"));
}

// ── Independent routes ───────────────────────────────────────────

#[test]
fn email_owner_reviewer_or_admin() {
    let auth = shipped_policy();
    let proposal = Resource::owned_by("7")
        .with_kind("project_proposal")
        .with_relation("reviewer", "21");

    assert_eq!(
        auth.decide(Some(&owner()), &proposal, "email").grant,
        Grant::OWNER
    );
    assert_eq!(
        auth.decide(Some(&Viewer::new("21")), &proposal, "email").grant,
        Grant::RELATION
    );
    assert_eq!(
        auth.decide(Some(&admin()), &proposal, "email").grant,
        Grant::ROLE
    );
    assert!(!auth.can_view(Some(&stranger()), &proposal, "email"));
    assert!(!auth.can_view(None, &proposal, "email"));
}

#[test]
fn kind_rules_only_apply_to_their_kind() {
    let auth = shipped_policy();
    let moderator = Viewer::with_roles("3", ["moderator"]);

    let proposal = Resource::owned_by("7").with_kind("project_proposal");
    assert!(auth.can_view(Some(&moderator), &proposal, "notes"));

    let post = Resource::owned_by("7").with_kind("cooperative_post");
    assert!(!auth.can_view(Some(&moderator), &post, "notes"));
}

#[test]
fn advisor_sees_budget_breakdown() {
    let auth = shipped_policy();
    let proposal = Resource::owned_by("7").with_kind("project_proposal");
    let advisor = Viewer::with_roles("30", ["energy_advisor"]);
    assert!(auth.can_view(Some(&advisor), &proposal, "budget_breakdown"));
    assert!(auth.can_view(Some(&owner()), &proposal, "budget_breakdown"));
    let moderator = Viewer::with_roles("31", ["moderator"]);
    assert!(!auth.can_view(Some(&moderator), &proposal, "budget_breakdown"));
}

#[test]
fn owns_relation_counts_as_ownership() {
    let auth = shipped_policy();
    let resource = Resource::new().with_id("proposal-44");
    let viewer = Viewer::new("12").owning("proposal-44");
    assert!(auth.can_view(Some(&viewer), &resource, "verification_documents"));
    assert!(!auth.can_view(Some(&Viewer::new("12")), &resource, "verification_documents"));
}

// ── Serializer contract ──────────────────────────────────────────

#[test]
fn serialized_proposal_per_viewer() {
    let auth = shipped_policy();
    let proposal = Resource::owned_by("7")
        .with_kind("project_proposal")
        .with_status("rejected");

    let serialize = |viewer: Option<&Viewer>| {
        Disclosure::new(&auth, viewer, &proposal)
            .field("id", 44)
            .and_then(|d| d.field("title", "Community solar"))
            .and_then(|d| d.when_visible("rejection_reason", || "Incomplete budget"))
            .and_then(|d| d.when_visible("internal_moderation_notes", || "Flagged twice"))
            .and_then(|d| d.when_loaded("verification_documents", Some(vec!["id.pdf"])))
            .map(Disclosure::finish)
            .unwrap()
    };

    assert_eq!(
        serialize(None),
        json!({"id": 44, "title": "Community solar"})
    );
    assert_eq!(
        serialize(Some(&owner())),
        json!({
            "id": 44,
            "title": "Community solar",
            "rejection_reason": "Incomplete budget",
            "verification_documents": ["id.pdf"]
        })
    );
    assert_eq!(
        serialize(Some(&admin())),
        json!({
            "id": 44,
            "title": "Community solar",
            "internal_moderation_notes": "Flagged twice"
        })
    );
}

#[test]
fn redact_record_for_stranger() {
    let auth = shipped_policy();
    let resource = Resource::owned_by("7").with_status("approved");
    let record = json!({
        "id": 1,
        "status": "approved",
        "phone": null,
        "email": "owner@example.org",
        "unlisted_column": "internal"
    });
    let serde_json::Value::Object(map) = record else {
        unreachable!()
    };

    let stranger_view = redact(&auth, Some(&stranger()), &resource, map.clone());
    assert_eq!(
        serde_json::Value::Object(stranger_view),
        json!({"id": 1, "status": "approved"})
    );

    let owner_view = redact(&auth, Some(&owner()), &resource, map);
    assert_eq!(owner_view.get("phone"), Some(&serde_json::Value::Null));
    assert!(owner_view.contains_key("email"));
    assert!(!owner_view.contains_key("unlisted_column"));
}

// ── Strict mode and fingerprints ─────────────────────────────────

#[test]
fn reject_mode_surfaces_unknown_fields() {
    let yaml = std::fs::read_to_string(concat!(
        env!("CARGO_MANIFEST_DIR"),
        "/config/field_policy.yaml"
    ))
    .unwrap()
    .replace("unknown_field: deny", "unknown_field: reject");
    let auth = FieldAuthorizer::new(PolicyTable::from_yaml_str(&yaml).unwrap());
    let resource = Resource::owned_by("7");

    let err = auth.check(Some(&admin()), &resource, "nonexistent_field").unwrap_err();
    assert!(matches!(err, PolicyError::UnknownField(_)));
    assert!(auth.check(Some(&admin()), &resource, "documents").unwrap().allowed);
}

#[test]
fn allow_mode_discloses_unknown_fields() {
    let yaml = std::fs::read_to_string(concat!(
        env!("CARGO_MANIFEST_DIR"),
        "/config/field_policy.yaml"
    ))
    .unwrap()
    .replace("unknown_field: deny", "unknown_field: allow");
    let auth = FieldAuthorizer::new(PolicyTable::from_yaml_str(&yaml).unwrap());
    assert!(auth.can_view(None, &Resource::new(), "nonexistent_field"));
}

#[test]
fn fingerprint_stable_across_loads() {
    let a = shipped_policy();
    let b = shipped_policy();
    assert_eq!(
        PolicyFingerprint::compute(a.table()),
        PolicyFingerprint::compute(b.table())
    );
}

#[test]
fn authorizer_shared_across_threads() {
    let auth = shipped_policy();
    let handles: Vec<_> = (0..4)
        .map(|i| {
            let auth = auth.clone();
            std::thread::spawn(move || {
                let viewer = Viewer::new(i.to_string());
                let resource = Resource::owned_by(i.to_string());
                auth.can_view(Some(&viewer), &resource, "verification_documents")
            })
        })
        .collect();
    for handle in handles {
        assert!(handle.join().unwrap());
    }
}
