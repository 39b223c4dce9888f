//! Field-level visibility policy for API resource serialization.
//!
//! This crate provides:
//!
//! - **Viewer**: The acting identity (roles, owned records)
//! - **PolicySubject**: Owner, status, kind and relations of a record
//! - **FieldRule**: Sensitivity class, role set, status condition, extra routes
//! - **PolicyTable**: Process-wide rule table loaded once at startup
//! - **FieldAuthorizer**: Decides whether a field may be disclosed
//! - **Disclosure**: Serializer helper that omits withheld keys
//!
//! # Architecture
//!
//! ```text
//! PolicyConfig (YAML) ──► PolicyTable ──► FieldAuthorizer
//!                              │                │
//!                              ▼         ┌──────┴───────┐
//!                     PolicyFingerprint  ▼              ▼
//!                                     Decision     Disclosure / redact
//!                                  (Grant flags)   (omit denied keys)
//! ```
//!
//! # Example
//!
//! ```
//! use field_policy::{FieldAuthorizer, FieldRule, PolicyTable, Resource, Viewer};
//!
//! let table = PolicyTable::builder()
//!     .field("verification_documents", FieldRule::owner_only())
//!     .field("internal_moderation_notes", FieldRule::admin_only().without_owner_override())
//!     .build()
//!     .unwrap();
//! let authorizer = FieldAuthorizer::new(table);
//!
//! let owner = Viewer::new("7");
//! let proposal = Resource::owned_by("7").with_status("pending");
//!
//! assert!(authorizer.can_view(Some(&owner), &proposal, "verification_documents"));
//! assert!(!authorizer.can_view(Some(&owner), &proposal, "internal_moderation_notes"));
//! ```

mod authorizer;
mod config;
mod disclosure;
mod error;
mod fingerprint;
mod grant;
mod resource;
mod rule;
mod sensitivity;
mod table;
mod viewer;

pub use authorizer::{Decision, DenyReason, FieldAuthorizer};
pub use config::{
    PolicyConfig, RoleDefaults, UnknownFieldPolicy, CONFIG_PATH_ENV, DEFAULT_CONFIG_PATH,
};
pub use disclosure::{redact, Disclosure};
pub use error::PolicyError;
pub use fingerprint::PolicyFingerprint;
pub use grant::Grant;
pub use resource::{PolicySubject, Resource};
pub use rule::{AccessRoute, FieldRule, StatusCondition};
pub use sensitivity::Sensitivity;
pub use table::{PolicyTable, PolicyTableBuilder};
pub use viewer::Viewer;
