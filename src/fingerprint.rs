//! Policy fingerprinting for cache invalidation.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::rule::{AccessRoute, FieldRule};
use crate::table::PolicyTable;

/// Content-addressed fingerprint of a rule table.
///
/// Serialized responses depend on the table, so the fingerprint belongs in
/// any cache key for them.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PolicyFingerprint {
    /// SHA-256 hash of the table.
    pub hash: String,
    /// Encoding version.
    pub version: u64,
}

impl PolicyFingerprint {
    /// Compute the fingerprint of a table.
    ///
    /// The encoding is canonical: maps and sets are hashed in sorted order,
    /// so equal tables hash equally regardless of source layout.
    pub fn compute(table: &PolicyTable) -> Self {
        let mut hasher = Sha256::new();

        hash_str(&mut hasher, table.unknown_field().as_str());
        hash_set(&mut hasher, &table.roles().moderator_only);
        hash_set(&mut hasher, &table.roles().admin_only);

        hasher.update((table.fields().len() as u32).to_le_bytes());
        for (field, rule) in table.fields() {
            hash_str(&mut hasher, field);
            hash_rule(&mut hasher, rule);
        }

        hasher.update((table.resources().len() as u32).to_le_bytes());
        for (kind, fields) in table.resources() {
            hash_str(&mut hasher, kind);
            hasher.update((fields.len() as u32).to_le_bytes());
            for (field, rule) in fields {
                hash_str(&mut hasher, field);
                hash_rule(&mut hasher, rule);
            }
        }

        let hash = hex::encode(hasher.finalize());

        Self { hash, version: 1 }
    }

    /// Get a short version of the hash (first 16 chars).
    pub fn short(&self) -> &str {
        &self.hash[..16.min(self.hash.len())]
    }
}

// Length-prefixed so adjacent strings cannot collide.
fn hash_str(hasher: &mut Sha256, s: &str) {
    hasher.update((s.len() as u32).to_le_bytes());
    hasher.update(s.as_bytes());
}

fn hash_set<'a>(hasher: &mut Sha256, items: impl IntoIterator<Item = &'a String> + Clone) {
    let count = items.clone().into_iter().count() as u32;
    hasher.update(count.to_le_bytes());
    for item in items {
        hash_str(hasher, item);
    }
}

fn hash_rule(hasher: &mut Sha256, rule: &FieldRule) {
    hash_str(hasher, rule.sensitivity.as_str());
    hasher.update([rule.owner_override as u8]);

    match &rule.allowed_roles {
        Some(roles) => {
            hasher.update([1u8]);
            hash_set(hasher, roles);
        }
        None => hasher.update([0u8]),
    }

    match &rule.status_condition {
        Some(cond) => {
            hasher.update([1u8]);
            hash_set(hasher, cond.statuses());
        }
        None => hasher.update([0u8]),
    }

    // Routes are OR-combined, so their order is irrelevant.
    let mut routes: Vec<String> = rule.also.iter().map(route_key).collect();
    routes.sort();
    routes.dedup();
    hash_set(hasher, &routes);
}

fn route_key(route: &AccessRoute) -> String {
    match route {
        AccessRoute::Owner => "owner".to_string(),
        AccessRoute::Roles { roles } => {
            let roles: Vec<&str> = roles.iter().map(String::as_str).collect();
            format!("roles:{}", roles.join(","))
        }
        AccessRoute::Relation { relation } => format!("relation:{relation}"),
    }
}
