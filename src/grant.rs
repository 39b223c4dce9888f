//! Flags naming the routes that granted access to a field.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

bitflags! {
    /// Routes through which a viewer was granted a field.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct Grant: u8 {
        /// Field is public.
        const PUBLIC = 1 << 0;

        /// Viewer owns the record.
        const OWNER = 1 << 1;

        /// Viewer holds an allowed role.
        const ROLE = 1 << 2;

        /// Viewer is bound to the record through a named relation.
        const RELATION = 1 << 3;

        /// Field is unknown and the table allows unknown fields.
        const DEFAULT = 1 << 4;

        /// No route matched.
        const NONE = 0;
    }
}

impl Default for Grant {
    fn default() -> Self {
        Grant::NONE
    }
}

impl Grant {
    /// Whether at least one route granted access.
    pub fn is_granted(&self) -> bool {
        !self.is_empty()
    }

    /// Whether access depends on who the viewer is.
    pub fn is_personal(&self) -> bool {
        self.intersects(Grant::OWNER | Grant::ROLE | Grant::RELATION)
    }

    /// Get a human-readable description of the grant.
    pub fn description(&self) -> &'static str {
        if self.is_empty() {
            "denied"
        } else if self.contains(Grant::PUBLIC) {
            "public"
        } else if self.contains(Grant::DEFAULT) {
            "unknown field allowed by default"
        } else if *self == Grant::OWNER {
            "owner"
        } else if *self == Grant::ROLE {
            "role"
        } else if *self == Grant::RELATION {
            "relation"
        } else {
            "multiple routes"
        }
    }
}
