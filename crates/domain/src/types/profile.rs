//! User profile types
//!
//! Application-owned profile record keyed by principal id, distinct from the
//! session credential issued by the identity provider.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Profile record stored in the hosted `profiles` table
///
/// Created exactly once per principal at sign-up; mutated afterwards only by
/// explicit profile edits. `created_at`/`updated_at` are assigned by the
/// backend, so they are absent on rows built client-side for insertion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub id: String,
    pub full_name: String,
    pub bio: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    pub interests: Vec<String>,
    pub services_offered: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Profile {
    /// Build the blank profile row inserted at sign-up
    ///
    /// Name and bio are empty, interest and service lists start empty. The
    /// backend fills in timestamps.
    #[must_use]
    pub fn empty(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            full_name: String::new(),
            bio: String::new(),
            avatar_url: None,
            interests: Vec::new(),
            services_offered: Vec::new(),
            created_at: None,
            updated_at: None,
        }
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for types::profile.
    use super::*;

    /// Validates `Profile::empty` behavior for the blank sign-up row scenario.
    ///
    /// Assertions:
    /// - Confirms `profile.id` equals `"u1"`.
    /// - Ensures name, bio, interests and services are empty.
    /// - Ensures no timestamps are set client-side.
    #[test]
    fn test_empty_profile_row() {
        let profile = Profile::empty("u1");

        assert_eq!(profile.id, "u1");
        assert!(profile.full_name.is_empty());
        assert!(profile.bio.is_empty());
        assert!(profile.interests.is_empty());
        assert!(profile.services_offered.is_empty());
        assert!(profile.created_at.is_none());
        assert!(profile.updated_at.is_none());
    }

    /// Validates serialization of a blank row omits backend-owned columns.
    ///
    /// Assertions:
    /// - Ensures serialized JSON contains no `created_at`/`updated_at` keys.
    /// - Ensures `avatar_url` is omitted when absent.
    #[test]
    fn test_blank_row_serialization_omits_backend_columns() {
        let profile = Profile::empty("u1");
        let json = serde_json::to_string(&profile).unwrap();

        assert!(!json.contains("created_at"));
        assert!(!json.contains("updated_at"));
        assert!(!json.contains("avatar_url"));
        assert!(json.contains("\"interests\":[]"));
    }
}
