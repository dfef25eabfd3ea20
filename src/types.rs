//! Domain types returned by the client

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A roster member known only by identity and display name, as produced by
/// the membership listing before profile enrichment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserStub {
    /// Numeric identity, stable and unique within a wiki
    pub uid: u64,
    /// Display name as rendered in the listing
    pub username: String,
}

/// Profile fields of a live account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub uid: u64,
    pub username: String,
    /// Biography text, if the profile carries one
    pub about: Option<String>,
    /// Date the account was created
    pub user_since: NaiveDate,
    /// Date the account joined this wiki
    pub member_since: NaiveDate,
}

/// A fully resolved roster member
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum User {
    /// Live account with its profile fields populated
    Active(UserProfile),
    /// The profile lookup rendered no display name; only the identity remains
    Deleted { uid: u64 },
}

impl User {
    /// The member's numeric identity
    pub fn uid(&self) -> u64 {
        match self {
            User::Active(profile) => profile.uid,
            User::Deleted { uid } => *uid,
        }
    }

    /// The display name, if the account still exists
    pub fn username(&self) -> Option<&str> {
        match self {
            User::Active(profile) => Some(&profile.username),
            User::Deleted { .. } => None,
        }
    }
}

/// Typed result of a `pages.get_one` structured call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page {
    pub fullname: String,
    pub created_at: String,
    pub created_by: String,
    pub updated_at: String,
    pub updated_by: String,
    pub title: String,
    pub title_shown: String,
    #[serde(default)]
    pub tags: Vec<String>,
    pub rating: i64,
    pub revisions: i64,
    pub content: String,
    pub html: String,
    pub children: i64,
    pub comments: i64,
    pub commented_at: String,
    pub commented_by: String,
}
