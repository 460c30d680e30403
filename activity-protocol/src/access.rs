use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Visibility settings of a project, as reported by the permission provider.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct ProjectAccess {
    pub id: i64,
    pub is_private: bool,
    #[serde(default)]
    pub anon_permissions: Vec<String>,
}

impl ProjectAccess {
    pub fn public(id: i64) -> Self {
        Self {
            id,
            is_private: false,
            anon_permissions: Vec::new(),
        }
    }

    pub fn private(id: i64, anon_permissions: &[&str]) -> Self {
        Self {
            id,
            is_private: true,
            anon_permissions: anon_permissions.iter().map(|p| p.to_string()).collect(),
        }
    }

    pub fn grants_anonymous(&self, permission: &str) -> bool {
        self.anon_permissions.iter().any(|p| p == permission)
    }
}

/// A viewer's membership in a project and the permissions its role grants.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct MembershipGrant {
    pub project_id: i64,
    pub user_id: i64,
    #[serde(default)]
    pub is_owner: bool,
    #[serde(default)]
    pub permissions: Vec<String>,
}

impl MembershipGrant {
    /// Owners see everything the permission table covers.
    pub fn allows(&self, permission: &str) -> bool {
        self.is_owner || self.permissions.iter().any(|p| p == permission)
    }
}

/// Identity requesting a feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Viewer {
    Anonymous,
    User(i64),
}

impl Viewer {
    pub fn is_authenticated(&self) -> bool {
        matches!(self, Viewer::User(_))
    }

    pub fn user_id(&self) -> Option<i64> {
        match self {
            Viewer::User(id) => Some(*id),
            Viewer::Anonymous => None,
        }
    }
}

/// Current profile of a user, used when presenting payloads and regenerating feeds.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserProfile {
    pub id: i64,
    pub username: String,
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub photo: Option<String>,
    #[serde(default)]
    pub big_photo: Option<String>,
    pub date_joined: DateTime<Utc>,
}

impl UserProfile {
    /// Display name, falling back to the username.
    pub fn display_name(&self) -> &str {
        if self.full_name.trim().is_empty() {
            &self.username
        } else {
            &self.full_name
        }
    }

    /// Expanded user block embedded in rendered payloads.
    pub fn to_payload_json(&self) -> Value {
        json!({
            "id": self.id,
            "name": self.display_name(),
            "photo": self.photo,
            "big_photo": self.big_photo,
            "username": self.username,
            "date_joined": self.date_joined,
        })
    }
}
