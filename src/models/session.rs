use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    Student,
    Admin,
}

/// The signed-in user
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Session {
    pub username: String,
    pub role: Role,
    pub logged_in_at: DateTime<Utc>,
}

impl Session {
    pub fn new(username: impl Into<String>, role: Role) -> Self {
        Self {
            username: username.into(),
            role,
            logged_in_at: Utc::now(),
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}
