use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct User {
    pub user_id: String,
    pub google_id: String,
    pub email: String,
    pub display_name: String,
    pub profile_picture_url: String,
    pub created_at: DateTime<Utc>,
    pub last_login: DateTime<Utc>,
}

/// Identity as reported by the OAuth provider after a verified login.
#[derive(Debug, Clone, PartialEq)]
pub struct GoogleProfile {
    pub google_id: String,
    pub email: String,
    pub display_name: String,
    pub profile_picture_url: String,
}
