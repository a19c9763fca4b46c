//! Session-related types for admin authentication.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Session-stored marker that the shared admin password was presented.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentAdmin {
    /// When the password was accepted.
    pub logged_in_at: DateTime<Utc>,
}

/// Session keys for admin authentication data.
pub mod keys {
    /// Key for storing the current logged-in admin.
    pub const CURRENT_ADMIN: &str = "current_admin";
}
