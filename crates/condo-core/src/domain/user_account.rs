//! User account as seen by the access-control kernel

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct UserAccount {
    pub id: Uuid,

    #[validate(email)]
    pub email: String,

    pub display_name: String,
    pub is_active: bool,

    /// Single platform owner; bypasses every grant check.
    pub is_super_admin: bool,

    // Audit fields
    pub created_at: DateTime<Utc>,
    pub modified_at: Option<DateTime<Utc>>,
    pub removed_at: Option<DateTime<Utc>>,
}

impl UserAccount {
    pub fn new(email: String, display_name: String) -> Result<Self, validator::ValidationErrors> {
        let user = Self {
            id: condo_shared::new_id(),
            email: email.trim().to_lowercase(),
            display_name: display_name.trim().to_string(),
            is_active: true,
            is_super_admin: false,
            created_at: Utc::now(),
            modified_at: None,
            removed_at: None,
        };

        user.validate()?;
        Ok(user)
    }

    pub fn new_super_admin(email: String, display_name: String) -> Result<Self, validator::ValidationErrors> {
        let mut user = Self::new(email, display_name)?;
        user.is_super_admin = true;
        Ok(user)
    }

    pub fn is_deleted(&self) -> bool {
        self.removed_at.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_user_is_not_privileged() {
        let user = UserAccount::new("Ana@Condo.test".to_string(), "Ana".to_string()).unwrap();
        assert_eq!(user.email, "ana@condo.test");
        assert!(!user.is_super_admin);
    }

    #[test]
    fn test_invalid_email_rejected() {
        assert!(UserAccount::new("not-an-email".to_string(), "Ana".to_string()).is_err());
    }
}
