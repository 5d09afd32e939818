// ============================================================================
// Condo Core - User Module Grant Entity
// File: crates/condo-core/src/domain/user_module_grant.rs
// Description: Direct module access for a user
// ============================================================================

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// User Module Grant entity, one row per (user, module)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserModuleGrant {
    pub id: Uuid,
    pub user_id: Uuid,
    pub module_id: Uuid,
    pub granted_by: Uuid,
    pub granted_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
    pub is_active: bool,

    // Audit fields
    pub created_at: DateTime<Utc>,
    pub modified_at: Option<DateTime<Utc>>,
    pub modified_by: Option<Uuid>,
}

impl UserModuleGrant {
    pub fn new(
        user_id: Uuid,
        module_id: Uuid,
        granted_by: Uuid,
        expires_at: Option<DateTime<Utc>>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: condo_shared::new_id(),
            user_id,
            module_id,
            granted_by,
            granted_at: now,
            expires_at,
            is_active: true,
            created_at: now,
            modified_at: None,
            modified_by: None,
        }
    }

    /// Reuse the row for a new grant instead of inserting a duplicate.
    pub fn reactivate(&mut self, granted_by: Uuid, expires_at: Option<DateTime<Utc>>) {
        let now = Utc::now();
        self.is_active = true;
        self.granted_by = granted_by;
        self.granted_at = now;
        self.expires_at = expires_at;
        self.modified_at = Some(now);
        self.modified_by = Some(granted_by);
    }

    pub fn deactivate(&mut self, revoked_by: Uuid) {
        self.is_active = false;
        self.modified_at = Some(Utc::now());
        self.modified_by = Some(revoked_by);
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.map_or(false, |at| at <= now)
    }

    pub fn is_effective(&self, now: DateTime<Utc>) -> bool {
        self.is_active && !self.is_expired(now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_reactivate_keeps_identity() {
        let admin = Uuid::new_v4();
        let mut grant = UserModuleGrant::new(Uuid::new_v4(), Uuid::new_v4(), admin, None);
        let id = grant.id;

        grant.deactivate(admin);
        assert!(!grant.is_active);

        let other_admin = Uuid::new_v4();
        let expiry = Utc::now() + Duration::days(30);
        grant.reactivate(other_admin, Some(expiry));
        assert_eq!(grant.id, id);
        assert!(grant.is_active);
        assert_eq!(grant.granted_by, other_admin);
        assert_eq!(grant.expires_at, Some(expiry));
    }

    #[test]
    fn test_expired_grant_is_not_effective() {
        let grant = UserModuleGrant::new(
            Uuid::new_v4(),
            Uuid::new_v4(),
            Uuid::new_v4(),
            Some(Utc::now() - Duration::minutes(1)),
        );
        assert!(grant.is_active);
        assert!(!grant.is_effective(Utc::now()));
    }
}
