// ============================================================================
// Condo Core - Pool Entity
// File: crates/condo-core/src/domain/pool.rs
// Description: Named group of users sharing module and permission grants
// ============================================================================

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Pool entity
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct Pool {
    pub id: Uuid,

    #[validate(length(min = 2, max = 100, message = "Pool name must be between 2 and 100 characters"))]
    pub name: String,

    #[validate(length(max = 1000, message = "Description too long"))]
    pub description: Option<String>,

    pub is_active: bool,

    // Audit fields
    pub created_at: DateTime<Utc>,
    pub created_by: Option<Uuid>,
    pub modified_at: Option<DateTime<Utc>>,
    pub modified_by: Option<Uuid>,
    pub removed_at: Option<DateTime<Utc>>,
    pub removed_by: Option<Uuid>,
}

impl Pool {
    pub fn new(
        name: String,
        description: Option<String>,
        created_by: Option<Uuid>,
    ) -> Result<Self, validator::ValidationErrors> {
        let pool = Self {
            id: condo_shared::new_id(),
            name: name.trim().to_string(),
            description: description.map(|d| d.trim().to_string()),
            is_active: true,
            created_at: Utc::now(),
            created_by,
            modified_at: None,
            modified_by: None,
            removed_at: None,
            removed_by: None,
        };

        pool.validate()?;
        Ok(pool)
    }

    pub fn is_available(&self) -> bool {
        self.is_active && self.removed_at.is_none()
    }

    pub fn deactivate(&mut self, deactivated_by: Uuid) {
        self.is_active = false;
        self.modified_at = Some(Utc::now());
        self.modified_by = Some(deactivated_by);
    }
}

/// Pool membership, one row per (pool, user)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoolMember {
    pub id: Uuid,
    pub pool_id: Uuid,
    pub user_id: Uuid,
    pub added_by: Uuid,
    pub added_at: DateTime<Utc>,
    pub is_active: bool,
    pub modified_at: Option<DateTime<Utc>>,
    pub modified_by: Option<Uuid>,
}

impl PoolMember {
    pub fn new(pool_id: Uuid, user_id: Uuid, added_by: Uuid) -> Self {
        Self {
            id: condo_shared::new_id(),
            pool_id,
            user_id,
            added_by,
            added_at: Utc::now(),
            is_active: true,
            modified_at: None,
            modified_by: None,
        }
    }

    pub fn reactivate(&mut self, added_by: Uuid) {
        let now = Utc::now();
        self.is_active = true;
        self.added_by = added_by;
        self.added_at = now;
        self.modified_at = Some(now);
        self.modified_by = Some(added_by);
    }

    pub fn deactivate(&mut self, removed_by: Uuid) {
        self.is_active = false;
        self.modified_at = Some(Utc::now());
        self.modified_by = Some(removed_by);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_pool() {
        let pool = Pool::new(
            "Tesorería".to_string(),
            Some("Comité de tesorería".to_string()),
            None,
        );
        assert!(pool.is_ok());
        assert!(pool.unwrap().is_available());
    }

    #[test]
    fn test_member_reactivation() {
        let admin = Uuid::new_v4();
        let mut member = PoolMember::new(Uuid::new_v4(), Uuid::new_v4(), admin);
        let id = member.id;
        member.deactivate(admin);
        assert!(!member.is_active);
        member.reactivate(admin);
        assert!(member.is_active);
        assert_eq!(member.id, id);
    }
}
