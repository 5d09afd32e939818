// ============================================================================
// Condo Core - Module Permission Entity
// File: crates/condo-core/src/domain/module_permission.rs
// Description: Action available inside a module
// ============================================================================

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Well-known action codes
pub mod actions {
    pub const CREATE: &str = "create";
    pub const READ: &str = "read";
    pub const UPDATE: &str = "update";
    pub const DELETE: &str = "delete";
    pub const MANAGE: &str = "manage";
    pub const EXPORT: &str = "export";

    /// Mutating CRUD actions that are meaningless without `read`.
    pub fn implies_read(code: &str) -> bool {
        matches!(code, CREATE | UPDATE | DELETE)
    }
}

/// Module Permission entity
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ModulePermission {
    pub id: Uuid,
    pub module_id: Uuid,

    #[validate(length(min = 2, max = 50, message = "Permission code must be between 2 and 50 characters"))]
    pub code: String,

    #[validate(length(min = 2, max = 100, message = "Permission name must be between 2 and 100 characters"))]
    pub name: String,

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

impl ModulePermission {
    pub fn new(
        module_id: Uuid,
        code: String,
        name: String,
        description: Option<String>,
        created_by: Option<Uuid>,
    ) -> Result<Self, validator::ValidationErrors> {
        let permission = Self {
            id: condo_shared::new_id(),
            module_id,
            code: code.trim().to_lowercase(),
            name: name.trim().to_string(),
            description,
            is_active: true,
            created_at: Utc::now(),
            created_by,
            modified_at: None,
            modified_by: None,
            removed_at: None,
            removed_by: None,
        };

        permission.validate()?;
        Ok(permission)
    }

    pub fn is_available(&self) -> bool {
        self.is_active && self.removed_at.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mutating_actions_imply_read() {
        assert!(actions::implies_read("create"));
        assert!(actions::implies_read("update"));
        assert!(actions::implies_read("delete"));
        assert!(!actions::implies_read("read"));
        assert!(!actions::implies_read("export"));
        assert!(!actions::implies_read("manage"));
    }

    #[test]
    fn test_create_permission() {
        let perm = ModulePermission::new(
            Uuid::new_v4(),
            "Export".to_string(),
            "Exportar".to_string(),
            None,
            None,
        )
        .unwrap();
        assert_eq!(perm.code, "export");
        assert!(perm.is_available());
    }
}
