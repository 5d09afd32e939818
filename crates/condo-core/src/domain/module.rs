// ============================================================================
// Condo Core - Module Entity
// File: crates/condo-core/src/domain/module.rs
// Description: Functional area gating a set of actions
// ============================================================================

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Module type enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModuleType {
    /// Standard create/read/update/delete area
    Crud,
    /// Area with bespoke actions (reports, exports, dashboards)
    Specialized,
}

impl ModuleType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModuleType::Crud => "crud",
            ModuleType::Specialized => "specialized",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "crud" => Some(ModuleType::Crud),
            "specialized" => Some(ModuleType::Specialized),
            _ => None,
        }
    }
}

impl Default for ModuleType {
    fn default() -> Self {
        ModuleType::Crud
    }
}

/// Module entity
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct Module {
    pub id: Uuid,

    #[validate(length(min = 2, max = 50, message = "Module code must be between 2 and 50 characters"))]
    pub code: String,

    #[validate(length(min = 2, max = 100, message = "Module name must be between 2 and 100 characters"))]
    pub name: String,

    #[validate(length(max = 1000, message = "Description too long"))]
    pub description: Option<String>,

    pub module_type: ModuleType,
    pub is_active: bool,

    // Audit fields
    pub created_at: DateTime<Utc>,
    pub created_by: Option<Uuid>,
    pub modified_at: Option<DateTime<Utc>>,
    pub modified_by: Option<Uuid>,
    pub removed_at: Option<DateTime<Utc>>,
    pub removed_by: Option<Uuid>,
}

impl Module {
    pub fn new(
        code: String,
        name: String,
        description: Option<String>,
        module_type: ModuleType,
        created_by: Option<Uuid>,
    ) -> Result<Self, validator::ValidationErrors> {
        let module = Self {
            id: condo_shared::new_id(),
            code: code.trim().to_lowercase(),
            name: name.trim().to_string(),
            description: description.map(|d| d.trim().to_string()),
            module_type,
            is_active: true,
            created_at: Utc::now(),
            created_by,
            modified_at: None,
            modified_by: None,
            removed_at: None,
            removed_by: None,
        };

        module.validate()?;
        Ok(module)
    }

    pub fn is_crud(&self) -> bool {
        self.module_type == ModuleType::Crud
    }

    /// Active and not soft-deleted
    pub fn is_available(&self) -> bool {
        self.is_active && !self.is_deleted()
    }

    pub fn deactivate(&mut self, deactivated_by: Uuid) {
        self.is_active = false;
        self.modified_at = Some(Utc::now());
        self.modified_by = Some(deactivated_by);
    }

    pub fn soft_delete(&mut self, deleted_by: Uuid) {
        self.removed_at = Some(Utc::now());
        self.removed_by = Some(deleted_by);
        self.is_active = false;
    }

    pub fn is_deleted(&self) -> bool {
        self.removed_at.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_module_normalizes_code() {
        let module = Module::new(
            "  Objetivos ".to_string(),
            "Objetivos de recaudación".to_string(),
            None,
            ModuleType::Crud,
            None,
        )
        .unwrap();
        assert_eq!(module.code, "objetivos");
        assert!(module.is_crud());
        assert!(module.is_available());
    }

    #[test]
    fn test_module_code_too_short() {
        let module = Module::new(
            "x".to_string(),
            "Reportes".to_string(),
            None,
            ModuleType::Specialized,
            None,
        );
        assert!(module.is_err());
    }

    #[test]
    fn test_module_type_round_trip() {
        assert_eq!(ModuleType::from_str("specialized"), Some(ModuleType::Specialized));
        assert_eq!(ModuleType::Crud.as_str(), "crud");
        assert_eq!(ModuleType::from_str("matrix"), None);
    }

    #[test]
    fn test_soft_deleted_module_is_unavailable() {
        let mut module = Module::new(
            "reportes".to_string(),
            "Reportes".to_string(),
            None,
            ModuleType::Specialized,
            None,
        )
        .unwrap();
        module.soft_delete(Uuid::new_v4());
        assert!(module.is_deleted());
        assert!(!module.is_available());
    }
}
