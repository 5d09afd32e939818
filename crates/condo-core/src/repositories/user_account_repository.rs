//! User account repository trait (port)

use async_trait::async_trait;
use uuid::Uuid;
use crate::domain::UserAccount;
use crate::error::DomainError;

#[async_trait]
pub trait UserAccountRepository: Send + Sync {
    async fn find_user(&self, id: &Uuid) -> Result<Option<UserAccount>, DomainError>;
}
