//! Repository traits (ports)

pub mod user_account_repository;
pub mod module_repository;
pub mod user_grant_repository;
pub mod pool_repository;
pub mod in_memory;

pub use user_account_repository::UserAccountRepository;
pub use module_repository::ModuleRepository;
pub use user_grant_repository::UserGrantRepository;
pub use pool_repository::PoolRepository;
pub use in_memory::InMemoryAccessStore;

/// Every port the access-control services need, implemented by one adapter.
pub trait AccessStore:
    UserAccountRepository + ModuleRepository + UserGrantRepository + PoolRepository + 'static
{
}

impl<T> AccessStore for T where
    T: UserAccountRepository + ModuleRepository + UserGrantRepository + PoolRepository + 'static
{
}
