//! User accounts: storage abstraction and CRUD service.

pub mod page;
pub mod repository;
pub mod service;

pub use page::{Page, PageMeta, UserQuery, DEFAULT_PAGE, DEFAULT_PER_PAGE};
pub use repository::{InMemoryUserRepository, UserRepository};
pub use service::{NewUser, SeedUser, UserPatch, UserService, DEFAULT_SEED_USERS};
