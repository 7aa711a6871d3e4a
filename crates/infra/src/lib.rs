//! Infrastructure layer: user storage and session handling.

pub mod session;
pub mod users;

pub use session::{LoginResult, LogoutOutcome, SessionError, SessionService};
pub use users::{InMemoryUserRepository, NewUser, Page, PageMeta, UserPatch, UserQuery, UserRepository, UserService};
