//! Authentication: password hashing, sessions, request identity, and the
//! registration/login flows.

pub mod actor;
pub mod flows;
pub mod password;
pub mod session;

pub use actor::{Actor, CurrentActor, RequireAdmin};
pub use flows::{AuthService, LoginRequest, RegisterRequest};
pub use password::{PasswordConfig, PasswordHasher, PasswordPolicy};
pub use session::{InMemorySessionStore, SessionConfig, SessionData, SessionStore, Sessions};
