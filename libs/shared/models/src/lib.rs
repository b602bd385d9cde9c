pub mod auth;
pub mod entities;
pub mod error;
pub mod roles;

pub use auth::*;
pub use entities::*;
pub use error::AppError;
pub use roles::{effective_role, Role};
