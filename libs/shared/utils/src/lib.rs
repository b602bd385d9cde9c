pub mod audit;
pub mod extractor;
pub mod guard;
pub mod ids;
pub mod jwt;
pub mod password;
pub mod state;

pub use extractor::{auth_middleware, clinic_context_middleware, resolve_clinic};
pub use guard::{ensure_module, require_module, require_roles};
pub use state::AppState;
