pub mod admin;
pub mod impersonation;

pub use admin::SuperAdminService;
pub use impersonation::ImpersonationService;
