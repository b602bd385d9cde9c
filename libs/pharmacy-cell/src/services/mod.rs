pub mod pharmacy;

pub use pharmacy::PharmacyService;
