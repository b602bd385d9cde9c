pub mod memory;
pub mod postgrest;
pub mod store;

pub use memory::MemoryStore;
pub use postgrest::RestStore;
pub use store::Store;
