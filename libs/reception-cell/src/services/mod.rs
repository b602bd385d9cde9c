pub mod reception;

pub use reception::ReceptionService;
