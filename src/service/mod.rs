//! Transaction-owning service layer

pub mod products;

pub use products::ProductService;
