pub mod error;
pub mod lifecycle;
pub mod models;
pub mod store;

pub use error::*;
pub use lifecycle::*;
pub use models::*;
pub use store::*;
