pub mod filter;
pub mod lessons;
pub mod models;
pub mod stats;


pub use filter::*;
pub use lessons::*;
pub use models::*;
pub use stats::*;
