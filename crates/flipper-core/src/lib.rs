pub mod config;
pub mod error;
pub mod flip;
pub mod types;
pub mod utils;

pub use config::*;
pub use error::*;
pub use flip::*;
pub use types::*;
pub use utils::*;
