//! CLI command implementations

pub mod config;
pub mod open;
pub mod store;

pub use config::execute as config;
pub use open::execute as open;
pub use store::execute as store;
