pub mod browser;
pub mod config;
pub mod error;
pub mod locator;
pub mod logging;
pub mod scenario;
pub mod scenarios;

pub use error::{Result, UiScoutError};
