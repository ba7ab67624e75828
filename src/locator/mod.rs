//! Locator strategies and multi-strategy element resolution.

pub mod resolver;
pub mod strategy;

pub use resolver::{resolve, wait_visible, ResolveMode, Resolved, Strategy, Target, WaitSettings};
pub use strategy::{Locator, TextMatch};
