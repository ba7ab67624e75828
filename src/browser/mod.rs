//! Chrome control over CDP and the page abstraction scenarios run against.

pub mod cdp;
pub mod chrome;
pub mod launcher;
pub mod page;
pub mod port;
pub mod script;

pub use cdp::CDPClient;
pub use chrome::{CdpPage, ChromeFactory};
pub use page::{Dialog, ElementState, Navigation, Page, PageFactory};
