pub mod config;
pub mod context;
pub mod driver;
pub mod error;
pub mod locators;
pub mod mail;
pub mod runner;
pub mod selectors;
pub mod session;
pub mod steps;

pub use error::{HarnessError, Result};
