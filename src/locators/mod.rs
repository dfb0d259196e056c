//! Page locator documents.
//!
//! Every page has one JSON document mapping logical element names to
//! selectors, grouped by category:
//!
//! ```json
//! {
//!     "url": { "URL": "/login" },
//!     "buttons": { "submit": "#submit-btn" },
//!     "inputs": { "username": "input[name='acct']" },
//!     "hrefs": {},
//!     "special": { "banner": "text=Welcome" }
//! }
//! ```

mod document;
mod repository;

pub use document::{Category, LocatorDocument};
pub use repository::LocatorRepository;
