#![forbid(unsafe_code)]

//! Premier Research Club site model
//!
//! Interactive state of the club's landing page (scroll-driven navigation,
//! mobile menu, reveal animations, forms) plus the research dashboard charts
//! and the back-end collaborators the forms talk to.

pub mod backend;
pub mod charts;
pub mod config;
pub mod constants;
pub mod error;
pub mod forms;
pub mod geometry;
pub mod menu;
pub mod notify;
pub mod page;
pub mod projects;
pub mod replay;
pub mod reveal;
pub mod scroll;
pub mod timer;

pub use config::SiteConfig;
pub use error::{CollaboratorError, SiteError};
pub use page::{Page, PageEvent, PageLayout};
