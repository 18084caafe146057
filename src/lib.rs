pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod forms;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod views;

pub use config::Config;
pub use error::LogbookError;
pub use router::{LogbookState, logbook_router};
