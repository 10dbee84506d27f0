// Email scrape relay - API Core
//
// Accepts lead-generation jobs over HTTP, runs the external scraping worker
// for each one, and relays the resulting email list to the caller's webhook.

pub mod config;
pub mod domains;
pub mod kernel;
pub mod server;

pub use config::*;
