//! Browser front end.
//!
//! Serves the three pages (landing, login, main) as server-rendered HTML.
//! Each request is one render cycle: resolve the session from its cookie,
//! apply at most one page event, render the resulting page.

pub mod error;
pub mod handlers;
pub mod middleware;
pub mod pages;
pub mod router;
pub mod server;

pub use router::build_router;
pub use server::{start_server, WebServer};
