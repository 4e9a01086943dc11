//! Embedded dashboard page.
//!
//! Serves a single-page dashboard at `/` that lays out the configured
//! tiles, fetches their fragments from `/api/tiles/:id`, and polls
//! `/api/stats` and `/api/history` for the activity panel.

pub mod handler;

pub use handler::{assets_handler, dashboard_handler};
