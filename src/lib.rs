//! Telegram Bot API connector runtime for workflow engines.
//!
//! Resolves the externally reachable callback base URL from layered
//! configuration (explicit config, environment override, cloud topology),
//! manages the webhook lifecycle against the Telegram Bot API, serves the
//! inbound webhook endpoint, and composes outbound Bot API requests from
//! layered parameter sources.

pub mod compose;
pub mod config;
pub mod connector;
pub mod resolver;
pub mod routes;
pub mod telegram;
