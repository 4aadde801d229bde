//! Gerrit Events - query and stream-events ingestion with async listener dispatch.

pub mod config;
pub mod dispatch;
pub mod events;
pub mod query;
pub mod rest;
pub mod stream;
pub mod transport;
