//! HTTP handlers and routing.

pub mod collections;
pub mod embed;
pub mod monitoring;
pub mod records;
pub mod routes;
pub mod search;
