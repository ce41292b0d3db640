//! HTTP surface for the audience catalog and segment engine.

pub mod catalog_rest;
pub mod rest;
pub mod segment_rest;
pub mod server;
pub mod swagger;
pub mod sync_rest;

pub use server::ApiServer;
