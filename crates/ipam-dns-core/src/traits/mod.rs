//! Core traits for the synchronizer
//!
//! - [`RecordApi`]: Write record sets through a DNS management API
//! - [`RecordApiFactory`]: Build a [`RecordApi`] from configuration

pub mod record_api;

pub use record_api::{RecordApi, RecordApiFactory};
