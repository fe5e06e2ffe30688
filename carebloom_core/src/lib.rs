#![forbid(unsafe_code)]

//! Core domain model and business logic for the Carebloom care calendar.
//!
//! This crate provides:
//! - Domain types (care events, drafts, daily templates)
//! - Template materialization with stable recurring ids
//! - Today/overdue queries
//! - Local-first persistence (key-value cache, remote REST store)
//! - The calendar session used by front ends

pub mod types;
pub mod error;
pub mod config;
pub mod logging;
pub mod template;
pub mod schedule;
pub mod cache;
pub mod remote;
pub mod store;
pub mod session;
pub mod export;

// Re-export commonly used types
pub use error::{Error, RemoteError, RemoteResult, Result};
pub use types::*;
pub use config::Config;
pub use template::{BuiltinTemplates, ConfiguredTemplates, TemplateProvider};
pub use cache::{EventCache, FileStore, KeyValueStore, MemoryStore};
pub use remote::{HttpRemote, OfflineRemote, RemoteStore};
pub use store::EventStore;
pub use session::CalendarSession;
pub use export::export_events_csv;
