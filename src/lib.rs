//! Imports a user's GitHub stars, follows, followers, repository languages
//! and the stars of the people they follow into a relational store.

pub mod actors;
pub mod admin;
pub mod auth;
pub mod cli;
pub mod collectors;
pub mod config;
pub mod error;
pub mod github;
pub mod health;
pub mod models;
pub mod pagination;
pub mod pool;
pub mod store;
pub mod sync;
pub mod types;

pub use error::{Result, SyncError};
pub use store::{MemoryStore, SurrealStore, SyncStore};
pub use sync::{CollectorOutcome, SyncCoordinator, SyncReport};
