//! Storage module for persisting discovered companies
//!
//! This module handles all database operations for the crawler, including:
//! - SQLite database initialization and schema management
//! - The company write path with dedup-by-website
//! - Lookup queries over persisted companies

mod schema;
mod sqlite;
mod traits;

pub use sqlite::SqliteCompanyStore;
pub use traits::{CompanyStore, StorageError, StorageResult};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Opens or creates a company database at the given path
pub fn open_store(path: &Path) -> StorageResult<SqliteCompanyStore> {
    SqliteCompanyStore::new(path)
}

/// A company contact record extracted from a crawled page
///
/// `website` is the identity key: the store holds at most one record per
/// website value, and a record is persisted only when its website is new.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Company {
    pub name: String,
    pub website: String,
    pub phones: Vec<String>,
    pub emails: Vec<String>,
    pub address: Option<String>,
    pub description: Option<String>,
    pub crawled_at: DateTime<Utc>,
    pub source_url: String,
}

impl Company {
    /// Returns true when the record carries at least one phone or email
    pub fn has_contacts(&self) -> bool {
        !self.phones.is_empty() || !self.emails.is_empty()
    }
}
