//! Company store trait and error types

use crate::storage::Company;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for company persistence backends
///
/// `website` is the uniqueness key: an implementation must never hold two
/// records with the same website value, regardless of caller discipline.
/// Implementations are shared across concurrently running tasks behind a
/// mutex, so every method takes a plain receiver.
pub trait CompanyStore: Send {
    /// Looks up a company by its website identity key
    fn find_by_website(&self, website: &str) -> StorageResult<Option<Company>>;

    /// Persists a company unless its website is already present
    ///
    /// Returns true when a new row was written, false when an existing
    /// website suppressed the insert.
    fn save(&mut self, company: &Company) -> StorageResult<bool>;

    /// Case-insensitive substring search over company names
    fn find_by_name_contains(&self, fragment: &str) -> StorageResult<Vec<Company>>;

    /// Companies that list at least one phone or email
    fn find_with_contacts(&self) -> StorageResult<Vec<Company>>;

    /// Companies listing the given phone number
    fn find_by_phone(&self, phone: &str) -> StorageResult<Vec<Company>>;

    /// Companies listing the given email address
    fn find_by_email(&self, email: &str) -> StorageResult<Vec<Company>>;

    /// Total number of persisted companies
    fn count_companies(&self) -> StorageResult<u64>;
}
