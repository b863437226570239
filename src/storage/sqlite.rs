//! SQLite company store implementation
//!
//! This module provides a SQLite-based implementation of the CompanyStore
//! trait. Phone and email lists are stored as JSON text columns; the
//! `website` column carries a UNIQUE constraint so the dedup-by-website
//! guarantee holds even when two tasks race through the find-then-save
//! window at the same time.

use crate::storage::schema::initialize_schema;
use crate::storage::traits::{CompanyStore, StorageError, StorageResult};
use crate::storage::Company;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;

const COMPANY_COLUMNS: &str =
    "name, website, phones, emails, address, description, crawled_at, source_url";

/// SQLite storage backend for companies
pub struct SqliteCompanyStore {
    conn: Connection,
}

impl SqliteCompanyStore {
    /// Opens or creates a company database at `path`
    pub fn new(path: &Path) -> StorageResult<Self> {
        let conn = Connection::open(path)?;

        // Configure SQLite for better performance
        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA foreign_keys = ON;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        // Initialize schema
        initialize_schema(&conn)?;

        Ok(Self { conn })
    }

    /// Creates an in-memory store (tests and dry runs)
    pub fn new_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }

    fn select_companies<P: rusqlite::Params>(
        &self,
        sql: &str,
        params: P,
    ) -> StorageResult<Vec<Company>> {
        let mut stmt = self.conn.prepare(sql)?;
        let rows = stmt.query_map(params, row_to_raw)?;

        let mut companies = Vec::new();
        for raw in rows {
            companies.push(raw?.into_company()?);
        }

        Ok(companies)
    }
}

/// Column values as read from SQLite, before JSON/timestamp decoding
struct RawCompany {
    name: String,
    website: String,
    phones: String,
    emails: String,
    address: Option<String>,
    description: Option<String>,
    crawled_at: String,
    source_url: String,
}

impl RawCompany {
    fn into_company(self) -> StorageResult<Company> {
        let crawled_at: DateTime<Utc> = DateTime::parse_from_rfc3339(&self.crawled_at)
            .map_err(|e| StorageError::Database(format!("invalid crawled_at timestamp: {}", e)))?
            .with_timezone(&Utc);

        Ok(Company {
            name: self.name,
            website: self.website,
            phones: serde_json::from_str(&self.phones)?,
            emails: serde_json::from_str(&self.emails)?,
            address: self.address,
            description: self.description,
            crawled_at,
            source_url: self.source_url,
        })
    }
}

fn row_to_raw(row: &Row) -> rusqlite::Result<RawCompany> {
    Ok(RawCompany {
        name: row.get(0)?,
        website: row.get(1)?,
        phones: row.get(2)?,
        emails: row.get(3)?,
        address: row.get(4)?,
        description: row.get(5)?,
        crawled_at: row.get(6)?,
        source_url: row.get(7)?,
    })
}

impl CompanyStore for SqliteCompanyStore {
    fn find_by_website(&self, website: &str) -> StorageResult<Option<Company>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM companies WHERE website = ?1",
            COMPANY_COLUMNS
        ))?;

        let raw = stmt
            .query_row(params![website], row_to_raw)
            .optional()?;

        match raw {
            Some(raw) => Ok(Some(raw.into_company()?)),
            None => Ok(None),
        }
    }

    fn save(&mut self, company: &Company) -> StorageResult<bool> {
        let phones = serde_json::to_string(&company.phones)?;
        let emails = serde_json::to_string(&company.emails)?;

        // ON CONFLICT DO NOTHING makes the write idempotent per website,
        // closing the race between concurrent find-then-save callers
        let inserted = self.conn.execute(
            &format!(
                "INSERT INTO companies ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                 ON CONFLICT(website) DO NOTHING",
                COMPANY_COLUMNS
            ),
            params![
                company.name,
                company.website,
                phones,
                emails,
                company.address,
                company.description,
                company.crawled_at.to_rfc3339(),
                company.source_url,
            ],
        )?;

        Ok(inserted > 0)
    }

    fn find_by_name_contains(&self, fragment: &str) -> StorageResult<Vec<Company>> {
        let pattern = format!("%{}%", fragment);
        self.select_companies(
            &format!(
                "SELECT {} FROM companies WHERE name LIKE ?1 COLLATE NOCASE ORDER BY name",
                COMPANY_COLUMNS
            ),
            params![pattern],
        )
    }

    fn find_with_contacts(&self) -> StorageResult<Vec<Company>> {
        self.select_companies(
            &format!(
                "SELECT {} FROM companies WHERE phones != '[]' OR emails != '[]' ORDER BY name",
                COMPANY_COLUMNS
            ),
            params![],
        )
    }

    fn find_by_phone(&self, phone: &str) -> StorageResult<Vec<Company>> {
        // Phones are a JSON array of strings; an exact member shows up
        // quoted in the serialized text
        let pattern = format!("%\"{}\"%", phone);
        self.select_companies(
            &format!(
                "SELECT {} FROM companies WHERE phones LIKE ?1 ORDER BY name",
                COMPANY_COLUMNS
            ),
            params![pattern],
        )
    }

    fn find_by_email(&self, email: &str) -> StorageResult<Vec<Company>> {
        let pattern = format!("%\"{}\"%", email);
        self.select_companies(
            &format!(
                "SELECT {} FROM companies WHERE emails LIKE ?1 ORDER BY name",
                COMPANY_COLUMNS
            ),
            params![pattern],
        )
    }

    fn count_companies(&self) -> StorageResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM companies", [], |row| row.get(0))?;
        Ok(count as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_company(website: &str, name: &str) -> Company {
        Company {
            name: name.to_string(),
            website: website.to_string(),
            phones: vec!["5551234567".to_string()],
            emails: vec!["sales@acme.test".to_string()],
            address: Some("12 Coyote Road".to_string()),
            description: Some("Industrial anvils since 1949.".to_string()),
            crawled_at: Utc::now(),
            source_url: format!("{}/contact", website),
        }
    }

    #[test]
    fn test_save_and_find_roundtrip() {
        let mut store = SqliteCompanyStore::new_in_memory().unwrap();
        let company = sample_company("http://acme.test", "Acme Corporation");

        assert!(store.save(&company).unwrap());

        let found = store.find_by_website("http://acme.test").unwrap().unwrap();
        assert_eq!(found.name, company.name);
        assert_eq!(found.phones, company.phones);
        assert_eq!(found.emails, company.emails);
        assert_eq!(found.address, company.address);
        assert_eq!(found.description, company.description);
        assert_eq!(found.source_url, company.source_url);
    }

    #[test]
    fn test_find_by_website_absent() {
        let store = SqliteCompanyStore::new_in_memory().unwrap();
        assert!(store.find_by_website("http://nowhere.test").unwrap().is_none());
    }

    #[test]
    fn test_sequential_saves_same_website_persist_once() {
        let mut store = SqliteCompanyStore::new_in_memory().unwrap();

        let first = sample_company("http://acme.test", "Acme Corporation");
        let second = sample_company("http://acme.test", "Acme Corp (duplicate)");

        assert!(store.save(&first).unwrap());
        assert!(!store.save(&second).unwrap(), "duplicate website must be suppressed");

        assert_eq!(store.count_companies().unwrap(), 1);
        let kept = store.find_by_website("http://acme.test").unwrap().unwrap();
        assert_eq!(kept.name, "Acme Corporation");
    }

    #[test]
    fn test_distinct_websites_both_persist() {
        let mut store = SqliteCompanyStore::new_in_memory().unwrap();

        store.save(&sample_company("http://acme.test", "Acme")).unwrap();
        store.save(&sample_company("http://globex.test", "Globex")).unwrap();

        assert_eq!(store.count_companies().unwrap(), 2);
    }

    #[test]
    fn test_find_by_name_contains_is_case_insensitive() {
        let mut store = SqliteCompanyStore::new_in_memory().unwrap();
        store.save(&sample_company("http://acme.test", "Acme Corporation")).unwrap();
        store.save(&sample_company("http://globex.test", "Globex Industries")).unwrap();

        let hits = store.find_by_name_contains("ACME").unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].name, "Acme Corporation");

        assert!(store.find_by_name_contains("initech").unwrap().is_empty());
    }

    #[test]
    fn test_find_with_contacts_skips_contactless_rows() {
        let mut store = SqliteCompanyStore::new_in_memory().unwrap();

        let mut bare = sample_company("http://bare.test", "Bare Landing");
        bare.phones.clear();
        bare.emails.clear();
        store.save(&bare).unwrap();
        store.save(&sample_company("http://acme.test", "Acme")).unwrap();

        let with_contacts = store.find_with_contacts().unwrap();
        assert_eq!(with_contacts.len(), 1);
        assert_eq!(with_contacts[0].website, "http://acme.test");
    }

    #[test]
    fn test_find_by_phone_and_email() {
        let mut store = SqliteCompanyStore::new_in_memory().unwrap();
        store.save(&sample_company("http://acme.test", "Acme")).unwrap();

        let by_phone = store.find_by_phone("5551234567").unwrap();
        assert_eq!(by_phone.len(), 1);

        let by_email = store.find_by_email("sales@acme.test").unwrap();
        assert_eq!(by_email.len(), 1);

        assert!(store.find_by_phone("0000000000").unwrap().is_empty());
        assert!(store.find_by_email("nobody@acme.test").unwrap().is_empty());
    }

    #[test]
    fn test_crawled_at_survives_roundtrip() {
        let mut store = SqliteCompanyStore::new_in_memory().unwrap();
        let company = sample_company("http://acme.test", "Acme");
        store.save(&company).unwrap();

        let found = store.find_by_website("http://acme.test").unwrap().unwrap();
        // RFC 3339 text keeps sub-second precision
        assert_eq!(found.crawled_at, company.crawled_at);
    }
}
