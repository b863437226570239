//! Company contact extraction from page content
//!
//! This module turns raw page markup into a [`Company`] record:
//! - Emails and phone numbers via pattern matching over the page text
//! - Company name from the page title, description from the meta tag
//! - A street-style address when one is recognizable
//! - The website identity key derived from the source URL's origin
//!
//! Extraction is a pure function of its inputs; it holds no state beyond
//! the compiled patterns and never touches the crawl engine's state.

use crate::storage::Company;
use chrono::Utc;
use regex::Regex;
use scraper::{Html, Selector};
use std::collections::HashSet;
use url::Url;

/// Email local parts that never identify a company contact
const JUNK_EMAIL_MARKERS: [&str; 4] = ["noreply", "no-reply", "donotreply", "example.com"];

/// Suffixes that betray an asset filename matched as an "email"
/// (e.g. `logo@2x.png`)
const ASSET_SUFFIXES: [&str; 5] = [".png", ".jpg", ".jpeg", ".gif", ".svg"];

/// Extracts company contact records from crawled pages
pub struct ContactExtractor {
    email_re: Regex,
    phone_re: Regex,
    address_re: Regex,
}

impl ContactExtractor {
    pub fn new() -> Self {
        Self {
            email_re: Regex::new(r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}\b").unwrap(),
            phone_re: Regex::new(
                r"(?:\+?\d{1,2}[-.\s]?)?\(?\d{3}\)?[-.\s]?\d{3}[-.\s]?\d{4}",
            )
            .unwrap(),
            address_re: Regex::new(
                r"(?i)\b\d{1,5} [A-Za-z0-9 .'-]+ (?:Street|St|Avenue|Ave|Road|Rd|Boulevard|Blvd|Lane|Ln|Drive|Dr|Way|Court|Ct|Plaza|Square|Sq)\b[^,<\n]*",
            )
            .unwrap(),
        }
    }

    /// Extracts a contact record from `content`, attributed to `source_url`
    ///
    /// The record's `website` is the `scheme://host` origin of the source
    /// URL, which the store later uses as the uniqueness key. Returns
    /// `None` for empty content, an unparseable or host-less source URL,
    /// or a page that yields neither an email nor a phone number.
    pub fn extract(&self, content: &str, source_url: &str) -> Option<Company> {
        if content.is_empty() {
            return None;
        }

        let source = Url::parse(source_url).ok()?;
        let host = source.host_str()?;
        let website = format!("{}://{}", source.scheme(), host);

        let document = Html::parse_document(content);
        let text = clean_text(&document);

        // Scan the raw markup too: mailto hrefs live outside the text
        let emails = self.collect_emails(&text, content);
        let phones = self.collect_phones(&text);

        if emails.is_empty() && phones.is_empty() {
            return None;
        }

        let name = extract_title(&document).unwrap_or_else(|| host.to_string());
        let description = extract_meta_description(&document);
        let address = self
            .address_re
            .find(&text)
            .map(|m| m.as_str().trim().to_string());

        Some(Company {
            name,
            website,
            phones,
            emails,
            address,
            description,
            crawled_at: Utc::now(),
            source_url: source_url.to_string(),
        })
    }

    fn collect_emails(&self, text: &str, raw: &str) -> Vec<String> {
        let mut emails = Vec::new();
        let mut seen = HashSet::new();

        for haystack in [text, raw] {
            for m in self.email_re.find_iter(haystack) {
                let email = m.as_str().to_lowercase();
                if is_contact_email(&email) && seen.insert(email.clone()) {
                    emails.push(email);
                }
            }
        }

        emails
    }

    fn collect_phones(&self, text: &str) -> Vec<String> {
        let mut phones = Vec::new();
        let mut seen = HashSet::new();

        for m in self.phone_re.find_iter(text) {
            let phone = normalize_phone(m.as_str());
            if phone.len() >= 10 && seen.insert(phone.clone()) {
                phones.push(phone);
            }
        }

        phones
    }
}

impl Default for ContactExtractor {
    fn default() -> Self {
        Self::new()
    }
}

/// Filters out auto-sender addresses and asset filenames
fn is_contact_email(email: &str) -> bool {
    if JUNK_EMAIL_MARKERS.iter().any(|marker| email.contains(marker)) {
        return false;
    }
    !ASSET_SUFFIXES.iter().any(|suffix| email.ends_with(suffix))
}

/// Strips formatting, keeping digits and a leading plus
fn normalize_phone(phone: &str) -> String {
    phone
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '+')
        .collect()
}

/// Collapses the document body into whitespace-normalized text
fn clean_text(document: &Html) -> String {
    let body_selector = match Selector::parse("body") {
        Ok(selector) => selector,
        Err(_) => return String::new(),
    };

    document
        .select(&body_selector)
        .next()
        .map(|body| {
            body.text()
                .collect::<Vec<_>>()
                .join(" ")
                .split_whitespace()
                .collect::<Vec<_>>()
                .join(" ")
        })
        .unwrap_or_default()
}

/// Extracts the page title, if present and non-empty
fn extract_title(document: &Html) -> Option<String> {
    let title_selector = Selector::parse("title").ok()?;

    document
        .select(&title_selector)
        .next()
        .map(|element| element.text().collect::<String>().trim().to_string())
        .filter(|title| !title.is_empty())
}

/// Extracts the meta description, if present and non-empty
fn extract_meta_description(document: &Html) -> Option<String> {
    let meta_selector = Selector::parse(r#"meta[name="description"]"#).ok()?;

    document
        .select(&meta_selector)
        .next()
        .and_then(|element| element.value().attr("content"))
        .map(|content| content.trim().to_string())
        .filter(|content| !content.is_empty())
}
