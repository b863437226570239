use serde::Deserialize;

/// Main configuration structure for Prospect
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub crawler: CrawlerConfig,
    pub fetch: FetchConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    pub output: OutputConfig,
    #[serde(default)]
    pub seeds: Vec<String>,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// Maximum number of pages a single task may visit
    #[serde(rename = "max-pages-per-task")]
    pub max_pages_per_task: u32,

    /// Fixed pause between successive page fetches within a task (milliseconds)
    #[serde(rename = "politeness-delay-ms")]
    pub politeness_delay_ms: u64,

    /// Maximum number of tasks executing concurrently
    #[serde(rename = "max-concurrent-tasks")]
    pub max_concurrent_tasks: u32,

    /// Whether tasks submitted beyond pool capacity wait for a free slot.
    /// When false, submission fails with a capacity error instead.
    #[serde(rename = "queue-when-saturated", default = "default_queue_when_saturated")]
    pub queue_when_saturated: bool,
}

fn default_queue_when_saturated() -> bool {
    true
}

/// Fetch strategy timeout configuration
///
/// Every strategy applies these to its own HTTP client; the pipeline adds
/// no timeout of its own.
#[derive(Debug, Clone, Deserialize)]
pub struct FetchConfig {
    /// Total request timeout per strategy attempt (seconds)
    #[serde(rename = "request-timeout-secs")]
    pub request_timeout_secs: u64,

    /// Connect timeout per strategy attempt (seconds)
    #[serde(rename = "connect-timeout-secs")]
    pub connect_timeout_secs: u64,
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UserAgentConfig {
    /// Name of the crawler
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version")]
    pub crawler_version: String,

    /// URL with information about the crawler
    #[serde(rename = "contact-url")]
    pub contact_url: String,

    /// Email address for crawler-related contact
    #[serde(rename = "contact-email")]
    pub contact_email: String,
}

impl UserAgentConfig {
    /// Formats the User-Agent header value: `Name/Version (+URL; Email)`
    pub fn header_value(&self) -> String {
        format!(
            "{}/{} (+{}; {})",
            self.crawler_name, self.crawler_version, self.contact_url, self.contact_email
        )
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Path to the SQLite company database file
    #[serde(rename = "database-path")]
    pub database_path: String,
}
