use crate::categories::CategorySet;
use crate::export::{ExportOptions, DEFAULT_BASE_URL};
use crate::scraper_client::ClientConfig;
use crate::script::RenderPolicy;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(name = "calend-scraper")]
#[command(about = "Scrape calend.ru holiday listings into SQL or raw HTML pages")]
#[command(version)]
pub struct Cli {
    /// Show debug output (RUST_LOG still takes precedence)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Scrape the twelve monthly holiday pages and write an SQL script
    Export(ExportArgs),

    /// Download the raw HTML page of every day of a year
    Archive(ArchiveArgs),
}

#[derive(Args, Debug)]
pub struct FetchArgs {
    /// Request timeout in seconds
    #[arg(long, default_value_t = 30)]
    pub timeout: u64,

    /// Extra attempts after a failed request
    #[arg(long, default_value_t = 0)]
    pub max_retries: u8,

    /// Seconds to wait between attempts
    #[arg(long, default_value_t = 2)]
    pub retry_delay: u64,
}

impl FetchArgs {
    pub fn client_config(&self) -> ClientConfig {
        ClientConfig {
            timeout: Duration::from_secs(self.timeout),
            max_retries: self.max_retries,
            retry_delay: Duration::from_secs(self.retry_delay),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum PolicyArg {
    /// Append categories to the holiday name
    Embedded,
    /// Write category link rows
    NormalizedLink,
}

impl From<PolicyArg> for RenderPolicy {
    fn from(policy: PolicyArg) -> Self {
        match policy {
            PolicyArg::Embedded => RenderPolicy::Embedded,
            PolicyArg::NormalizedLink => RenderPolicy::NormalizedLink,
        }
    }
}

#[derive(Args, Debug)]
pub struct ExportArgs {
    /// Site root; month pages are read from <base-url>/holidays/<month>/
    #[arg(long, env = "CALEND_BASE_URL", default_value = DEFAULT_BASE_URL)]
    pub base_url: String,

    /// Accepted category label (repeatable). Defaults to the built-in list
    #[arg(short, long = "category")]
    pub categories: Vec<String>,

    /// How categories are represented in the script
    #[arg(short, long, value_enum, default_value = "normalized-link")]
    pub policy: PolicyArg,

    /// Directory for the generated script
    #[arg(short, long, default_value = "output_calend")]
    pub output_dir: PathBuf,

    /// Read saved month pages (<month>.html) from this directory instead of the network
    #[arg(long)]
    pub pages_dir: Option<PathBuf>,

    /// Also load the holidays into this SQLite database
    #[arg(long)]
    pub sqlite: Option<PathBuf>,

    #[command(flatten)]
    pub fetch: FetchArgs,
}

impl ExportArgs {
    pub fn category_set(&self) -> CategorySet {
        if self.categories.is_empty() {
            CategorySet::default()
        } else {
            CategorySet::new(self.categories.iter().cloned())
        }
    }

    pub fn options(&self) -> ExportOptions {
        ExportOptions {
            base_url: self.base_url.clone(),
            categories: self.category_set(),
            policy: self.policy.into(),
            output_dir: self.output_dir.clone(),
            sqlite: self.sqlite.clone(),
        }
    }
}

#[derive(Args, Debug)]
pub struct ArchiveArgs {
    /// Site root; day pages are read from <base-url>/<month>/<day>
    #[arg(long, env = "BASE_URL")]
    pub base_url: String,

    /// Year to download (defaults to the current year)
    #[arg(short, long)]
    pub year: Option<i32>,

    /// Directory for the saved pages
    #[arg(short, long, default_value = "output")]
    pub output_dir: PathBuf,

    #[command(flatten)]
    pub fetch: FetchArgs,
}
