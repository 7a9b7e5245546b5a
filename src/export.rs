use crate::categories::CategorySet;
use crate::errors::ScraperError;
use crate::holiday_extractor::{HolidayExtractor, HolidayRecord};
use crate::scraper_client::PageSource;
use crate::script::{RenderPolicy, SqlScript};
use crate::store;
use log::info;
use rusqlite::Connection;
use std::path::{Path, PathBuf};

pub const DEFAULT_BASE_URL: &str = "https://www.calend.ru";
pub const SCRIPT_FILE_NAME: &str = "insert_holidays_and_links.sql";

pub const MONTHS: [&str; 12] = [
    "january",
    "february",
    "march",
    "april",
    "may",
    "june",
    "july",
    "august",
    "september",
    "october",
    "november",
    "december",
];

#[derive(Debug, Clone)]
pub struct ExportOptions {
    pub base_url: String,
    pub categories: CategorySet,
    pub policy: RenderPolicy,
    pub output_dir: PathBuf,
    /// Also load the records into this SQLite database.
    pub sqlite: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportReport {
    pub script_path: PathBuf,
    pub holidays: usize,
    pub links: usize,
}

/// Holidays found on one month page.
#[derive(Debug, Clone)]
pub struct MonthHolidays {
    pub month: &'static str,
    pub records: Vec<HolidayRecord>,
}

pub fn month_url(base_url: &str, month: &str) -> String {
    format!("{}/holidays/{}/", base_url.trim_end_matches('/'), month)
}

/// Fetch and extract every month in calendar order. The first page that
/// cannot be fetched aborts the whole collection.
pub async fn collect_year<S>(
    source: &mut S,
    base_url: &str,
    extractor: &HolidayExtractor,
) -> Result<Vec<MonthHolidays>, ScraperError>
where
    S: PageSource + ?Sized,
{
    let mut months = Vec::with_capacity(MONTHS.len());
    for month in MONTHS {
        let url = month_url(base_url, month);
        let raw_html = source.fetch_page(&url).await?;
        let records = extractor.extract_html(&raw_html);
        info!("{}: {} holidays", month, records.len());
        months.push(MonthHolidays { month, records });
    }
    Ok(months)
}

pub fn build_script(months: &[MonthHolidays], policy: RenderPolicy) -> SqlScript {
    let mut script = SqlScript::new(policy);
    for month in months {
        script.extend(&month.records);
    }
    script
}

pub fn script_path(output_dir: &Path, timestamp: i64) -> PathBuf {
    output_dir.join(format!("{}_{}", timestamp, SCRIPT_FILE_NAME))
}

/// Scrape all twelve months and write the SQL script. Nothing is written
/// unless every month was fetched, and the script only appears under its
/// final name once the optional SQLite load has succeeded.
pub async fn run_export<S>(
    source: &mut S,
    options: &ExportOptions,
) -> Result<ExportReport, ScraperError>
where
    S: PageSource + ?Sized,
{
    let extractor = HolidayExtractor::new(options.categories.clone())?;
    let months = collect_year(source, &options.base_url, &extractor).await?;

    let script = build_script(&months, options.policy);
    let rendered = script.render(&options.categories);

    tokio::fs::create_dir_all(&options.output_dir).await?;
    let path = script_path(&options.output_dir, chrono::Utc::now().timestamp());
    let partial = path.with_extension("sql.part");
    tokio::fs::write(&partial, rendered).await?;

    if let Some(db_path) = &options.sqlite {
        let records: Vec<HolidayRecord> = months
            .into_iter()
            .flat_map(|month| month.records)
            .collect();
        if let Err(err) = save_to_sqlite(db_path, &options.categories, &records) {
            tokio::fs::remove_file(&partial).await?;
            return Err(err);
        }
    }

    tokio::fs::rename(&partial, &path).await?;
    info!(
        "Wrote {} holidays and {} links to {}",
        script.holiday_count(),
        script.link_count(),
        path.display()
    );

    Ok(ExportReport {
        script_path: path,
        holidays: script.holiday_count(),
        links: script.link_count(),
    })
}

fn save_to_sqlite(
    db_path: &Path,
    categories: &CategorySet,
    records: &[HolidayRecord],
) -> Result<(), ScraperError> {
    let mut conn = Connection::open(db_path)?;
    store::save_records(&mut conn, categories, records)
}
