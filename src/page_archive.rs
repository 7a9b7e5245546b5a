//! Downloads one raw HTML page per day of a year into a directory.
//!
//! Pages that are already on disk are not fetched again, so an interrupted
//! run can simply be restarted. A day that fails to download is logged and
//! left for the next run.

use crate::errors::ScraperError;
use crate::scraper_client::PageSource;
use chrono::{Datelike, NaiveDate};
use log::{info, warn};
use std::path::{Path, PathBuf};
use std::time::Instant;

/// Transliterated Russian month names used in day URLs.
const MONTH_SLUGS: [&str; 12] = [
    "yanvar", "fevral", "mart", "aprel", "may", "iyun", "iyul", "avgust", "sentyabr", "oktyabr",
    "noyabr", "dekabr",
];

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ArchiveSummary {
    pub saved: usize,
    pub skipped: usize,
    pub failed: usize,
}

pub fn month_slug(date: NaiveDate) -> &'static str {
    MONTH_SLUGS[date.month0() as usize]
}

/// `<base>/<month-slug>/<day>`, e.g. `https://example.org/yanvar/7`.
pub fn day_url(base_url: &str, date: NaiveDate) -> String {
    format!(
        "{}/{}/{}",
        base_url.trim_end_matches('/'),
        month_slug(date),
        date.day()
    )
}

pub fn day_file(dir: &Path, date: NaiveDate) -> PathBuf {
    dir.join(format!("{}.html", date.format("%Y-%m-%d")))
}

/// Every calendar day of `year` in order.
pub fn days_of_year(year: i32) -> Result<Vec<NaiveDate>, ScraperError> {
    let first = NaiveDate::from_ymd_opt(year, 1, 1)
        .ok_or_else(|| ScraperError::CustomError(format!("Unsupported year: {}", year)))?;
    Ok(first
        .iter_days()
        .take_while(|date| date.year() == year)
        .collect())
}

pub async fn archive_year<S>(
    source: &mut S,
    base_url: &str,
    year: i32,
    dir: &Path,
) -> Result<ArchiveSummary, ScraperError>
where
    S: PageSource + ?Sized,
{
    let days = days_of_year(year)?;
    tokio::fs::create_dir_all(dir).await?;

    let mut summary = ArchiveSummary::default();
    for date in days {
        let path = day_file(dir, date);
        if tokio::fs::try_exists(&path).await? {
            info!("Skipping fetch for {}: file already exists", path.display());
            summary.skipped += 1;
            continue;
        }

        let started = Instant::now();
        let url = day_url(base_url, date);
        let html = match source.fetch_page(&url).await {
            Ok(html) => html,
            Err(err) => {
                warn!("Error fetching page for {}: {}", date, err);
                summary.failed += 1;
                continue;
            }
        };

        if let Err(err) = tokio::fs::write(&path, html).await {
            warn!("Error saving page for {}: {}", date, err);
            summary.failed += 1;
            continue;
        }

        info!(
            "Date: {}, File: {}, Time Elapsed for Fetch and Save: {:?}",
            date,
            path.display(),
            started.elapsed()
        );
        summary.saved += 1;
    }

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    #[derive(Default)]
    struct FakeSource {
        requested: Vec<String>,
        failing: Vec<String>,
    }

    #[async_trait]
    impl PageSource for FakeSource {
        async fn fetch_page(&mut self, url: &str) -> Result<String, ScraperError> {
            self.requested.push(url.to_string());
            if self.failing.iter().any(|f| f == url) {
                return Err(ScraperError::CustomError("boom".to_string()));
            }
            Ok(format!("<html>{}</html>", url))
        }
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_day_url_uses_transliterated_month() {
        assert_eq!(day_url("https://x.org/", date(2024, 1, 7)), "https://x.org/yanvar/7");
        assert_eq!(day_url("https://x.org", date(2024, 5, 1)), "https://x.org/may/1");
        assert_eq!(day_url("https://x.org", date(2024, 12, 31)), "https://x.org/dekabr/31");
    }

    #[test]
    fn test_days_of_year_handles_leap_years() {
        assert_eq!(days_of_year(2024).unwrap().len(), 366);
        assert_eq!(days_of_year(2023).unwrap().len(), 365);
        let days = days_of_year(2024).unwrap();
        assert_eq!(days[59], date(2024, 2, 29));
        assert_eq!(*days.last().unwrap(), date(2024, 12, 31));
    }

    #[test]
    fn test_day_file_is_iso_named() {
        assert_eq!(
            day_file(Path::new("output"), date(2024, 3, 8)),
            PathBuf::from("output/2024-03-08.html")
        );
    }

    #[tokio::test]
    async fn test_archive_year_skips_existing_and_continues_past_failures() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("2023-01-01.html"), "cached").unwrap();

        let mut source = FakeSource {
            failing: vec!["http://cal/mart/8".to_string()],
            ..Default::default()
        };

        let summary = archive_year(&mut source, "http://cal", 2023, dir.path())
            .await
            .unwrap();

        assert_eq!(
            summary,
            ArchiveSummary {
                saved: 363,
                skipped: 1,
                failed: 1,
            }
        );
        assert_eq!(source.requested.len(), 364);
        assert!(!source.requested.contains(&"http://cal/yanvar/1".to_string()));
        assert_eq!(
            std::fs::read_to_string(dir.path().join("2023-01-01.html")).unwrap(),
            "cached"
        );
        assert_eq!(
            std::fs::read_to_string(dir.path().join("2023-12-31.html")).unwrap(),
            "<html>http://cal/dekabr/31</html>"
        );
        assert!(!dir.path().join("2023-03-08.html").exists());
    }

    #[tokio::test]
    async fn test_archive_year_creates_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("pages").join("2024");
        let mut source = FakeSource::default();

        let summary = archive_year(&mut source, "http://cal", 2024, &nested)
            .await
            .unwrap();

        assert_eq!(summary.saved, 366);
        assert!(nested.join("2024-02-29.html").exists());
    }
}
