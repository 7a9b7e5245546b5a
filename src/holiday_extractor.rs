use crate::categories::CategorySet;
use crate::errors::ScraperError;
use chrono::NaiveDate;
use log::debug;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use std::collections::HashMap;

const DAY_SELECTOR: &str = ".block .datesList .holidayweek ul.itemsNet li";
const DATE_LINK_SELECTOR: &str = ".dataNum a";
const CAPTION_SELECTOR: &str = ".caption";
const TITLE_SELECTOR: &str = ".title a";
const IMAGE_SELECTOR: &str = "img";

/// Day links look like `/day/2024-01-07/`.
const DAY_LINK_PREFIX: &str = "/day/";

/// One allow-listed holiday found on a month page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HolidayRecord {
    /// Position among the day's accepted holidays, starting at 1.
    pub ordinal: u32,
    pub date: NaiveDate,
    /// Display name as scraped. Not escaped.
    pub name: String,
    /// Matched labels in the order their icons appear.
    pub categories: Vec<String>,
}

impl HolidayRecord {
    pub fn iso_date(&self) -> String {
        self.date.format("%Y-%m-%d").to_string()
    }
}

/// Hands out per-day ordinals. A date that shows up again after another
/// date continues its own numbering, so `(date, ordinal)` stays unique.
#[derive(Debug, Default)]
struct DayCursor {
    date: Option<NaiveDate>,
    next_ordinals: HashMap<NaiveDate, u32>,
}

impl DayCursor {
    fn observe(&mut self, date: NaiveDate) {
        if self.date != Some(date) {
            if self.next_ordinals.contains_key(&date) {
                debug!("Date {} listed again, continuing its numbering", date);
            }
            self.date = Some(date);
        }
    }

    fn take_ordinal(&mut self, date: NaiveDate) -> u32 {
        let next = self.next_ordinals.entry(date).or_insert(1);
        let ordinal = *next;
        *next += 1;
        ordinal
    }
}

/// Pulls allow-listed holidays out of a calend.ru month page.
///
/// Extraction never fails on page content: a day without a date link, a
/// caption without a title, or a holiday without an allowed category icon
/// simply contributes nothing.
pub struct HolidayExtractor {
    categories: CategorySet,
    day_selector: Selector,
    date_link_selector: Selector,
    caption_selector: Selector,
    title_selector: Selector,
    image_selector: Selector,
    whitespace: Regex,
}

impl HolidayExtractor {
    pub fn new(categories: CategorySet) -> Result<Self, ScraperError> {
        Ok(Self {
            categories,
            day_selector: parse_selector(DAY_SELECTOR)?,
            date_link_selector: parse_selector(DATE_LINK_SELECTOR)?,
            caption_selector: parse_selector(CAPTION_SELECTOR)?,
            title_selector: parse_selector(TITLE_SELECTOR)?,
            image_selector: parse_selector(IMAGE_SELECTOR)?,
            whitespace: Regex::new(r"\s+")?,
        })
    }

    /// Parse raw HTML and extract its holidays.
    pub fn extract_html(&self, raw_html: &str) -> Vec<HolidayRecord> {
        let document = Html::parse_document(raw_html);
        self.extract(&document)
    }

    /// Walk the day list in document order. Each date numbers its accepted
    /// holidays from 1; rejected holidays consume no ordinal.
    pub fn extract(&self, document: &Html) -> Vec<HolidayRecord> {
        let mut cursor = DayCursor::default();
        let mut records = Vec::new();

        for day in document.select(&self.day_selector) {
            let Some(date) = self.day_date(day) else {
                debug!("Skipping day entry without a usable date link");
                continue;
            };
            cursor.observe(date);

            for caption in day.select(&self.caption_selector) {
                let Some(name) = self.caption_name(caption) else {
                    debug!("Skipping caption without a title on {}", date);
                    continue;
                };

                let categories = self.caption_categories(caption);
                if categories.is_empty() {
                    debug!("Dropping '{}' on {}: no allowed category", name, date);
                    continue;
                }

                records.push(HolidayRecord {
                    ordinal: cursor.take_ordinal(date),
                    date,
                    name,
                    categories,
                });
            }
        }

        records
    }

    fn day_date(&self, day: ElementRef) -> Option<NaiveDate> {
        let link = day.select(&self.date_link_selector).next()?;
        parse_day_link(link.value().attr("href")?)
    }

    fn caption_name(&self, caption: ElementRef) -> Option<String> {
        let title = caption.select(&self.title_selector).next()?;
        let text: String = title.text().collect();
        let name = self.whitespace.replace_all(&text, " ").trim().to_string();
        (!name.is_empty()).then_some(name)
    }

    fn caption_categories(&self, caption: ElementRef) -> Vec<String> {
        let mut matched: Vec<String> = Vec::new();
        for image in caption.select(&self.image_selector) {
            if let Some(alt) = image.value().attr("alt") {
                if self.categories.contains(alt) {
                    matched.push(alt.to_string());
                }
            }
        }
        matched
    }
}

fn parse_selector(selector: &str) -> Result<Selector, ScraperError> {
    Selector::parse(selector).map_err(|err| ScraperError::SelectorError(err.to_string()))
}

/// `/day/2024-01-07/` (or an absolute URL ending that way) to a date.
fn parse_day_link(href: &str) -> Option<NaiveDate> {
    let token = href.trim();
    let token = match token.split_once(DAY_LINK_PREFIX) {
        Some((_, rest)) => rest,
        None => token,
    };
    let token = token.strip_suffix('/').unwrap_or(token);
    NaiveDate::parse_from_str(token, "%Y-%m-%d").ok()
}
