pub mod categories;
pub mod cli;
pub mod errors;
pub mod export;
pub mod holiday_extractor;
pub mod page_archive;
pub mod scraper_client;
pub mod script;
pub mod sql;
pub mod store;
