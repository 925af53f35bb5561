pub mod config;
pub mod dataset;
pub mod estimate;
pub mod parser;
pub mod resolver;
pub mod scraper;
pub mod types;
pub mod utils;

pub use config::ResolverConfig;
pub use resolver::{ResolutionFailure, Resolver};
pub use scraper::{DataSource, ScraperError, WebScraper};
pub use types::{AttendanceRecord, DataQuality, Period, Source};

pub(crate) const BASE_URL: &str = "https://www.broadwayworld.com";
