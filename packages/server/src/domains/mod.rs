// Business domains
pub mod scraping;
