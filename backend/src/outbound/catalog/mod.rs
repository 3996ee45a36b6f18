//! Remote catalog adapter backed by HTTP.

pub mod dto;
pub mod http_source;

pub use http_source::HttpCatalogSource;
