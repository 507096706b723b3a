pub mod catalog;
pub mod extract;
pub mod fetch;
pub mod normalize;

pub use catalog::CatalogEntry;
pub use extract::{extract, FieldRule, PageLayout};
pub use fetch::{HttpFetcher, PageSource};
pub use normalize::normalize;
