pub mod config;
pub mod pipeline;
pub mod report;
pub mod startup;

pub use config::Config;
pub use pipeline::{run, PageState, RunOptions};
pub use report::{PersistedSpeech, RunReport};
pub use startup::{start, CatalogChoice, Startup};
