pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod sources;

pub use crate::config::ThermologConfig;
pub use crate::db::ReadingStore;
pub use crate::error::{SourceError, StoreError, ThermologError};
pub use crate::models::{Reading, SortOrder};
pub use crate::sources::{InsideClient, OutsideClient, TemperatureSource};
