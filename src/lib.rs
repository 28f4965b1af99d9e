pub mod classifier;
pub mod config;
pub mod db;
pub mod error;
pub mod metadata;
pub mod models;
pub mod service;
pub mod store;
pub mod tags;
pub mod utils;

pub use config::Config;
pub use db::Database;
pub use error::{Result, VaultError};
pub use models::{
    ContentKind, DEFAULT_TAG_COLOR, ItemFilter, ItemId, ItemUpdate, Metadata, NewItem, Tag, TagId,
    UnknownContentKind, VaultItem,
};
pub use service::{Detection, IngestRequest, Ingested, Updated, VaultService};
pub use store::{Created, VaultStore};
pub use tags::TagResolver;
