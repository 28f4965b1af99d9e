mod content_kind;
mod filter;
mod ids;
mod item;
mod metadata;
mod tag;

pub use content_kind::{ContentKind, UnknownContentKind};
pub use filter::ItemFilter;
pub use ids::{ItemId, TagId};
pub use item::{ItemUpdate, NewItem, VaultItem};
pub use metadata::Metadata;
pub(crate) use metadata::non_empty;
pub use tag::{DEFAULT_TAG_COLOR, Tag};
