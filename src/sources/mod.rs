//! Skill sources: fetching, marketplace descriptors, multi-source loading
//! and precedence tagging.

pub mod descriptor;
pub mod fetch;
pub mod loader;
pub mod marketplace;
pub mod precedence;

pub use descriptor::{
    DEFAULT_SOURCE_URL, InstallMode, SourceDescriptor, SourceType, is_local_source,
};
pub use fetch::{FetchOptions, FetchedSource, GitSourceFetcher, SourceFetcher};
pub use loader::{CatalogLoader, ExtraSource, LoadOptions, LoadedCatalog};
pub use marketplace::{
    MarketplaceDescriptor, MarketplaceFetcher, SourceMarketplaceFetcher, parse_marketplace,
};
pub use precedence::{
    SourceCatalog, name_from_url, precedence_rank, resolve_source_name, select_active,
    tag_catalog,
};
