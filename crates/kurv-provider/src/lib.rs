pub mod cache;
pub mod error;
pub mod http;
pub mod index;
pub mod provider;
mod retry;
pub mod types;

pub use cache::{request_key, MemoCache};
pub use error::ProviderError;
pub use http::HttpProductProvider;
pub use index::{IndexEntry, YamlPriceIndex};
pub use provider::{PriceIndex, ProductProvider, SearchOptions};
