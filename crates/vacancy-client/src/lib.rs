pub mod fetcher;

pub use fetcher::{DEFAULT_BASE_URL, HhClient};
