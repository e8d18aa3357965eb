//! Remote access for virtual works.

mod fetcher;
mod retry;

pub use fetcher::{Fetcher, HttpFetcher};
pub use retry::{retry_async, RetryPolicy};
