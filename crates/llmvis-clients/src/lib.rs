//! HTTP clients for the translation and text-generation collaborators.
//!
//! Each call is a single attempt. Retry, backoff, and concurrency limits are
//! applied by the caller so that every client instance can be shared freely
//! across concurrent tasks.

pub mod error;
mod http;
pub mod query;
pub mod translate;

pub use error::ClientError;
pub use query::QueryClient;
pub use translate::TranslationClient;
