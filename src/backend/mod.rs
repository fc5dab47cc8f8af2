//! Search backend boundary.
//!
//! A backend hands out sessions; a session exposes one capability per search
//! mode. Every capability returns a lazy stream: nothing is fetched until the
//! stream is polled, and later pages are only fetched once the records already
//! buffered have been consumed. Dropping the session releases it.

use futures::stream::BoxStream;

use crate::data_models::{ImageOptions, ResultRecord, TextOptions, VideoOptions};
use crate::error::BackendError;

pub mod duckduckgo;
mod parser;

pub use duckduckgo::{DuckDuckGo, DuckDuckGoSession};

pub type RecordStream<'a> = BoxStream<'a, Result<ResultRecord, BackendError>>;

pub trait SearchBackend: Send + Sync + 'static {
    type Session: BackendSession;

    /// Acquire a session scoped to a single query.
    fn open_session(&self) -> Result<Self::Session, BackendError>;
}

pub trait BackendSession: Send + Sync {
    fn text<'a>(&'a self, query: &'a str, options: &TextOptions) -> RecordStream<'a>;

    fn answers<'a>(&'a self, query: &'a str) -> RecordStream<'a>;

    fn images<'a>(&'a self, query: &'a str, options: &ImageOptions) -> RecordStream<'a>;

    fn videos<'a>(&'a self, query: &'a str, options: &VideoOptions) -> RecordStream<'a>;
}
