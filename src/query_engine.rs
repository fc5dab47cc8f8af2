use futures::{Stream, StreamExt, TryStreamExt};

use crate::backend::{BackendSession, RecordStream, SearchBackend};
use crate::data_models::{
    IMAGE_OPTIONS, ResultRecord, SearchMode, SearchResponse, TEXT_OPTIONS, VIDEO_OPTIONS,
};
use crate::error::BackendError;

/// Pull at most `limit` records off the front of `records`, in order.
///
/// The stream is never polled once `limit` records were taken, so an
/// expensive upstream is not asked for the record after the last one kept.
/// The first error wins and discards whatever was already collected.
pub async fn take_bounded<S>(
    records: S,
    limit: usize,
) -> Result<Vec<ResultRecord>, BackendError>
where
    S: Stream<Item = Result<ResultRecord, BackendError>>,
{
    records.take(limit).try_collect().await
}

/// Runs one search per call against a fresh backend session.
pub struct QueryEngine<B> {
    backend: B,
}

impl<B: SearchBackend> QueryEngine<B> {
    pub fn new(backend: B) -> Self {
        Self { backend }
    }

    fn dispatch<'a>(session: &'a B::Session, mode: SearchMode, query: &'a str) -> RecordStream<'a> {
        match mode {
            SearchMode::Text => session.text(query, &TEXT_OPTIONS),
            SearchMode::Answers => session.answers(query),
            SearchMode::Images => session.images(query, &IMAGE_OPTIONS),
            SearchMode::Videos => session.videos(query, &VIDEO_OPTIONS),
        }
    }

    pub async fn execute(
        &self,
        mode: SearchMode,
        query: &str,
        max_results: usize,
    ) -> Result<SearchResponse, BackendError> {
        // Released on drop, whichever way this function returns.
        let session = self.backend.open_session()?;
        let records = Self::dispatch(&session, mode, query);
        let results = take_bounded(records, max_results).await?;

        tracing::debug!(
            mode = mode.name(),
            query,
            max_results,
            returned = results.len(),
            "search complete"
        );
        Ok(SearchResponse::new(results))
    }
}
