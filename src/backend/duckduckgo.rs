//! DuckDuckGo search backend.
//!
//! Talks to the same public endpoints a browser uses: the lite text page,
//! the instant-answer API, and the `i.js` / `v.js` JSON endpoints that
//! need a `vqd` token scraped from the landing page.

use futures::stream::{self, StreamExt, TryStreamExt};
use nanoid::nanoid;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde_json::Value;
use std::time::Duration;

use super::parser::{self, TextPage};
use super::{BackendSession, RecordStream, SearchBackend};
use crate::config::Config;
use crate::data_models::{
    ImageOptions, ResultRecord, SafeSearch, TextBackend, TextOptions, VideoOptions,
};
use crate::error::BackendError;

const LANDING_URL: &str = "https://duckduckgo.com";
const LITE_URL: &str = "https://lite.duckduckgo.com/lite/";
const ANSWERS_URL: &str = "https://api.duckduckgo.com/";
const IMAGES_URL: &str = "https://duckduckgo.com/i.js";
const VIDEOS_URL: &str = "https://duckduckgo.com/v.js";

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

#[derive(Debug, Clone)]
pub struct ClientSettings {
    pub region: String,
    pub timeout: Duration,
    pub proxy: Option<String>,
    /// Upper bound on pages a single query may fetch.
    pub max_pages: usize,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            region: "wt-wt".to_string(),
            timeout: Duration::from_secs(10),
            proxy: None,
            max_pages: 10,
        }
    }
}

impl From<&Config> for ClientSettings {
    fn from(config: &Config) -> Self {
        Self {
            region: config.ddg_region.clone(),
            timeout: Duration::from_secs(config.ddg_timeout_secs),
            proxy: config.ddg_proxy.clone(),
            max_pages: config.ddg_max_pages,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct DuckDuckGo {
    settings: ClientSettings,
}

impl DuckDuckGo {
    pub fn new(settings: ClientSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &ClientSettings {
        &self.settings
    }
}

impl SearchBackend for DuckDuckGo {
    type Session = DuckDuckGoSession;

    fn open_session(&self) -> Result<DuckDuckGoSession, BackendError> {
        let mut builder = Client::builder()
            .timeout(self.settings.timeout)
            .user_agent(USER_AGENT);
        if let Some(proxy) = &self.settings.proxy {
            let proxy = reqwest::Proxy::all(proxy)
                .map_err(|e| BackendError::Session(format!("invalid proxy {proxy:?}: {e}")))?;
            builder = builder.proxy(proxy);
        }
        let client = builder
            .build()
            .map_err(|e| BackendError::Session(e.to_string()))?;

        let id = nanoid!(8);
        tracing::debug!(session = %id, "opened duckduckgo session");
        Ok(DuckDuckGoSession {
            id,
            client,
            settings: self.settings.clone(),
        })
    }
}

/// One HTTP client, owned by one query. Connections go away with it.
pub struct DuckDuckGoSession {
    id: String,
    client: Client,
    settings: ClientSettings,
}

impl Drop for DuckDuckGoSession {
    fn drop(&mut self) {
        tracing::debug!(session = %self.id, "released duckduckgo session");
    }
}

enum JsonCursor {
    Start,
    Next {
        vqd: String,
        offset: String,
        page: usize,
    },
    Done,
}

struct TextCursor {
    form: Option<Vec<(String, String)>>,
    page: usize,
}

/// Later pages repost the previous form with the fields the page handed out.
fn merge_form(
    mut previous: Vec<(String, String)>,
    next: Vec<(String, String)>,
) -> Vec<(String, String)> {
    for (name, value) in next {
        match previous.iter_mut().find(|(n, _)| *n == name) {
            Some(field) => field.1 = value,
            None => previous.push((name, value)),
        }
    }
    previous
}

fn flatten_pages<'a, S>(pages: S) -> RecordStream<'a>
where
    S: futures::Stream<Item = Result<Vec<ResultRecord>, BackendError>> + Send + 'a,
{
    pages
        .map_ok(|records| stream::iter(records.into_iter().map(Ok::<_, BackendError>)))
        .try_flatten()
        .boxed()
}

impl DuckDuckGoSession {
    async fn fetch_text(&self, url: &str, request: RequestBuilder) -> Result<String, BackendError> {
        let response = request
            .send()
            .await
            .map_err(|e| BackendError::request(url, e))?;
        // 202 is how the provider signals rate limiting.
        if response.status() != StatusCode::OK {
            return Err(BackendError::Status {
                url: url.to_string(),
                status: response.status().as_u16(),
            });
        }
        response
            .text()
            .await
            .map_err(|e| BackendError::request(url, e))
    }

    async fn fetch_json(
        &self,
        url: &str,
        params: &[(&str, String)],
    ) -> Result<Value, BackendError> {
        let body = self.fetch_text(url, self.client.get(url).query(params)).await?;
        serde_json::from_str(&body).map_err(|e| BackendError::malformed(url, e.to_string()))
    }

    async fn vqd(&self, query: &str) -> Result<String, BackendError> {
        let body = self
            .fetch_text(LANDING_URL, self.client.post(LANDING_URL).form(&[("q", query)]))
            .await?;
        parser::extract_vqd(&body)
            .ok_or_else(|| BackendError::malformed(LANDING_URL, "no vqd token in landing page"))
    }

    fn json_pages<'a>(
        &'a self,
        url: &'static str,
        query: &'a str,
        filters: String,
        safesearch: SafeSearch,
    ) -> RecordStream<'a> {
        let pages = stream::try_unfold(JsonCursor::Start, move |cursor| {
            let filters = filters.clone();
            async move {
                let (vqd, offset, page) = match cursor {
                    JsonCursor::Start => (self.vqd(query).await?, None, 0),
                    JsonCursor::Next { vqd, offset, page } => (vqd, Some(offset), page),
                    JsonCursor::Done => return Ok(None),
                };
                if page >= self.settings.max_pages {
                    return Ok(None);
                }

                let mut params = vec![
                    ("l", self.settings.region.clone()),
                    ("o", "json".to_string()),
                    ("q", query.to_string()),
                    ("vqd", vqd.clone()),
                    ("f", filters),
                    ("p", safesearch.as_param().to_string()),
                ];
                if let Some(offset) = offset {
                    params.push(("s", offset));
                }
                tracing::debug!(session = %self.id, url, page, "fetching result page");
                let payload = self.fetch_json(url, &params).await?;
                let parsed = parser::parse_json_page(&payload);

                let next = match parsed.next_offset {
                    Some(offset) => JsonCursor::Next {
                        vqd,
                        offset,
                        page: page + 1,
                    },
                    None => JsonCursor::Done,
                };
                Ok::<_, BackendError>(Some((parsed.records, next)))
            }
        });
        flatten_pages(pages)
    }
}

impl BackendSession for DuckDuckGoSession {
    fn text<'a>(&'a self, query: &'a str, options: &TextOptions) -> RecordStream<'a> {
        let (url, parse): (&'static str, fn(&str) -> TextPage) = match options.backend {
            TextBackend::Lite => (LITE_URL, parser::parse_lite_page),
        };

        let mut form = vec![
            ("q".to_string(), query.to_string()),
            ("kl".to_string(), self.settings.region.clone()),
            ("kp".to_string(), options.safesearch.as_kp().to_string()),
        ];
        if let Some(timelimit) = options.timelimit {
            form.push(("df".to_string(), timelimit.as_param().to_string()));
        }

        let cursor = TextCursor {
            form: Some(form),
            page: 0,
        };
        let pages = stream::try_unfold(cursor, move |mut cursor| async move {
            let Some(form) = cursor.form.take() else {
                return Ok(None);
            };
            if cursor.page >= self.settings.max_pages {
                return Ok(None);
            }
            tracing::debug!(session = %self.id, url, page = cursor.page, "fetching result page");
            let body = self
                .fetch_text(url, self.client.post(url).form(&form))
                .await?;
            let page = parse(&body);
            cursor.page += 1;
            cursor.form = page.next_form.map(|next| merge_form(form, next));
            Ok::<_, BackendError>(Some((page.records, cursor)))
        });
        flatten_pages(pages)
    }

    fn answers<'a>(&'a self, query: &'a str) -> RecordStream<'a> {
        let summary = stream::once(async move {
            let params = [("q", format!("what is {query}")), ("format", "json".to_string())];
            let payload = self.fetch_json(ANSWERS_URL, &params).await?;
            Ok::<Vec<ResultRecord>, BackendError>(
                parser::parse_answer_abstract(&payload).into_iter().collect(),
            )
        });
        let related = stream::once(async move {
            let params = [("q", query.to_string()), ("format", "json".to_string())];
            let payload = self.fetch_json(ANSWERS_URL, &params).await?;
            Ok::<_, BackendError>(parser::parse_related_topics(&payload))
        });
        flatten_pages(summary.chain(related))
    }

    fn images<'a>(&'a self, query: &'a str, options: &ImageOptions) -> RecordStream<'a> {
        let time = options
            .timelimit
            .map(|t| format!("time:{}", t.as_word()))
            .unwrap_or_default();
        // time, size, color, type, layout, license
        let filters = format!("{time},,,,,");
        self.json_pages(IMAGES_URL, query, filters, options.safesearch)
    }

    fn videos<'a>(&'a self, query: &'a str, options: &VideoOptions) -> RecordStream<'a> {
        let published = options
            .timelimit
            .map(|t| format!("publishedAfter:{}", t.as_param()))
            .unwrap_or_default();
        let definition = options
            .resolution
            .map(|r| format!("videoDefinition:{}", r.as_param()))
            .unwrap_or_default();
        // published, definition, duration, license
        let filters = format!("{published},{definition},,");
        self.json_pages(VIDEOS_URL, query, filters, options.safesearch)
    }
}
