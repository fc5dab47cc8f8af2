//! Page parsers for the DuckDuckGo endpoints.
//!
//! Parsers are pure: they take one page body and return the records on it
//! plus whatever is needed to request the following page.

use reqwest::Url;
use scraper::{ElementRef, Html, Selector};
use serde_json::{Value, json};
use std::sync::OnceLock;

use crate::data_models::ResultRecord;

const NO_MORE_RESULTS: &str = "No more results.";

/// One parsed page of text results.
#[derive(Debug, Default)]
pub(crate) struct TextPage {
    pub records: Vec<ResultRecord>,
    /// Form fields to post for the next page, when there is one.
    pub next_form: Option<Vec<(String, String)>>,
}

struct LiteSelectors {
    row: Selector,
    link: Selector,
    snippet: Selector,
    form: Selector,
    input: Selector,
}

static LITE: OnceLock<LiteSelectors> = OnceLock::new();

fn selector(css: &str) -> Selector {
    // Only called with the literal selectors below.
    Selector::parse(css).unwrap_or_else(|e| panic!("invalid selector {css:?}: {e}"))
}

fn lite_selectors() -> &'static LiteSelectors {
    LITE.get_or_init(|| LiteSelectors {
        row: selector("tr"),
        link: selector("a.result-link"),
        snippet: selector("td.result-snippet"),
        form: selector("form"),
        input: selector("input"),
    })
}

fn text_of(element: ElementRef<'_>) -> String {
    element
        .text()
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn text_record(title: String, href: String, body: String) -> ResultRecord {
    let mut record = ResultRecord::new();
    record.insert("title".into(), Value::String(title));
    record.insert("href".into(), Value::String(href));
    record.insert("body".into(), Value::String(body));
    record
}

/// Ads and search-engine bounce links are not results.
fn is_ad_link(href: &str) -> bool {
    href.starts_with("http://www.google.com/search?q=") || href.contains("duckduckgo.com/y.js")
}

/// Resolve the `//duckduckgo.com/l/?uddg=...` redirect to its target.
pub(crate) fn unwrap_redirect(href: &str) -> String {
    if !href.contains("duckduckgo.com/l/") {
        return href.to_string();
    }
    let absolute = if href.starts_with("//") {
        format!("https:{href}")
    } else {
        href.to_string()
    };
    Url::parse(&absolute)
        .ok()
        .and_then(|url| {
            url.query_pairs()
                .find(|(k, _)| k == "uddg")
                .map(|(_, v)| v.into_owned())
        })
        .unwrap_or_else(|| href.to_string())
}

fn form_fields(form: ElementRef<'_>, input: &Selector) -> Vec<(String, String)> {
    form.select(input)
        .filter(|i| i.value().attr("type") != Some("submit"))
        .filter_map(|i| {
            let name = i.value().attr("name")?;
            let value = i.value().attr("value").unwrap_or("");
            Some((name.to_string(), value.to_string()))
        })
        .collect()
}

fn is_next_form(form: ElementRef<'_>, input: &Selector) -> bool {
    form.select(input).any(|i| {
        i.value().attr("type") == Some("submit")
            && i.value().attr("value").is_some_and(|v| v.contains("Next"))
    })
}

/// Parse a page of `lite.duckduckgo.com/lite/`.
///
/// Results are laid out as table rows: a row with the result link, followed by
/// a row with the snippet, followed by decoration rows.
pub(crate) fn parse_lite_page(body: &str) -> TextPage {
    if body.contains(NO_MORE_RESULTS) {
        return TextPage::default();
    }
    let sel = lite_selectors();
    let document = Html::parse_document(body);

    let mut records = Vec::new();
    let mut current: Option<(String, String, String)> = None;
    for row in document.select(&sel.row) {
        if let Some(link) = row.select(&sel.link).next() {
            if let Some((title, href, snippet)) = current.take() {
                if !is_ad_link(&href) {
                    records.push(text_record(title, href, snippet));
                }
            }
            let href = unwrap_redirect(link.value().attr("href").unwrap_or(""));
            current = Some((text_of(link), href, String::new()));
        } else if let Some(snippet) = row.select(&sel.snippet).next() {
            if let Some((_, _, body)) = current.as_mut() {
                *body = text_of(snippet);
            }
        }
    }
    if let Some((title, href, snippet)) = current {
        if !is_ad_link(&href) {
            records.push(text_record(title, href, snippet));
        }
    }

    let next_form = document
        .select(&sel.form)
        .filter(|f| is_next_form(*f, &sel.input))
        .last()
        .map(|f| form_fields(f, &sel.input));

    TextPage { records, next_form }
}

/// Extract the `vqd` token embedded in the DuckDuckGo landing page.
pub(crate) fn extract_vqd(body: &str) -> Option<String> {
    for (open, close) in [("vqd=\"", '"'), ("vqd=", '&'), ("vqd='", '\'')] {
        if let Some(start) = body.find(open).map(|i| i + open.len()) {
            if let Some(len) = body[start..].find(close) {
                let token = &body[start..start + len];
                if !token.is_empty() && !token.starts_with(['"', '\'']) {
                    return Some(token.to_string());
                }
            }
        }
    }
    None
}

fn answer_record(
    icon: Option<&str>,
    text: &str,
    topic: Option<&str>,
    url: Option<&str>,
) -> ResultRecord {
    let value = json!({
        "icon": icon.filter(|s| !s.is_empty()),
        "text": text,
        "topic": topic,
        "url": url,
    });
    match value {
        Value::Object(map) => map,
        _ => ResultRecord::new(),
    }
}

/// The abstract of an instant-answer payload, if the provider has one.
pub(crate) fn parse_answer_abstract(payload: &Value) -> Option<ResultRecord> {
    let text = payload.get("AbstractText")?.as_str()?;
    if text.is_empty() {
        return None;
    }
    let url = payload.get("AbstractURL").and_then(Value::as_str);
    Some(answer_record(None, text, None, url))
}

/// Related topics of an instant-answer payload. Topic groups are flattened,
/// each entry carrying the group name as its `topic`.
pub(crate) fn parse_related_topics(payload: &Value) -> Vec<ResultRecord> {
    fn entry(row: &Value, topic: Option<&str>) -> Option<ResultRecord> {
        let text = row.get("Text")?.as_str()?;
        if text.is_empty() {
            return None;
        }
        let icon = row
            .get("Icon")
            .and_then(|i| i.get("URL"))
            .and_then(Value::as_str);
        let url = row.get("FirstURL").and_then(Value::as_str);
        Some(answer_record(icon, text, topic, url))
    }

    let Some(rows) = payload.get("RelatedTopics").and_then(Value::as_array) else {
        return Vec::new();
    };
    let mut records = Vec::new();
    for row in rows {
        match row.get("Name").and_then(Value::as_str) {
            Some(name) => {
                let topics = row.get("Topics").and_then(Value::as_array);
                records.extend(
                    topics
                        .into_iter()
                        .flatten()
                        .filter_map(|t| entry(t, Some(name))),
                );
            }
            None => records.extend(entry(row, None)),
        }
    }
    records
}

/// One page of the `i.js` / `v.js` JSON endpoints.
#[derive(Debug, Default)]
pub(crate) struct JsonPage {
    pub records: Vec<ResultRecord>,
    /// Offset of the following page, from the provider's `next` link.
    pub next_offset: Option<String>,
}

pub(crate) fn parse_json_page(payload: &Value) -> JsonPage {
    let records = payload
        .get("results")
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter_map(|r| r.as_object().cloned())
        .collect();
    let next_offset = payload
        .get("next")
        .and_then(Value::as_str)
        .and_then(|next| next.split("s=").last())
        .and_then(|tail| tail.split('&').next())
        .filter(|s| !s.is_empty())
        .map(str::to_string);
    JsonPage {
        records,
        next_offset,
    }
}
