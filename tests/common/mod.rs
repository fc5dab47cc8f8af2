#![allow(dead_code)]

use futures::stream::{self, StreamExt};
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use ddg_gateway::backend::{BackendSession, RecordStream, SearchBackend};
use ddg_gateway::data_models::{ImageOptions, ResultRecord, TextOptions, VideoOptions};
use ddg_gateway::error::BackendError;

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Text(String, TextOptions),
    Answers(String),
    Images(String, ImageOptions),
    Videos(String, VideoOptions),
}

/// Shared view of everything a stub backend was asked to do.
#[derive(Debug, Clone, Default)]
pub struct Counters {
    pub opened: Arc<AtomicUsize>,
    pub released: Arc<AtomicUsize>,
    pub pulled: Arc<AtomicUsize>,
    pub calls: Arc<Mutex<Vec<Call>>>,
}

impl Counters {
    pub fn opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }

    pub fn released(&self) -> usize {
        self.released.load(Ordering::SeqCst)
    }

    pub fn pulled(&self) -> usize {
        self.pulled.load(Ordering::SeqCst)
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }
}

/// Deterministic backend yielding `len` records per capability, optionally
/// failing when record number `fail_at` is pulled.
#[derive(Debug, Clone, Default)]
pub struct StubBackend {
    pub len: usize,
    pub fail_at: Option<usize>,
    pub fail_open: bool,
    pub counters: Counters,
}

impl StubBackend {
    pub fn yielding(len: usize) -> StubBackend {
        StubBackend {
            len,
            ..StubBackend::default()
        }
    }

    pub fn failing_at(len: usize, fail_at: usize) -> StubBackend {
        StubBackend {
            len,
            fail_at: Some(fail_at),
            ..StubBackend::default()
        }
    }
}

pub fn record(label: &str, i: usize) -> ResultRecord {
    match json!({ "title": format!("{label} result {i}"), "n": i }) {
        serde_json::Value::Object(map) => map,
        _ => unreachable!(),
    }
}

pub struct StubSession {
    len: usize,
    fail_at: Option<usize>,
    counters: Counters,
}

impl Drop for StubSession {
    fn drop(&mut self) {
        self.counters.released.fetch_add(1, Ordering::SeqCst);
    }
}

impl StubSession {
    fn records(&self, label: &'static str) -> RecordStream<'_> {
        let pulled = self.counters.pulled.clone();
        let fail_at = self.fail_at;
        stream::iter(0..self.len)
            .map(move |i| {
                pulled.fetch_add(1, Ordering::SeqCst);
                if fail_at == Some(i) {
                    Err(BackendError::Other(format!("{label} upstream dropped")))
                } else {
                    Ok(record(label, i))
                }
            })
            .boxed()
    }

    fn record_call(&self, call: Call) {
        self.counters.calls.lock().unwrap().push(call);
    }
}

impl SearchBackend for StubBackend {
    type Session = StubSession;

    fn open_session(&self) -> Result<StubSession, BackendError> {
        if self.fail_open {
            return Err(BackendError::Session("stub refused".into()));
        }
        self.counters.opened.fetch_add(1, Ordering::SeqCst);
        Ok(StubSession {
            len: self.len,
            fail_at: self.fail_at,
            counters: self.counters.clone(),
        })
    }
}

impl BackendSession for StubSession {
    fn text<'a>(&'a self, query: &'a str, options: &TextOptions) -> RecordStream<'a> {
        self.record_call(Call::Text(query.to_string(), *options));
        self.records("text")
    }

    fn answers<'a>(&'a self, query: &'a str) -> RecordStream<'a> {
        self.record_call(Call::Answers(query.to_string()));
        self.records("answers")
    }

    fn images<'a>(&'a self, query: &'a str, options: &ImageOptions) -> RecordStream<'a> {
        self.record_call(Call::Images(query.to_string(), *options));
        self.records("images")
    }

    fn videos<'a>(&'a self, query: &'a str, options: &VideoOptions) -> RecordStream<'a> {
        self.record_call(Call::Videos(query.to_string(), *options));
        self.records("videos")
    }
}
