use std::collections::VecDeque;
use std::sync::Mutex;

use indexmap::IndexMap;
use serde::de::DeserializeOwned;

use crate::error::TransportError;
use crate::transport::uri::UriTarget;
use crate::transport::{ResolvedRequest, Transport};
use crate::value::Payload;

/**
A transport that performs no I/O. Submissions resolve against a queue of
canned JSON replies (an exhausted queue replies `null`) and every exchange
is recorded for inspection. This makes request construction observable
without a server, both for tests and for dry runs.
*/
#[derive(Debug, Default)]
pub struct RecordingTransport {
    replies: Mutex<VecDeque<serde_json::Value>>,
    exchanges: Mutex<Vec<Exchange>>,
}

/** One recorded submission. */
#[derive(Debug, Clone)]
pub struct Exchange {
    pub uri: String,
    pub method: http::Method,
    pub accept: Vec<String>,
    pub headers: IndexMap<String, Vec<String>>,
    pub cookies: IndexMap<String, Vec<String>>,
    pub content_type: Option<String>,
    pub entity: Option<Payload>,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues the reply for the next submission.
    pub fn enqueue_reply(&self, reply: serde_json::Value) {
        self.replies.lock().unwrap().push_back(reply);
    }

    pub fn exchange_count(&self) -> usize {
        self.exchanges.lock().unwrap().len()
    }

    /// Snapshot of every submission recorded so far.
    pub fn exchanges(&self) -> Vec<Exchange> {
        self.exchanges.lock().unwrap().clone()
    }
}

impl Transport for RecordingTransport {
    type Target = UriTarget;

    fn target(&self, base: &str) -> UriTarget {
        UriTarget::new(base)
    }

    fn append_path(&self, target: &mut UriTarget, segment: &str) {
        target.push_segment(segment);
    }

    fn resolve_templates(&self, target: &mut UriTarget, values: &IndexMap<String, String>) {
        target.resolve_templates(values);
    }

    fn add_query(&self, target: &mut UriTarget, name: &str, values: &[String]) {
        for value in values {
            target.push_query(name, value);
        }
    }

    fn add_matrix(&self, target: &mut UriTarget, name: &str, values: &[String]) {
        for value in values {
            target.push_matrix(name, value);
        }
    }

    fn submit<R: DeserializeOwned>(
        &self,
        request: ResolvedRequest<'_, UriTarget>,
    ) -> Result<R, TransportError> {
        let exchange = Exchange {
            uri: request.target.render(),
            method: request.method,
            accept: request.accept.to_vec(),
            headers: request.headers.clone(),
            cookies: request.cookies.clone(),
            content_type: request.content_type,
            entity: request.entity,
        };
        log::debug!("recording {} {}", exchange.method, exchange.uri);
        self.exchanges.lock().unwrap().push(exchange);

        let reply = self
            .replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(serde_json::Value::Null);
        serde_json::from_value(reply).map_err(TransportError::new)
    }
}
