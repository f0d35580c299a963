use indexmap::IndexMap;
use serde::de::DeserializeOwned;

use crate::error::TransportError;
use crate::transport::uri::{UriTarget, encode};
use crate::transport::{ResolvedRequest, Transport};
use crate::value::Payload;

/**
Blocking HTTP transport over [reqwest]. Connection pooling, TLS, redirects
and timeouts are whatever the wrapped client is configured with; failures
(including error statuses) surface as opaque transport errors.
*/
#[derive(Debug)]
pub struct BlockingClient {
    client: reqwest::blocking::Client,
}

impl BlockingClient {
    pub fn new() -> Self {
        BlockingClient {
            client: reqwest::blocking::Client::new(),
        }
    }

    /// Wraps a pre-configured client, keeping its timeouts, proxy and TLS
    /// settings.
    pub fn with_client(client: reqwest::blocking::Client) -> Self {
        BlockingClient { client }
    }

    pub fn client(&self) -> &reqwest::blocking::Client {
        &self.client
    }
}

impl Default for BlockingClient {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for BlockingClient {
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
        let method = reqwest::Method::from_bytes(request.method.as_str().as_bytes())
            .map_err(TransportError::new)?;
        let uri = request.target.render();
        log::debug!("submitting {method} {uri}");

        let mut builder = self.client.request(method, uri);
        if !request.accept.is_empty() {
            builder = builder.header("accept", request.accept.join(", "));
        }
        for (name, values) in request.headers {
            for value in values {
                builder = builder.header(name.as_str(), value.as_str());
            }
        }
        if !request.cookies.is_empty() {
            let cookie = request
                .cookies
                .iter()
                .flat_map(|(name, values)| values.iter().map(move |v| format!("{name}={v}")))
                .collect::<Vec<_>>()
                .join("; ");
            builder = builder.header("cookie", cookie);
        }
        if let Some(entity) = request.entity {
            let body = match entity {
                Payload::Json(v) => serde_json::to_vec(&v).map_err(TransportError::new)?,
                Payload::Text(s) => s.into_bytes(),
                Payload::Form(map) => form_encode(&map).into_bytes(),
            };
            builder = builder.body(body);
            if let Some(content_type) = request.content_type {
                builder = builder.header("content-type", content_type);
            }
        }

        let response = builder
            .send()
            .and_then(|r| r.error_for_status())
            .map_err(TransportError::new)?;
        let text = response.text().map_err(TransportError::new)?;
        let value = if text.is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_str(&text).map_err(TransportError::new)?
        };
        serde_json::from_value(value).map_err(TransportError::new)
    }
}

fn form_encode(map: &IndexMap<String, Vec<String>>) -> String {
    map.iter()
        .flat_map(|(name, values)| {
            values
                .iter()
                .map(move |v| format!("{}={}", encode(name), encode(v)))
        })
        .collect::<Vec<_>>()
        .join("&")
}
