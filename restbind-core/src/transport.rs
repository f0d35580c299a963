use indexmap::IndexMap;
use serde::de::DeserializeOwned;

use crate::error::TransportError;
use crate::value::Payload;

#[cfg(feature = "reqwest-blocking")]
pub mod client;
pub mod recording;
pub mod uri;

/**
The seam between the engine and HTTP machinery.

A transport owns the request target representation (an opaque URI under
construction) and the actual submission. Connection handling, TLS, retries
and timeouts all live behind this trait; the engine never inspects a
transport failure.

`submit` must map an empty response body to JSON `null` before converting
it to the requested type, so that methods returning `()` work against
empty replies.
*/
pub trait Transport {
    /// Opaque request target handle.
    type Target: Clone + std::fmt::Debug;

    /// Creates the root target from a base address.
    fn target(&self, base: &str) -> Self::Target;

    /// Appends a path template segment to the target.
    fn append_path(&self, target: &mut Self::Target, segment: &str);

    /// Substitutes bound `{name}` template variables into the target.
    fn resolve_templates(&self, target: &mut Self::Target, values: &IndexMap<String, String>);

    fn add_query(&self, target: &mut Self::Target, name: &str, values: &[String]);

    fn add_matrix(&self, target: &mut Self::Target, name: &str, values: &[String]);

    /// Executes the request synchronously and converts the response body
    /// into the requested type.
    fn submit<R: DeserializeOwned>(
        &self,
        request: ResolvedRequest<'_, Self::Target>,
    ) -> Result<R, TransportError>;
}

/** The outcome of request resolution, handed to a transport for submission. */
#[derive(Debug)]
pub struct ResolvedRequest<'a, Tgt> {
    pub target: Tgt,
    pub method: http::Method,
    /// Acceptable response media types; empty means unrestricted.
    pub accept: &'a [String],
    pub headers: &'a IndexMap<String, Vec<String>>,
    pub cookies: &'a IndexMap<String, Vec<String>>,
    /// Effective entity media type; present exactly when `entity` is.
    pub content_type: Option<String>,
    pub entity: Option<Payload>,
}
