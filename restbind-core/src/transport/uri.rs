use std::fmt::Display;

use indexmap::IndexMap;

/**
A request target assembled as plain text: a base address, appended path
segments (which may contain `{name}` templates), matrix parameters attached
to the last segment and a trailing query string.

Substituted and appended values are percent-encoded when the target is
rendered; an unresolved `{name}` template passes through untouched, leaving
it to the transport to reject or tolerate.
*/
#[derive(Debug, Clone, PartialEq)]
pub struct UriTarget {
    base: String,
    segments: Vec<String>,
    matrix: Vec<(String, String)>,
    query: Vec<(String, String)>,
}

impl UriTarget {
    pub fn new(base: &str) -> Self {
        UriTarget {
            base: base.trim_end_matches('/').to_string(),
            segments: Vec::new(),
            matrix: Vec::new(),
            query: Vec::new(),
        }
    }

    pub fn push_segment(&mut self, segment: &str) {
        let trimmed = segment.trim_matches('/');
        if !trimmed.is_empty() {
            self.segments.push(trimmed.to_string());
        }
    }

    pub fn resolve_templates(&mut self, values: &IndexMap<String, String>) {
        for (name, value) in values {
            let pattern = format!("{{{name}}}");
            let encoded = encode(value);
            self.base = self.base.replace(&pattern, &encoded);
            for segment in &mut self.segments {
                *segment = segment.replace(&pattern, &encoded);
            }
        }
    }

    pub fn push_query(&mut self, name: &str, value: &str) {
        self.query.push((name.to_string(), value.to_string()));
    }

    pub fn push_matrix(&mut self, name: &str, value: &str) {
        self.matrix.push((name.to_string(), value.to_string()));
    }

    pub fn render(&self) -> String {
        let mut uri = self.base.clone();
        for segment in &self.segments {
            uri.push('/');
            uri.push_str(segment);
        }
        for (name, value) in &self.matrix {
            uri.push(';');
            uri.push_str(&encode(name));
            uri.push('=');
            uri.push_str(&encode(value));
        }
        let mut separator = '?';
        for (name, value) in &self.query {
            uri.push(separator);
            separator = '&';
            uri.push_str(&encode(name));
            uri.push('=');
            uri.push_str(&encode(value));
        }
        uri
    }
}

impl Display for UriTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.render())
    }
}

/// Percent-encodes everything outside the RFC 3986 unreserved set.
pub(crate) fn encode(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for byte in value.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'.' | b'_' | b'~' => {
                out.push(byte as char)
            }
            _ => out.push_str(&format!("%{byte:02X}")),
        }
    }
    out
}
