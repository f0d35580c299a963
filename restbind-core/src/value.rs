use std::fmt::Display;

use indexmap::IndexMap;
use serde::Serialize;

use crate::error::Error;

/**
A method argument, rendered for request building.

Arguments routed into URI, header, form or cookie slots are plain text;
the request entity is an arbitrary JSON value. [Arg::display] renders
anything printable, [Arg::json] serializes anything `serde` can handle.
*/
#[derive(Debug, Clone, PartialEq)]
pub enum Arg {
    Text(String),
    Json(serde_json::Value),
}

impl Arg {
    pub fn display(value: impl Display) -> Self {
        Arg::Text(value.to_string())
    }

    pub fn json<T: Serialize>(value: &T) -> Result<Self, Error> {
        Ok(Arg::Json(serde_json::to_value(value)?))
    }

    /// Text form of the argument, as it appears in a URI or header slot.
    /// JSON strings render without quotes, other JSON values compactly.
    pub(crate) fn render(&self) -> String {
        match self {
            Arg::Text(s) => s.clone(),
            Arg::Json(serde_json::Value::String(s)) => s.clone(),
            Arg::Json(v) => v.to_string(),
        }
    }
}

impl From<&str> for Arg {
    fn from(value: &str) -> Self {
        Arg::Text(value.to_string())
    }
}

impl From<String> for Arg {
    fn from(value: String) -> Self {
        Arg::Text(value)
    }
}

impl From<serde_json::Value> for Arg {
    fn from(value: serde_json::Value) -> Self {
        Arg::Json(value)
    }
}

macro_rules! impl_arg_from_display {
    ($($t:ty),*) => {
        $(impl From<$t> for Arg {
            fn from(value: $t) -> Self {
                Arg::Text(value.to_string())
            }
        })*
    };
}

impl_arg_from_display!(bool, i8, i16, i32, i64, u8, u16, u32, u64, usize, f32, f64);

/// The ordered argument vector of a single dispatch.
pub type Args = Vec<Arg>;

/// Builds an [Args] vector, converting each element with [Arg::from].
#[macro_export]
macro_rules! args {
    () => { $crate::Args::new() };
    ($($arg:expr),+ $(,)?) => { vec![$($crate::Arg::from($arg)),+] };
}

/**
The effective request body. Text and JSON payloads come from entity
parameters, form payloads from accumulated form parameters. Each payload
kind carries a default media type which a `consumes` declaration overrides.
*/
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Json(serde_json::Value),
    Text(String),
    Form(IndexMap<String, Vec<String>>),
}

impl Payload {
    pub fn media_type(&self) -> &'static str {
        match self {
            Payload::Json(_) => "application/json",
            Payload::Text(_) => "text/plain",
            Payload::Form(_) => "application/x-www-form-urlencoded",
        }
    }
}

impl From<Arg> for Payload {
    fn from(value: Arg) -> Self {
        match value {
            Arg::Text(s) => Payload::Text(s),
            Arg::Json(v) => Payload::Json(v),
        }
    }
}
