//! The high-traffic surface: `use restbind::prelude::*;` brings in what a
//! typical resource declaration and call site need.

pub use restbind_core::{
    Arg, Args, ConfigurationError, Error, MethodMeta, ParamAnnotation, ParamMeta, Payload, Proxy,
    Resource, ResourceMeta, Result, Transport, TransportError,
};
