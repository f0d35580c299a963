pub mod prelude;

pub use prelude::*;

pub use restbind_core::{
    Exchange, MethodBinding, ParamBinding, RecordingTransport, ResolvedRequest,
    ResourceDescriptor, RootBuilder, TypeDescriptor, UriTarget, binding, descriptor,
    descriptor_for, error, meta, proxy, transport, value,
};

#[cfg(feature = "reqwest-blocking")]
pub use restbind_core::BlockingClient;

pub use restbind_core::args;

// generated metadata names HTTP verbs through this re-export
pub use restbind_core::http;

pub use restbind_macro::resource;
