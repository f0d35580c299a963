pub mod binding;
pub mod descriptor;
pub mod error;
pub mod meta;
pub mod proxy;
mod resolve;
mod state;
pub mod transport;
pub mod value;

pub use binding::{MethodBinding, ParamBinding};
pub use descriptor::{ResourceDescriptor, descriptor_for};
pub use error::{ConfigurationError, Error, Result, TransportError};
pub use meta::{MethodMeta, ParamAnnotation, ParamMeta, Resource, ResourceMeta, TypeDescriptor};
pub use proxy::{Proxy, RootBuilder};
pub use transport::recording::{Exchange, RecordingTransport};
pub use transport::uri::UriTarget;
pub use transport::{ResolvedRequest, Transport};
pub use value::{Arg, Args, Payload};

#[cfg(feature = "reqwest-blocking")]
pub use transport::client::BlockingClient;

// re-exported so that generated metadata can name HTTP verbs without its
// own dependency on the http crate
pub use http;
