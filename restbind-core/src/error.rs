use std::error::Error as StdError;

/**
Raised while a [crate::ResourceDescriptor] is built from resource metadata.
These indicate a malformed interface declaration; they surface on first
introspection of the resource type and are never deferred to individual
calls.
*/
#[derive(Debug, thiserror::Error)]
pub enum ConfigurationError {
    #[error(
        "parameter '{param}' of method '{method}' carries both {first} and {second} bindings, at most one is allowed"
    )]
    ConflictingBindings {
        method: String,
        param: String,
        first: &'static str,
        second: &'static str,
    },
    #[error("entity parameters are not allowed on sub-resource locator '{method}'")]
    EntityOnLocator { method: String },
    #[error("too many entity parameters on method '{method}'")]
    TooManyEntities { method: String },
    #[error("method '{method}' is declared more than once on resource '{resource}'")]
    DuplicateMethod { resource: String, method: String },
}

/**
Error raised by a transport while submitting a resolved request. The engine
treats transport failures as opaque: they are passed through to the caller
unchanged, never inspected or retried.
*/
#[derive(Debug, thiserror::Error)]
#[error(transparent)]
pub struct TransportError(Box<dyn StdError + Send + Sync>);

impl TransportError {
    pub fn new<E>(source: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        TransportError(Box::new(source))
    }

    pub fn message(msg: impl Into<String>) -> Self {
        TransportError(msg.into().into())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
    #[error(
        "method '{method}' binds both form parameters and an entity, the two are mutually exclusive"
    )]
    RequestConflict { method: String },
    #[error("resource '{resource}' has no method named '{method}'")]
    UnknownMethod { resource: String, method: String },
    #[error("method '{method}' is a sub-resource locator, it must be dispatched through locate()")]
    NotATerminal { method: String },
    #[error("method '{method}' is a terminal method, it must be dispatched through invoke()")]
    NotALocator { method: String },
    #[error("method '{method}' takes {expected} arguments, {supplied} were supplied")]
    ArityMismatch {
        method: String,
        expected: usize,
        supplied: usize,
    },
    #[error("method '{method}' declares return type {declared}, {requested} was requested")]
    ReturnTypeMismatch {
        method: String,
        declared: &'static str,
        requested: &'static str,
    },
    #[error("locator '{method}' declares sub-resource type {declared}, {requested} was requested")]
    LocatorTypeMismatch {
        method: String,
        declared: &'static str,
        requested: &'static str,
    },
    #[error("the entity value could not be serialized")]
    EntitySerialization(#[from] serde_json::Error),
    #[error("dispatch invariant violated: {0}")]
    Invariant(&'static str),
    #[error(transparent)]
    Transport(#[from] TransportError),
}

pub type Result<T> = std::result::Result<T, Error>;
