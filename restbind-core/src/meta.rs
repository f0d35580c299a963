use std::any::TypeId;

use http::Method;

/**
The annotation surface of one resource interface.

A [ResourceMeta] is what a [Resource] type hands to the engine: the
type-level path and media-type declarations plus one [MethodMeta] per
declared method, in declaration order. Construction is deliberately
validation free; every invariant is checked when the descriptor is built,
so a malformed interface fails exactly once, at first introspection.
*/
#[derive(Debug, Clone)]
pub struct ResourceMeta {
    pub(crate) name: String,
    pub(crate) path: Option<String>,
    pub(crate) produces: Option<Vec<String>>,
    pub(crate) methods: Vec<MethodMeta>,
}

impl ResourceMeta {
    pub fn new(name: &str) -> Self {
        ResourceMeta {
            name: name.to_string(),
            path: None,
            produces: None,
            methods: Vec::new(),
        }
    }

    /// Type-level path template, appended to the base target of every chain.
    pub fn path(mut self, path: &str) -> Self {
        self.path = Some(path.to_string());
        self
    }

    /// Type-level default media types, used when a method declares none.
    pub fn produces<I, S>(mut self, types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.produces = Some(types.into_iter().map(Into::into).collect());
        self
    }

    pub fn method(mut self, method: MethodMeta) -> Self {
        self.methods.push(method);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

/** Declaration of a single interface method. */
#[derive(Debug, Clone)]
pub struct MethodMeta {
    pub(crate) name: String,
    pub(crate) verb: Option<Method>,
    pub(crate) path: Option<String>,
    pub(crate) produces: Option<Vec<String>>,
    pub(crate) consumes: Option<Vec<String>>,
    pub(crate) params: Vec<ParamMeta>,
    pub(crate) returns: Option<TypeDescriptor>,
    pub(crate) locates: Option<TypeDescriptor>,
}

impl MethodMeta {
    /// A terminal method: carries an HTTP verb and executes a request.
    /// Extension verbs work through [http::Method::from_bytes].
    pub fn terminal(name: &str, verb: Method) -> Self {
        MethodMeta {
            name: name.to_string(),
            verb: Some(verb),
            path: None,
            produces: None,
            consumes: None,
            params: Vec::new(),
            returns: None,
            locates: None,
        }
    }

    /// A sub-resource locator: no verb, dispatching it yields a new proxy
    /// scoped to the located resource.
    pub fn locator(name: &str) -> Self {
        MethodMeta {
            name: name.to_string(),
            verb: None,
            path: None,
            produces: None,
            consumes: None,
            params: Vec::new(),
            returns: None,
            locates: None,
        }
    }

    pub fn path(mut self, path: &str) -> Self {
        self.path = Some(path.to_string());
        self
    }

    pub fn produces<I, S>(mut self, types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.produces = Some(types.into_iter().map(Into::into).collect());
        self
    }

    pub fn consumes<I, S>(mut self, types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.consumes = Some(types.into_iter().map(Into::into).collect());
        self
    }

    pub fn param(mut self, param: ParamMeta) -> Self {
        self.params.push(param);
        self
    }

    /// Declared return type of a terminal method, checked against the type
    /// requested at the dispatch site.
    pub fn returns<T: 'static>(mut self) -> Self {
        self.returns = Some(TypeDescriptor::of::<T>());
        self
    }

    /// Declared sub-resource type of a locator, checked against the type
    /// requested at the dispatch site.
    pub fn locates<T: 'static>(mut self) -> Self {
        self.locates = Some(TypeDescriptor::of::<T>());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

/**
Declaration of a single method parameter: its name (for diagnostics) and
the binding annotations placed on it. A well formed parameter carries zero
annotations (making it the entity) or exactly one; more are representable
so that the descriptor builder can reject them.
*/
#[derive(Debug, Clone)]
pub struct ParamMeta {
    pub(crate) name: String,
    pub(crate) annotations: Vec<ParamAnnotation>,
}

impl ParamMeta {
    /// An unannotated parameter, serialized as the request entity.
    pub fn entity(name: &str) -> Self {
        ParamMeta {
            name: name.to_string(),
            annotations: Vec::new(),
        }
    }

    pub fn bound(name: &str, annotation: ParamAnnotation) -> Self {
        ParamMeta {
            name: name.to_string(),
            annotations: vec![annotation],
        }
    }

    pub fn annotation(mut self, annotation: ParamAnnotation) -> Self {
        self.annotations.push(annotation);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

/// A parameter binding annotation, carrying the key it binds under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamAnnotation {
    Path(String),
    Query(String),
    Matrix(String),
    Header(String),
    Form(String),
    Cookie(String),
}

impl ParamAnnotation {
    pub(crate) fn kind(&self) -> &'static str {
        match self {
            ParamAnnotation::Path(_) => "path",
            ParamAnnotation::Query(_) => "query",
            ParamAnnotation::Matrix(_) => "matrix",
            ParamAnnotation::Header(_) => "header",
            ParamAnnotation::Form(_) => "form",
            ParamAnnotation::Cookie(_) => "cookie",
        }
    }
}

/**
Identifies a Rust type in metadata. Dynamic entry points take the method
name as a string, so declared return and sub-resource types are recorded
here and cross-checked at the dispatch site.
*/
#[derive(Debug, Clone)]
pub struct TypeDescriptor {
    id: TypeId,
    name: &'static str,
}

impl TypeDescriptor {
    pub fn of<T: 'static>() -> Self {
        TypeDescriptor {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        }
    }

    pub fn matches<T: 'static>(&self) -> bool {
        self.id == TypeId::of::<T>()
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl PartialEq for TypeDescriptor {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeDescriptor {}

/**
Implemented by resource marker types. The metadata returned by [Resource::meta]
is the complete annotation surface of the interface; the engine introspects
it once per type and caches the resulting descriptor.
*/
pub trait Resource: 'static {
    fn meta() -> ResourceMeta;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_meta_builders() {
        let meta = ResourceMeta::new("Items")
            .path("items")
            .produces(["application/json"])
            .method(
                MethodMeta::terminal("list", Method::GET)
                    .path("all")
                    .param(ParamMeta::bound(
                        "page",
                        ParamAnnotation::Query("page".to_string()),
                    )),
            )
            .method(MethodMeta::locator("item").path("{id}"));

        assert_eq!(meta.name(), "Items");
        assert_eq!(meta.path.as_deref(), Some("items"));
        assert_eq!(meta.methods.len(), 2);
        assert_eq!(meta.methods[0].verb, Some(Method::GET));
        assert!(meta.methods[1].verb.is_none());
    }

    #[test]
    fn test_type_descriptor_matching() {
        let d = TypeDescriptor::of::<Vec<String>>();
        assert!(d.matches::<Vec<String>>());
        assert!(!d.matches::<String>());
        assert_eq!(d, TypeDescriptor::of::<Vec<String>>());
    }
}
