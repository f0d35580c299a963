use std::fmt::Display;
use std::marker::PhantomData;
use std::sync::Arc;

use serde::de::DeserializeOwned;

use crate::binding::{MethodBinding, ParamBinding};
use crate::descriptor::{ResourceDescriptor, descriptor_for};
use crate::error::Error;
use crate::meta::Resource;
use crate::resolve;
use crate::state::InvocationState;
use crate::transport::Transport;
use crate::value::{Args, Payload};

/**
The dispatcher. A proxy pairs a resource descriptor with the invocation
state accumulated along its locator chain and a shared transport.

Proxies never mutate their carried state: every dispatch extends a clone of
it, so one proxy can fan out into any number of independent chains and is
safe to share across threads.

[Proxy::invoke] dispatches terminal methods and submits a request;
[Proxy::locate] dispatches sub-resource locators and yields the next proxy
without touching the network.
*/
pub struct Proxy<R: Resource, T: Transport> {
    descriptor: Arc<ResourceDescriptor>,
    state: InvocationState<T::Target>,
    transport: Arc<T>,
    _resource: PhantomData<fn() -> R>,
}

impl<R: Resource, T: Transport> Proxy<R, T> {
    /// Builds the root proxy for `R` against a base address. The descriptor
    /// is built (or fetched from the cache) here, so a malformed interface
    /// fails at construction, not at the first call.
    pub fn root(transport: T, base: &str) -> Result<Self, Error> {
        Self::builder(transport, base).build()
    }

    /// A root proxy builder, for seeding state shared by the whole chain.
    pub fn builder(transport: T, base: &str) -> RootBuilder<R, T> {
        RootBuilder {
            transport,
            base: base.to_string(),
            headers: Vec::new(),
            cookies: Vec::new(),
            queries: Vec::new(),
            _resource: PhantomData,
        }
    }

    pub fn descriptor(&self) -> &ResourceDescriptor {
        &self.descriptor
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Dispatches the terminal method `method` with the given arguments,
    /// deserializing the response into `Ret`.
    pub fn invoke<Ret>(&self, method: &str, args: Args) -> Result<Ret, Error>
    where
        Ret: DeserializeOwned + 'static,
    {
        let binding = self.binding(method)?;
        if binding.is_locator {
            return Err(Error::NotATerminal {
                method: method.to_string(),
            });
        }
        if let Some(declared) = &binding.returns {
            if !declared.matches::<Ret>() {
                return Err(Error::ReturnTypeMismatch {
                    method: method.to_string(),
                    declared: declared.name(),
                    requested: std::any::type_name::<Ret>(),
                });
            }
        }
        log::trace!(
            "invoking '{}' on resource '{}'",
            method,
            self.descriptor.name
        );
        let state = self.extended_state(binding, args)?;
        resolve::resolve(
            self.transport.as_ref(),
            binding,
            self.descriptor.produces.as_deref(),
            state,
        )
    }

    /// Dispatches the locator `method`, yielding a proxy for the
    /// sub-resource `S` that carries this proxy's state as its prefix.
    pub fn locate<S: Resource>(&self, method: &str, args: Args) -> Result<Proxy<S, T>, Error> {
        let binding = self.binding(method)?;
        if !binding.is_locator {
            return Err(Error::NotALocator {
                method: method.to_string(),
            });
        }
        if let Some(declared) = &binding.locates {
            if !declared.matches::<S>() {
                return Err(Error::LocatorTypeMismatch {
                    method: method.to_string(),
                    declared: declared.name(),
                    requested: std::any::type_name::<S>(),
                });
            }
        }
        log::trace!(
            "locating '{}' from resource '{}'",
            method,
            self.descriptor.name
        );
        let descriptor = descriptor_for::<S>()?;
        let mut state = self.extended_state(binding, args)?;
        if let Some(path) = &descriptor.path {
            state.append_path(self.transport.as_ref(), path);
        }
        Ok(Proxy {
            descriptor,
            state,
            transport: self.transport.clone(),
            _resource: PhantomData,
        })
    }

    fn binding(&self, method: &str) -> Result<&MethodBinding, Error> {
        self.descriptor
            .method(method)
            .ok_or_else(|| Error::UnknownMethod {
                resource: self.descriptor.name.clone(),
                method: method.to_string(),
            })
    }

    /// Clones the carried state and extends the clone with the method path
    /// and the argument bindings, in declaration order.
    fn extended_state(
        &self,
        binding: &MethodBinding,
        args: Args,
    ) -> Result<InvocationState<T::Target>, Error> {
        if args.len() != binding.params.len() {
            return Err(Error::ArityMismatch {
                method: binding.name.clone(),
                expected: binding.params.len(),
                supplied: args.len(),
            });
        }

        let mut state = self.state.clone();
        if let Some(path) = &binding.path {
            state.append_path(self.transport.as_ref(), path);
        }
        for (param, arg) in binding.params.iter().zip(args) {
            match param {
                ParamBinding::Path(name) => {
                    state.apply_path(name, arg.render());
                }
                ParamBinding::Query(name) => state.apply_query(name, arg.render()),
                ParamBinding::Matrix(name) => state.apply_matrix(name, arg.render()),
                ParamBinding::Header(name) => state.apply_header(name, arg.render()),
                ParamBinding::Form(name) => state.apply_form(name, arg.render()),
                ParamBinding::Cookie(name) => state.apply_cookie(name, arg.render()),
                ParamBinding::Entity => {
                    // descriptor construction rejects entities on locators,
                    // so a locator dispatch can never reach this arm
                    if binding.is_locator {
                        return Err(Error::Invariant("entity binding on a locator"));
                    }
                    state.apply_entity(Payload::from(arg));
                }
            }
        }
        Ok(state)
    }
}

impl<R: Resource, T: Transport> Clone for Proxy<R, T> {
    fn clone(&self) -> Self {
        Proxy {
            descriptor: self.descriptor.clone(),
            state: self.state.clone(),
            transport: self.transport.clone(),
            _resource: PhantomData,
        }
    }
}

/**
Builds the root proxy of a chain, seeding headers, cookies and query
parameters that every request dispatched through the chain carries.
*/
pub struct RootBuilder<R: Resource, T: Transport> {
    transport: T,
    base: String,
    headers: Vec<(String, String)>,
    cookies: Vec<(String, String)>,
    queries: Vec<(String, String)>,
    _resource: PhantomData<fn() -> R>,
}

impl<R: Resource, T: Transport> RootBuilder<R, T> {
    pub fn header(mut self, name: &str, value: impl Display) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    pub fn cookie(mut self, name: &str, value: impl Display) -> Self {
        self.cookies.push((name.to_string(), value.to_string()));
        self
    }

    pub fn query(mut self, name: &str, value: impl Display) -> Self {
        self.queries.push((name.to_string(), value.to_string()));
        self
    }

    pub fn build(self) -> Result<Proxy<R, T>, Error> {
        let descriptor = descriptor_for::<R>()?;
        let mut state = InvocationState::new(self.transport.target(&self.base));
        if let Some(path) = &descriptor.path {
            state.append_path(&self.transport, path);
        }
        for (name, value) in self.headers {
            state.apply_header(&name, value);
        }
        for (name, value) in self.cookies {
            state.apply_cookie(&name, value);
        }
        for (name, value) in self.queries {
            state.apply_query(&name, value);
        }
        Ok(Proxy {
            descriptor,
            state,
            transport: Arc::new(self.transport),
            _resource: PhantomData,
        })
    }
}

#[cfg(test)]
mod tests {
    use http::Method;
    use serde_json::json;
    use test_log::test;

    use crate::meta::{MethodMeta, ParamAnnotation, ParamMeta, Resource, ResourceMeta};
    use crate::transport::recording::RecordingTransport;
    use crate::{Arg, args};

    use super::*;

    struct Api;
    impl Resource for Api {
        fn meta() -> ResourceMeta {
            ResourceMeta::new("Api")
                .path("api")
                .produces(["application/json"])
                .method(
                    MethodMeta::terminal("find", Method::GET)
                        .path("items/{id}")
                        .param(ParamMeta::bound(
                            "id",
                            ParamAnnotation::Path("id".to_string()),
                        ))
                        .returns::<serde_json::Value>(),
                )
                .method(
                    MethodMeta::terminal("create", Method::POST)
                        .path("items")
                        .param(ParamMeta::entity("item")),
                )
                .method(MethodMeta::locator("children").locates::<Children>())
        }
    }

    struct Children;
    impl Resource for Children {
        fn meta() -> ResourceMeta {
            ResourceMeta::new("Children")
                .path("children")
                .method(MethodMeta::terminal("leaf", Method::GET).path("leaf"))
        }
    }

    fn root() -> Proxy<Api, RecordingTransport> {
        Proxy::root(RecordingTransport::new(), "http://localhost:8080").unwrap()
    }

    #[test]
    fn test_terminal_invocation_builds_expected_uri() -> anyhow::Result<()> {
        let proxy = root();
        proxy.transport().enqueue_reply(json!({"id": 42}));

        let found: serde_json::Value = proxy.invoke("find", args![42])?;
        assert_eq!(found["id"], 42);

        let exchanges = proxy.transport().exchanges();
        assert_eq!(exchanges.len(), 1);
        assert_eq!(exchanges[0].uri, "http://localhost:8080/api/items/42");
        assert_eq!(exchanges[0].method, Method::GET);
        assert_eq!(exchanges[0].accept, ["application/json"]);
        Ok(())
    }

    #[test]
    fn test_entity_param_becomes_the_body() -> anyhow::Result<()> {
        let proxy = root();
        let entity = Arg::json(&json!({"name": "bolt"}))?;

        let _: serde_json::Value = proxy.invoke("create", vec![entity])?;

        let exchange = &proxy.transport().exchanges()[0];
        assert_eq!(exchange.method, Method::POST);
        assert_eq!(exchange.content_type.as_deref(), Some("application/json"));
        match &exchange.entity {
            Some(Payload::Json(v)) => assert_eq!(v["name"], "bolt"),
            other => panic!("expected json payload, got {other:?}"),
        }
        Ok(())
    }

    #[test]
    fn test_locator_chain_submits_once() -> anyhow::Result<()> {
        let proxy = root();

        let children = proxy.locate::<Children>("children", args!())?;
        assert_eq!(proxy.transport().exchange_count(), 0);

        let _: serde_json::Value = children.invoke("leaf", args!())?;
        let exchanges = children.transport().exchanges();
        assert_eq!(exchanges.len(), 1);
        assert_eq!(exchanges[0].uri, "http://localhost:8080/api/children/leaf");
        Ok(())
    }

    #[test]
    fn test_unknown_method() {
        let proxy = root();
        match proxy.invoke::<serde_json::Value>("nope", args!()) {
            Err(Error::UnknownMethod { resource, method }) => {
                assert_eq!(resource, "Api");
                assert_eq!(method, "nope");
            }
            other => panic!("expected UnknownMethod, got {other:?}"),
        }
    }

    #[test]
    fn test_entry_point_mismatch() {
        let proxy = root();
        match proxy.invoke::<serde_json::Value>("children", args!()) {
            Err(Error::NotATerminal { method }) => assert_eq!(method, "children"),
            other => panic!("expected NotATerminal, got {other:?}"),
        }
        match proxy.locate::<Children>("find", args![1]) {
            Err(Error::NotALocator { method }) => assert_eq!(method, "find"),
            other => panic!("expected NotALocator, got {other:?}"),
        }
    }

    #[test]
    fn test_arity_mismatch() {
        let proxy = root();
        match proxy.invoke::<serde_json::Value>("find", args!()) {
            Err(Error::ArityMismatch {
                expected, supplied, ..
            }) => {
                assert_eq!(expected, 1);
                assert_eq!(supplied, 0);
            }
            other => panic!("expected ArityMismatch, got {other:?}"),
        }
        // nothing was submitted for the failed dispatch
        assert_eq!(proxy.transport().exchange_count(), 0);
    }

    #[test]
    fn test_declared_types_are_checked() {
        let proxy = root();
        match proxy.invoke::<String>("find", args![1]) {
            Err(Error::ReturnTypeMismatch { method, .. }) => assert_eq!(method, "find"),
            other => panic!("expected ReturnTypeMismatch, got {other:?}"),
        }
        match proxy.locate::<Api>("children", args!()) {
            Err(Error::LocatorTypeMismatch { method, .. }) => assert_eq!(method, "children"),
            other => panic!("expected LocatorTypeMismatch, got {other:?}"),
        }
    }

    #[test]
    fn test_sibling_dispatches_are_independent() -> anyhow::Result<()> {
        let proxy = root();

        let _: serde_json::Value = proxy.invoke("find", args![1])?;
        let _: serde_json::Value = proxy.invoke("find", args![2])?;

        let exchanges = proxy.transport().exchanges();
        assert_eq!(exchanges[0].uri, "http://localhost:8080/api/items/1");
        assert_eq!(exchanges[1].uri, "http://localhost:8080/api/items/2");
        Ok(())
    }

    #[test]
    fn test_builder_seeds_chain_wide_state() -> anyhow::Result<()> {
        let proxy: Proxy<Api, _> =
            Proxy::builder(RecordingTransport::new(), "http://localhost:8080")
                .header("X-Tenant", "acme")
                .cookie("session", "s1")
                .query("trace", true)
                .build()?;

        let children = proxy.locate::<Children>("children", args!())?;
        let _: serde_json::Value = children.invoke("leaf", args!())?;

        let exchange = &children.transport().exchanges()[0];
        assert_eq!(exchange.headers["X-Tenant"], vec!["acme"]);
        assert_eq!(exchange.cookies["session"], vec!["s1"]);
        assert!(exchange.uri.ends_with("?trace=true"));
        Ok(())
    }
}
