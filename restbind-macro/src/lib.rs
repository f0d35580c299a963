use proc_macro::TokenStream;

mod procmacro;

/**
Binds an annotated trait to the dispatch engine.

The attribute consumes the trait declaration and emits a unit marker type
of the same name implementing `restbind::Resource`, plus a typed
`{Trait}Client` wrapper around `restbind::Proxy` with one method per
declared operation. Generated code refers to the `restbind` crate by
absolute path, so that crate must be a dependency wherever the attribute
is used.

Trait level arguments: `path = "..."` for the type-level template and
`produces("...", ...)` for the default response media types.

Method attributes: one HTTP verb of `get`, `post`, `put`, `delete`, `head`,
`options` or `patch`, optionally carrying the method path template inline,
e.g. `#[get("items/{id}")]`. `#[path("...")]` declares the template
separately; a method with a template but no verb is a sub-resource locator
and must return another resource type. `#[produces(...)]` and
`#[consumes(...)]` override media types per method.

Parameter attributes: `#[path_param]`, `#[query_param]`, `#[matrix_param]`,
`#[header_param]`, `#[form_param]` and `#[cookie_param]`, each accepting an
explicit key, e.g. `#[query_param("lang")]`, and defaulting to the
parameter name without one. A parameter with no binding attribute is sent
as the request entity.
*/
#[proc_macro_attribute]
pub fn resource(attr: TokenStream, item: TokenStream) -> TokenStream {
    match procmacro::expand_resource(attr.into(), item.into()) {
        Ok(tokens) => tokens.into(),
        Err(e) => e.to_compile_error().into(),
    }
}
