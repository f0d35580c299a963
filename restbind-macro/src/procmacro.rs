use proc_macro2::{Ident, Span, TokenStream};
use quote::{ToTokens, format_ident, quote};
use syn::{
    Attribute, Expr, ExprLit, FnArg, ItemTrait, LitStr, Meta, Pat, PathArguments, ReturnType,
    TraitItem, TraitItemFn, Type, TypePath,
    parse::{Parse, ParseStream},
    punctuated::Punctuated,
    spanned::Spanned,
    token::Comma,
};

/// Verb attribute names and the `http::Method` constants they map to.
const VERBS: [(&str, &str); 7] = [
    ("get", "GET"),
    ("post", "POST"),
    ("put", "PUT"),
    ("delete", "DELETE"),
    ("head", "HEAD"),
    ("options", "OPTIONS"),
    ("patch", "PATCH"),
];

/// Parameter attribute names and the `ParamAnnotation` variants they map to.
const BINDINGS: [(&str, &str); 6] = [
    ("path_param", "Path"),
    ("query_param", "Query"),
    ("matrix_param", "Matrix"),
    ("header_param", "Header"),
    ("form_param", "Form"),
    ("cookie_param", "Cookie"),
];

// Structure to hold the arguments of the attribute itself
#[derive(Default, Debug, PartialEq)]
struct ResourceArgs {
    path: Option<String>,
    produces: Vec<String>,
}

trait ExprInto<T> {
    fn expr_into(&self) -> Option<T>;
}

impl ExprInto<String> for Expr {
    fn expr_into(&self) -> Option<String> {
        if let Expr::Lit(ExprLit {
            attrs: _,
            lit: syn::Lit::Str(lit_str),
        }) = self
        {
            Some(lit_str.value())
        } else {
            None
        }
    }
}

impl Parse for ResourceArgs {
    fn parse(input: ParseStream) -> syn::Result<Self> {
        let mut args = Self::default();

        let metas = Punctuated::<Meta, Comma>::parse_terminated(input)?;

        for meta in metas {
            let name = meta.path().to_token_stream().to_string();

            match name.as_str() {
                "path" => {
                    let Meta::NameValue(name_value) = &meta else {
                        return Err(syn::Error::new(
                            meta.span(),
                            "'path' expects a string literal as argument",
                        ));
                    };
                    args.path = Some(name_value.value.expr_into().ok_or(syn::Error::new(
                        name_value.span(),
                        "'path' expects a string literal as argument",
                    ))?);
                }
                "produces" => {
                    let Meta::List(list) = &meta else {
                        return Err(syn::Error::new(
                            meta.span(),
                            "'produces' expects a parenthesized media type list",
                        ));
                    };
                    let types =
                        list.parse_args_with(Punctuated::<LitStr, Comma>::parse_terminated)?;
                    if types.is_empty() {
                        return Err(syn::Error::new(
                            meta.span(),
                            "expected at least one media type",
                        ));
                    }
                    args.produces = types.iter().map(LitStr::value).collect();
                }
                _ => {
                    return Err(syn::Error::new(
                        meta.span(),
                        format!("unknown parameter: {}", name),
                    ));
                }
            }
        }

        Ok(args)
    }
}

/// One scanned trait method, with route attributes separated from the
/// attributes that pass through to the generated client method.
struct MethodModel {
    ident: Ident,
    verb: Option<Ident>,
    path: Option<String>,
    produces: Vec<String>,
    consumes: Vec<String>,
    params: Vec<ParamModel>,
    ret: Option<Type>,
    forwarded: Vec<Attribute>,
}

struct ParamModel {
    ident: Ident,
    ty: Type,
    // `ParamAnnotation` variant ident plus the key it binds under. Every
    // binding attribute is recorded, even conflicting ones; the descriptor
    // builder is the single place that rejects them.
    bindings: Vec<(Ident, String)>,
}

fn scan_method(method: &TraitItemFn) -> syn::Result<MethodModel> {
    if method.default.is_some() {
        return Err(syn::Error::new_spanned(
            &method.sig.ident,
            "resource methods must not have a default body",
        ));
    }
    if !method.sig.generics.params.is_empty() || method.sig.generics.where_clause.is_some() {
        return Err(syn::Error::new_spanned(
            &method.sig.generics,
            "generic resource methods are not supported",
        ));
    }
    if method.sig.asyncness.is_some() {
        return Err(syn::Error::new_spanned(
            &method.sig,
            "resource methods are synchronous",
        ));
    }
    match method.sig.receiver() {
        Some(receiver) if receiver.reference.is_some() && receiver.mutability.is_none() => {}
        _ => {
            return Err(syn::Error::new_spanned(
                &method.sig,
                "resource methods take `&self`",
            ));
        }
    }

    let mut verb = None;
    let mut path = None;
    let mut produces = Vec::new();
    let mut consumes = Vec::new();
    let mut forwarded = Vec::new();

    for attr in &method.attrs {
        let Some(ident) = attr.path().get_ident() else {
            forwarded.push(attr.clone());
            continue;
        };
        let name = ident.to_string();

        if let Some((_, constant)) = VERBS.iter().find(|(n, _)| *n == name) {
            if verb.is_some() {
                return Err(syn::Error::new_spanned(
                    attr,
                    "conflicting HTTP method attributes",
                ));
            }
            verb = Some(Ident::new(constant, Span::call_site()));
            if let Some(template) = inline_path(attr)? {
                set_path(&mut path, template, attr)?;
            }
        } else if name == "path" {
            let template = match &attr.meta {
                Meta::List(_) => attr.parse_args::<LitStr>()?.value(),
                Meta::NameValue(name_value) => {
                    name_value.value.expr_into().ok_or(syn::Error::new(
                        name_value.span(),
                        "'path' expects a string literal as argument",
                    ))?
                }
                Meta::Path(_) => {
                    return Err(syn::Error::new_spanned(
                        attr,
                        "'path' expects a string literal as argument",
                    ));
                }
            };
            set_path(&mut path, template, attr)?;
        } else if name == "produces" {
            if !produces.is_empty() {
                return Err(syn::Error::new_spanned(attr, "duplicate 'produces' attribute"));
            }
            produces = media_types(attr)?;
        } else if name == "consumes" {
            if !consumes.is_empty() {
                return Err(syn::Error::new_spanned(attr, "duplicate 'consumes' attribute"));
            }
            consumes = media_types(attr)?;
        } else {
            forwarded.push(attr.clone());
        }
    }

    let mut params = Vec::new();
    for input in &method.sig.inputs {
        let FnArg::Typed(typed) = input else {
            continue;
        };
        let Pat::Ident(pat) = typed.pat.as_ref() else {
            return Err(syn::Error::new_spanned(
                &typed.pat,
                "parameter must be a plain identifier",
            ));
        };

        let mut bindings = Vec::new();
        for attr in &typed.attrs {
            let Some(ident) = attr.path().get_ident() else {
                return Err(syn::Error::new_spanned(attr, "unknown parameter attribute"));
            };
            let name = ident.to_string();
            let Some((_, variant)) = BINDINGS.iter().find(|(n, _)| *n == name) else {
                return Err(syn::Error::new_spanned(
                    attr,
                    format!("unknown parameter attribute: {}", name),
                ));
            };
            let key = match &attr.meta {
                Meta::Path(_) => pat.ident.to_string(),
                Meta::List(_) => attr.parse_args::<LitStr>()?.value(),
                Meta::NameValue(_) => {
                    return Err(syn::Error::new_spanned(
                        attr,
                        format!("'{}' expects a parenthesized key", name),
                    ));
                }
            };
            bindings.push((Ident::new(variant, Span::call_site()), key));
        }

        params.push(ParamModel {
            ident: pat.ident.clone(),
            ty: (*typed.ty).clone(),
            bindings,
        });
    }

    let ret = match &method.sig.output {
        ReturnType::Default => None,
        ReturnType::Type(_, ty) => Some((**ty).clone()),
    };
    if verb.is_none() && ret.is_none() {
        return Err(syn::Error::new_spanned(
            &method.sig,
            "a locator method must return a resource type",
        ));
    }

    Ok(MethodModel {
        ident: method.sig.ident.clone(),
        verb,
        path,
        produces,
        consumes,
        params,
        ret,
        forwarded,
    })
}

/// The optional path template carried inline by a verb attribute,
/// `#[get("items/{id}")]`.
fn inline_path(attr: &Attribute) -> syn::Result<Option<String>> {
    match &attr.meta {
        Meta::Path(_) => Ok(None),
        Meta::List(_) => Ok(Some(attr.parse_args::<LitStr>()?.value())),
        Meta::NameValue(_) => Err(syn::Error::new_spanned(
            attr,
            "expected a parenthesized path template",
        )),
    }
}

fn set_path(slot: &mut Option<String>, template: String, attr: &Attribute) -> syn::Result<()> {
    if slot.is_some() {
        return Err(syn::Error::new_spanned(
            attr,
            "path template declared more than once",
        ));
    }
    *slot = Some(template);
    Ok(())
}

fn media_types(attr: &Attribute) -> syn::Result<Vec<String>> {
    let types = attr.parse_args_with(Punctuated::<LitStr, Comma>::parse_terminated)?;
    if types.is_empty() {
        return Err(syn::Error::new_spanned(attr, "expected at least one media type"));
    }
    Ok(types.iter().map(LitStr::value).collect())
}

/// The builder chain registering one method with the resource metadata.
fn method_meta_tokens(model: &MethodModel) -> syn::Result<TokenStream> {
    let name = model.ident.to_string();
    let mut tokens = match &model.verb {
        Some(verb) => quote! {
            ::restbind::MethodMeta::terminal(#name, ::restbind::http::Method::#verb)
        },
        None => quote! { ::restbind::MethodMeta::locator(#name) },
    };

    if let Some(path) = &model.path {
        tokens = quote! { #tokens.path(#path) };
    }
    if !model.produces.is_empty() {
        let types = &model.produces;
        tokens = quote! { #tokens.produces([#(#types),*]) };
    }
    if !model.consumes.is_empty() {
        let types = &model.consumes;
        tokens = quote! { #tokens.consumes([#(#types),*]) };
    }

    for param in &model.params {
        let param_name = param.ident.to_string();
        tokens = match param.bindings.as_slice() {
            [] => quote! { #tokens.param(::restbind::ParamMeta::entity(#param_name)) },
            [(variant, key), rest @ ..] => {
                let mut meta = quote! {
                    ::restbind::ParamMeta::bound(
                        #param_name,
                        ::restbind::ParamAnnotation::#variant(::std::string::String::from(#key)),
                    )
                };
                for (variant, key) in rest {
                    meta = quote! {
                        #meta.annotation(
                            ::restbind::ParamAnnotation::#variant(::std::string::String::from(#key)),
                        )
                    };
                }
                quote! { #tokens.param(#meta) }
            }
        };
    }

    match (&model.verb, &model.ret) {
        (Some(_), Some(ty)) => Ok(quote! { #tokens.returns::<#ty>() }),
        (Some(_), None) => Ok(quote! { #tokens.returns::<()>() }),
        (None, Some(ty)) => Ok(quote! { #tokens.locates::<#ty>() }),
        (None, None) => Err(syn::Error::new_spanned(
            &model.ident,
            "a locator method must return a resource type",
        )),
    }
}

/// The typed client method dispatching one trait method through the proxy.
fn client_method_tokens(model: &MethodModel) -> syn::Result<TokenStream> {
    let ident = &model.ident;
    let name = model.ident.to_string();
    let forwarded = &model.forwarded;
    let params = model.params.iter().map(|param| {
        let ident = &param.ident;
        let ty = &param.ty;
        quote! { #ident: #ty }
    });
    let args = model.params.iter().map(|param| {
        let ident = &param.ident;
        if param.bindings.is_empty() {
            quote! { ::restbind::Arg::json(&#ident)? }
        } else {
            quote! { ::restbind::Arg::display(&#ident) }
        }
    });

    if model.verb.is_some() {
        let ret = match &model.ret {
            Some(ty) => quote! { #ty },
            None => quote! { () },
        };
        Ok(quote! {
            #(#forwarded)*
            pub fn #ident(&self, #(#params),*) -> ::restbind::Result<#ret> {
                self.proxy.invoke(#name, ::std::vec![#(#args),*])
            }
        })
    } else {
        let Some(marker) = &model.ret else {
            return Err(syn::Error::new_spanned(
                ident,
                "a locator method must return a resource type",
            ));
        };
        let client = locator_client_type(marker)?;
        Ok(quote! {
            #(#forwarded)*
            pub fn #ident(&self, #(#params),*) -> ::restbind::Result<#client> {
                Ok(<#client>::from_proxy(
                    self.proxy.locate::<#marker>(#name, ::std::vec![#(#args),*])?,
                ))
            }
        })
    }
}

/// Rewrites the declared sub-resource type into its generated client type,
/// `sub::Tags` into `sub::TagsClient<T>`.
fn locator_client_type(ty: &Type) -> syn::Result<Type> {
    let Type::Path(TypePath { qself: None, path }) = ty else {
        return Err(syn::Error::new_spanned(
            ty,
            "a locator method must return a resource type",
        ));
    };
    let mut path = path.clone();
    let Some(last) = path.segments.last_mut() else {
        return Err(syn::Error::new_spanned(
            ty,
            "a locator method must return a resource type",
        ));
    };
    if !matches!(last.arguments, PathArguments::None) {
        return Err(syn::Error::new_spanned(
            ty,
            "a locator method must return a resource type",
        ));
    }
    last.ident = format_ident!("{}Client", last.ident);
    last.arguments = PathArguments::AngleBracketed(syn::parse_quote! { <T> });
    Ok(Type::Path(TypePath { qself: None, path }))
}

pub(crate) fn expand_resource(attr: TokenStream, item: TokenStream) -> syn::Result<TokenStream> {
    let args = syn::parse2::<ResourceArgs>(attr)?;
    let trait_item = syn::parse2::<ItemTrait>(item)?;

    if !trait_item.generics.params.is_empty() || trait_item.generics.where_clause.is_some() {
        return Err(syn::Error::new_spanned(
            &trait_item.generics,
            "generic resource traits are not supported",
        ));
    }
    if !trait_item.supertraits.is_empty() {
        return Err(syn::Error::new_spanned(
            &trait_item.supertraits,
            "resource traits cannot have supertraits",
        ));
    }
    if let Some(unsafety) = &trait_item.unsafety {
        return Err(syn::Error::new_spanned(
            unsafety,
            "resource traits cannot be unsafe",
        ));
    }

    let mut methods = Vec::new();
    for item in &trait_item.items {
        let TraitItem::Fn(method) = item else {
            return Err(syn::Error::new_spanned(
                item,
                "only methods are allowed in a resource trait",
            ));
        };
        methods.push(scan_method(method)?);
    }
    for model in &methods {
        let name = model.ident.to_string();
        if matches!(name.as_str(), "new" | "from_proxy" | "proxy") {
            return Err(syn::Error::new_spanned(
                &model.ident,
                format!("method name '{}' collides with a generated client method", name),
            ));
        }
    }

    let vis = &trait_item.vis;
    let trait_attrs = &trait_item.attrs;
    let trait_ident = &trait_item.ident;
    let client_ident = format_ident!("{}Client", trait_ident);
    let resource_name = trait_ident.to_string();

    let mut meta = quote! { ::restbind::ResourceMeta::new(#resource_name) };
    if let Some(path) = &args.path {
        meta = quote! { #meta.path(#path) };
    }
    if !args.produces.is_empty() {
        let types = &args.produces;
        meta = quote! { #meta.produces([#(#types),*]) };
    }
    for model in &methods {
        let method_meta = method_meta_tokens(model)?;
        meta = quote! { #meta.method(#method_meta) };
    }

    let client_methods = methods
        .iter()
        .map(client_method_tokens)
        .collect::<syn::Result<Vec<_>>>()?;

    let client_doc = format!("Typed client for `{}`.", trait_ident);

    Ok(quote! {
        #(#trait_attrs)*
        #vis struct #trait_ident;

        impl ::restbind::Resource for #trait_ident {
            fn meta() -> ::restbind::ResourceMeta {
                #meta
            }
        }

        #[doc = #client_doc]
        #vis struct #client_ident<T: ::restbind::Transport> {
            proxy: ::restbind::Proxy<#trait_ident, T>,
        }

        impl<T: ::restbind::Transport> #client_ident<T> {
            pub fn new(transport: T, base: &str) -> ::restbind::Result<Self> {
                Ok(Self {
                    proxy: ::restbind::Proxy::root(transport, base)?,
                })
            }

            pub fn from_proxy(proxy: ::restbind::Proxy<#trait_ident, T>) -> Self {
                Self { proxy }
            }

            pub fn proxy(&self) -> &::restbind::Proxy<#trait_ident, T> {
                &self.proxy
            }

            #(#client_methods)*
        }

        impl<T: ::restbind::Transport> ::std::clone::Clone for #client_ident<T> {
            fn clone(&self) -> Self {
                Self {
                    proxy: ::std::clone::Clone::clone(&self.proxy),
                }
            }
        }
    })
}

#[test]
pub fn test_parse_resource_args() {
    let args: ResourceArgs =
        syn::parse2(quote::quote!(path = "api", produces("application/json"))).unwrap();
    assert_eq!(
        ResourceArgs {
            path: Some("api".to_string()),
            produces: vec!["application/json".to_string()],
        },
        args
    );

    let args: ResourceArgs = syn::parse2(TokenStream::new()).unwrap();
    assert_eq!(ResourceArgs::default(), args);

    // error on unknown params
    let macro_args = quote::quote!(xxx = "api");
    syn::parse2::<ResourceArgs>(macro_args).unwrap_err();
}

#[test]
pub fn test_scan_terminal_method() {
    let method: TraitItemFn = syn::parse_quote! {
        #[get("items/{id}")]
        #[produces("text/plain")]
        fn find(&self, #[path_param] id: u64, #[query_param("v")] verbose: bool) -> String;
    };
    let model = scan_method(&method).unwrap();
    assert_eq!(model.verb.as_ref().unwrap().to_string(), "GET");
    assert_eq!(model.path.as_deref(), Some("items/{id}"));
    assert_eq!(model.produces, ["text/plain"]);
    assert_eq!(model.params.len(), 2);
    assert_eq!(model.params[0].bindings[0].0.to_string(), "Path");
    assert_eq!(model.params[0].bindings[0].1, "id");
    assert_eq!(model.params[1].bindings[0].0.to_string(), "Query");
    assert_eq!(model.params[1].bindings[0].1, "v");
}

#[test]
pub fn test_scan_locator_method() {
    let method: TraitItemFn = syn::parse_quote! {
        #[path("sub/{key}")]
        fn sub(&self, #[path_param] key: String) -> SubApi;
    };
    let model = scan_method(&method).unwrap();
    assert!(model.verb.is_none());
    assert_eq!(model.path.as_deref(), Some("sub/{key}"));

    // no verb and no return type identifies nothing
    let method: TraitItemFn = syn::parse_quote! {
        fn sub(&self);
    };
    scan_method(&method).unwrap_err();
}

#[test]
pub fn test_scan_rejects_conflicting_routes() {
    let method: TraitItemFn = syn::parse_quote! {
        #[get("a")]
        #[path("b")]
        fn find(&self) -> String;
    };
    scan_method(&method).unwrap_err();

    let method: TraitItemFn = syn::parse_quote! {
        #[get]
        #[post]
        fn find(&self) -> String;
    };
    scan_method(&method).unwrap_err();
}

#[test]
pub fn test_scan_keeps_conflicting_bindings_for_the_engine() {
    let method: TraitItemFn = syn::parse_quote! {
        #[get]
        fn find(&self, #[path_param] #[query_param] id: u64) -> String;
    };
    let model = scan_method(&method).unwrap();
    assert_eq!(model.params[0].bindings.len(), 2);
}

#[test]
pub fn test_expand_resource() {
    let tokens = expand_resource(
        quote::quote!(path = "api", produces("application/json")),
        quote::quote! {
            pub trait Items {
                #[get("items/{id}")]
                fn find(&self, #[path_param] id: u64) -> Widget;

                #[post("items")]
                fn create(&self, item: Widget) -> Widget;

                #[path("items/{id}/tags")]
                fn tags(&self, #[path_param] id: u64) -> Tags;
            }
        },
    )
    .unwrap();

    // marker struct, Resource impl, client struct, client impl, Clone impl
    let file: syn::File = syn::parse2(tokens).unwrap();
    assert_eq!(file.items.len(), 5);

    let rendered = file.to_token_stream().to_string();
    assert!(rendered.contains("ItemsClient"));
    assert!(rendered.contains("TagsClient"));
}

#[test]
pub fn test_expand_rejects_non_method_items() {
    let result = expand_resource(
        TokenStream::new(),
        quote::quote! {
            trait Items {
                const LIMIT: usize;
            }
        },
    );
    result.unwrap_err();
}
