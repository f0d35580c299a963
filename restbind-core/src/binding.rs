use http::Method;

use crate::error::ConfigurationError;
use crate::meta::{MethodMeta, ParamAnnotation, ParamMeta, TypeDescriptor};

/**
The binding kind of a single method parameter. Every declared parameter maps
to exactly one variant; the unannotated fallback is [ParamBinding::Entity].
*/
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamBinding {
    Path(String),
    Query(String),
    Matrix(String),
    Header(String),
    Form(String),
    Cookie(String),
    Entity,
}

/// Classifies one parameter from its annotation list. Zero annotations make
/// it the entity, one selects the binding, more than one is a configuration
/// error naming both offenders.
pub(crate) fn classify(
    method: &str,
    param: &ParamMeta,
) -> Result<ParamBinding, ConfigurationError> {
    match param.annotations.as_slice() {
        [] => Ok(ParamBinding::Entity),
        [single] => Ok(binding_of(single)),
        [first, second, ..] => Err(ConfigurationError::ConflictingBindings {
            method: method.to_string(),
            param: param.name.clone(),
            first: first.kind(),
            second: second.kind(),
        }),
    }
}

fn binding_of(annotation: &ParamAnnotation) -> ParamBinding {
    match annotation {
        ParamAnnotation::Path(name) => ParamBinding::Path(name.clone()),
        ParamAnnotation::Query(name) => ParamBinding::Query(name.clone()),
        ParamAnnotation::Matrix(name) => ParamBinding::Matrix(name.clone()),
        ParamAnnotation::Header(name) => ParamBinding::Header(name.clone()),
        ParamAnnotation::Form(name) => ParamBinding::Form(name.clone()),
        ParamAnnotation::Cookie(name) => ParamBinding::Cookie(name.clone()),
    }
}

/**
Immutable per-method binding descriptor. `params` holds one entry per
declared parameter, in declaration order, so dispatch can zip it with the
argument vector. A missing verb marks the method as a sub-resource locator.
*/
#[derive(Debug, Clone)]
pub struct MethodBinding {
    pub(crate) name: String,
    pub(crate) verb: Option<Method>,
    pub(crate) path: Option<String>,
    pub(crate) params: Vec<ParamBinding>,
    pub(crate) produces: Option<Vec<String>>,
    pub(crate) consumes: Option<Vec<String>>,
    pub(crate) returns: Option<TypeDescriptor>,
    pub(crate) locates: Option<TypeDescriptor>,
    pub(crate) is_locator: bool,
}

impl MethodBinding {
    pub(crate) fn from_meta(meta: &MethodMeta) -> Result<Self, ConfigurationError> {
        let is_locator = meta.verb.is_none();
        let mut params = Vec::with_capacity(meta.params.len());
        let mut entity_seen = false;

        for param in &meta.params {
            let binding = classify(&meta.name, param)?;
            if binding == ParamBinding::Entity {
                if is_locator {
                    return Err(ConfigurationError::EntityOnLocator {
                        method: meta.name.clone(),
                    });
                }
                if entity_seen {
                    return Err(ConfigurationError::TooManyEntities {
                        method: meta.name.clone(),
                    });
                }
                entity_seen = true;
            }
            params.push(binding);
        }

        Ok(MethodBinding {
            name: meta.name.clone(),
            verb: meta.verb.clone(),
            path: meta.path.clone(),
            params,
            produces: meta.produces.clone(),
            consumes: meta.consumes.clone(),
            returns: meta.returns.clone(),
            locates: meta.locates.clone(),
            is_locator,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn verb(&self) -> Option<&Method> {
        self.verb.as_ref()
    }

    pub fn path_template(&self) -> Option<&str> {
        self.path.as_deref()
    }

    pub fn param_iter(&self) -> impl Iterator<Item = &ParamBinding> {
        self.params.iter()
    }

    pub fn is_locator(&self) -> bool {
        self.is_locator
    }
}

#[cfg(test)]
mod tests {
    use crate::meta::MethodMeta;

    use super::*;

    #[test]
    fn test_classify_entity() {
        let binding = classify("create", &ParamMeta::entity("body")).unwrap();
        assert_eq!(binding, ParamBinding::Entity);
    }

    #[test]
    fn test_classify_single() {
        let param = ParamMeta::bound("id", ParamAnnotation::Path("id".to_string()));
        let binding = classify("find", &param).unwrap();
        assert_eq!(binding, ParamBinding::Path("id".to_string()));
    }

    #[test]
    fn test_classify_conflict() {
        let param = ParamMeta::bound("id", ParamAnnotation::Path("id".to_string()))
            .annotation(ParamAnnotation::Query("id".to_string()));
        match classify("find", &param) {
            Err(ConfigurationError::ConflictingBindings {
                method,
                param,
                first,
                second,
            }) => {
                assert_eq!(method, "find");
                assert_eq!(param, "id");
                assert_eq!(first, "path");
                assert_eq!(second, "query");
            }
            other => panic!("expected ConflictingBindings, got {other:?}"),
        }
    }

    #[test]
    fn test_locator_from_missing_verb() {
        let binding = MethodBinding::from_meta(&MethodMeta::locator("sub")).unwrap();
        assert!(binding.is_locator());
        assert!(binding.verb().is_none());
    }

    #[test]
    fn test_entity_rejected_on_locator() {
        let meta = MethodMeta::locator("sub").param(ParamMeta::entity("body"));
        match MethodBinding::from_meta(&meta) {
            Err(ConfigurationError::EntityOnLocator { method }) => assert_eq!(method, "sub"),
            other => panic!("expected EntityOnLocator, got {other:?}"),
        }
    }

    #[test]
    fn test_second_entity_rejected() {
        let meta = MethodMeta::terminal("create", Method::POST)
            .param(ParamMeta::entity("first"))
            .param(ParamMeta::entity("second"));
        match MethodBinding::from_meta(&meta) {
            Err(ConfigurationError::TooManyEntities { method }) => assert_eq!(method, "create"),
            other => panic!("expected TooManyEntities, got {other:?}"),
        }
    }

    #[test]
    fn test_params_keep_declaration_order() {
        let meta = MethodMeta::terminal("mixed", Method::POST)
            .param(ParamMeta::bound("a", ParamAnnotation::Query("a".to_string())))
            .param(ParamMeta::entity("body"))
            .param(ParamMeta::bound("b", ParamAnnotation::Header("X-B".to_string())));
        let binding = MethodBinding::from_meta(&meta).unwrap();
        let kinds: Vec<_> = binding.param_iter().collect();
        assert_eq!(kinds.len(), 3);
        assert_eq!(*kinds[0], ParamBinding::Query("a".to_string()));
        assert_eq!(*kinds[1], ParamBinding::Entity);
        assert_eq!(*kinds[2], ParamBinding::Header("X-B".to_string()));
    }
}
