use std::any::TypeId;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use indexmap::IndexMap;
use lazy_static::lazy_static;

use crate::binding::MethodBinding;
use crate::error::ConfigurationError;
use crate::meta::{Resource, ResourceMeta};

/**
Immutable description of one resource interface: its path template, its
default media types and one [MethodBinding] per declared method. Built once
per type, shared behind an [Arc] and read only afterwards.
*/
#[derive(Debug)]
pub struct ResourceDescriptor {
    pub(crate) name: String,
    pub(crate) path: Option<String>,
    pub(crate) produces: Option<Vec<String>>,
    pub(crate) methods: IndexMap<String, MethodBinding>,
}

impl ResourceDescriptor {
    pub(crate) fn from_meta(meta: ResourceMeta) -> Result<Self, ConfigurationError> {
        let mut methods = IndexMap::with_capacity(meta.methods.len());
        for method_meta in &meta.methods {
            let binding = MethodBinding::from_meta(method_meta)?;
            if methods.insert(binding.name.clone(), binding).is_some() {
                return Err(ConfigurationError::DuplicateMethod {
                    resource: meta.name.clone(),
                    method: method_meta.name().to_string(),
                });
            }
        }
        log::debug!(
            "built descriptor for resource '{}' with {} methods",
            meta.name,
            methods.len()
        );
        Ok(ResourceDescriptor {
            name: meta.name,
            path: meta.path,
            produces: meta.produces,
            methods,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path_template(&self) -> Option<&str> {
        self.path.as_deref()
    }

    pub fn method(&self, name: &str) -> Option<&MethodBinding> {
        self.methods.get(name)
    }

    pub fn method_iter(&self) -> impl Iterator<Item = &MethodBinding> {
        self.methods.values()
    }
}

lazy_static! {
    static ref REGISTRY: RwLock<HashMap<TypeId, Arc<ResourceDescriptor>>> =
        RwLock::new(HashMap::new());
}

/**
Returns the descriptor for `R`, building it from [Resource::meta] on first
use. Construction runs outside the registry lock; when two threads race,
the first inserted descriptor wins and the other build is discarded.
Construction failures are reported to the caller and never cached.
*/
pub fn descriptor_for<R: Resource>() -> Result<Arc<ResourceDescriptor>, ConfigurationError> {
    let key = TypeId::of::<R>();
    {
        let registry = REGISTRY.read().unwrap();
        if let Some(descriptor) = registry.get(&key) {
            return Ok(descriptor.clone());
        }
    }

    let descriptor = Arc::new(ResourceDescriptor::from_meta(R::meta())?);
    let mut registry = REGISTRY.write().unwrap();
    Ok(registry.entry(key).or_insert(descriptor).clone())
}
