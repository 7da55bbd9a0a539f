// SPDX-License-Identifier: Apache-2.0 OR MIT
use std::collections::HashMap;
use std::sync::Arc;

use crate::error::Error;
use crate::runtime::RenderContext;
use crate::value::Value;

/// Signature implemented by template filters. The subject of a piped
/// invocation is prepended as argument 0, so `{{ x | f(a) }}` and
/// `{{ f(x, a) }}` reach the implementation identically.
pub type Filter = dyn Fn(&mut RenderContext, &[Value]) -> Result<Value, Error> + Send + Sync;

#[derive(Clone)]
pub(crate) struct FilterEntry {
    pub func: Arc<Filter>,
    pub handles_unknown: bool,
}

/// Registry mapping `(name, arity)` to a filter implementation. Aliases are
/// duplicate entries; optional parameters are duplicate arities. Frozen
/// behind `Arc` once built; there is no registration after
/// [`crate::Context`] initialisation.
#[derive(Clone, Default)]
pub struct FilterRegistry {
    map: Arc<HashMap<(String, usize), FilterEntry>>,
}

impl FilterRegistry {
    /// Creates an empty registry.
    pub fn empty() -> Self {
        Self {
            map: Arc::new(HashMap::new()),
        }
    }

    /// Returns a new builder for constructing registries.
    pub fn builder() -> FilterRegistryBuilder {
        FilterRegistryBuilder::new()
    }

    pub(crate) fn get(&self, name: &str, arity: usize) -> Option<FilterEntry> {
        self.map.get(&(name.to_string(), arity)).cloned()
    }

    /// Whether any arity is registered under `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.map.keys().any(|(n, _)| n == name)
    }

    /// Reports whether the registry contains no filters.
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Sorted, de-duplicated filter names.
    pub fn filter_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.map.keys().map(|(n, _)| n.clone()).collect();
        names.sort();
        names.dedup();
        names
    }
}

/// Builder for [`FilterRegistry`]. Consumed by `build`, which freezes the
/// map; late registration is unrepresentable.
#[derive(Default)]
pub struct FilterRegistryBuilder {
    map: HashMap<(String, usize), FilterEntry>,
}

impl FilterRegistryBuilder {
    pub fn new() -> Self {
        Self {
            map: HashMap::new(),
        }
    }

    /// Registers a filter under `name` at the given arity (total positional
    /// count, subject included).
    pub fn register<F>(&mut self, name: impl Into<String>, arity: usize, func: F) -> &mut Self
    where
        F: Fn(&mut RenderContext, &[Value]) -> Result<Value, Error> + Send + Sync + 'static,
    {
        self.insert(name, arity, false, Arc::new(func))
    }

    /// Registers a filter that participates even when its subject or
    /// arguments are [`Value::Unresolved`]. Running such a filter counts as
    /// consuming the unknown: the placeholder no longer falls back to
    /// verbatim passthrough.
    pub fn register_unknown_aware<F>(
        &mut self,
        name: impl Into<String>,
        arity: usize,
        func: F,
    ) -> &mut Self
    where
        F: Fn(&mut RenderContext, &[Value]) -> Result<Value, Error> + Send + Sync + 'static,
    {
        self.insert(name, arity, true, Arc::new(func))
    }

    /// Duplicates every arity of `existing` under `alias`.
    pub fn alias(&mut self, alias: impl Into<String>, existing: &str) -> &mut Self {
        let alias = alias.into();
        let copies: Vec<(usize, FilterEntry)> = self
            .map
            .iter()
            .filter(|((name, _), _)| name == existing)
            .map(|((_, arity), entry)| (*arity, entry.clone()))
            .collect();
        for (arity, entry) in copies {
            self.map.insert((alias.clone(), arity), entry);
        }
        self
    }

    /// Extends the builder with every entry from a built registry.
    pub fn extend(&mut self, other: &FilterRegistry) -> &mut Self {
        for (key, entry) in other.map.iter() {
            self.map.insert(key.clone(), entry.clone());
        }
        self
    }

    /// Finalises the builder into an immutable registry.
    pub fn build(self) -> FilterRegistry {
        FilterRegistry {
            map: Arc::new(self.map),
        }
    }

    fn insert(
        &mut self,
        name: impl Into<String>,
        arity: usize,
        handles_unknown: bool,
        func: Arc<Filter>,
    ) -> &mut Self {
        self.map.insert(
            (name.into(), arity),
            FilterEntry {
                func,
                handles_unknown,
            },
        );
        self
    }
}
