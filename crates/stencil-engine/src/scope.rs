// SPDX-License-Identifier: Apache-2.0 OR MIT
//! Scope frames: the chain of name→value mappings visible during a render.

use std::sync::Arc;

use indexmap::IndexMap;

use crate::value::Value;

/// One link in the scope chain. Frames are immutable once built; pushing a
/// scope means constructing a child whose parent pointer is the current
/// frame, so sibling frames never see each other's bindings.
#[derive(Debug)]
pub struct ScopeFrame {
    vars: IndexMap<String, Value>,
    parent: Option<Arc<ScopeFrame>>,
}

impl ScopeFrame {
    /// The root frame of a chain, holding the context-level args.
    pub fn root(vars: IndexMap<String, Value>) -> Arc<Self> {
        Arc::new(Self { vars, parent: None })
    }

    /// A child frame layered over `parent`.
    pub fn child(parent: &Arc<ScopeFrame>, vars: IndexMap<String, Value>) -> Arc<Self> {
        Arc::new(Self {
            vars,
            parent: Some(Arc::clone(parent)),
        })
    }

    /// Looks a name up, walking parent-ward until the root.
    pub fn lookup(&self, name: &str) -> Option<&Value> {
        let mut frame = self;
        loop {
            if let Some(value) = frame.vars.get(name) {
                return Some(value);
            }
            frame = frame.parent.as_deref()?;
        }
    }

    /// Whether the name is bound anywhere in the chain.
    pub fn contains(&self, name: &str) -> bool {
        self.lookup(name).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use indexmap::indexmap;

    #[test]
    fn lookup_walks_parents() {
        let root = ScopeFrame::root(indexmap! {
            "culture".to_string() => Value::String("en-US".into()),
        });
        let child = ScopeFrame::child(&root, indexmap! {
            "it".to_string() => Value::Integer(1),
        });

        assert_eq!(child.lookup("it"), Some(&Value::Integer(1)));
        assert_eq!(
            child.lookup("culture"),
            Some(&Value::String("en-US".into()))
        );
        assert!(root.lookup("it").is_none());
    }

    #[test]
    fn child_bindings_shadow_parents() {
        let root = ScopeFrame::root(indexmap! {
            "name".to_string() => Value::String("outer".into()),
        });
        let child = ScopeFrame::child(&root, indexmap! {
            "name".to_string() => Value::String("inner".into()),
        });

        assert_eq!(child.lookup("name"), Some(&Value::String("inner".into())));
        assert_eq!(root.lookup("name"), Some(&Value::String("outer".into())));
    }

    #[test]
    fn siblings_are_invisible_to_each_other() {
        let root = ScopeFrame::root(IndexMap::new());
        let left = ScopeFrame::child(&root, indexmap! {
            "x".to_string() => Value::Integer(1),
        });
        let right = ScopeFrame::child(&root, IndexMap::new());

        assert!(left.contains("x"));
        assert!(!right.contains("x"));
    }
}
