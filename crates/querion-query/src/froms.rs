//! Alias resolution scopes.

use querion_core::{Error, Result};
use std::collections::HashMap;
use std::sync::Arc;

/// A source bound into a query scope under an alias.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoundSource {
    /// The alias the source is bound under
    pub alias: String,
    /// The table backing the source
    pub table: String,
}

/// The alias → bound-source registry for one query level.
///
/// Resolution checks the local bindings first and then walks outward
/// through parent scopes. The parent link is assigned exactly once, at
/// subquery-scope construction, from an already-built outer scope, so the
/// chain cannot form a cycle.
#[derive(Debug, Clone, Default)]
pub struct Froms {
    /// Bindings in declaration order
    bindings: Vec<BoundSource>,
    /// Alias -> index into `bindings`
    index: HashMap<String, usize>,
    /// Enclosing scope for correlated subqueries
    parent: Option<Arc<Froms>>,
}

impl Froms {
    /// Create an empty root scope.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty scope enclosed by `parent`.
    pub fn child_of(parent: Arc<Froms>) -> Self {
        Self {
            bindings: Vec::new(),
            index: HashMap::new(),
            parent: Some(parent),
        }
    }

    /// Bind a table under an alias in this scope.
    ///
    /// Binding the same alias twice in one scope is a specification error;
    /// shadowing an alias bound in a parent scope is allowed.
    pub fn bind(&mut self, alias: impl Into<String>, table: impl Into<String>) -> Result<()> {
        let alias = alias.into();
        if self.index.contains_key(&alias) {
            return Err(Error::specification(
                querion_core::SpecificationErrorKind::DuplicateAlias,
                format!("alias `{alias}` is bound twice in one scope"),
            ));
        }
        self.index.insert(alias.clone(), self.bindings.len());
        self.bindings.push(BoundSource {
            alias,
            table: table.into(),
        });
        Ok(())
    }

    /// Resolve an alias through this scope and its parents.
    pub fn resolve(&self, alias: &str) -> Result<&BoundSource> {
        self.lookup(alias).ok_or_else(|| Error::resolution(alias))
    }

    fn lookup(&self, alias: &str) -> Option<&BoundSource> {
        match self.index.get(alias) {
            Some(i) => self.bindings.get(*i),
            None => self.parent.as_deref().and_then(|p| p.lookup(alias)),
        }
    }

    /// The bindings local to this scope, in declaration order.
    pub fn bindings(&self) -> &[BoundSource] {
        &self.bindings
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use querion_core::SpecificationErrorKind;

    #[test]
    fn test_resolve_local_binding() {
        let mut froms = Froms::new();
        froms.bind("i", "invoice").unwrap();
        let bound = froms.resolve("i").unwrap();
        assert_eq!(bound.table, "invoice");
    }

    #[test]
    fn test_resolve_walks_parent_chain() {
        let mut outer = Froms::new();
        outer.bind("i", "invoice").unwrap();
        let mut inner = Froms::child_of(Arc::new(outer));
        inner.bind("li", "line_item").unwrap();

        assert_eq!(inner.resolve("li").unwrap().table, "line_item");
        assert_eq!(inner.resolve("i").unwrap().table, "invoice");
    }

    #[test]
    fn test_unresolvable_alias_is_an_error() {
        let froms = Froms::new();
        let err = froms.resolve("missing").unwrap_err();
        assert_eq!(err, Error::resolution("missing"));
    }

    #[test]
    fn test_child_shadows_parent() {
        let mut outer = Froms::new();
        outer.bind("t", "outer_table").unwrap();
        let mut inner = Froms::child_of(Arc::new(outer));
        inner.bind("t", "inner_table").unwrap();

        assert_eq!(inner.resolve("t").unwrap().table, "inner_table");
    }

    #[test]
    fn test_duplicate_alias_rejected() {
        let mut froms = Froms::new();
        froms.bind("t", "a").unwrap();
        let err = froms.bind("t", "b").unwrap_err();
        match err {
            Error::Specification(e) => {
                assert_eq!(e.kind, SpecificationErrorKind::DuplicateAlias);
            }
            other => panic!("expected specification error, got {other:?}"),
        }
    }
}
