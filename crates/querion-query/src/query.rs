//! Query specifications.
//!
//! A specification composes a projection, from clauses, an optional
//! predicate root, grouping, ordering, and a mutation-context tag into the
//! unit handed to the compiler. Select specifications are typed by their
//! projection; update and delete specifications are typed by their target
//! entity.

use crate::expr::{EntityRef, ExprNode, Expression, ProjectionExpr};
use crate::predicate::{Predicate, PredicateNode};
use querion_core::{Entity, JoinKind, Row, SortDirection};
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

/// The mutation context a specification compiles under.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementContext {
    /// Row-set producing query
    Select,
    /// Update statement
    Update,
    /// Delete statement
    Delete,
}

/// One root from-clause: a table bound under an alias.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FromClause {
    pub(crate) alias: String,
    pub(crate) table: String,
}

/// One explicit join attached to a query.
#[derive(Debug, Clone, PartialEq)]
pub struct JoinClause {
    pub(crate) kind: JoinKind,
    pub(crate) alias: String,
    pub(crate) table: String,
    pub(crate) on: Option<Arc<PredicateNode>>,
}

/// One ordering term: an expression plus a direction.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderSpec {
    pub(crate) expr: Arc<ExprNode>,
    pub(crate) direction: SortDirection,
}

impl<T> Expression<T> {
    /// Order ascending by this expression.
    pub fn asc(&self) -> OrderSpec {
        OrderSpec {
            expr: self.node_arc(),
            direction: SortDirection::Ascending,
        }
    }

    /// Order descending by this expression.
    pub fn desc(&self) -> OrderSpec {
        OrderSpec {
            expr: self.node_arc(),
            direction: SortDirection::Descending,
        }
    }
}

/// What a query projects.
#[derive(Debug, Clone, PartialEq)]
pub enum ProjectionSpec {
    /// A single expression
    Single(Arc<ExprNode>),
    /// An ordered multi-column tuple
    Multi(Vec<Arc<ExprNode>>),
}

/// The untyped body of a select query, shared by typed select
/// specifications and embedded subqueries.
#[derive(Debug, Clone, PartialEq)]
pub struct QuerySpec {
    pub(crate) projection: ProjectionSpec,
    pub(crate) froms: Vec<FromClause>,
    pub(crate) joins: Vec<JoinClause>,
    pub(crate) predicate: Option<Arc<PredicateNode>>,
    pub(crate) group_by: Vec<Arc<ExprNode>>,
    pub(crate) order_by: Vec<OrderSpec>,
    pub(crate) distinct: bool,
}

/// A typed select specification.
///
/// The type parameter is the projection's value type — the row-mapping
/// target for multi-column projections is [`Row`].
pub struct SelectSpec<T> {
    query: QuerySpec,
    _marker: PhantomData<fn() -> T>,
}

/// Start a select specification from a single typed projection.
pub fn select<T>(projection: impl Into<Expression<T>>) -> SelectSpec<T> {
    SelectSpec {
        query: QuerySpec {
            projection: ProjectionSpec::Single(projection.into().node_arc()),
            froms: Vec::new(),
            joins: Vec::new(),
            predicate: None,
            group_by: Vec::new(),
            order_by: Vec::new(),
            distinct: false,
        },
        _marker: PhantomData,
    }
}

/// Start a select specification from an ordered multi-column projection.
///
/// The caller maps each result [`Row`] into its DTO.
pub fn select_multi(columns: Vec<ProjectionExpr>) -> SelectSpec<Row> {
    SelectSpec {
        query: QuerySpec {
            projection: ProjectionSpec::Multi(columns.into_iter().map(|c| c.node).collect()),
            froms: Vec::new(),
            joins: Vec::new(),
            predicate: None,
            group_by: Vec::new(),
            order_by: Vec::new(),
            distinct: false,
        },
        _marker: PhantomData,
    }
}

impl<T> SelectSpec<T> {
    /// Add a root from-clause.
    pub fn from<E: Entity>(mut self, entity: &EntityRef<E>) -> Self {
        self.query.froms.push(FromClause {
            alias: entity.alias().to_string(),
            table: entity.table().to_string(),
        });
        self
    }

    /// Add an inner join with an on-condition.
    pub fn join<E: Entity>(mut self, entity: &EntityRef<E>, on: Predicate) -> Self {
        self.query.joins.push(JoinClause {
            kind: JoinKind::Inner,
            alias: entity.alias().to_string(),
            table: entity.table().to_string(),
            on: Some(on.node_arc()),
        });
        self
    }

    /// Add a left join with an on-condition.
    pub fn left_join<E: Entity>(mut self, entity: &EntityRef<E>, on: Predicate) -> Self {
        self.query.joins.push(JoinClause {
            kind: JoinKind::Left,
            alias: entity.alias().to_string(),
            table: entity.table().to_string(),
            on: Some(on.node_arc()),
        });
        self
    }

    /// Add a cross join.
    pub fn cross_join<E: Entity>(mut self, entity: &EntityRef<E>) -> Self {
        self.query.joins.push(JoinClause {
            kind: JoinKind::Cross,
            alias: entity.alias().to_string(),
            table: entity.table().to_string(),
            on: None,
        });
        self
    }

    /// Add a WHERE condition; multiple calls are conjoined.
    pub fn filter(mut self, predicate: Predicate) -> Self {
        self.query.predicate = Some(match self.query.predicate.take() {
            Some(existing) => Arc::new(PredicateNode::And(vec![existing, predicate.node_arc()])),
            None => predicate.node_arc(),
        });
        self
    }

    /// Append a group-by key.
    pub fn group_by(mut self, expr: impl Into<ProjectionExpr>) -> Self {
        self.query.group_by.push(expr.into().node);
        self
    }

    /// Append an ordering term.
    pub fn order_by(mut self, order: OrderSpec) -> Self {
        self.query.order_by.push(order);
        self
    }

    /// Eliminate duplicate result rows.
    pub fn distinct(mut self) -> Self {
        self.query.distinct = true;
        self
    }

    /// Embed this specification as a scalar subquery expression.
    ///
    /// Aliases of the enclosing query stay visible inside — the subquery's
    /// scope is chained to the outer scope when the enclosing query is
    /// compiled.
    pub fn scalar(self) -> Expression<T> {
        Expression::from_node(ExprNode::Subquery(Arc::new(self.query)))
    }

    pub(crate) fn query(&self) -> &QuerySpec {
        &self.query
    }

    pub(crate) fn into_query(self) -> QuerySpec {
        self.query
    }
}

impl<T> Clone for SelectSpec<T> {
    fn clone(&self) -> Self {
        Self {
            query: self.query.clone(),
            _marker: PhantomData,
        }
    }
}

impl<T> fmt::Debug for SelectSpec<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("SelectSpec").field(&self.query).finish()
    }
}

/// A typed update specification.
pub struct UpdateSpec<E: Entity> {
    pub(crate) alias: String,
    pub(crate) assignments: Vec<(String, Arc<ExprNode>)>,
    pub(crate) predicate: Option<Arc<PredicateNode>>,
    _marker: PhantomData<fn() -> E>,
}

/// Start an update specification against a target entity.
pub fn update<E: Entity>(target: &EntityRef<E>) -> UpdateSpec<E> {
    UpdateSpec {
        alias: target.alias().to_string(),
        assignments: Vec::new(),
        predicate: None,
        _marker: PhantomData,
    }
}

impl<E: Entity> UpdateSpec<E> {
    /// Append a SET clause; clauses apply in declaration order.
    pub fn set<T>(mut self, column: impl Into<String>, value: impl Into<Expression<T>>) -> Self {
        self.assignments
            .push((column.into(), value.into().node_arc()));
        self
    }

    /// Add a WHERE condition; multiple calls are conjoined.
    pub fn filter(mut self, predicate: Predicate) -> Self {
        self.predicate = Some(match self.predicate.take() {
            Some(existing) => Arc::new(PredicateNode::And(vec![existing, predicate.node_arc()])),
            None => predicate.node_arc(),
        });
        self
    }
}

impl<E: Entity> fmt::Debug for UpdateSpec<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UpdateSpec")
            .field("alias", &self.alias)
            .field("assignments", &self.assignments)
            .field("predicate", &self.predicate)
            .finish()
    }
}

/// A typed delete specification.
pub struct DeleteSpec<E: Entity> {
    pub(crate) alias: String,
    pub(crate) predicate: Option<Arc<PredicateNode>>,
    _marker: PhantomData<fn() -> E>,
}

/// Start a delete specification against a target entity.
pub fn delete<E: Entity>(target: &EntityRef<E>) -> DeleteSpec<E> {
    DeleteSpec {
        alias: target.alias().to_string(),
        predicate: None,
        _marker: PhantomData,
    }
}

impl<E: Entity> DeleteSpec<E> {
    /// Add a WHERE condition; multiple calls are conjoined.
    pub fn filter(mut self, predicate: Predicate) -> Self {
        self.predicate = Some(match self.predicate.take() {
            Some(existing) => Arc::new(PredicateNode::And(vec![existing, predicate.node_arc()])),
            None => predicate.node_arc(),
        });
        self
    }
}

impl<E: Entity> fmt::Debug for DeleteSpec<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeleteSpec")
            .field("alias", &self.alias)
            .field("predicate", &self.predicate)
            .finish()
    }
}
