//! Expression specification nodes.
//!
//! The grammar is a closed union ([`ExprNode`]) walked by the compiler;
//! static typing lives in the [`Expression<T>`] handles wrapping shared
//! `Arc` nodes. Handles are cheap to clone and nodes are freely shared
//! between parent specifications — a node carries no identity beyond its
//! field values.

use crate::predicate::{Predicate, PredicateNode};
use crate::query::QuerySpec;
use querion_core::{
    AggregateFunction, Comparable, Entity, Error, Numeric, Result, SpecificationErrorKind,
    SqlParam, SqlType, Value,
};
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

/// A node of the expression specification tree.
#[derive(Debug, Clone, PartialEq)]
pub enum ExprNode {
    /// Typed literal value
    Literal(Value),

    /// Typed NULL literal carrying its declared type token
    TypedNull(SqlType),

    /// Column reference on an aliased source
    Column {
        /// Alias of the owning source
        alias: String,
        /// Column name
        column: String,
    },

    /// Whole-row projection of an aliased source
    EntityRow {
        /// Alias of the owning source
        alias: String,
    },

    /// Aggregate function over exactly one child expression
    Aggregate {
        function: AggregateFunction,
        distinct: bool,
        argument: Arc<ExprNode>,
    },

    /// Searched case expression with a mandatory else branch
    Case {
        /// (condition, result) branches in declared order
        branches: Vec<(Arc<PredicateNode>, Arc<ExprNode>)>,
        otherwise: Arc<ExprNode>,
    },

    /// Cast to an explicit type
    Cast {
        target: SqlType,
        argument: Arc<ExprNode>,
    },

    /// Embedded query specification used as a scalar expression
    Subquery(Arc<QuerySpec>),
}

/// A typed handle on an expression node.
///
/// The type parameter tracks the value type the expression produces; it is
/// phantom — the underlying node is untyped and shared.
pub struct Expression<T> {
    node: Arc<ExprNode>,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Expression<T> {
    pub(crate) fn from_node(node: ExprNode) -> Self {
        Self {
            node: Arc::new(node),
            _marker: PhantomData,
        }
    }

    pub(crate) fn node(&self) -> &ExprNode {
        &self.node
    }

    pub(crate) fn node_arc(&self) -> Arc<ExprNode> {
        Arc::clone(&self.node)
    }

    /// Cast this expression to another parameter type.
    pub fn cast<U: SqlParam>(&self) -> Expression<U> {
        Expression::from_node(ExprNode::Cast {
            target: U::SQL_TYPE,
            argument: self.node_arc(),
        })
    }
}

impl<T: SqlParam> Expression<T> {
    /// Create a typed literal expression.
    pub fn literal(value: T) -> Self {
        Self::from_node(ExprNode::Literal(value.into_value()))
    }

    /// Create a typed NULL literal.
    ///
    /// The declared type token travels with the node because the criteria
    /// layer is dynamically valued and needs an explicit hint for NULL.
    pub fn null() -> Self {
        Self::from_node(ExprNode::TypedNull(T::SQL_TYPE))
    }
}

impl<T> Clone for Expression<T> {
    fn clone(&self) -> Self {
        Self {
            node: Arc::clone(&self.node),
            _marker: PhantomData,
        }
    }
}

impl<T> fmt::Debug for Expression<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Expression").field(&self.node).finish()
    }
}

impl From<bool> for Expression<bool> {
    fn from(v: bool) -> Self {
        Expression::literal(v)
    }
}

impl From<i32> for Expression<i32> {
    fn from(v: i32) -> Self {
        Expression::literal(v)
    }
}

impl From<i64> for Expression<i64> {
    fn from(v: i64) -> Self {
        Expression::literal(v)
    }
}

impl From<f64> for Expression<f64> {
    fn from(v: f64) -> Self {
        Expression::literal(v)
    }
}

impl From<String> for Expression<String> {
    fn from(v: String) -> Self {
        Expression::literal(v)
    }
}

impl From<&str> for Expression<String> {
    fn from(v: &str) -> Self {
        Expression::literal(v.to_string())
    }
}

impl<T> From<&Expression<T>> for Expression<T> {
    fn from(v: &Expression<T>) -> Self {
        v.clone()
    }
}

/// Create a typed literal expression.
pub fn lit<T: SqlParam>(value: T) -> Expression<T> {
    Expression::literal(value)
}

/// Create a typed NULL literal.
pub fn null_lit<T: SqlParam>() -> Expression<T> {
    Expression::null()
}

/// An aliased reference to an entity within a query.
///
/// This is the typed origin of column references and whole-row
/// projections; the default alias is the entity's table name.
pub struct EntityRef<E: Entity> {
    alias: String,
    _marker: PhantomData<fn() -> E>,
}

impl<E: Entity> EntityRef<E> {
    /// Reference the entity under its table name.
    pub fn new() -> Self {
        Self {
            alias: E::TABLE.to_string(),
            _marker: PhantomData,
        }
    }

    /// Reference the entity under an explicit alias.
    pub fn aliased(alias: impl Into<String>) -> Self {
        Self {
            alias: alias.into(),
            _marker: PhantomData,
        }
    }

    /// The alias this reference is bound under.
    pub fn alias(&self) -> &str {
        &self.alias
    }

    /// The table backing the entity.
    pub fn table(&self) -> &'static str {
        E::TABLE
    }

    /// A typed column reference on this entity.
    pub fn col<T: SqlParam>(&self, column: impl Into<String>) -> Expression<T> {
        Expression::from_node(ExprNode::Column {
            alias: self.alias.clone(),
            column: column.into(),
        })
    }

    /// Project the whole entity row.
    pub fn row(&self) -> Expression<E> {
        Expression::from_node(ExprNode::EntityRow {
            alias: self.alias.clone(),
        })
    }
}

impl<E: Entity> Default for EntityRef<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Entity> Clone for EntityRef<E> {
    fn clone(&self) -> Self {
        Self {
            alias: self.alias.clone(),
            _marker: PhantomData,
        }
    }
}

impl<E: Entity> fmt::Debug for EntityRef<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntityRef")
            .field("alias", &self.alias)
            .field("table", &E::TABLE)
            .finish()
    }
}

/// A projection expression with its static type erased, used for
/// multi-column projections and group-by keys.
#[derive(Debug, Clone)]
pub struct ProjectionExpr {
    pub(crate) node: Arc<ExprNode>,
}

impl<T> From<Expression<T>> for ProjectionExpr {
    fn from(expr: Expression<T>) -> Self {
        Self {
            node: expr.node_arc(),
        }
    }
}

impl<T> From<&Expression<T>> for ProjectionExpr {
    fn from(expr: &Expression<T>) -> Self {
        Self {
            node: expr.node_arc(),
        }
    }
}

// ==================== Aggregate functions ====================

fn aggregate<T, U>(
    function: AggregateFunction,
    distinct: bool,
    argument: &Expression<T>,
) -> Expression<U> {
    Expression::from_node(ExprNode::Aggregate {
        function,
        distinct,
        argument: argument.node_arc(),
    })
}

/// MAX over a comparable expression.
pub fn max<T: Comparable>(argument: impl Into<Expression<T>>) -> Expression<T> {
    aggregate(AggregateFunction::Max, false, &argument.into())
}

/// MIN over a comparable expression.
pub fn min<T: Comparable>(argument: impl Into<Expression<T>>) -> Expression<T> {
    aggregate(AggregateFunction::Min, false, &argument.into())
}

/// AVG over a numeric expression; always produces a double.
pub fn avg<T: Numeric>(argument: impl Into<Expression<T>>) -> Expression<f64> {
    aggregate(AggregateFunction::Avg, false, &argument.into())
}

/// SUM over a numeric expression, widened per [`Numeric::Sum`].
pub fn sum<T: Numeric>(argument: impl Into<Expression<T>>) -> Expression<T::Sum> {
    aggregate(AggregateFunction::Sum, false, &argument.into())
}

/// COUNT over any expression, including constants (`count(lit(1))`).
pub fn count<T>(argument: impl Into<Expression<T>>) -> Expression<i64> {
    aggregate(AggregateFunction::Count, false, &argument.into())
}

/// COUNT DISTINCT over any expression.
pub fn count_distinct<T>(argument: impl Into<Expression<T>>) -> Expression<i64> {
    aggregate(AggregateFunction::Count, true, &argument.into())
}

/// GREATEST (ordering maximum) over a comparable expression.
pub fn greatest<T: Comparable>(argument: impl Into<Expression<T>>) -> Expression<T> {
    aggregate(AggregateFunction::Greatest, false, &argument.into())
}

/// LEAST (ordering minimum) over a comparable expression.
pub fn least<T: Comparable>(argument: impl Into<Expression<T>>) -> Expression<T> {
    aggregate(AggregateFunction::Least, false, &argument.into())
}

// ==================== Case expressions ====================

/// Builder for searched case expressions.
///
/// Branch order is evaluation order in the target engine; the else branch
/// is mandatory, so [`CaseWhen::otherwise`] is the only way to finish.
pub struct CaseWhen<T> {
    branches: Vec<(Arc<PredicateNode>, Arc<ExprNode>)>,
    _marker: PhantomData<fn() -> T>,
}

/// Start a case expression with its first branch.
pub fn case_when<T>(condition: Predicate, result: impl Into<Expression<T>>) -> CaseWhen<T> {
    CaseWhen {
        branches: vec![(condition.node_arc(), result.into().node_arc())],
        _marker: PhantomData,
    }
}

impl<T> CaseWhen<T> {
    /// Append a further branch.
    pub fn when(mut self, condition: Predicate, result: impl Into<Expression<T>>) -> Self {
        self.branches
            .push((condition.node_arc(), result.into().node_arc()));
        self
    }

    /// Finish with the mandatory else branch.
    pub fn otherwise(self, otherwise: impl Into<Expression<T>>) -> Expression<T> {
        Expression::from_node(ExprNode::Case {
            branches: self.branches,
            otherwise: otherwise.into().node_arc(),
        })
    }
}

/// Build a case expression from a branch collection.
///
/// Unlike [`case_when`], the branch list arrives at once and may be empty,
/// which is rejected here rather than at compile time.
pub fn case<T>(
    branches: Vec<(Predicate, Expression<T>)>,
    otherwise: Expression<T>,
) -> Result<Expression<T>> {
    if branches.is_empty() {
        return Err(Error::specification(
            SpecificationErrorKind::EmptyCaseBranches,
            "case expression requires at least one branch",
        ));
    }
    Ok(Expression::from_node(ExprNode::Case {
        branches: branches
            .into_iter()
            .map(|(p, e)| (p.node_arc(), e.node_arc()))
            .collect(),
        otherwise: otherwise.node_arc(),
    }))
}
