//! Typed query construction for Querion.
//!
//! `querion-query` is the **specification layer**: immutable, typed trees
//! describing a query, and the compiler that lowers them into the criteria
//! representation from `querion-core`.
//!
//! # Role In The Architecture
//!
//! - **Expression DSL**: [`Expression`] handles over a closed node union,
//!   built from [`EntityRef`] columns, literals, aggregates, and case
//!   expressions.
//! - **Predicate DSL**: [`Predicate`] combinators layered on expressions.
//! - **Specifications**: [`select`]/[`select_multi`], [`update`], and
//!   [`delete`] assemble the unit the compiler consumes.
//! - **Compiler**: [`CriteriaCompiler`] recursively lowers a specification
//!   into an executable criteria statement, resolving aliases through
//!   [`Froms`] scopes.
//!
//! # Example
//!
//! ```ignore
//! use querion_query::{select, max, EntityRef, CriteriaCompiler};
//!
//! entity!(struct LineItem => "line_item");
//!
//! let li = EntityRef::<LineItem>::new();
//! let spec = select(max(li.col::<i32>("price")))
//!     .from(&li)
//!     .filter(li.col::<bool>("settled").is_false());
//!
//! let criteria = CriteriaCompiler::new().compile_single(&spec)?;
//! // hand `criteria` to the engine
//! ```

pub mod compile;
pub mod expr;
pub mod froms;
pub mod predicate;
pub mod query;

pub use compile::CriteriaCompiler;
pub use expr::{
    avg, case, case_when, count, count_distinct, greatest, least, lit, max, min, null_lit, sum,
    CaseWhen, EntityRef, ExprNode, Expression, ProjectionExpr,
};
pub use froms::{BoundSource, Froms};
pub use predicate::{and, exists, not, not_exists, or, Predicate, PredicateNode};
pub use query::{
    delete, select, select_multi, update, DeleteSpec, FromClause, JoinClause, OrderSpec,
    ProjectionSpec, QuerySpec, SelectSpec, StatementContext, UpdateSpec,
};
