//! Querion — typed criteria query construction for Rust.
//!
//! Querion builds queries as immutable, statically-typed specification
//! trees and compiles them into a criteria representation that an engine
//! executes:
//!
//! - Specifications are **persistent**: nodes are shared `Arc` values with
//!   no identity beyond their fields, freely reused across queries.
//! - Typing is **static**: comparisons require both sides to share a
//!   comparable type, aggregates carry numeric/comparable bounds, and
//!   boolean truth checks only accept boolean expressions.
//! - Compilation is **pure**: the same specification always lowers to a
//!   structurally equal criteria statement, and correlated subqueries
//!   resolve outer aliases through a parent-linked scope chain.
//!
//! # Quick Start
//!
//! ```ignore
//! use querion::prelude::*;
//!
//! entity!(struct LineItem => "line_item");
//!
//! let li = EntityRef::<LineItem>::new();
//! let spec = select(max(li.col::<i32>("price")))
//!     .from(&li)
//!     .filter(li.col::<String>("product_name").like("test%"));
//!
//! let compiler = CriteriaCompiler::new();
//! let criteria = compiler.compile_single(&spec)?;
//! let row = db.execute_single(&criteria)?;
//! ```
//!
//! The `querion-core` crate holds the criteria representation and the
//! in-memory reference engine; `querion-query` holds the specification
//! trees and the compiler. This crate re-exports both.

pub use querion_core::{
    entity, AggregateFunction, Assignment, CaseBranch, ColumnInfo, Comparable, ComparisonOp,
    CriteriaBuilder, CriteriaExpr, CriteriaJoin, CriteriaOrder, CriteriaPredicate,
    CriteriaProjection, Database, DeleteCriteria, Entity, Error, ExecutionError,
    ExecutionErrorKind, JoinKind, Numeric, ResolutionError, Result, Row, SelectCriteria,
    SortDirection, SourceBinding, SpecificationError, SpecificationErrorKind, SqlParam, SqlType,
    Table, TypeInfo, UpdateCriteria, Value,
};

pub use querion_query::{
    and, avg, case, case_when, count, count_distinct, delete, exists, greatest, least, lit, max,
    min, not, not_exists, null_lit, or, select, select_multi, sum, update, BoundSource, CaseWhen,
    CriteriaCompiler, DeleteSpec, EntityRef, ExprNode, Expression, FromClause, Froms, JoinClause,
    OrderSpec, Predicate, PredicateNode, ProjectionExpr, ProjectionSpec, QuerySpec, SelectSpec,
    StatementContext, UpdateSpec,
};

/// Everything needed to build and run queries.
pub mod prelude {
    pub use querion_core::{
        entity, CriteriaBuilder, Database, Entity, Error, Result, Row, SqlType, Value,
    };
    pub use querion_query::{
        and, avg, case, case_when, count, count_distinct, delete, exists, greatest, least, lit,
        max, min, not, not_exists, null_lit, or, select, select_multi, sum, update,
        CriteriaCompiler, EntityRef, Expression, Predicate, SelectSpec,
    };
}
