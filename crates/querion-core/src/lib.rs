//! Core types for Querion: the criteria representation and reference engine.
//!
//! This crate is the *target* side of the query pipeline:
//!
//! - [`Value`], [`SqlType`], and [`TypeInfo`] map Rust values into the
//!   dynamically-typed criteria layer
//! - [`Entity`] names the table a queryable marker type maps to
//! - [`criteria`] holds the compiled statement representation and the
//!   [`CriteriaBuilder`] factory the compiler in `querion-query` is written
//!   against
//! - [`engine`] executes compiled statements against in-memory tables
//!
//! Query construction lives in `querion-query`; most users depend on the
//! `querion` facade crate.

pub mod criteria;
pub mod engine;
pub mod entity;
pub mod error;
pub mod row;
pub mod types;
pub mod value;

pub use criteria::{
    AggregateFunction, Assignment, CaseBranch, CaseExprBuilder, ComparisonOp, CriteriaBuilder,
    CriteriaExpr, CriteriaJoin, CriteriaOrder, CriteriaPredicate, CriteriaProjection,
    DeleteCriteria, JoinKind, SelectCriteria, SortDirection, SourceBinding, UpdateCriteria,
};
pub use engine::{Database, Table};
pub use entity::Entity;
pub use error::{
    Error, ExecutionError, ExecutionErrorKind, ResolutionError, Result, SpecificationError,
    SpecificationErrorKind,
};
pub use row::{ColumnInfo, Row};
pub use types::{Comparable, Numeric, SqlParam, SqlType, TypeInfo};
pub use value::Value;
