//! The criteria representation: the target of query compilation.
//!
//! The compiler in `querion-query` consumes this module as a black box: it
//! calls [`CriteriaBuilder`] factory operations and assembles the statement
//! structs, never inspecting what it has built. The engine in
//! [`engine`](crate::engine) is the only consumer of the node internals.
//!
//! All node types derive `PartialEq`, so two compilations of the same
//! specification can be compared structurally.

use crate::types::SqlType;
use crate::value::Value;

/// A fully resolved source binding: an alias attached to a table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceBinding {
    /// The alias the source is bound under
    pub alias: String,
    /// The table backing the source
    pub table: String,
}

impl SourceBinding {
    /// Create a new binding.
    pub fn new(alias: impl Into<String>, table: impl Into<String>) -> Self {
        Self {
            alias: alias.into(),
            table: table.into(),
        }
    }
}

/// Comparison operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComparisonOp {
    /// Equal (=)
    Eq,
    /// Not equal (<>)
    Ne,
    /// Less than (<)
    Lt,
    /// Less than or equal (<=)
    Le,
    /// Greater than (>)
    Gt,
    /// Greater than or equal (>=)
    Ge,
}

impl ComparisonOp {
    /// Get the SQL symbol for this operator.
    pub const fn as_str(self) -> &'static str {
        match self {
            ComparisonOp::Eq => "=",
            ComparisonOp::Ne => "<>",
            ComparisonOp::Lt => "<",
            ComparisonOp::Le => "<=",
            ComparisonOp::Gt => ">",
            ComparisonOp::Ge => ">=",
        }
    }
}

/// Aggregate functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregateFunction {
    Max,
    Min,
    Avg,
    Sum,
    Count,
    Greatest,
    Least,
}

impl AggregateFunction {
    /// Get the SQL name of this function.
    pub const fn as_str(self) -> &'static str {
        match self {
            AggregateFunction::Max => "max",
            AggregateFunction::Min => "min",
            AggregateFunction::Avg => "avg",
            AggregateFunction::Sum => "sum",
            AggregateFunction::Count => "count",
            AggregateFunction::Greatest => "greatest",
            AggregateFunction::Least => "least",
        }
    }
}

/// A compiled criteria expression.
#[derive(Debug, Clone, PartialEq)]
pub enum CriteriaExpr {
    /// Constant value
    Constant(Value),

    /// NULL constant carrying its declared type token
    TypedNull(SqlType),

    /// Attribute projection on a bound source
    Path {
        /// Alias of the owning source
        alias: String,
        /// Attribute name
        column: String,
    },

    /// Whole-row projection of a bound source
    SourceRow {
        /// Alias of the owning source
        alias: String,
    },

    /// Aggregate function over one argument expression
    Aggregate {
        function: AggregateFunction,
        distinct: bool,
        argument: Box<CriteriaExpr>,
    },

    /// Searched case expression; branches evaluate in declared order
    Case {
        branches: Vec<CaseBranch>,
        otherwise: Box<CriteriaExpr>,
    },

    /// Cast to an explicit type
    Cast {
        target: SqlType,
        argument: Box<CriteriaExpr>,
    },

    /// Scalar subquery
    Scalar(Box<SelectCriteria>),
}

/// One (condition, result) branch of a case expression.
#[derive(Debug, Clone, PartialEq)]
pub struct CaseBranch {
    /// Branch condition
    pub condition: CriteriaPredicate,
    /// Result when the condition holds
    pub result: CriteriaExpr,
}

/// A compiled criteria predicate.
#[derive(Debug, Clone, PartialEq)]
pub enum CriteriaPredicate {
    /// N-ary conjunction; operands evaluate in declared order
    And(Vec<CriteriaPredicate>),

    /// N-ary disjunction; operands evaluate in declared order
    Or(Vec<CriteriaPredicate>),

    /// Negation
    Not(Box<CriteriaPredicate>),

    /// Binary comparison
    Comparison {
        op: ComparisonOp,
        lhs: Box<CriteriaExpr>,
        rhs: Box<CriteriaExpr>,
    },

    /// Inclusive range check
    Between {
        subject: Box<CriteriaExpr>,
        lower: Box<CriteriaExpr>,
        upper: Box<CriteriaExpr>,
    },

    /// Membership in a finite alternative list
    In {
        subject: Box<CriteriaExpr>,
        alternatives: Vec<CriteriaExpr>,
    },

    /// Boolean truth check
    Truth {
        subject: Box<CriteriaExpr>,
        expected: bool,
    },

    /// NULL check
    IsNull {
        subject: Box<CriteriaExpr>,
        negated: bool,
    },

    /// SQL LIKE pattern match
    Like {
        subject: Box<CriteriaExpr>,
        pattern: String,
        negated: bool,
    },

    /// Correlated or uncorrelated existence check
    Exists {
        subquery: Box<SelectCriteria>,
        negated: bool,
    },
}

/// Join kinds supported by the criteria layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinKind {
    Inner,
    Left,
    Cross,
}

impl JoinKind {
    /// Get the SQL keyword for this join kind.
    pub const fn as_str(self) -> &'static str {
        match self {
            JoinKind::Inner => "INNER JOIN",
            JoinKind::Left => "LEFT JOIN",
            JoinKind::Cross => "CROSS JOIN",
        }
    }
}

/// A compiled join clause.
#[derive(Debug, Clone, PartialEq)]
pub struct CriteriaJoin {
    /// Kind of join
    pub kind: JoinKind,
    /// The joined source
    pub source: SourceBinding,
    /// ON condition; `None` for cross joins
    pub condition: Option<CriteriaPredicate>,
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

/// One compiled ordering term.
#[derive(Debug, Clone, PartialEq)]
pub struct CriteriaOrder {
    /// Sort key expression
    pub expr: CriteriaExpr,
    /// Sort direction
    pub direction: SortDirection,
}

/// The projection of a select statement.
#[derive(Debug, Clone, PartialEq)]
pub enum CriteriaProjection {
    /// A single expression (possibly a whole-row projection)
    Expr(CriteriaExpr),
    /// An ordered multi-column tuple
    Tuple(Vec<CriteriaExpr>),
}

/// A compiled select statement.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectCriteria {
    /// What the statement projects
    pub projection: CriteriaProjection,
    /// Root sources, in declaration order
    pub roots: Vec<SourceBinding>,
    /// Explicit joins, in declaration order
    pub joins: Vec<CriteriaJoin>,
    /// WHERE restriction
    pub restriction: Option<CriteriaPredicate>,
    /// GROUP BY keys, in declaration order
    pub grouping: Vec<CriteriaExpr>,
    /// ORDER BY terms, in declaration order
    pub ordering: Vec<CriteriaOrder>,
    /// Whether duplicate result rows are eliminated
    pub distinct: bool,
}

impl SelectCriteria {
    /// Create a select statement projecting `projection` from `root`.
    pub fn new(projection: CriteriaProjection, root: SourceBinding) -> Self {
        Self {
            projection,
            roots: vec![root],
            joins: Vec::new(),
            restriction: None,
            grouping: Vec::new(),
            ordering: Vec::new(),
            distinct: false,
        }
    }
}

/// One SET clause of an update statement.
#[derive(Debug, Clone, PartialEq)]
pub struct Assignment {
    /// Target column
    pub column: String,
    /// Assigned value expression
    pub value: CriteriaExpr,
}

/// A compiled update statement.
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateCriteria {
    /// The mutated source
    pub target: SourceBinding,
    /// SET clauses, in declaration order
    pub assignments: Vec<Assignment>,
    /// WHERE restriction
    pub restriction: Option<CriteriaPredicate>,
}

/// A compiled delete statement.
#[derive(Debug, Clone, PartialEq)]
pub struct DeleteCriteria {
    /// The mutated source
    pub target: SourceBinding,
    /// WHERE restriction
    pub restriction: Option<CriteriaPredicate>,
}

/// Factory for criteria nodes.
///
/// This is the operation set the compiler is written against; everything a
/// lowering rule emits goes through one of these constructors.
#[derive(Debug, Clone, Copy, Default)]
pub struct CriteriaBuilder;

impl CriteriaBuilder {
    /// Create a new builder.
    pub fn new() -> Self {
        Self
    }

    // ==================== Sources ====================

    /// Bind a table under an alias.
    pub fn bind(&self, alias: impl Into<String>, table: impl Into<String>) -> SourceBinding {
        SourceBinding::new(alias, table)
    }

    // ==================== Values ====================

    /// Create a constant expression.
    pub fn literal(&self, value: Value) -> CriteriaExpr {
        CriteriaExpr::Constant(value)
    }

    /// Create a NULL constant carrying an explicit type token.
    pub fn null_literal(&self, ty: SqlType) -> CriteriaExpr {
        CriteriaExpr::TypedNull(ty)
    }

    /// Project an attribute of a bound source.
    pub fn path(&self, alias: impl Into<String>, column: impl Into<String>) -> CriteriaExpr {
        CriteriaExpr::Path {
            alias: alias.into(),
            column: column.into(),
        }
    }

    /// Project the whole row of a bound source.
    pub fn source_row(&self, alias: impl Into<String>) -> CriteriaExpr {
        CriteriaExpr::SourceRow {
            alias: alias.into(),
        }
    }

    // ==================== Aggregates ====================

    /// MAX over an argument.
    pub fn max(&self, argument: CriteriaExpr) -> CriteriaExpr {
        self.aggregate(AggregateFunction::Max, false, argument)
    }

    /// MIN over an argument.
    pub fn min(&self, argument: CriteriaExpr) -> CriteriaExpr {
        self.aggregate(AggregateFunction::Min, false, argument)
    }

    /// AVG over an argument.
    pub fn avg(&self, argument: CriteriaExpr) -> CriteriaExpr {
        self.aggregate(AggregateFunction::Avg, false, argument)
    }

    /// SUM over an argument.
    pub fn sum(&self, argument: CriteriaExpr) -> CriteriaExpr {
        self.aggregate(AggregateFunction::Sum, false, argument)
    }

    /// COUNT over an argument.
    pub fn count(&self, argument: CriteriaExpr) -> CriteriaExpr {
        self.aggregate(AggregateFunction::Count, false, argument)
    }

    /// COUNT DISTINCT over an argument.
    pub fn count_distinct(&self, argument: CriteriaExpr) -> CriteriaExpr {
        self.aggregate(AggregateFunction::Count, true, argument)
    }

    /// GREATEST (ordering maximum) over an argument.
    pub fn greatest(&self, argument: CriteriaExpr) -> CriteriaExpr {
        self.aggregate(AggregateFunction::Greatest, false, argument)
    }

    /// LEAST (ordering minimum) over an argument.
    pub fn least(&self, argument: CriteriaExpr) -> CriteriaExpr {
        self.aggregate(AggregateFunction::Least, false, argument)
    }

    fn aggregate(
        &self,
        function: AggregateFunction,
        distinct: bool,
        argument: CriteriaExpr,
    ) -> CriteriaExpr {
        CriteriaExpr::Aggregate {
            function,
            distinct,
            argument: Box::new(argument),
        }
    }

    // ==================== Compound expressions ====================

    /// Start a searched case expression.
    pub fn case(&self) -> CaseExprBuilder {
        CaseExprBuilder {
            branches: Vec::new(),
        }
    }

    /// Cast an expression to an explicit type.
    pub fn cast(&self, target: SqlType, argument: CriteriaExpr) -> CriteriaExpr {
        CriteriaExpr::Cast {
            target,
            argument: Box::new(argument),
        }
    }

    /// Embed a select statement as a scalar subquery.
    pub fn scalar_subquery(&self, query: SelectCriteria) -> CriteriaExpr {
        CriteriaExpr::Scalar(Box::new(query))
    }

    // ==================== Predicates ====================

    /// Build a binary comparison.
    pub fn comparison(
        &self,
        op: ComparisonOp,
        lhs: CriteriaExpr,
        rhs: CriteriaExpr,
    ) -> CriteriaPredicate {
        CriteriaPredicate::Comparison {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        }
    }

    /// Conjunction of all operands.
    pub fn and(&self, operands: Vec<CriteriaPredicate>) -> CriteriaPredicate {
        CriteriaPredicate::And(operands)
    }

    /// Disjunction of all operands.
    pub fn or(&self, operands: Vec<CriteriaPredicate>) -> CriteriaPredicate {
        CriteriaPredicate::Or(operands)
    }

    /// Negate a predicate.
    pub fn not(&self, operand: CriteriaPredicate) -> CriteriaPredicate {
        CriteriaPredicate::Not(Box::new(operand))
    }

    /// Inclusive range check.
    pub fn between(
        &self,
        subject: CriteriaExpr,
        lower: CriteriaExpr,
        upper: CriteriaExpr,
    ) -> CriteriaPredicate {
        CriteriaPredicate::Between {
            subject: Box::new(subject),
            lower: Box::new(lower),
            upper: Box::new(upper),
        }
    }

    /// Membership in a finite alternative list.
    pub fn in_list(
        &self,
        subject: CriteriaExpr,
        alternatives: Vec<CriteriaExpr>,
    ) -> CriteriaPredicate {
        CriteriaPredicate::In {
            subject: Box::new(subject),
            alternatives,
        }
    }

    /// Boolean IS TRUE check.
    pub fn is_true(&self, subject: CriteriaExpr) -> CriteriaPredicate {
        CriteriaPredicate::Truth {
            subject: Box::new(subject),
            expected: true,
        }
    }

    /// Boolean IS FALSE check.
    pub fn is_false(&self, subject: CriteriaExpr) -> CriteriaPredicate {
        CriteriaPredicate::Truth {
            subject: Box::new(subject),
            expected: false,
        }
    }

    /// IS NULL check.
    pub fn is_null(&self, subject: CriteriaExpr) -> CriteriaPredicate {
        CriteriaPredicate::IsNull {
            subject: Box::new(subject),
            negated: false,
        }
    }

    /// IS NOT NULL check.
    pub fn is_not_null(&self, subject: CriteriaExpr) -> CriteriaPredicate {
        CriteriaPredicate::IsNull {
            subject: Box::new(subject),
            negated: true,
        }
    }

    /// LIKE pattern match.
    pub fn like(&self, subject: CriteriaExpr, pattern: impl Into<String>) -> CriteriaPredicate {
        CriteriaPredicate::Like {
            subject: Box::new(subject),
            pattern: pattern.into(),
            negated: false,
        }
    }

    /// NOT LIKE pattern match.
    pub fn not_like(&self, subject: CriteriaExpr, pattern: impl Into<String>) -> CriteriaPredicate {
        CriteriaPredicate::Like {
            subject: Box::new(subject),
            pattern: pattern.into(),
            negated: true,
        }
    }

    /// Existence check over a subquery.
    pub fn exists(&self, subquery: SelectCriteria) -> CriteriaPredicate {
        CriteriaPredicate::Exists {
            subquery: Box::new(subquery),
            negated: false,
        }
    }

    /// Non-existence check over a subquery.
    pub fn not_exists(&self, subquery: SelectCriteria) -> CriteriaPredicate {
        CriteriaPredicate::Exists {
            subquery: Box::new(subquery),
            negated: true,
        }
    }

    // ==================== Ordering ====================

    /// Ascending sort term.
    pub fn asc(&self, expr: CriteriaExpr) -> CriteriaOrder {
        CriteriaOrder {
            expr,
            direction: SortDirection::Ascending,
        }
    }

    /// Descending sort term.
    pub fn desc(&self, expr: CriteriaExpr) -> CriteriaOrder {
        CriteriaOrder {
            expr,
            direction: SortDirection::Descending,
        }
    }
}

/// Builder for searched case expressions; branches keep insertion order.
#[derive(Debug, Clone)]
pub struct CaseExprBuilder {
    branches: Vec<CaseBranch>,
}

impl CaseExprBuilder {
    /// Append a (condition, result) branch.
    pub fn when(mut self, condition: CriteriaPredicate, result: CriteriaExpr) -> Self {
        self.branches.push(CaseBranch { condition, result });
        self
    }

    /// Close the expression with its mandatory else branch.
    pub fn otherwise(self, otherwise: CriteriaExpr) -> CriteriaExpr {
        CriteriaExpr::Case {
            branches: self.branches,
            otherwise: Box::new(otherwise),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_case_builder_preserves_branch_order() {
        let builder = CriteriaBuilder::new();
        let expr = builder
            .case()
            .when(
                builder.is_true(builder.path("t", "flag")),
                builder.literal(Value::Int(1)),
            )
            .when(
                builder.is_false(builder.path("t", "flag")),
                builder.literal(Value::Int(2)),
            )
            .otherwise(builder.null_literal(SqlType::Integer));

        match expr {
            CriteriaExpr::Case { branches, otherwise } => {
                assert_eq!(branches.len(), 2);
                assert_eq!(branches[0].result, CriteriaExpr::Constant(Value::Int(1)));
                assert_eq!(branches[1].result, CriteriaExpr::Constant(Value::Int(2)));
                assert_eq!(*otherwise, CriteriaExpr::TypedNull(SqlType::Integer));
            }
            other => panic!("expected case expression, got {other:?}"),
        }
    }

    #[test]
    fn test_count_distinct_sets_flag() {
        let builder = CriteriaBuilder::new();
        let expr = builder.count_distinct(builder.path("t", "name"));
        match expr {
            CriteriaExpr::Aggregate {
                function, distinct, ..
            } => {
                assert_eq!(function, AggregateFunction::Count);
                assert!(distinct);
            }
            other => panic!("expected aggregate, got {other:?}"),
        }
    }
}
