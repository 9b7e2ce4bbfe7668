//! The criteria compiler.
//!
//! One recursive lowering pass walks a specification tree post-order —
//! children always compile before their parent — and emits the target
//! criteria through the [`CriteriaBuilder`] factory. Each query level gets
//! its own [`Froms`] scope; a subquery's scope is chained to the scope of
//! the enclosing query, so correlated references resolve outward exactly as
//! they will evaluate.
//!
//! Lowering is pure: no state survives a call, and the same specification
//! under an equivalent scope always produces a structurally equal result.

use crate::expr::ExprNode;
use crate::froms::Froms;
use crate::predicate::PredicateNode;
use crate::query::{
    DeleteSpec, ProjectionSpec, QuerySpec, SelectSpec, StatementContext, UpdateSpec,
};
use querion_core::{
    AggregateFunction, Assignment, CriteriaBuilder, CriteriaExpr, CriteriaJoin, CriteriaOrder,
    CriteriaPredicate, CriteriaProjection, DeleteCriteria, Entity, Error, Result, SelectCriteria,
    SortDirection, SpecificationErrorKind, UpdateCriteria,
};
use std::sync::Arc;

/// One compilation scope: the alias registry of the current query level
/// plus the active mutation context.
struct Scope {
    froms: Arc<Froms>,
    context: StatementContext,
}

/// Compiles query specifications into criteria statements.
///
/// The compiler is stateless; one instance can compile any number of
/// specifications, concurrently if desired.
#[derive(Debug, Clone, Copy, Default)]
pub struct CriteriaCompiler {
    builder: CriteriaBuilder,
}

impl CriteriaCompiler {
    /// Create a new compiler.
    pub fn new() -> Self {
        Self {
            builder: CriteriaBuilder::new(),
        }
    }

    /// Compile a select specification for single-result execution.
    ///
    /// Shares the lowering algorithm with [`compile_list`](Self::compile_list);
    /// the single/list distinction only matters to the executing engine.
    #[tracing::instrument(level = "debug", skip_all)]
    pub fn compile_single<T>(&self, spec: &SelectSpec<T>) -> Result<SelectCriteria> {
        self.lower_query(spec.query(), None)
    }

    /// Compile a select specification for list-result execution.
    #[tracing::instrument(level = "debug", skip_all)]
    pub fn compile_list<T>(&self, spec: &SelectSpec<T>) -> Result<SelectCriteria> {
        self.lower_query(spec.query(), None)
    }

    /// Compile an update specification.
    #[tracing::instrument(level = "debug", skip_all)]
    pub fn compile_update<E: Entity>(&self, spec: &UpdateSpec<E>) -> Result<UpdateCriteria> {
        if spec.assignments.is_empty() {
            return Err(Error::specification(
                SpecificationErrorKind::EmptyAssignments,
                "update statement has no assignments",
            ));
        }

        let scope = self.statement_scope(&spec.alias, E::TABLE, StatementContext::Update)?;
        let assignments = spec
            .assignments
            .iter()
            .map(|(column, value)| {
                Ok(Assignment {
                    column: column.clone(),
                    value: self.lower_expr(value, &scope)?,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        let restriction = spec
            .predicate
            .as_deref()
            .map(|p| self.lower_predicate(p, &scope))
            .transpose()?;

        Ok(UpdateCriteria {
            target: self.builder.bind(&spec.alias, E::TABLE),
            assignments,
            restriction,
        })
    }

    /// Compile a delete specification.
    #[tracing::instrument(level = "debug", skip_all)]
    pub fn compile_delete<E: Entity>(&self, spec: &DeleteSpec<E>) -> Result<DeleteCriteria> {
        let scope = self.statement_scope(&spec.alias, E::TABLE, StatementContext::Delete)?;
        let restriction = spec
            .predicate
            .as_deref()
            .map(|p| self.lower_predicate(p, &scope))
            .transpose()?;

        Ok(DeleteCriteria {
            target: self.builder.bind(&spec.alias, E::TABLE),
            restriction,
        })
    }

    fn statement_scope(
        &self,
        alias: &str,
        table: &str,
        context: StatementContext,
    ) -> Result<Scope> {
        let mut froms = Froms::new();
        froms.bind(alias, table)?;
        Ok(Scope {
            froms: Arc::new(froms),
            context,
        })
    }

    // ==================== Query lowering ====================

    /// Lower one query level. Subqueries re-enter here with the enclosing
    /// scope as `parent`.
    fn lower_query(&self, q: &QuerySpec, parent: Option<Arc<Froms>>) -> Result<SelectCriteria> {
        if q.froms.is_empty() {
            return Err(Error::specification(
                SpecificationErrorKind::MissingFrom,
                "query specification has no from clause",
            ));
        }

        let mut froms = match parent {
            Some(parent) => Froms::child_of(parent),
            None => Froms::new(),
        };
        for clause in &q.froms {
            froms.bind(&clause.alias, &clause.table)?;
        }
        for join in &q.joins {
            froms.bind(&join.alias, &join.table)?;
        }
        let scope = Scope {
            froms: Arc::new(froms),
            context: StatementContext::Select,
        };

        let projection = match &q.projection {
            ProjectionSpec::Single(expr) => {
                CriteriaProjection::Expr(self.lower_expr(expr, &scope)?)
            }
            ProjectionSpec::Multi(exprs) => CriteriaProjection::Tuple(
                exprs
                    .iter()
                    .map(|e| self.lower_expr(e, &scope))
                    .collect::<Result<Vec<_>>>()?,
            ),
        };

        let roots = q
            .froms
            .iter()
            .map(|clause| self.builder.bind(&clause.alias, &clause.table))
            .collect();

        let joins = q
            .joins
            .iter()
            .map(|join| {
                Ok(CriteriaJoin {
                    kind: join.kind,
                    source: self.builder.bind(&join.alias, &join.table),
                    condition: join
                        .on
                        .as_deref()
                        .map(|p| self.lower_predicate(p, &scope))
                        .transpose()?,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let restriction = q
            .predicate
            .as_deref()
            .map(|p| self.lower_predicate(p, &scope))
            .transpose()?;

        let grouping = q
            .group_by
            .iter()
            .map(|g| self.lower_expr(g, &scope))
            .collect::<Result<Vec<_>>>()?;

        let ordering = q
            .order_by
            .iter()
            .map(|order| {
                let expr = self.lower_expr(&order.expr, &scope)?;
                Ok(match order.direction {
                    SortDirection::Ascending => self.builder.asc(expr),
                    SortDirection::Descending => self.builder.desc(expr),
                })
            })
            .collect::<Result<Vec<CriteriaOrder>>>()?;

        Ok(SelectCriteria {
            projection,
            roots,
            joins,
            restriction,
            grouping,
            ordering,
            distinct: q.distinct,
        })
    }

    // ==================== Expression lowering ====================

    fn lower_expr(&self, node: &ExprNode, scope: &Scope) -> Result<CriteriaExpr> {
        match node {
            ExprNode::Literal(value) => Ok(self.builder.literal(value.clone())),

            ExprNode::TypedNull(ty) => Ok(self.builder.null_literal(*ty)),

            ExprNode::Column { alias, column } => {
                let bound = scope.froms.resolve(alias)?;
                Ok(self.builder.path(&bound.alias, column))
            }

            ExprNode::EntityRow { alias } => {
                if scope.context != StatementContext::Select {
                    return Err(Error::specification(
                        SpecificationErrorKind::UnsupportedInContext,
                        format!("whole-row projection of `{alias}` requires a select context"),
                    ));
                }
                let bound = scope.froms.resolve(alias)?;
                Ok(self.builder.source_row(&bound.alias))
            }

            ExprNode::Aggregate {
                function,
                distinct,
                argument,
            } => {
                let argument = self.lower_expr(argument, scope)?;
                Ok(match function {
                    AggregateFunction::Max => self.builder.max(argument),
                    AggregateFunction::Min => self.builder.min(argument),
                    AggregateFunction::Avg => self.builder.avg(argument),
                    AggregateFunction::Sum => self.builder.sum(argument),
                    AggregateFunction::Greatest => self.builder.greatest(argument),
                    AggregateFunction::Least => self.builder.least(argument),
                    AggregateFunction::Count => {
                        if *distinct {
                            self.builder.count_distinct(argument)
                        } else {
                            self.builder.count(argument)
                        }
                    }
                })
            }

            ExprNode::Case {
                branches,
                otherwise,
            } => {
                if branches.is_empty() {
                    return Err(Error::specification(
                        SpecificationErrorKind::EmptyCaseBranches,
                        "case expression has no branches",
                    ));
                }
                let mut case = self.builder.case();
                for (condition, result) in branches {
                    case = case.when(
                        self.lower_predicate(condition, scope)?,
                        self.lower_expr(result, scope)?,
                    );
                }
                Ok(case.otherwise(self.lower_expr(otherwise, scope)?))
            }

            ExprNode::Cast { target, argument } => Ok(self
                .builder
                .cast(*target, self.lower_expr(argument, scope)?)),

            ExprNode::Subquery(query) => {
                let compiled = self.lower_query(query, Some(Arc::clone(&scope.froms)))?;
                Ok(self.builder.scalar_subquery(compiled))
            }
        }
    }

    // ==================== Predicate lowering ====================

    fn lower_predicate(&self, node: &PredicateNode, scope: &Scope) -> Result<CriteriaPredicate> {
        match node {
            PredicateNode::Not(inner) => {
                Ok(self.builder.not(self.lower_predicate(inner, scope)?))
            }

            PredicateNode::And(operands) => {
                if operands.is_empty() {
                    return Err(empty_operands("and"));
                }
                Ok(self.builder.and(self.lower_operands(operands, scope)?))
            }

            PredicateNode::Or(operands) => {
                if operands.is_empty() {
                    return Err(empty_operands("or"));
                }
                Ok(self.builder.or(self.lower_operands(operands, scope)?))
            }

            PredicateNode::Compare { op, lhs, rhs } => Ok(self.builder.comparison(
                *op,
                self.lower_expr(lhs, scope)?,
                self.lower_expr(rhs, scope)?,
            )),

            PredicateNode::Between {
                subject,
                lower,
                upper,
            } => Ok(self.builder.between(
                self.lower_expr(subject, scope)?,
                self.lower_expr(lower, scope)?,
                self.lower_expr(upper, scope)?,
            )),

            PredicateNode::InList {
                subject,
                alternatives,
            } => {
                let subject = self.lower_expr(subject, scope)?;
                let alternatives = alternatives
                    .iter()
                    .map(|a| self.lower_expr(a, scope))
                    .collect::<Result<Vec<_>>>()?;
                Ok(self.builder.in_list(subject, alternatives))
            }

            PredicateNode::Truth { subject, expected } => {
                let subject = self.lower_expr(subject, scope)?;
                Ok(if *expected {
                    self.builder.is_true(subject)
                } else {
                    self.builder.is_false(subject)
                })
            }

            PredicateNode::NullCheck { subject, negated } => {
                let subject = self.lower_expr(subject, scope)?;
                Ok(if *negated {
                    self.builder.is_not_null(subject)
                } else {
                    self.builder.is_null(subject)
                })
            }

            PredicateNode::Match {
                subject,
                pattern,
                negated,
            } => {
                let subject = self.lower_expr(subject, scope)?;
                Ok(if *negated {
                    self.builder.not_like(subject, pattern)
                } else {
                    self.builder.like(subject, pattern)
                })
            }

            PredicateNode::Exists { query, negated } => {
                let compiled = self.lower_query(query, Some(Arc::clone(&scope.froms)))?;
                Ok(if *negated {
                    self.builder.not_exists(compiled)
                } else {
                    self.builder.exists(compiled)
                })
            }
        }
    }

    fn lower_operands(
        &self,
        operands: &[Arc<PredicateNode>],
        scope: &Scope,
    ) -> Result<Vec<CriteriaPredicate>> {
        operands
            .iter()
            .map(|p| self.lower_predicate(p, scope))
            .collect()
    }
}

fn empty_operands(combinator: &str) -> Error {
    Error::specification(
        SpecificationErrorKind::EmptyOperands,
        format!("{combinator}() compiled with no operands"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::{count, lit, max, null_lit, EntityRef, Expression};
    use crate::predicate::exists;
    use crate::query::{delete, select, update};
    use querion_core::entity;

    entity!(struct Invoice => "invoice");
    entity!(struct LineItem => "line_item");

    #[test]
    fn test_column_lowering_resolves_the_alias() {
        let li = EntityRef::<LineItem>::aliased("li");
        let spec = select(li.col::<i32>("price")).from(&li);
        let criteria = CriteriaCompiler::new().compile_list(&spec).unwrap();
        assert_eq!(
            criteria.projection,
            CriteriaProjection::Expr(CriteriaExpr::Path {
                alias: "li".to_string(),
                column: "price".to_string(),
            })
        );
        assert_eq!(criteria.roots[0].table, "line_item");
    }

    #[test]
    fn test_unresolvable_alias_fails_compilation() {
        let li = EntityRef::<LineItem>::aliased("li");
        let stray = EntityRef::<Invoice>::aliased("elsewhere");
        let spec = select(stray.col::<i64>("id")).from(&li);
        let err = CriteriaCompiler::new().compile_list(&spec).unwrap_err();
        assert_eq!(err, Error::resolution("elsewhere"));
    }

    #[test]
    fn test_missing_from_clause_fails_compilation() {
        let spec = select(lit(1));
        let err = CriteriaCompiler::new().compile_list(&spec).unwrap_err();
        match err {
            Error::Specification(e) => {
                assert_eq!(e.kind, SpecificationErrorKind::MissingFrom);
            }
            other => panic!("expected specification error, got {other:?}"),
        }
    }

    #[test]
    fn test_lowering_is_deterministic() {
        let li = EntityRef::<LineItem>::new();
        let price: Expression<i32> = li.col("price");
        let spec = select(max(&price))
            .from(&li)
            .filter(price.gt(10).and(price.lt(100)));

        let compiler = CriteriaCompiler::new();
        let first = compiler.compile_list(&spec).unwrap();
        let second = compiler.compile_list(&spec).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_single_and_list_share_the_algorithm() {
        let li = EntityRef::<LineItem>::new();
        let spec = select(count(li.col::<i64>("id"))).from(&li);
        let compiler = CriteriaCompiler::new();
        assert_eq!(
            compiler.compile_single(&spec).unwrap(),
            compiler.compile_list(&spec).unwrap()
        );
    }

    #[test]
    fn test_subquery_scope_is_chained_to_the_outer_scope() {
        let i = EntityRef::<Invoice>::aliased("i");
        let li = EntityRef::<LineItem>::aliased("li");

        // Correlated: the inner predicate references the outer alias `i`.
        let inner = select(li.col::<i64>("id"))
            .from(&li)
            .filter(li.col::<i64>("invoice_id").eq(&i.col::<i64>("id")));

        let outer = select(i.col::<i64>("id"))
            .from(&i)
            .filter(exists(inner.clone()));
        let criteria = CriteriaCompiler::new().compile_list(&outer).unwrap();
        match criteria.restriction {
            Some(CriteriaPredicate::Exists { negated: false, .. }) => {}
            other => panic!("expected exists predicate, got {other:?}"),
        }

        // Compiled on its own there is no outer scope, so `i` cannot
        // resolve.
        let err = CriteriaCompiler::new().compile_list(&inner).unwrap_err();
        assert_eq!(err, Error::resolution("i"));
    }

    #[test]
    fn test_case_branch_order_survives_lowering() {
        let li = EntityRef::<LineItem>::new();
        let name: Expression<String> = li.col("name");
        let expr = crate::expr::case_when(name.eq("a"), lit(1))
            .when(name.eq("b"), lit(2))
            .otherwise(null_lit::<i32>());
        let spec = select(expr).from(&li);
        let criteria = CriteriaCompiler::new().compile_list(&spec).unwrap();
        match criteria.projection {
            CriteriaProjection::Expr(CriteriaExpr::Case { branches, .. }) => {
                assert_eq!(branches.len(), 2);
                assert_eq!(
                    branches[0].result,
                    CriteriaExpr::Constant(querion_core::Value::Int(1))
                );
                assert_eq!(
                    branches[1].result,
                    CriteriaExpr::Constant(querion_core::Value::Int(2))
                );
            }
            other => panic!("expected case projection, got {other:?}"),
        }
    }

    #[test]
    fn test_whole_row_projection_is_select_only() {
        let li = EntityRef::<LineItem>::new();
        let row = li.row();
        let err = CriteriaCompiler::new()
            .compile_update(&update(&li).set("price", row.cast::<i32>()))
            .unwrap_err();
        match err {
            Error::Specification(e) => {
                assert_eq!(e.kind, SpecificationErrorKind::UnsupportedInContext);
            }
            other => panic!("expected specification error, got {other:?}"),
        }
    }

    #[test]
    fn test_update_without_assignments_is_rejected() {
        let li = EntityRef::<LineItem>::new();
        let err = CriteriaCompiler::new()
            .compile_update(&update(&li))
            .unwrap_err();
        match err {
            Error::Specification(e) => {
                assert_eq!(e.kind, SpecificationErrorKind::EmptyAssignments);
            }
            other => panic!("expected specification error, got {other:?}"),
        }
    }

    #[test]
    fn test_delete_compiles_with_target_binding() {
        let li = EntityRef::<LineItem>::aliased("li");
        let criteria = CriteriaCompiler::new()
            .compile_delete(&delete(&li).filter(li.col::<i32>("price").lt(10)))
            .unwrap();
        assert_eq!(criteria.target.alias, "li");
        assert_eq!(criteria.target.table, "line_item");
        assert!(criteria.restriction.is_some());
    }
}
