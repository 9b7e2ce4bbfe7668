//! In-memory reference engine.
//!
//! Executes compiled criteria statements against in-memory tables with SQL
//! evaluation semantics: comparisons against NULL never match, aggregates
//! skip NULL inputs, empty aggregate input yields NULL (COUNT yields 0),
//! and correlated subqueries see the enclosing row through an environment
//! chain that mirrors the scope chain the compiler resolved against.

use crate::criteria::{
    AggregateFunction, ComparisonOp, CriteriaExpr, CriteriaJoin, CriteriaOrder,
    CriteriaPredicate, CriteriaProjection, DeleteCriteria, JoinKind, SelectCriteria,
    SortDirection, SourceBinding, UpdateCriteria,
};
use crate::error::{Error, ExecutionErrorKind, Result};
use crate::row::{ColumnInfo, Row};
use crate::types::SqlType;
use crate::value::Value;
use regex::Regex;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Arc;

/// A single in-memory table: shared column metadata plus row storage.
#[derive(Debug, Clone)]
pub struct Table {
    columns: Arc<ColumnInfo>,
    rows: Vec<Vec<Value>>,
}

impl Table {
    fn new(columns: Vec<String>) -> Self {
        Self {
            columns: Arc::new(ColumnInfo::new(columns)),
            rows: Vec::new(),
        }
    }

    /// Number of rows currently stored.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Check if the table has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Column metadata of this table.
    pub fn columns(&self) -> &ColumnInfo {
        &self.columns
    }
}

/// One source row bound under an alias during evaluation.
#[derive(Debug, Clone)]
struct BoundRow {
    alias: String,
    columns: Arc<ColumnInfo>,
    values: Vec<Value>,
}

/// Evaluation environment: the bound rows of the current query level plus a
/// link to the enclosing level for correlated references.
struct Env<'a> {
    rows: &'a [BoundRow],
    parent: Option<&'a Env<'a>>,
}

impl<'a> Env<'a> {
    fn lookup(&self, alias: &str) -> Option<&BoundRow> {
        self.rows
            .iter()
            .find(|r| r.alias == alias)
            .or_else(|| self.parent.and_then(|p| p.lookup(alias)))
    }
}

/// An in-memory database executing compiled criteria statements.
#[derive(Debug, Clone, Default)]
pub struct Database {
    tables: HashMap<String, Table>,
}

impl Database {
    /// Create an empty database.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create (or replace) a table with the given columns.
    pub fn create_table(&mut self, name: impl Into<String>, columns: &[&str]) {
        self.tables.insert(
            name.into(),
            Table::new(columns.iter().map(|c| (*c).to_string()).collect()),
        );
    }

    /// Insert one row of values, in column order.
    pub fn insert(&mut self, table: &str, values: Vec<Value>) -> Result<()> {
        let t = self
            .tables
            .get_mut(table)
            .ok_or_else(|| unknown_table(table))?;
        if values.len() != t.columns.len() {
            return Err(Error::execution(
                ExecutionErrorKind::TypeMismatch,
                format!(
                    "table `{table}` has {} columns, row has {}",
                    t.columns.len(),
                    values.len()
                ),
            ));
        }
        t.rows.push(values);
        Ok(())
    }

    /// Read every row of a table, in insertion order.
    pub fn scan(&self, table: &str) -> Result<Vec<Row>> {
        let t = self.table(table)?;
        Ok(t.rows
            .iter()
            .map(|r| Row::with_columns(Arc::clone(&t.columns), r.clone()))
            .collect())
    }

    // ==================== Statement execution ====================

    /// Execute a select statement, returning every matching row.
    #[tracing::instrument(level = "debug", skip_all)]
    pub fn execute_select(&self, criteria: &SelectCriteria) -> Result<Vec<Row>> {
        let rows = self.run_select(criteria, None)?;
        tracing::debug!(rows = rows.len(), "select criteria executed");
        Ok(rows)
    }

    /// Execute a select statement expected to match exactly one row.
    #[tracing::instrument(level = "debug", skip_all)]
    pub fn execute_single(&self, criteria: &SelectCriteria) -> Result<Row> {
        let mut rows = self.run_select(criteria, None)?;
        match rows.len() {
            1 => Ok(rows.remove(0)),
            0 => Err(Error::execution(
                ExecutionErrorKind::NoResult,
                "single-result query matched no rows",
            )),
            n => Err(Error::execution(
                ExecutionErrorKind::NonUniqueResult,
                format!("single-result query matched {n} rows"),
            )),
        }
    }

    /// Execute an update statement, returning the affected row count.
    #[tracing::instrument(level = "debug", skip_all, fields(table = %criteria.target.table))]
    pub fn execute_update(&mut self, criteria: &UpdateCriteria) -> Result<usize> {
        let planned = {
            let table = self.table(&criteria.target.table)?;
            let mut col_indices = Vec::with_capacity(criteria.assignments.len());
            for assignment in &criteria.assignments {
                let idx = table
                    .columns
                    .index_of(&assignment.column)
                    .ok_or_else(|| unknown_column(&assignment.column, &criteria.target.table))?;
                col_indices.push(idx);
            }

            let mut planned: Vec<(usize, Vec<(usize, Value)>)> = Vec::new();
            for (i, row) in table.rows.iter().enumerate() {
                let bound = [bound_row(&criteria.target, table, row)];
                let env = Env {
                    rows: &bound,
                    parent: None,
                };
                let hit = match &criteria.restriction {
                    Some(p) => self.eval_predicate(p, &env)?,
                    None => true,
                };
                if hit {
                    let mut writes = Vec::with_capacity(criteria.assignments.len());
                    for (assignment, idx) in criteria.assignments.iter().zip(&col_indices) {
                        writes.push((*idx, self.eval_expr(&assignment.value, &env)?));
                    }
                    planned.push((i, writes));
                }
            }
            planned
        };

        let affected = planned.len();
        let table = self
            .tables
            .get_mut(&criteria.target.table)
            .ok_or_else(|| unknown_table(&criteria.target.table))?;
        for (i, writes) in planned {
            for (idx, value) in writes {
                table.rows[i][idx] = value;
            }
        }
        tracing::debug!(affected, "update criteria executed");
        Ok(affected)
    }

    /// Execute a delete statement, returning the affected row count.
    #[tracing::instrument(level = "debug", skip_all, fields(table = %criteria.target.table))]
    pub fn execute_delete(&mut self, criteria: &DeleteCriteria) -> Result<usize> {
        let doomed = {
            let table = self.table(&criteria.target.table)?;
            let mut doomed: Vec<usize> = Vec::new();
            for (i, row) in table.rows.iter().enumerate() {
                let bound = [bound_row(&criteria.target, table, row)];
                let env = Env {
                    rows: &bound,
                    parent: None,
                };
                let hit = match &criteria.restriction {
                    Some(p) => self.eval_predicate(p, &env)?,
                    None => true,
                };
                if hit {
                    doomed.push(i);
                }
            }
            doomed
        };

        let table = self
            .tables
            .get_mut(&criteria.target.table)
            .ok_or_else(|| unknown_table(&criteria.target.table))?;
        for i in doomed.iter().rev() {
            table.rows.remove(*i);
        }
        tracing::debug!(affected = doomed.len(), "delete criteria executed");
        Ok(doomed.len())
    }

    // ==================== Select evaluation ====================

    fn run_select(&self, c: &SelectCriteria, outer: Option<&Env<'_>>) -> Result<Vec<Row>> {
        let tuples = self.enumerate_tuples(c, outer)?;
        let columns = Arc::new(ColumnInfo::new(self.projection_columns(c)?));
        let aggregated = !c.grouping.is_empty() || projection_has_aggregate(&c.projection);

        // Each entry is (ordering keys, projected values).
        let mut keyed: Vec<(Vec<Value>, Vec<Value>)> = Vec::new();

        if aggregated {
            let mut groups: Vec<(Vec<Value>, Vec<Vec<BoundRow>>)> = Vec::new();
            if c.grouping.is_empty() {
                groups.push((Vec::new(), tuples));
            } else {
                for tuple in tuples {
                    let env = Env {
                        rows: &tuple,
                        parent: outer,
                    };
                    let key = c
                        .grouping
                        .iter()
                        .map(|g| self.eval_expr(g, &env))
                        .collect::<Result<Vec<_>>>()?;
                    match groups.iter_mut().find(|(k, _)| *k == key) {
                        Some((_, members)) => members.push(tuple),
                        None => groups.push((key, vec![tuple])),
                    }
                }
            }

            for (_, members) in &groups {
                let order_keys = c
                    .ordering
                    .iter()
                    .map(|o| self.eval_grouped(&o.expr, members, outer))
                    .collect::<Result<Vec<_>>>()?;
                let values = self.project_grouped(&c.projection, members, outer)?;
                keyed.push((order_keys, values));
            }
        } else {
            for tuple in &tuples {
                let env = Env {
                    rows: tuple,
                    parent: outer,
                };
                let order_keys = c
                    .ordering
                    .iter()
                    .map(|o| self.eval_expr(&o.expr, &env))
                    .collect::<Result<Vec<_>>>()?;
                let values = self.project_row(&c.projection, &env)?;
                keyed.push((order_keys, values));
            }
        }

        if !c.ordering.is_empty() {
            keyed.sort_by(|a, b| compare_order_keys(&a.0, &b.0, &c.ordering));
        }

        let mut out: Vec<Row> = keyed
            .into_iter()
            .map(|(_, values)| Row::with_columns(Arc::clone(&columns), values))
            .collect();

        if c.distinct {
            let mut unique: Vec<Row> = Vec::new();
            for row in out {
                if !unique.iter().any(|r| *r == row) {
                    unique.push(row);
                }
            }
            out = unique;
        }
        Ok(out)
    }

    fn enumerate_tuples(
        &self,
        c: &SelectCriteria,
        outer: Option<&Env<'_>>,
    ) -> Result<Vec<Vec<BoundRow>>> {
        if c.roots.is_empty() {
            return Err(Error::execution(
                ExecutionErrorKind::UnknownTable,
                "select criteria has no root source",
            ));
        }

        let mut tuples: Vec<Vec<BoundRow>> = vec![Vec::new()];
        for root in &c.roots {
            tuples = self.cross_with(tuples, root)?;
        }
        for join in &c.joins {
            tuples = self.apply_join(tuples, join, outer)?;
        }

        if let Some(pred) = &c.restriction {
            let mut kept = Vec::new();
            for tuple in tuples {
                let env = Env {
                    rows: &tuple,
                    parent: outer,
                };
                if self.eval_predicate(pred, &env)? {
                    kept.push(tuple);
                }
            }
            tuples = kept;
        }
        Ok(tuples)
    }

    fn cross_with(
        &self,
        tuples: Vec<Vec<BoundRow>>,
        source: &SourceBinding,
    ) -> Result<Vec<Vec<BoundRow>>> {
        let table = self.table(&source.table)?;
        let mut next = Vec::new();
        for tuple in &tuples {
            for row in &table.rows {
                let mut extended = tuple.clone();
                extended.push(bound_row(source, table, row));
                next.push(extended);
            }
        }
        Ok(next)
    }

    fn apply_join(
        &self,
        tuples: Vec<Vec<BoundRow>>,
        join: &CriteriaJoin,
        outer: Option<&Env<'_>>,
    ) -> Result<Vec<Vec<BoundRow>>> {
        let table = self.table(&join.source.table)?;
        let mut next = Vec::new();
        for tuple in tuples {
            let mut matched = false;
            for row in &table.rows {
                let mut extended = tuple.clone();
                extended.push(bound_row(&join.source, table, row));
                let keep = match (join.kind, &join.condition) {
                    (JoinKind::Cross, _) | (_, None) => true,
                    (_, Some(cond)) => {
                        let env = Env {
                            rows: &extended,
                            parent: outer,
                        };
                        self.eval_predicate(cond, &env)?
                    }
                };
                if keep {
                    matched = true;
                    next.push(extended);
                }
            }
            if join.kind == JoinKind::Left && !matched {
                let mut extended = tuple;
                extended.push(BoundRow {
                    alias: join.source.alias.clone(),
                    columns: Arc::clone(&table.columns),
                    values: vec![Value::Null; table.columns.len()],
                });
                next.push(extended);
            }
        }
        Ok(next)
    }

    // ==================== Projection ====================

    fn projection_columns(&self, c: &SelectCriteria) -> Result<Vec<String>> {
        match &c.projection {
            CriteriaProjection::Expr(CriteriaExpr::SourceRow { alias }) => {
                let table = self.source_table(c, alias)?;
                Ok(table.columns.names().to_vec())
            }
            CriteriaProjection::Expr(e) => Ok(vec![column_label(e, 0)]),
            CriteriaProjection::Tuple(exprs) => Ok(exprs
                .iter()
                .enumerate()
                .map(|(i, e)| column_label(e, i))
                .collect()),
        }
    }

    fn source_table(&self, c: &SelectCriteria, alias: &str) -> Result<&Table> {
        let binding = c
            .roots
            .iter()
            .chain(c.joins.iter().map(|j| &j.source))
            .find(|b| b.alias == alias)
            .ok_or_else(|| {
                Error::execution(
                    ExecutionErrorKind::UnknownAlias,
                    format!("alias `{alias}` is not bound in this statement"),
                )
            })?;
        self.table(&binding.table)
    }

    fn project_row(&self, projection: &CriteriaProjection, env: &Env<'_>) -> Result<Vec<Value>> {
        match projection {
            CriteriaProjection::Expr(CriteriaExpr::SourceRow { alias }) => {
                let bound = env.lookup(alias).ok_or_else(|| unknown_alias(alias))?;
                Ok(bound.values.clone())
            }
            CriteriaProjection::Expr(e) => Ok(vec![self.eval_expr(e, env)?]),
            CriteriaProjection::Tuple(exprs) => {
                exprs.iter().map(|e| self.eval_expr(e, env)).collect()
            }
        }
    }

    fn project_grouped(
        &self,
        projection: &CriteriaProjection,
        members: &[Vec<BoundRow>],
        outer: Option<&Env<'_>>,
    ) -> Result<Vec<Value>> {
        match projection {
            CriteriaProjection::Expr(CriteriaExpr::SourceRow { .. }) => Err(Error::execution(
                ExecutionErrorKind::TypeMismatch,
                "whole-row projection cannot be combined with aggregation",
            )),
            CriteriaProjection::Expr(e) => Ok(vec![self.eval_grouped(e, members, outer)?]),
            CriteriaProjection::Tuple(exprs) => exprs
                .iter()
                .map(|e| self.eval_grouped(e, members, outer))
                .collect(),
        }
    }

    // ==================== Expression evaluation ====================

    fn eval_expr(&self, expr: &CriteriaExpr, env: &Env<'_>) -> Result<Value> {
        match expr {
            CriteriaExpr::Constant(v) => Ok(v.clone()),
            CriteriaExpr::TypedNull(_) => Ok(Value::Null),
            CriteriaExpr::Path { alias, column } => {
                let bound = env.lookup(alias).ok_or_else(|| unknown_alias(alias))?;
                let idx = bound
                    .columns
                    .index_of(column)
                    .ok_or_else(|| unknown_column(column, alias))?;
                Ok(bound.values[idx].clone())
            }
            CriteriaExpr::SourceRow { .. } => Err(Error::execution(
                ExecutionErrorKind::TypeMismatch,
                "row-valued expression in scalar position",
            )),
            CriteriaExpr::Aggregate { .. } => Err(Error::execution(
                ExecutionErrorKind::TypeMismatch,
                "aggregate used outside an aggregating query",
            )),
            CriteriaExpr::Case {
                branches,
                otherwise,
            } => {
                for branch in branches {
                    if self.eval_predicate(&branch.condition, env)? {
                        return self.eval_expr(&branch.result, env);
                    }
                }
                self.eval_expr(otherwise, env)
            }
            CriteriaExpr::Cast { target, argument } => {
                cast_value(self.eval_expr(argument, env)?, *target)
            }
            CriteriaExpr::Scalar(sub) => {
                let rows = self.run_select(sub, Some(env))?;
                match rows.len() {
                    0 => Ok(Value::Null),
                    1 => {
                        let row = &rows[0];
                        if row.len() == 1 {
                            Ok(row.get(0).cloned().unwrap_or(Value::Null))
                        } else {
                            Err(Error::execution(
                                ExecutionErrorKind::NonScalarSubquery,
                                format!("scalar subquery produced {} columns", row.len()),
                            ))
                        }
                    }
                    n => Err(Error::execution(
                        ExecutionErrorKind::NonScalarSubquery,
                        format!("scalar subquery produced {n} rows"),
                    )),
                }
            }
        }
    }

    fn eval_grouped(
        &self,
        expr: &CriteriaExpr,
        members: &[Vec<BoundRow>],
        outer: Option<&Env<'_>>,
    ) -> Result<Value> {
        match expr {
            CriteriaExpr::Aggregate {
                function,
                distinct,
                argument,
            } => self.eval_aggregate(*function, *distinct, argument, members, outer),
            CriteriaExpr::Constant(v) => Ok(v.clone()),
            CriteriaExpr::TypedNull(_) => Ok(Value::Null),
            CriteriaExpr::Cast { target, argument } => {
                cast_value(self.eval_grouped(argument, members, outer)?, *target)
            }
            // Non-aggregate expressions in an aggregating query evaluate
            // against the first member row (group keys are constant within
            // a group, which is the supported use).
            other => match members.first() {
                Some(tuple) => {
                    let env = Env {
                        rows: tuple,
                        parent: outer,
                    };
                    self.eval_expr(other, &env)
                }
                None => Ok(Value::Null),
            },
        }
    }

    fn eval_aggregate(
        &self,
        function: AggregateFunction,
        distinct: bool,
        argument: &CriteriaExpr,
        members: &[Vec<BoundRow>],
        outer: Option<&Env<'_>>,
    ) -> Result<Value> {
        let mut collected: Vec<Value> = Vec::new();
        for tuple in members {
            let env = Env {
                rows: tuple,
                parent: outer,
            };
            let v = self.eval_expr(argument, &env)?;
            if !v.is_null() {
                collected.push(v);
            }
        }

        if distinct {
            let mut unique: Vec<Value> = Vec::new();
            for v in collected {
                if !unique.contains(&v) {
                    unique.push(v);
                }
            }
            collected = unique;
        }

        match function {
            AggregateFunction::Count => Ok(Value::BigInt(collected.len() as i64)),
            AggregateFunction::Max | AggregateFunction::Greatest => {
                Ok(fold_extreme(collected, Ordering::Greater))
            }
            AggregateFunction::Min | AggregateFunction::Least => {
                Ok(fold_extreme(collected, Ordering::Less))
            }
            AggregateFunction::Sum => sum_values(&collected),
            AggregateFunction::Avg => avg_values(&collected),
        }
    }

    // ==================== Predicate evaluation ====================

    fn eval_predicate(&self, pred: &CriteriaPredicate, env: &Env<'_>) -> Result<bool> {
        match pred {
            CriteriaPredicate::And(operands) => {
                for op in operands {
                    if !self.eval_predicate(op, env)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
            CriteriaPredicate::Or(operands) => {
                for op in operands {
                    if self.eval_predicate(op, env)? {
                        return Ok(true);
                    }
                }
                Ok(false)
            }
            CriteriaPredicate::Not(inner) => Ok(!self.eval_predicate(inner, env)?),
            CriteriaPredicate::Comparison { op, lhs, rhs } => {
                let l = self.eval_expr(lhs, env)?;
                let r = self.eval_expr(rhs, env)?;
                Ok(match l.compare(&r) {
                    Some(ord) => comparison_holds(*op, ord),
                    None => false,
                })
            }
            CriteriaPredicate::Between {
                subject,
                lower,
                upper,
            } => {
                let v = self.eval_expr(subject, env)?;
                let lo = self.eval_expr(lower, env)?;
                let hi = self.eval_expr(upper, env)?;
                let ge = matches!(v.compare(&lo), Some(Ordering::Equal | Ordering::Greater));
                let le = matches!(v.compare(&hi), Some(Ordering::Equal | Ordering::Less));
                Ok(ge && le)
            }
            CriteriaPredicate::In {
                subject,
                alternatives,
            } => {
                let v = self.eval_expr(subject, env)?;
                for alt in alternatives {
                    let candidate = self.eval_expr(alt, env)?;
                    if v.compare(&candidate) == Some(Ordering::Equal) {
                        return Ok(true);
                    }
                }
                Ok(false)
            }
            CriteriaPredicate::Truth { subject, expected } => {
                Ok(self.eval_expr(subject, env)?.as_bool() == Some(*expected))
            }
            CriteriaPredicate::IsNull { subject, negated } => {
                Ok(self.eval_expr(subject, env)?.is_null() != *negated)
            }
            CriteriaPredicate::Like {
                subject,
                pattern,
                negated,
            } => match self.eval_expr(subject, env)? {
                Value::Null => Ok(false),
                Value::Text(s) => Ok(like_match(&s, pattern)? != *negated),
                other => Err(Error::execution(
                    ExecutionErrorKind::TypeMismatch,
                    format!("LIKE requires a text subject, got {}", other.type_name()),
                )),
            },
            CriteriaPredicate::Exists { subquery, negated } => {
                let rows = self.run_select(subquery, Some(env))?;
                Ok(rows.is_empty() == *negated)
            }
        }
    }

    fn table(&self, name: &str) -> Result<&Table> {
        self.tables.get(name).ok_or_else(|| unknown_table(name))
    }
}

// ==================== Helpers ====================

fn bound_row(source: &SourceBinding, table: &Table, values: &[Value]) -> BoundRow {
    BoundRow {
        alias: source.alias.clone(),
        columns: Arc::clone(&table.columns),
        values: values.to_vec(),
    }
}

fn unknown_table(name: &str) -> Error {
    Error::execution(
        ExecutionErrorKind::UnknownTable,
        format!("unknown table `{name}`"),
    )
}

fn unknown_column(column: &str, owner: &str) -> Error {
    Error::execution(
        ExecutionErrorKind::UnknownColumn,
        format!("column `{column}` does not exist on `{owner}`"),
    )
}

fn unknown_alias(alias: &str) -> Error {
    Error::execution(
        ExecutionErrorKind::UnknownAlias,
        format!("alias `{alias}` is not bound in this scope"),
    )
}

fn comparison_holds(op: ComparisonOp, ord: Ordering) -> bool {
    match op {
        ComparisonOp::Eq => ord == Ordering::Equal,
        ComparisonOp::Ne => ord != Ordering::Equal,
        ComparisonOp::Lt => ord == Ordering::Less,
        ComparisonOp::Le => ord != Ordering::Greater,
        ComparisonOp::Gt => ord == Ordering::Greater,
        ComparisonOp::Ge => ord != Ordering::Less,
    }
}

fn projection_has_aggregate(projection: &CriteriaProjection) -> bool {
    match projection {
        CriteriaProjection::Expr(e) => contains_aggregate(e),
        CriteriaProjection::Tuple(exprs) => exprs.iter().any(contains_aggregate),
    }
}

fn contains_aggregate(expr: &CriteriaExpr) -> bool {
    match expr {
        CriteriaExpr::Aggregate { .. } => true,
        CriteriaExpr::Cast { argument, .. } => contains_aggregate(argument),
        CriteriaExpr::Case {
            branches,
            otherwise,
        } => {
            branches.iter().any(|b| contains_aggregate(&b.result)) || contains_aggregate(otherwise)
        }
        _ => false,
    }
}

/// NULLs sort after everything in ascending order; descending reverses the
/// whole key, so they come first there.
fn compare_order_keys(a: &[Value], b: &[Value], ordering: &[CriteriaOrder]) -> Ordering {
    for ((av, bv), order) in a.iter().zip(b).zip(ordering) {
        let mut ord = match (av.is_null(), bv.is_null()) {
            (true, true) => Ordering::Equal,
            (true, false) => Ordering::Greater,
            (false, true) => Ordering::Less,
            (false, false) => av.compare(bv).unwrap_or(Ordering::Equal),
        };
        if order.direction == SortDirection::Descending {
            ord = ord.reverse();
        }
        if ord != Ordering::Equal {
            return ord;
        }
    }
    Ordering::Equal
}

fn fold_extreme(values: Vec<Value>, keep: Ordering) -> Value {
    let mut best: Option<Value> = None;
    for v in values {
        best = match best {
            None => Some(v),
            Some(current) => {
                if v.compare(&current) == Some(keep) {
                    Some(v)
                } else {
                    Some(current)
                }
            }
        };
    }
    best.unwrap_or(Value::Null)
}

fn sum_values(values: &[Value]) -> Result<Value> {
    if values.is_empty() {
        return Ok(Value::Null);
    }
    if values
        .iter()
        .all(|v| matches!(v, Value::Int(_) | Value::BigInt(_)))
    {
        let mut total = 0i64;
        for v in values {
            total += v.as_i64().unwrap_or(0);
        }
        return Ok(Value::BigInt(total));
    }
    let mut total = 0f64;
    for v in values {
        total += v.as_f64().ok_or_else(|| {
            Error::execution(
                ExecutionErrorKind::TypeMismatch,
                format!("SUM requires numeric input, got {}", v.type_name()),
            )
        })?;
    }
    Ok(Value::Double(total))
}

fn avg_values(values: &[Value]) -> Result<Value> {
    if values.is_empty() {
        return Ok(Value::Null);
    }
    let mut total = 0f64;
    for v in values {
        total += v.as_f64().ok_or_else(|| {
            Error::execution(
                ExecutionErrorKind::TypeMismatch,
                format!("AVG requires numeric input, got {}", v.type_name()),
            )
        })?;
    }
    Ok(Value::Double(total / values.len() as f64))
}

/// Derive a result column label for a projected expression.
fn column_label(expr: &CriteriaExpr, index: usize) -> String {
    match expr {
        CriteriaExpr::Path { column, .. } => column.clone(),
        CriteriaExpr::Aggregate { function, .. } => function.as_str().to_string(),
        CriteriaExpr::Cast { argument, .. } => column_label(argument, index),
        _ => format!("column_{index}"),
    }
}

fn cast_value(value: Value, target: SqlType) -> Result<Value> {
    if value.is_null() {
        return Ok(Value::Null);
    }
    let mismatch = |value: &Value| {
        Error::execution(
            ExecutionErrorKind::TypeMismatch,
            format!(
                "cannot cast {} to {}",
                value.type_name(),
                target.sql_name()
            ),
        )
    };
    match target {
        SqlType::Boolean => value.as_bool().map(Value::Bool).ok_or_else(|| mismatch(&value)),
        SqlType::Integer => match &value {
            Value::Int(v) => Ok(Value::Int(*v)),
            Value::BigInt(v) => i32::try_from(*v)
                .map(Value::Int)
                .map_err(|_| mismatch(&value)),
            Value::Double(v) => Ok(Value::Int(*v as i32)),
            Value::Text(s) => s.parse().map(Value::Int).map_err(|_| mismatch(&value)),
            _ => Err(mismatch(&value)),
        },
        SqlType::BigInt => match &value {
            Value::Int(v) => Ok(Value::BigInt(i64::from(*v))),
            Value::BigInt(v) => Ok(Value::BigInt(*v)),
            Value::Double(v) => Ok(Value::BigInt(*v as i64)),
            Value::Text(s) => s.parse().map(Value::BigInt).map_err(|_| mismatch(&value)),
            _ => Err(mismatch(&value)),
        },
        SqlType::Double => match &value {
            Value::Text(s) => s.parse().map(Value::Double).map_err(|_| mismatch(&value)),
            _ => value.as_f64().map(Value::Double).ok_or_else(|| mismatch(&value)),
        },
        SqlType::Text => match &value {
            Value::Bool(v) => Ok(Value::Text(v.to_string())),
            Value::Int(v) => Ok(Value::Text(v.to_string())),
            Value::BigInt(v) => Ok(Value::Text(v.to_string())),
            Value::Double(v) => Ok(Value::Text(v.to_string())),
            Value::Text(s) => Ok(Value::Text(s.clone())),
            _ => Err(mismatch(&value)),
        },
        SqlType::Blob => match value {
            Value::Bytes(_) => Ok(value),
            _ => Err(mismatch(&value)),
        },
        SqlType::Date => match value {
            Value::Date(_) => Ok(value),
            _ => Err(mismatch(&value)),
        },
        SqlType::Timestamp => match value {
            Value::Timestamp(_) => Ok(value),
            _ => Err(mismatch(&value)),
        },
        SqlType::Json => match value {
            Value::Json(_) => Ok(value),
            _ => Err(mismatch(&value)),
        },
    }
}

fn like_match(subject: &str, pattern: &str) -> Result<bool> {
    let mut translated = String::with_capacity(pattern.len() + 2);
    translated.push('^');
    for ch in pattern.chars() {
        match ch {
            '%' => translated.push_str(".*"),
            '_' => translated.push('.'),
            other => translated.push_str(&regex::escape(&other.to_string())),
        }
    }
    translated.push('$');
    let re = Regex::new(&translated).map_err(|e| {
        Error::execution(
            ExecutionErrorKind::InvalidPattern,
            format!("invalid LIKE pattern `{pattern}`: {e}"),
        )
    })?;
    Ok(re.is_match(subject))
}
