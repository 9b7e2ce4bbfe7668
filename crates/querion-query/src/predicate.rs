//! Predicate specification nodes.
//!
//! Boolean algebra layered on expressions: comparisons, logical
//! combinators, range and membership checks, pattern matches, null checks,
//! and existence predicates over subqueries. Like expressions, predicates
//! are immutable shared nodes behind cheap handles.

use crate::expr::{ExprNode, Expression};
use crate::query::{QuerySpec, SelectSpec};
use querion_core::{Comparable, ComparisonOp, Error, Result, SpecificationErrorKind};
use std::sync::Arc;

/// A node of the predicate specification tree.
#[derive(Debug, Clone, PartialEq)]
pub enum PredicateNode {
    /// Negation
    Not(Arc<PredicateNode>),

    /// N-ary conjunction; at least one operand
    And(Vec<Arc<PredicateNode>>),

    /// N-ary disjunction; at least one operand
    Or(Vec<Arc<PredicateNode>>),

    /// Binary comparison with both sides typed identically
    Compare {
        op: ComparisonOp,
        lhs: Arc<ExprNode>,
        rhs: Arc<ExprNode>,
    },

    /// Inclusive range check
    Between {
        subject: Arc<ExprNode>,
        lower: Arc<ExprNode>,
        upper: Arc<ExprNode>,
    },

    /// Membership in a finite alternative list
    InList {
        subject: Arc<ExprNode>,
        alternatives: Vec<Arc<ExprNode>>,
    },

    /// Boolean truth check; only boolean expressions can construct this
    Truth {
        subject: Arc<ExprNode>,
        expected: bool,
    },

    /// NULL check
    NullCheck {
        subject: Arc<ExprNode>,
        negated: bool,
    },

    /// SQL LIKE pattern match
    Match {
        subject: Arc<ExprNode>,
        pattern: String,
        negated: bool,
    },

    /// Existence check over an embedded query specification
    Exists {
        query: Arc<QuerySpec>,
        negated: bool,
    },
}

/// A handle on a predicate node.
#[derive(Debug, Clone, PartialEq)]
pub struct Predicate {
    node: Arc<PredicateNode>,
}

impl Predicate {
    pub(crate) fn from_node(node: PredicateNode) -> Self {
        Self {
            node: Arc::new(node),
        }
    }

    pub(crate) fn node(&self) -> &PredicateNode {
        &self.node
    }

    pub(crate) fn node_arc(&self) -> Arc<PredicateNode> {
        Arc::clone(&self.node)
    }

    /// Conjoin with another predicate.
    pub fn and(self, other: Predicate) -> Predicate {
        Predicate::from_node(PredicateNode::And(vec![self.node, other.node]))
    }

    /// Disjoin with another predicate.
    pub fn or(self, other: Predicate) -> Predicate {
        Predicate::from_node(PredicateNode::Or(vec![self.node, other.node]))
    }

    /// Negate this predicate.
    pub fn not(self) -> Predicate {
        Predicate::from_node(PredicateNode::Not(self.node))
    }
}

/// Conjunction of all operands, in declared order.
///
/// An empty operand list is a construction-time error — it must never
/// silently compile to a vacuous predicate.
pub fn and(operands: impl IntoIterator<Item = Predicate>) -> Result<Predicate> {
    let operands: Vec<Arc<PredicateNode>> = operands.into_iter().map(|p| p.node).collect();
    if operands.is_empty() {
        return Err(Error::specification(
            SpecificationErrorKind::EmptyOperands,
            "and() requires at least one operand",
        ));
    }
    Ok(Predicate::from_node(PredicateNode::And(operands)))
}

/// Disjunction of all operands, in declared order.
///
/// An empty operand list is a construction-time error.
pub fn or(operands: impl IntoIterator<Item = Predicate>) -> Result<Predicate> {
    let operands: Vec<Arc<PredicateNode>> = operands.into_iter().map(|p| p.node).collect();
    if operands.is_empty() {
        return Err(Error::specification(
            SpecificationErrorKind::EmptyOperands,
            "or() requires at least one operand",
        ));
    }
    Ok(Predicate::from_node(PredicateNode::Or(operands)))
}

/// Negate a predicate.
pub fn not(operand: Predicate) -> Predicate {
    operand.not()
}

/// Existence check: the subquery matches at least one row.
pub fn exists<T>(subquery: SelectSpec<T>) -> Predicate {
    Predicate::from_node(PredicateNode::Exists {
        query: Arc::new(subquery.into_query()),
        negated: false,
    })
}

/// Non-existence check: the subquery matches no rows.
pub fn not_exists<T>(subquery: SelectSpec<T>) -> Predicate {
    Predicate::from_node(PredicateNode::Exists {
        query: Arc::new(subquery.into_query()),
        negated: true,
    })
}

impl<T: Comparable> Expression<T> {
    fn compare(&self, op: ComparisonOp, other: impl Into<Expression<T>>) -> Predicate {
        Predicate::from_node(PredicateNode::Compare {
            op,
            lhs: self.node_arc(),
            rhs: other.into().node_arc(),
        })
    }

    /// Equal (=)
    pub fn eq(&self, other: impl Into<Expression<T>>) -> Predicate {
        self.compare(ComparisonOp::Eq, other)
    }

    /// Not equal (<>)
    pub fn ne(&self, other: impl Into<Expression<T>>) -> Predicate {
        self.compare(ComparisonOp::Ne, other)
    }

    /// Less than (<)
    pub fn lt(&self, other: impl Into<Expression<T>>) -> Predicate {
        self.compare(ComparisonOp::Lt, other)
    }

    /// Less than or equal (<=)
    pub fn le(&self, other: impl Into<Expression<T>>) -> Predicate {
        self.compare(ComparisonOp::Le, other)
    }

    /// Greater than (>)
    pub fn gt(&self, other: impl Into<Expression<T>>) -> Predicate {
        self.compare(ComparisonOp::Gt, other)
    }

    /// Greater than or equal (>=)
    pub fn ge(&self, other: impl Into<Expression<T>>) -> Predicate {
        self.compare(ComparisonOp::Ge, other)
    }

    /// Inclusive range check.
    pub fn between(
        &self,
        lower: impl Into<Expression<T>>,
        upper: impl Into<Expression<T>>,
    ) -> Predicate {
        Predicate::from_node(PredicateNode::Between {
            subject: self.node_arc(),
            lower: lower.into().node_arc(),
            upper: upper.into().node_arc(),
        })
    }

    /// Membership in a finite alternative list, in declared order.
    pub fn in_list<V: Into<Expression<T>>>(
        &self,
        alternatives: impl IntoIterator<Item = V>,
    ) -> Predicate {
        Predicate::from_node(PredicateNode::InList {
            subject: self.node_arc(),
            alternatives: alternatives
                .into_iter()
                .map(|a| a.into().node_arc())
                .collect(),
        })
    }
}

impl<T> Expression<T> {
    /// IS NULL check.
    pub fn is_null(&self) -> Predicate {
        Predicate::from_node(PredicateNode::NullCheck {
            subject: self.node_arc(),
            negated: false,
        })
    }

    /// IS NOT NULL check.
    pub fn is_not_null(&self) -> Predicate {
        Predicate::from_node(PredicateNode::NullCheck {
            subject: self.node_arc(),
            negated: true,
        })
    }
}

impl Expression<bool> {
    /// IS TRUE check.
    pub fn is_true(&self) -> Predicate {
        Predicate::from_node(PredicateNode::Truth {
            subject: self.node_arc(),
            expected: true,
        })
    }

    /// IS FALSE check.
    pub fn is_false(&self) -> Predicate {
        Predicate::from_node(PredicateNode::Truth {
            subject: self.node_arc(),
            expected: false,
        })
    }
}

impl Expression<String> {
    /// LIKE pattern match.
    pub fn like(&self, pattern: impl Into<String>) -> Predicate {
        Predicate::from_node(PredicateNode::Match {
            subject: self.node_arc(),
            pattern: pattern.into(),
            negated: false,
        })
    }

    /// NOT LIKE pattern match.
    pub fn not_like(&self, pattern: impl Into<String>) -> Predicate {
        Predicate::from_node(PredicateNode::Match {
            subject: self.node_arc(),
            pattern: pattern.into(),
            negated: true,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::EntityRef;
    use querion_core::entity;

    entity!(struct LineItem => "line_item");

    #[test]
    fn test_empty_and_is_rejected() {
        let err = and(Vec::new()).unwrap_err();
        match err {
            Error::Specification(e) => {
                assert_eq!(e.kind, SpecificationErrorKind::EmptyOperands);
            }
            other => panic!("expected specification error, got {other:?}"),
        }
    }

    #[test]
    fn test_empty_or_is_rejected() {
        assert!(or(Vec::new()).is_err());
    }

    #[test]
    fn test_nary_operands_keep_declaration_order() {
        let li = EntityRef::<LineItem>::new();
        let price: Expression<i32> = li.col("price");
        let combined = and([price.gt(10), price.lt(50), price.ne(30)]).unwrap();
        match combined.node() {
            PredicateNode::And(operands) => assert_eq!(operands.len(), 3),
            other => panic!("expected and node, got {other:?}"),
        }
    }

    #[test]
    fn test_comparison_shares_both_sides() {
        let li = EntityRef::<LineItem>::new();
        let price: Expression<i32> = li.col("price");
        let p = price.eq(10);
        match p.node() {
            PredicateNode::Compare { op, lhs, .. } => {
                assert_eq!(*op, ComparisonOp::Eq);
                assert_eq!(lhs.as_ref(), price.node());
            }
            other => panic!("expected comparison, got {other:?}"),
        }
    }

    #[test]
    fn test_fluent_combinators() {
        let li = EntityRef::<LineItem>::new();
        let price: Expression<i32> = li.col("price");
        let p = price.gt(10).and(price.lt(50)).or(price.eq(99)).not();
        match p.node() {
            PredicateNode::Not(inner) => match inner.as_ref() {
                PredicateNode::Or(operands) => assert_eq!(operands.len(), 2),
                other => panic!("expected or node, got {other:?}"),
            },
            other => panic!("expected not node, got {other:?}"),
        }
    }
}
