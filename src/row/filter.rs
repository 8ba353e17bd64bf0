// Copyright 2025 Ojima Abraham
// SPDX-License-Identifier: Apache-2.0

//! Column match predicates.

use std::cmp::Ordering;

use crate::txn::TxnError;

use super::decoder::TxnRowValue;
use super::value::FieldValue;

/// Comparison operator for a match predicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchOp {
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
}

/// A single column predicate. A row matches a filter set only when every
/// predicate in it holds (conjunction).
#[derive(Debug, Clone)]
pub struct Match {
    /// Column the predicate applies to.
    pub column: u64,
    /// Comparison operator.
    pub op: MatchOp,
    /// Operand the column value is compared against.
    pub operand: FieldValue,
}

impl Match {
    /// Creates a predicate.
    pub fn new(column: u64, op: MatchOp, operand: FieldValue) -> Self {
        Self {
            column,
            op,
            operand,
        }
    }

    /// Evaluates the predicate against a decoded row.
    ///
    /// A row that lacks the predicate's column does not match. Comparing
    /// against a value of a different type is a malformed request.
    pub fn eval(&self, row: &TxnRowValue) -> Result<bool, TxnError> {
        let field = match row.field(self.column) {
            Some(f) => f,
            None => return Ok(false),
        };

        let ord = field.compare(&self.operand).ok_or_else(|| {
            TxnError::InvalidArgument(format!(
                "filter operand type {:?} does not match column {} type {:?}",
                self.operand.typ(),
                self.column,
                field.typ()
            ))
        })?;

        Ok(match self.op {
            MatchOp::Eq => ord == Ordering::Equal,
            MatchOp::NotEq => ord != Ordering::Equal,
            MatchOp::Lt => ord == Ordering::Less,
            MatchOp::LtEq => ord != Ordering::Greater,
            MatchOp::Gt => ord == Ordering::Greater,
            MatchOp::GtEq => ord != Ordering::Less,
        })
    }
}
