// Copyright 2025 Ojima Abraham
// SPDX-License-Identifier: Apache-2.0

//! Read-only schema lookup for the transactional read path.
//!
//! Schema management lives upstream; this layer only needs column identifiers
//! and types to decode stored rows and evaluate predicates.

use std::collections::BTreeMap;

/// Type of a column's values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Int,
    Uint,
    Float,
    Bytes,
}

/// A column definition.
#[derive(Debug, Clone)]
pub struct Column {
    /// Column identifier, unique within the table.
    pub id: u64,
    /// Column name (diagnostic only; the wire format uses ids).
    pub name: String,
    /// Value type.
    pub typ: ColumnType,
    /// Whether this column is part of the table's primary key.
    pub primary_key: bool,
}

impl Column {
    /// Creates a non-primary-key column.
    pub fn new(id: u64, name: impl Into<String>, typ: ColumnType) -> Self {
        Self {
            id,
            name: name.into(),
            typ,
            primary_key: false,
        }
    }

    /// Marks the column as part of the primary key.
    pub fn primary(mut self) -> Self {
        self.primary_key = true;
        self
    }
}

/// A table's column layout, indexed by column id.
#[derive(Debug, Clone, Default)]
pub struct TableSchema {
    columns: BTreeMap<u64, Column>,
}

impl TableSchema {
    /// Builds a schema from column definitions. A duplicate id keeps the
    /// last definition.
    pub fn new(columns: Vec<Column>) -> Self {
        Self {
            columns: columns.into_iter().map(|c| (c.id, c)).collect(),
        }
    }

    /// Looks up a column by id.
    #[inline]
    pub fn column(&self, id: u64) -> Option<&Column> {
        self.columns.get(&id)
    }

    /// Iterates over columns in id order.
    pub fn columns(&self) -> impl Iterator<Item = &Column> {
        self.columns.values()
    }

    /// Returns the number of columns.
    #[inline]
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// Returns true if the schema has no columns.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_by_id() {
        let schema = TableSchema::new(vec![
            Column::new(1, "id", ColumnType::Uint).primary(),
            Column::new(2, "name", ColumnType::Bytes),
        ]);

        assert_eq!(schema.len(), 2);
        assert_eq!(schema.column(1).unwrap().name, "id");
        assert!(schema.column(1).unwrap().primary_key);
        assert!(!schema.column(2).unwrap().primary_key);
        assert!(schema.column(3).is_none());
    }
}
