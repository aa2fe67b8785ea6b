//! Memo of resolved from-elements for one query spec.

use std::collections::HashMap;

use sqmc_sql_ast::{TableGroupId, TableGroupJoin};
use sqmc_types::NavigablePath;

/// Maps navigable paths to the table groups (and joins) they resolved to.
///
/// Entries are never evicted: a path resolved once keeps its table group for
/// the rest of the query spec. Several paths may map to one group (an
/// embedded join is registered under its left-hand side's group).
#[derive(Debug, Default)]
pub struct FromClauseIndex {
    table_groups: HashMap<NavigablePath, TableGroupId>,
    table_group_joins: HashMap<NavigablePath, TableGroupJoin>,
}

impl FromClauseIndex {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the group for a path; returns the group previously
    /// registered under it, if any.
    pub fn register_table_group(
        &mut self,
        path: NavigablePath,
        group: TableGroupId,
    ) -> Option<TableGroupId> {
        self.table_groups.insert(path, group)
    }

    #[must_use]
    pub fn find_table_group(&self, path: &NavigablePath) -> Option<TableGroupId> {
        self.table_groups.get(path).copied()
    }

    pub fn register_table_group_join(&mut self, path: NavigablePath, join: TableGroupJoin) {
        self.table_group_joins.insert(path, join);
    }

    #[must_use]
    pub fn find_table_group_join(&self, path: &NavigablePath) -> Option<&TableGroupJoin> {
        self.table_group_joins.get(path)
    }

    /// The group of the path itself or of its closest registered ancestor,
    /// together with the path it is registered under.
    #[must_use]
    pub fn find_closest(&self, path: &NavigablePath) -> Option<(TableGroupId, NavigablePath)> {
        let mut current = Some(path.clone());
        while let Some(p) = current {
            if let Some(id) = self.find_table_group(&p) {
                return Some((id, p));
            }
            current = p.parent();
        }
        None
    }

    /// Number of registered table-group entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.table_groups.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.table_groups.is_empty()
    }
}
