//! Expansion of queries over unmapped polymorphic types.
//!
//! `select a from Animal a` where `Animal` is an interface implemented by the
//! mapped entities `Cat` and `Dog` cannot be lowered directly: there is no
//! `Animal` table. The splitter copies the statement once per implementor,
//! substituting the implementor for the root entity, and the copies are
//! lowered independently.

use std::collections::HashMap;

use sqmc_error::{Result, SqmError};
use sqmc_sqm::walker::{self, SemanticQueryWalker};
use sqmc_sqm::{
    NodeId, SqmAssignment, SqmAttributeJoin, SqmCrossJoin, SqmDeleteStatement, SqmEntityJoin,
    SqmPath, SqmRoot, SqmSetClause, SqmStatement, SqmUpdateStatement,
};
use sqmc_types::{JavaType, NavigablePath};
use tracing::{debug, debug_span};

use crate::metamodel::MappingMetamodel;

pub struct QuerySplitter;

impl QuerySplitter {
    /// One statement per implementor of the first unmapped polymorphic root
    /// of `statement`, or `[statement]` when there is none.
    ///
    /// Only SELECT statements can be split.
    pub fn split(metamodel: &dyn MappingMetamodel, statement: &SqmStatement) -> Result<Vec<SqmStatement>> {
        let SqmStatement::Select(select) = statement else {
            return Err(SqmError::unsupported(
                "only SELECT statements can be split over polymorphic roots",
            ));
        };
        let polymorphic = select
            .query_spec
            .from_clause
            .spaces
            .iter()
            .map(|space| &space.root)
            .find_map(|root| metamodel.implementors(&root.entity_name).map(|i| (root, i)));
        let Some((root, implementors)) = polymorphic else {
            return Ok(vec![statement.clone()]);
        };

        let span = debug_span!(target: "sqmc.split", "split", root = %root.navigable_path, implementors = implementors.len());
        let _g = span.enter();
        let statements = implementors
            .iter()
            .map(|implementor| {
                let mut replacer = UnmappedPolymorphismReplacer::new(root, implementor);
                replacer.visit_statement(statement)
            })
            .collect::<Result<Vec<_>>>()?;
        debug!(target: "sqmc.split", polymorphic = %root.entity_name, statements = statements.len(), "statement split");
        crate::record_split_statements(statements.len());
        Ok(statements)
    }
}

/// Deep copier substituting one implementor for the polymorphic root.
///
/// Every from-element and path gets a fresh id; a node visited more than
/// once (the same path selected and restricted, say) maps to the same copy.
struct UnmappedPolymorphismReplacer<'a> {
    root_id: NodeId,
    root_path: &'a NavigablePath,
    polymorphic_type: JavaType,
    implementor: &'a str,
    node_ids: HashMap<NodeId, NodeId>,
    paths: HashMap<NodeId, SqmPath>,
}

impl<'a> UnmappedPolymorphismReplacer<'a> {
    fn new(root: &'a SqmRoot, implementor: &'a str) -> Self {
        Self {
            root_id: root.id,
            root_path: &root.navigable_path,
            polymorphic_type: JavaType::Entity(root.entity_name.clone()),
            implementor,
            node_ids: HashMap::new(),
            paths: HashMap::new(),
        }
    }

    fn copy_id(&mut self, id: NodeId) -> NodeId {
        *self.node_ids.entry(id).or_insert_with(NodeId::next)
    }

    /// Paths below the polymorphic root are re-rooted at the implementor.
    fn rewrite(&self, path: &NavigablePath) -> NavigablePath {
        if path.segments().first() == self.root_path.segments().first() {
            path.with_root_entity(self.implementor)
        } else {
            path.clone()
        }
    }
}

fn rejected(node: &str) -> SqmError {
    SqmError::unsupported(format!("{node} cannot be split over polymorphic roots"))
}

impl SemanticQueryWalker for UnmappedPolymorphismReplacer<'_> {
    fn visit_update_statement(&mut self, _statement: &SqmUpdateStatement) -> Result<SqmUpdateStatement> {
        Err(rejected("UPDATE statement"))
    }

    fn visit_delete_statement(&mut self, _statement: &SqmDeleteStatement) -> Result<SqmDeleteStatement> {
        Err(rejected("DELETE statement"))
    }

    fn visit_set_clause(&mut self, _clause: &SqmSetClause) -> Result<SqmSetClause> {
        Err(rejected("SET clause"))
    }

    fn visit_assignment(&mut self, _assignment: &SqmAssignment) -> Result<SqmAssignment> {
        Err(rejected("assignment"))
    }

    fn visit_root(&mut self, root: &SqmRoot) -> Result<SqmRoot> {
        let mut copy = walker::walk_root(self, root)?;
        if root.id == self.root_id {
            copy.entity_name = self.implementor.to_owned();
        }
        copy.id = self.copy_id(root.id);
        copy.navigable_path = self.rewrite(&root.navigable_path);
        Ok(copy)
    }

    fn visit_attribute_join(&mut self, join: &SqmAttributeJoin) -> Result<SqmAttributeJoin> {
        let mut copy = walker::walk_attribute_join(self, join)?;
        copy.id = self.copy_id(join.id);
        copy.lhs_path = self.rewrite(&join.lhs_path);
        copy.navigable_path = self.rewrite(&join.navigable_path);
        Ok(copy)
    }

    fn visit_cross_join(&mut self, join: &SqmCrossJoin) -> Result<SqmCrossJoin> {
        let mut copy = walker::walk_cross_join(self, join)?;
        copy.id = self.copy_id(join.id);
        Ok(copy)
    }

    fn visit_entity_join(&mut self, join: &SqmEntityJoin) -> Result<SqmEntityJoin> {
        let mut copy = walker::walk_entity_join(self, join)?;
        copy.id = self.copy_id(join.id);
        Ok(copy)
    }

    fn visit_path(&mut self, path: &SqmPath) -> Result<SqmPath> {
        if let Some(copy) = self.paths.get(&path.id) {
            return Ok(copy.clone());
        }
        let navigable_path = self.rewrite(&path.navigable_path);
        let node_type = if path.node_type == self.polymorphic_type && navigable_path.is_root() {
            JavaType::Entity(self.implementor.to_owned())
        } else {
            path.node_type.clone()
        };
        let copy = SqmPath {
            id: self.copy_id(path.id),
            kind: path.kind,
            navigable_path,
            lhs_path: path.lhs_path.as_ref().map(|p| self.rewrite(p)),
            node_type,
        };
        self.paths.insert(path.id, copy.clone());
        Ok(copy)
    }
}
