//! Domain model descriptors consumed by the converter and the splitter.
//!
//! The metadata-binding subsystem that builds the domain model lives outside
//! this workspace. What the compiler needs from it is captured by
//! [`MappingMetamodel`]: entity lookup, the implementors of unmapped
//! polymorphic types, and the type configuration. [`Metamodel`] is the
//! in-memory implementation used by embedders and tests.
//!
//! Entity and attribute descriptors double as the table-group factories:
//! [`EntityMapping::create_root_table_group`] builds the group for a root or
//! cross-joined from-element, [`create_table_group_join`] builds the join for
//! a to-one or plural attribute.

use std::collections::HashMap;

use smallvec::SmallVec;
use sqmc_error::{Result, SqmError};
use sqmc_sql_ast::{
    ColumnReference, Expression, Predicate, TableGroupArena, TableGroupId, TableGroupJoin,
    TableReference,
};
use sqmc_types::{
    BasicJavaType, BasicType, ComparisonOperator, JavaType, JdbcMappings, LockMode,
    NavigablePath, SqlJoinType, TypeConfiguration,
};

use crate::alias::SqlAliasBaseManager;

// ---------------------------------------------------------------------------
// Metamodel contract
// ---------------------------------------------------------------------------

/// Read-only view of the domain model.
pub trait MappingMetamodel: Send + Sync {
    fn find_entity(&self, name: &str) -> Option<&EntityMapping>;

    /// Concrete mapped implementors of an unmapped polymorphic type, `None`
    /// when `name` is not such a type.
    fn implementors(&self, name: &str) -> Option<&[String]>;

    fn type_configuration(&self) -> &TypeConfiguration;

    fn entity(&self, name: &str) -> Result<&EntityMapping> {
        self.find_entity(name).ok_or_else(|| SqmError::UnknownEntity {
            name: name.to_owned(),
        })
    }
}

#[derive(Debug, Default)]
pub struct Metamodel {
    entities: HashMap<String, EntityMapping>,
    polymorphic: HashMap<String, Vec<String>>,
    type_configuration: TypeConfiguration,
}

impl Metamodel {
    #[must_use]
    pub fn new(type_configuration: TypeConfiguration) -> Self {
        Self {
            type_configuration,
            ..Self::default()
        }
    }

    pub fn add_entity(&mut self, entity: EntityMapping) {
        self.entities.insert(entity.name.clone(), entity);
    }

    #[must_use]
    pub fn with_entity(mut self, entity: EntityMapping) -> Self {
        self.add_entity(entity);
        self
    }

    /// Declare `name` as an unmapped type implemented by `implementors`, in
    /// the order queries against it are split.
    #[must_use]
    pub fn with_polymorphic_type(mut self, name: &str, implementors: &[&str]) -> Self {
        self.polymorphic.insert(
            name.to_owned(),
            implementors.iter().map(|s| (*s).to_owned()).collect(),
        );
        self
    }
}

impl MappingMetamodel for Metamodel {
    fn find_entity(&self, name: &str) -> Option<&EntityMapping> {
        self.entities.get(name)
    }

    fn implementors(&self, name: &str) -> Option<&[String]> {
        self.polymorphic.get(name).map(Vec::as_slice)
    }

    fn type_configuration(&self) -> &TypeConfiguration {
        &self.type_configuration
    }
}

// ---------------------------------------------------------------------------
// Entities and attributes
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityMapping {
    pub name: String,
    pub table_name: String,
    pub identifier_name: String,
    pub identifier_column: String,
    pub identifier_type: BasicJavaType,
    attributes: Vec<(String, AttributeMapping)>,
}

impl EntityMapping {
    #[must_use]
    pub fn new(name: &str, table_name: &str, identifier_column: &str) -> Self {
        Self {
            name: name.to_owned(),
            table_name: table_name.to_owned(),
            identifier_name: "id".to_owned(),
            identifier_column: identifier_column.to_owned(),
            identifier_type: BasicJavaType::Long,
            attributes: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_identifier(mut self, name: &str, column: &str, java_type: BasicJavaType) -> Self {
        self.identifier_name = name.to_owned();
        self.identifier_column = column.to_owned();
        self.identifier_type = java_type;
        self
    }

    #[must_use]
    pub fn with_attribute(mut self, name: &str, attribute: AttributeMapping) -> Self {
        self.attributes.push((name.to_owned(), attribute));
        self
    }

    /// Declared attribute by name; the identifier is not among them.
    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<&AttributeMapping> {
        find(&self.attributes, name)
    }

    pub fn find_attribute(&self, name: &str) -> Result<AttributeMapping> {
        if name == self.identifier_name {
            return Ok(AttributeMapping::basic(
                &self.identifier_column,
                self.identifier_type,
            ));
        }
        self.attribute(name)
            .cloned()
            .ok_or_else(|| SqmError::UnknownAttribute {
                container: self.name.clone(),
                attribute: name.to_owned(),
            })
    }

    #[must_use]
    pub fn identifier_jdbc_type(&self, tc: &TypeConfiguration) -> BasicType {
        tc.basic_type(self.identifier_type)
    }

    /// Create the table group of a root (or cross-joined) from-element.
    ///
    /// The group's single table reference is aliased from a fresh alias base
    /// named after the entity.
    pub fn create_root_table_group(
        &self,
        navigable_path: NavigablePath,
        arena: &mut TableGroupArena,
        aliases: &mut SqlAliasBaseManager,
        lock_mode: LockMode,
    ) -> Result<TableGroupId> {
        let mut alias_base = aliases.create_sql_alias_base(&self.name);
        let table_reference = TableReference {
            table_name: self.table_name.clone(),
            identification_variable: alias_base.generate_new_alias(),
        };
        arena.create(
            navigable_path,
            &self.name,
            alias_base.alias_stem(),
            table_reference,
            lock_mode,
        )
    }
}

fn find<'a>(attributes: &'a [(String, AttributeMapping)], name: &str) -> Option<&'a AttributeMapping> {
    attributes.iter().find(|(n, _)| n == name).map(|(_, a)| a)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbeddableMapping {
    pub name: String,
    attributes: Vec<(String, AttributeMapping)>,
}

impl EmbeddableMapping {
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_owned(),
            attributes: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_attribute(mut self, name: &str, attribute: AttributeMapping) -> Self {
        self.attributes.push((name.to_owned(), attribute));
        self
    }

    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<&AttributeMapping> {
        find(&self.attributes, name)
    }

    pub fn attributes(&self) -> impl Iterator<Item = (&str, &AttributeMapping)> {
        self.attributes.iter().map(|(n, a)| (n.as_str(), a))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttributeMapping {
    Basic {
        column: String,
        java_type: BasicJavaType,
    },
    Embedded(EmbeddableMapping),
    /// Many-to-one / one-to-one through a foreign key column on the owner.
    ToOne {
        target_entity: String,
        join_column: String,
    },
    /// One-to-many through a key column on the element table.
    Plural {
        element_entity: String,
        key_column: String,
    },
}

impl AttributeMapping {
    #[must_use]
    pub fn basic(column: &str, java_type: BasicJavaType) -> Self {
        Self::Basic {
            column: column.to_owned(),
            java_type,
        }
    }

    #[must_use]
    pub fn to_one(target_entity: &str, join_column: &str) -> Self {
        Self::ToOne {
            target_entity: target_entity.to_owned(),
            join_column: join_column.to_owned(),
        }
    }

    #[must_use]
    pub fn plural(element_entity: &str, key_column: &str) -> Self {
        Self::Plural {
            element_entity: element_entity.to_owned(),
            key_column: key_column.to_owned(),
        }
    }

    /// Whether joining this attribute produces a table group of its own.
    #[must_use]
    pub const fn is_join_producer(&self) -> bool {
        matches!(self, Self::ToOne { .. } | Self::Plural { .. })
    }

    /// Columns this attribute occupies in its owner's table, in declaration
    /// order. Plural attributes occupy none.
    pub fn columns(
        &self,
        metamodel: &dyn MappingMetamodel,
        qualifier: &str,
    ) -> Result<SmallVec<[ColumnReference; 1]>> {
        let tc = metamodel.type_configuration();
        let mut columns = SmallVec::new();
        match self {
            Self::Basic { column, java_type } => columns.push(ColumnReference {
                qualifier: qualifier.to_owned(),
                column_expression: column.clone(),
                jdbc_mapping: tc.basic_type(*java_type),
            }),
            Self::Embedded(embeddable) => {
                for (_, attribute) in embeddable.attributes() {
                    columns.extend(attribute.columns(metamodel, qualifier)?);
                }
            }
            Self::ToOne {
                target_entity,
                join_column,
            } => {
                let target = metamodel.entity(target_entity)?;
                columns.push(ColumnReference {
                    qualifier: qualifier.to_owned(),
                    column_expression: join_column.clone(),
                    jdbc_mapping: target.identifier_jdbc_type(tc),
                });
            }
            Self::Plural { .. } => {}
        }
        Ok(columns)
    }
}

/// JDBC types a value of `ty` binds as: one per column.
pub fn jdbc_mappings_of(metamodel: &dyn MappingMetamodel, ty: &JavaType) -> Result<JdbcMappings> {
    let tc = metamodel.type_configuration();
    Ok(match ty {
        JavaType::Basic(b) => smallvec::smallvec![tc.basic_type(*b)],
        JavaType::Entity(name) => smallvec::smallvec![metamodel.entity(name)?.identifier_jdbc_type(tc)],
        JavaType::Embeddable(_) => smallvec::smallvec![BasicType::OBJECT],
    })
}

// ---------------------------------------------------------------------------
// Join producer
// ---------------------------------------------------------------------------

/// Build the join of a to-one or plural attribute from `lhs`.
///
/// The joined entity gets a fresh table group whose alias base is named after
/// the attribute; the returned join carries the foreign-key predicate. The
/// join is not attached to `lhs`.
#[allow(clippy::too_many_arguments)]
pub fn create_table_group_join(
    metamodel: &dyn MappingMetamodel,
    attribute: &AttributeMapping,
    lhs: TableGroupId,
    navigable_path: NavigablePath,
    join_type: SqlJoinType,
    arena: &mut TableGroupArena,
    aliases: &mut SqlAliasBaseManager,
    lock_mode: LockMode,
) -> Result<TableGroupJoin> {
    let tc = metamodel.type_configuration();
    let lhs_group = arena.get(lhs).ok_or_else(|| {
        SqmError::internal(format!("table group {lhs} is not part of this statement"))
    })?;
    let lhs_entity = metamodel.entity(&lhs_group.entity_name)?;
    let lhs_qualifier = lhs_group.primary_table_reference.identification_variable.clone();

    let (target, fk_on_lhs, fk_column) = match attribute {
        AttributeMapping::ToOne {
            target_entity,
            join_column,
        } => (metamodel.entity(target_entity)?, true, join_column),
        AttributeMapping::Plural {
            element_entity,
            key_column,
        } => (metamodel.entity(element_entity)?, false, key_column),
        AttributeMapping::Basic { .. } | AttributeMapping::Embedded(_) => {
            return Err(SqmError::internal(format!(
                "attribute at '{navigable_path}' does not produce a table group join"
            )));
        }
    };

    let mut alias_base = aliases.create_sql_alias_base(navigable_path.local_name());
    let table_reference = TableReference {
        table_name: target.table_name.clone(),
        identification_variable: alias_base.generate_new_alias(),
    };
    let rhs_qualifier = table_reference.identification_variable.clone();
    let joined_group = arena.create(
        navigable_path.clone(),
        &target.name,
        alias_base.alias_stem(),
        table_reference,
        lock_mode,
    )?;

    let column = |qualifier: &str, column: &str, jdbc_mapping: BasicType| {
        Expression::Column(ColumnReference {
            qualifier: qualifier.to_owned(),
            column_expression: column.to_owned(),
            jdbc_mapping,
        })
    };
    let predicate = if fk_on_lhs {
        let key_type = target.identifier_jdbc_type(tc);
        Predicate::Comparison {
            lhs: column(&lhs_qualifier, fk_column, key_type),
            operator: ComparisonOperator::Equal,
            rhs: column(&rhs_qualifier, &target.identifier_column, key_type),
        }
    } else {
        let key_type = lhs_entity.identifier_jdbc_type(tc);
        Predicate::Comparison {
            lhs: column(&lhs_qualifier, &lhs_entity.identifier_column, key_type),
            operator: ComparisonOperator::Equal,
            rhs: column(&rhs_qualifier, fk_column, key_type),
        }
    };

    Ok(TableGroupJoin {
        navigable_path,
        join_type,
        joined_group,
        predicate: Some(predicate),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metamodel() -> Metamodel {
        Metamodel::new(TypeConfiguration::new())
            .with_entity(
                EntityMapping::new("Person", "person", "id")
                    .with_attribute("name", AttributeMapping::basic("name", BasicJavaType::String))
                    .with_attribute(
                        "address",
                        AttributeMapping::Embedded(
                            EmbeddableMapping::new("Address")
                                .with_attribute("city", AttributeMapping::basic("city", BasicJavaType::String))
                                .with_attribute("zip", AttributeMapping::basic("zip", BasicJavaType::String)),
                        ),
                    )
                    .with_attribute("employer", AttributeMapping::to_one("Company", "employer_id"))
                    .with_attribute("pets", AttributeMapping::plural("Pet", "owner_id")),
            )
            .with_entity(EntityMapping::new("Company", "company", "id"))
            .with_entity(EntityMapping::new("Pet", "pet", "id"))
            .with_polymorphic_type("Animal", &["Cat", "Dog"])
    }

    #[test]
    fn lookup() {
        let mm = metamodel();
        assert!(mm.find_entity("Person").is_some());
        assert!(matches!(mm.entity("Nope"), Err(SqmError::UnknownEntity { .. })));
        assert_eq!(mm.implementors("Animal").map(<[String]>::len), Some(2));
        assert!(mm.implementors("Person").is_none());
    }

    #[test]
    fn identifier_is_an_attribute() {
        let mm = metamodel();
        let person = mm.entity("Person").unwrap();
        assert_eq!(
            person.find_attribute("id").unwrap(),
            AttributeMapping::basic("id", BasicJavaType::Long)
        );
        assert!(matches!(
            person.find_attribute("age"),
            Err(SqmError::UnknownAttribute { .. })
        ));
    }

    #[test]
    fn embedded_columns_flatten() {
        let mm = metamodel();
        let address = mm.entity("Person").unwrap().find_attribute("address").unwrap();
        let columns = address.columns(&mm, "p1_0").unwrap();
        let names: Vec<_> = columns.iter().map(|c| c.to_string()).collect();
        assert_eq!(names, ["p1_0.city", "p1_0.zip"]);
    }

    #[test]
    fn root_group_aliases() {
        let mm = metamodel();
        let mut arena = TableGroupArena::new();
        let mut aliases = SqlAliasBaseManager::new();
        let person = mm.entity("Person").unwrap();
        let a = person.create_root_table_group(
            NavigablePath::root("Person", Some("p")),
            &mut arena,
            &mut aliases,
            LockMode::None,
        )
        .unwrap();
        let b = person.create_root_table_group(
            NavigablePath::root("Person", Some("q")),
            &mut arena,
            &mut aliases,
            LockMode::None,
        )
        .unwrap();
        assert_eq!(arena.get(a).unwrap().primary_table_reference.to_string(), "person p1_0");
        assert_eq!(arena.get(b).unwrap().primary_table_reference.to_string(), "person p2_0");
    }

    #[test]
    fn to_one_and_plural_joins() {
        let mm = metamodel();
        let mut arena = TableGroupArena::new();
        let mut aliases = SqlAliasBaseManager::new();
        let root_path = NavigablePath::root("Person", Some("p"));
        let person = mm.entity("Person").unwrap();
        let root = person.create_root_table_group(root_path.clone(), &mut arena, &mut aliases, LockMode::None).unwrap();

        let employer = person.find_attribute("employer").unwrap();
        let join = create_table_group_join(
            &mm,
            &employer,
            root,
            root_path.append_aliased("employer", "e"),
            SqlJoinType::Inner,
            &mut arena,
            &mut aliases,
            LockMode::None,
        )
        .unwrap();
        assert_eq!(
            join.predicate.unwrap().to_string(),
            "p1_0.employer_id = e1_0.id"
        );

        let pets = person.find_attribute("pets").unwrap();
        let join = create_table_group_join(
            &mm,
            &pets,
            root,
            root_path.append("pets"),
            SqlJoinType::Left,
            &mut arena,
            &mut aliases,
            LockMode::None,
        )
        .unwrap();
        assert_eq!(join.predicate.unwrap().to_string(), "p1_0.id = p2_0.owner_id");
        assert_eq!(arena.len(), 3);
    }

    #[test]
    fn basic_attribute_is_not_a_join_producer() {
        let mm = metamodel();
        let mut arena = TableGroupArena::new();
        let mut aliases = SqlAliasBaseManager::new();
        let root_path = NavigablePath::root("Person", Some("p"));
        let person = mm.entity("Person").unwrap();
        let root = person.create_root_table_group(root_path.clone(), &mut arena, &mut aliases, LockMode::None).unwrap();
        let name = person.find_attribute("name").unwrap();
        assert!(!name.is_join_producer());
        let err = create_table_group_join(
            &mm,
            &name,
            root,
            root_path.append("name"),
            SqlJoinType::Inner,
            &mut arena,
            &mut aliases,
            LockMode::None,
        )
        .unwrap_err();
        assert_eq!(err.kind(), sqmc_error::ErrorKind::Internal);
    }
}
