//! Query parameters: bindings, the domain-parameter cross reference, the
//! JDBC placeholder registry, and the fallback type.
//!
//! A query parameter (`:name`, `?1`, or a criteria parameter) may occur
//! several times in a statement, and one occurrence may expand into several
//! JDBC placeholders. The cross reference records, per semantic parameter
//! occurrence, which query parameter it belongs to, and which copies the
//! converter made of it while expanding multi-valued bindings or
//! de-duplicating repeated occurrences.

use std::collections::HashMap;

use smallvec::smallvec;
use sqmc_error::Result;
use sqmc_sqm::walker::SemanticQueryWalker;
use sqmc_sqm::{ParameterId, ParameterKind, SqmParameter, SqmStatement};
use sqmc_sql_ast::JdbcParameter;
use sqmc_types::{BasicType, JavaType, JdbcMappings, LiteralValue};

// ---------------------------------------------------------------------------
// Bindings
// ---------------------------------------------------------------------------

/// The value(s) bound to one query parameter.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParameterBinding {
    bind_type: Option<JavaType>,
    values: Vec<LiteralValue>,
    multi_valued: bool,
}

impl ParameterBinding {
    #[must_use]
    pub fn single(value: LiteralValue) -> Self {
        Self {
            bind_type: None,
            values: vec![value],
            multi_valued: false,
        }
    }

    #[must_use]
    pub fn multi(values: Vec<LiteralValue>) -> Self {
        Self {
            bind_type: None,
            values,
            multi_valued: true,
        }
    }

    #[must_use]
    pub fn with_bind_type(mut self, ty: JavaType) -> Self {
        self.bind_type = Some(ty);
        self
    }

    #[must_use]
    pub const fn is_multi_valued(&self) -> bool {
        self.multi_valued
    }

    #[must_use]
    pub fn bind_values(&self) -> &[LiteralValue] {
        &self.values
    }

    /// Declared bind type, else the natural type of the first non-null value.
    #[must_use]
    pub fn bind_type(&self) -> Option<JavaType> {
        self.bind_type.clone().or_else(|| {
            self.values
                .iter()
                .find_map(LiteralValue::natural_type)
                .map(JavaType::Basic)
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryParameterBindings {
    bindings: HashMap<ParameterKind, ParameterBinding>,
}

impl QueryParameterBindings {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bind(&mut self, parameter: ParameterKind, binding: ParameterBinding) {
        self.bindings.insert(parameter, binding);
    }

    #[must_use]
    pub fn with_binding(mut self, parameter: ParameterKind, binding: ParameterBinding) -> Self {
        self.bind(parameter, binding);
        self
    }

    #[must_use]
    pub fn binding(&self, parameter: &ParameterKind) -> Option<&ParameterBinding> {
        self.bindings.get(parameter)
    }
}

// ---------------------------------------------------------------------------
// Domain parameter cross reference
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DomainParameterXref {
    query_parameters: HashMap<ParameterId, ParameterKind>,
    occurrences: HashMap<ParameterKind, Vec<ParameterId>>,
    expansions: HashMap<ParameterId, Vec<ParameterId>>,
    duplicates: HashMap<ParameterId, Vec<ParameterId>>,
}

impl DomainParameterXref {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Collect every parameter occurrence of a statement.
    pub fn from_statement(statement: &SqmStatement) -> Result<Self> {
        let mut collector = ParameterCollector {
            xref: Self::new(),
        };
        collector.visit_statement(statement)?;
        Ok(collector.xref)
    }

    fn register(&mut self, parameter: &SqmParameter) {
        if self
            .query_parameters
            .insert(parameter.id, parameter.kind.clone())
            .is_none()
        {
            self.occurrences
                .entry(parameter.kind.clone())
                .or_default()
                .push(parameter.id);
        }
    }

    /// Query parameter a semantic parameter occurrence belongs to.
    #[must_use]
    pub fn query_parameter(&self, id: ParameterId) -> Option<&ParameterKind> {
        self.query_parameters.get(&id)
    }

    /// Occurrences of a query parameter, in discovery order.
    #[must_use]
    pub fn occurrences(&self, parameter: &ParameterKind) -> &[ParameterId] {
        self.occurrences.get(parameter).map_or(&[], Vec::as_slice)
    }

    /// Number of distinct query parameters.
    #[must_use]
    pub fn query_parameter_count(&self) -> usize {
        self.occurrences.len()
    }

    /// Record that `expansion` stands for one additional value of the
    /// multi-valued `original`.
    pub fn add_expansion(&mut self, original: &SqmParameter, expansion: &SqmParameter) {
        self.register(expansion);
        self.expansions
            .entry(original.id)
            .or_default()
            .push(expansion.id);
    }

    #[must_use]
    pub fn expansions(&self, original: ParameterId) -> &[ParameterId] {
        self.expansions.get(&original).map_or(&[], Vec::as_slice)
    }

    #[must_use]
    pub fn expansion_count(&self) -> usize {
        self.expansions.values().map(Vec::len).sum()
    }

    /// Record that `copy` replaced a repeated occurrence of `original`.
    pub fn add_duplicate(&mut self, original: &SqmParameter, copy: &SqmParameter) {
        self.register(copy);
        self.duplicates.entry(original.id).or_default().push(copy.id);
    }

    #[must_use]
    pub fn duplicates(&self, original: ParameterId) -> &[ParameterId] {
        self.duplicates.get(&original).map_or(&[], Vec::as_slice)
    }
}

struct ParameterCollector {
    xref: DomainParameterXref,
}

impl SemanticQueryWalker for ParameterCollector {
    fn visit_parameter(&mut self, parameter: &SqmParameter) -> Result<SqmParameter> {
        self.xref.register(parameter);
        Ok(parameter.clone())
    }
}

// ---------------------------------------------------------------------------
// JDBC parameters
// ---------------------------------------------------------------------------

/// Ordered registry of the JDBC placeholders of one statement.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JdbcParameters {
    parameters: Vec<JdbcParameter>,
}

impl JdbcParameters {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a placeholder; positions are assigned in creation order.
    pub fn add(&mut self, jdbc_mapping: BasicType) -> JdbcParameter {
        let parameter = JdbcParameter {
            position: self.parameters.len(),
            jdbc_mapping,
        };
        self.parameters.push(parameter);
        parameter
    }

    #[must_use]
    pub fn parameters(&self) -> &[JdbcParameter] {
        &self.parameters
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.parameters.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.parameters.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Fallback type
// ---------------------------------------------------------------------------

/// Type of a parameter whose type could not be inferred from its context,
/// its declaration, or its binding: a single untyped `Object` column.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParameterFallbackType;

impl ParameterFallbackType {
    #[must_use]
    pub const fn java_type(self) -> JavaType {
        JavaType::OBJECT
    }

    #[must_use]
    pub fn jdbc_mappings(self) -> JdbcMappings {
        smallvec![BasicType::OBJECT]
    }

    #[must_use]
    pub const fn jdbc_type_count(self) -> usize {
        1
    }
}
