//! SQL function registry.
//!
//! Functions are keyed by `(lower-case name, argument count)`. Lookup tries
//! the exact arity first and falls back to the variadic registration
//! (`num_args == -1`). A descriptor turns lowered arguments into a SQL
//! function expression and decides its result type.

use std::collections::HashMap;
use std::sync::Arc;

use sqmc_sql_ast::Expression;
use sqmc_types::{BasicJavaType, BasicType, TypeConfiguration};
use tracing::debug;

/// How a function's result type is determined.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReturnType {
    Fixed(BasicType),
    /// Type of the argument at this position.
    Argument(usize),
    /// Type inferred by the caller from the semantic node.
    Inferred,
}

/// Descriptor of one SQL function.
pub trait SqlFunctionDescriptor: Send + Sync {
    fn name(&self) -> &str;

    /// Exact argument count, or `-1` for variadic.
    fn num_args(&self) -> i32;

    fn return_type(&self, arguments: &[Expression], inferred: BasicType) -> BasicType;

    fn generate(&self, arguments: Vec<Expression>, inferred: BasicType) -> Expression {
        let ty = self.return_type(&arguments, inferred);
        Expression::Function {
            name: self.name().to_owned(),
            arguments,
            ty,
        }
    }
}

/// A function rendered as `name(args...)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StandardFunction {
    name: String,
    num_args: i32,
    return_type: ReturnType,
}

impl StandardFunction {
    #[must_use]
    pub fn new(name: &str, num_args: i32, return_type: ReturnType) -> Self {
        Self {
            name: canonical_name(name),
            num_args,
            return_type,
        }
    }
}

impl SqlFunctionDescriptor for StandardFunction {
    fn name(&self) -> &str {
        &self.name
    }

    fn num_args(&self) -> i32 {
        self.num_args
    }

    fn return_type(&self, arguments: &[Expression], inferred: BasicType) -> BasicType {
        match self.return_type {
            ReturnType::Fixed(ty) => ty,
            ReturnType::Argument(i) => arguments
                .get(i)
                .and_then(Expression::single_type)
                .unwrap_or(inferred),
            ReturnType::Inferred => inferred,
        }
    }
}

fn canonical_name(name: &str) -> String {
    name.to_ascii_lowercase()
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct FunctionKey {
    name: String,
    num_args: i32,
}

#[derive(Default)]
pub struct SqlFunctionRegistry {
    functions: HashMap<FunctionKey, Arc<dyn SqlFunctionDescriptor>>,
}

impl std::fmt::Debug for SqlFunctionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqlFunctionRegistry")
            .field("functions", &self.functions.len())
            .finish()
    }
}

impl SqlFunctionRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the functions the converter emits or maps named
    /// semantic functions onto.
    #[must_use]
    pub fn standard(tc: &TypeConfiguration) -> Self {
        let mut registry = Self::new();
        let fixed = |java_type| ReturnType::Fixed(tc.basic_type(java_type));
        let first = ReturnType::Argument(0);
        let standard = [
            ("timestampadd", 3, ReturnType::Argument(2)),
            ("timestampdiff", 3, ReturnType::Fixed(BasicType::LONG)),
            ("avg", 1, fixed(BasicJavaType::Double)),
            ("sum", 1, first),
            ("min", 1, first),
            ("max", 1, first),
            ("count", 1, ReturnType::Fixed(BasicType::LONG)),
            ("substring", -1, fixed(BasicJavaType::String)),
            ("trim", 3, fixed(BasicJavaType::String)),
            ("cast", 1, ReturnType::Inferred),
            ("upper", 1, first),
            ("lower", 1, first),
            ("length", 1, ReturnType::Fixed(BasicType::INTEGER)),
            ("locate", -1, ReturnType::Fixed(BasicType::INTEGER)),
            ("abs", 1, first),
            ("mod", 2, first),
            ("coalesce", -1, first),
            ("nullif", 2, first),
            ("concat", -1, fixed(BasicJavaType::String)),
            ("current_date", 0, fixed(BasicJavaType::LocalDate)),
            ("current_time", 0, fixed(BasicJavaType::LocalTime)),
            ("current_timestamp", 0, fixed(BasicJavaType::LocalDateTime)),
            ("extract", 2, ReturnType::Fixed(BasicType::INTEGER)),
        ];
        for (name, num_args, return_type) in standard {
            registry.register(StandardFunction::new(name, num_args, return_type));
        }
        registry
    }

    /// Register a function; returns the one it replaced, if any.
    pub fn register<F>(&mut self, function: F) -> Option<Arc<dyn SqlFunctionDescriptor>>
    where
        F: SqlFunctionDescriptor + 'static,
    {
        let key = FunctionKey {
            name: canonical_name(function.name()),
            num_args: function.num_args(),
        };
        self.functions.insert(key, Arc::new(function))
    }

    /// Look up by name and argument count, falling back to a variadic
    /// registration.
    #[must_use]
    pub fn find(&self, name: &str, num_args: usize) -> Option<Arc<dyn SqlFunctionDescriptor>> {
        let canon = canonical_name(name);
        let arity = i32::try_from(num_args).unwrap_or(i32::MAX);
        let exact = FunctionKey {
            name: canon.clone(),
            num_args: arity,
        };
        if let Some(f) = self.functions.get(&exact) {
            debug!(target: "sqmc.functions", name = %canon, arity, hit = "exact", "registry lookup");
            return Some(Arc::clone(f));
        }
        let variadic = FunctionKey {
            name: canon.clone(),
            num_args: -1,
        };
        let result = self.functions.get(&variadic).map(Arc::clone);
        debug!(
            target: "sqmc.functions",
            name = %canon,
            arity,
            hit = if result.is_some() { "variadic" } else { "miss" },
            "registry lookup"
        );
        result
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.functions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }
}
