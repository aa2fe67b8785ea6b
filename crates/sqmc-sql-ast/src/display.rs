//! SQL-like rendering of lowered nodes via `fmt::Display`.
//!
//! The output is for trace logs and assertions, not for execution: dialect
//! specific rendering happens downstream.

#[allow(clippy::wildcard_imports)]
use crate::*;
use std::fmt;

fn comma_list<T: fmt::Display>(f: &mut fmt::Formatter<'_>, items: &[T]) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{item}")?;
    }
    Ok(())
}

/// A node rendered against the arena of its statement, if known.
///
/// With an arena every query spec, nested ones included, expands its table
/// groups; without one, groups render by id (`tg0`).
struct Rendered<'a, T> {
    node: &'a T,
    arena: Option<&'a TableGroupArena>,
}

const fn rendered<'a, T>(node: &'a T, arena: Option<&'a TableGroupArena>) -> Rendered<'a, T> {
    Rendered { node, arena }
}

impl<'a, T> Rendered<'a, T> {
    const fn child<U>(&self, node: &'a U) -> Rendered<'a, U> {
        rendered(node, self.arena)
    }
}

fn expression_list(
    f: &mut fmt::Formatter<'_>,
    items: &[Expression],
    arena: Option<&TableGroupArena>,
) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{}", rendered(item, arena))?;
    }
    Ok(())
}

impl fmt::Display for ColumnReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.qualifier, self.column_expression)
    }
}

impl fmt::Display for TableReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.table_name, self.identification_variable)
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&rendered(self, None), f)
    }
}

impl fmt::Display for Rendered<'_, Expression> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let arena = self.arena;
        match self.node {
            Expression::Column(c) => write!(f, "{c}"),
            Expression::Navigable(n) => {
                if let [single] = n.columns.as_slice() {
                    write!(f, "{single}")
                } else {
                    f.write_str("(")?;
                    comma_list(f, &n.columns)?;
                    f.write_str(")")
                }
            }
            Expression::QueryLiteral { value, .. } => write!(f, "{value}"),
            Expression::Parameter { jdbc_parameters } => {
                if jdbc_parameters.len() == 1 {
                    f.write_str("?")
                } else {
                    f.write_str("(")?;
                    for i in 0..jdbc_parameters.len() {
                        if i > 0 {
                            f.write_str(", ")?;
                        }
                        f.write_str("?")?;
                    }
                    f.write_str(")")
                }
            }
            Expression::Tuple(elements) => {
                f.write_str("(")?;
                expression_list(f, elements, arena)?;
                f.write_str(")")
            }
            Expression::Unary { operator, operand, .. } => write!(f, "{operator}{}", self.child(operand.as_ref())),
            Expression::BinaryArithmetic { lhs, operator, rhs, .. } => {
                write!(f, "({} {operator} {})", self.child(lhs.as_ref()), self.child(rhs.as_ref()))
            }
            Expression::Duration { magnitude, unit, .. } => write!(f, "({} {unit})", self.child(magnitude.as_ref())),
            Expression::DurationUnit { unit, .. } => write!(f, "{unit}"),
            Expression::Conversion { duration, unit, .. } => write!(f, "({} by {unit})", self.child(duration.as_ref())),
            Expression::Function { name, arguments, .. } => {
                write!(f, "{name}(")?;
                expression_list(f, arguments, arena)?;
                f.write_str(")")
            }
            Expression::Star => f.write_str("*"),
            Expression::Distinct(inner) => write!(f, "distinct {}", self.child(inner.as_ref())),
            Expression::CaseSimple {
                fixture,
                whens,
                otherwise,
                ..
            } => {
                write!(f, "case {}", self.child(fixture.as_ref()))?;
                for (test, result) in whens {
                    write!(f, " when {} then {}", self.child(test), self.child(result))?;
                }
                if let Some(o) = otherwise {
                    write!(f, " else {}", self.child(o.as_ref()))?;
                }
                f.write_str(" end")
            }
            Expression::CaseSearched { whens, otherwise, .. } => {
                f.write_str("case")?;
                for (predicate, result) in whens {
                    write!(f, " when {} then {}", rendered(predicate, arena), self.child(result))?;
                }
                if let Some(o) = otherwise {
                    write!(f, " else {}", self.child(o.as_ref()))?;
                }
                f.write_str(" end")
            }
            Expression::SubQuery { query_spec, .. } => {
                write!(f, "({})", rendered(query_spec.as_ref(), arena))
            }
        }
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&rendered(self, None), f)
    }
}

impl fmt::Display for Rendered<'_, Predicate> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let arena = self.arena;
        let not = |negated: bool| if negated { "not " } else { "" };
        match self.node {
            Predicate::Junction { kind, predicates } => {
                let sep = match kind {
                    JunctionKind::Conjunction => " and ",
                    JunctionKind::Disjunction => " or ",
                };
                for (i, p) in predicates.iter().enumerate() {
                    if i > 0 {
                        f.write_str(sep)?;
                    }
                    write!(f, "{}", rendered(p, arena))?;
                }
                Ok(())
            }
            Predicate::Negated(p) => write!(f, "not ({})", rendered(p.as_ref(), arena)),
            Predicate::Grouped(p) => write!(f, "({})", rendered(p.as_ref(), arena)),
            Predicate::Comparison { lhs, operator, rhs } => write!(f, "{} {operator} {}", self.child(lhs), self.child(rhs)),
            Predicate::Between {
                expression,
                lower_bound,
                upper_bound,
                negated,
            } => write!(
                f,
                "{} {}between {} and {}",
                self.child(expression),
                not(*negated),
                self.child(lower_bound),
                self.child(upper_bound)
            ),
            Predicate::Like {
                match_expression,
                pattern,
                escape_character,
                negated,
            } => {
                write!(f, "{} {}like {}", self.child(match_expression), not(*negated), self.child(pattern))?;
                if let Some(e) = escape_character {
                    write!(f, " escape {}", self.child(e))?;
                }
                Ok(())
            }
            Predicate::InList {
                test_expression,
                list_expressions,
                negated,
            } => {
                write!(f, "{} {}in (", self.child(test_expression), not(*negated))?;
                expression_list(f, list_expressions, arena)?;
                f.write_str(")")
            }
            Predicate::InSubQuery {
                test_expression,
                sub_query,
                negated,
            } => write!(
                f,
                "{} {}in ({})",
                self.child(test_expression),
                not(*negated),
                rendered(sub_query.as_ref(), arena)
            ),
            Predicate::Nullness { expression, negated } => {
                write!(f, "{} is {}null", self.child(expression), not(*negated))
            }
            Predicate::BooleanExpression(e) => write!(f, "{}", self.child(e)),
        }
    }
}

/// Renders a query spec without expanding table groups (`from tg0`).
impl fmt::Display for QuerySpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&rendered(self, None), f)
    }
}

/// A query spec rendered together with its table groups.
pub struct QuerySpecDisplay<'a> {
    pub(crate) spec: &'a QuerySpec,
    pub(crate) arena: &'a TableGroupArena,
}

impl fmt::Display for QuerySpecDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&rendered(self.spec, Some(self.arena)), f)
    }
}

impl fmt::Display for Rendered<'_, QuerySpec> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (spec, arena) = (self.node, self.arena);

        f.write_str("select ")?;
        if spec.select_clause.distinct {
            f.write_str("distinct ")?;
        }
        let selections = spec.select_clause.sql_selections();
        if selections.is_empty() {
            f.write_str("*")?;
        }
        for (i, s) in selections.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}", self.child(&s.expression))?;
        }

        f.write_str(" from ")?;
        for (i, root) in spec.from_clause.roots.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            match arena {
                Some(arena) => write_table_group(f, arena, *root)?,
                None => write!(f, "{root}")?,
            }
        }

        if let Some(w) = &spec.where_clause {
            write!(f, " where {}", rendered(w, arena))?;
        }
        if !spec.sort_specifications.is_empty() {
            f.write_str(" order by ")?;
            for (i, s) in spec.sort_specifications.iter().enumerate() {
                if i > 0 {
                    f.write_str(", ")?;
                }
                write!(f, "{} {}", self.child(&s.sort_expression), s.sort_order)?;
            }
        }
        if let Some(l) = &spec.limit_clause_expression {
            write!(f, " limit {}", self.child(l))?;
        }
        if let Some(o) = &spec.offset_clause_expression {
            write!(f, " offset {}", self.child(o))?;
        }
        Ok(())
    }
}

fn write_table_group(
    f: &mut fmt::Formatter<'_>,
    arena: &TableGroupArena,
    id: TableGroupId,
) -> fmt::Result {
    let Some(group) = arena.get(id) else {
        return write!(f, "{id}");
    };
    write!(f, "{}", group.primary_table_reference)?;
    for join in &group.table_group_joins {
        write!(f, " {} ", join.join_type)?;
        write_table_group(f, arena, join.joined_group)?;
        if let Some(p) = &join.predicate {
            write!(f, " on {}", rendered(p, Some(arena)))?;
        }
    }
    Ok(())
}
