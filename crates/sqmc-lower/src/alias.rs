//! SQL alias generation.
//!
//! Every table group gets an alias base such as `p1` derived from the name of
//! the entity or attribute it was created for; the tables inside the group are
//! then aliased `p1_0`, `p1_1`, ... Bases are unique within one conversion
//! session.

use std::collections::HashMap;

/// Alias stem for a name: the lower-cased first letter plus every later
/// upper-case letter of its unqualified part (`OrderLine` -> `ol`).
#[must_use]
pub fn alias_stem(name: &str) -> String {
    let unqualified = name.rsplit('.').next().unwrap_or(name);
    let mut chars = unqualified.chars().filter(|c| c.is_alphanumeric());
    let Some(first) = chars.next() else {
        return "t".to_owned();
    };
    let mut stem: String = first.to_lowercase().collect();
    stem.extend(
        chars
            .filter(char::is_ascii_uppercase)
            .map(|c| c.to_ascii_lowercase()),
    );
    stem
}

/// Source of table aliases for one table group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SqlAliasBase {
    alias_stem: String,
    next_table: u32,
}

impl SqlAliasBase {
    #[must_use]
    pub fn alias_stem(&self) -> &str {
        &self.alias_stem
    }

    /// Next table alias of this base: `p1_0`, then `p1_1`, ...
    pub fn generate_new_alias(&mut self) -> String {
        let alias = format!("{}_{}", self.alias_stem, self.next_table);
        self.next_table += 1;
        alias
    }
}

#[derive(Debug, Default)]
pub struct SqlAliasBaseManager {
    stem_usage: HashMap<String, u32>,
}

impl SqlAliasBaseManager {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create_sql_alias_base(&mut self, name: &str) -> SqlAliasBase {
        let stem = alias_stem(name);
        let count = self.stem_usage.entry(stem.clone()).or_insert(0);
        *count += 1;
        SqlAliasBase {
            alias_stem: format!("{stem}{count}"),
            next_table: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stems() {
        assert_eq!(alias_stem("Person"), "p");
        assert_eq!(alias_stem("OrderLine"), "ol");
        assert_eq!(alias_stem("com.acme.OrderLine"), "ol");
        assert_eq!(alias_stem("address"), "a");
        assert_eq!(alias_stem(""), "t");
    }

    #[test]
    fn bases_are_unique_per_stem() {
        let mut manager = SqlAliasBaseManager::new();
        let mut p1 = manager.create_sql_alias_base("Person");
        let p2 = manager.create_sql_alias_base("Pet");
        let a1 = manager.create_sql_alias_base("address");
        assert_eq!(p1.alias_stem(), "p1");
        assert_eq!(p2.alias_stem(), "p2");
        assert_eq!(a1.alias_stem(), "a1");
        assert_eq!(p1.generate_new_alias(), "p1_0");
        assert_eq!(p1.generate_new_alias(), "p1_1");
    }
}
