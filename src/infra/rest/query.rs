//! Table query builder for the hosted platform's REST dialect.
//!
//! Filters render to `column=op.value` query pairs; OR-combined substring
//! filters render to a single `or=(...)` pair. Free-text terms are sanitized
//! before interpolation so user input cannot inject additional operators.

use std::fmt::Display;

/// A composable table query: equality/range/substring filters, one ordering
/// column, and an offset/limit window.
#[derive(Debug, Clone, Default)]
pub struct TableQuery {
    select: Option<String>,
    filters: Vec<(String, String)>,
    order: Option<String>,
    offset: Option<u64>,
    limit: Option<u64>,
}

impl TableQuery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Projection, including embedded joins (`*,category:categories(name)`).
    pub fn select(mut self, columns: &str) -> Self {
        self.select = Some(columns.to_string());
        self
    }

    pub fn eq(mut self, column: &str, value: impl Display) -> Self {
        self.filters.push((column.to_string(), format!("eq.{value}")));
        self
    }

    pub fn is_true(mut self, column: &str) -> Self {
        self.filters.push((column.to_string(), "is.true".to_string()));
        self
    }

    pub fn not_true(mut self, column: &str) -> Self {
        self.filters
            .push((column.to_string(), "not.is.true".to_string()));
        self
    }

    /// OR-combined case-insensitive substring match over several columns.
    pub fn ilike_any(mut self, columns: &[&str], term: &str) -> Self {
        let needle = sanitize_term(term);
        if needle.is_empty() {
            return self;
        }
        let clauses: Vec<String> = columns
            .iter()
            .map(|column| format!("{column}.ilike.*{needle}*"))
            .collect();
        self.filters
            .push(("or".to_string(), format!("({})", clauses.join(","))));
        self
    }

    /// Inclusive timestamp range on one column.
    pub fn created_between(mut self, column: &str, from: &str, to: &str) -> Self {
        self.filters.push((column.to_string(), format!("gte.{from}")));
        self.filters.push((column.to_string(), format!("lte.{to}")));
        self
    }

    pub fn order_asc(mut self, column: &str) -> Self {
        self.order = Some(format!("{column}.asc"));
        self
    }

    pub fn order_desc(mut self, column: &str) -> Self {
        self.order = Some(format!("{column}.desc"));
        self
    }

    pub fn window(mut self, offset: u64, limit: u64) -> Self {
        self.offset = Some(offset);
        self.limit = Some(limit);
        self
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Render to query pairs in a stable order.
    pub fn into_pairs(self) -> Vec<(String, String)> {
        let mut pairs = Vec::with_capacity(self.filters.len() + 4);
        if let Some(select) = self.select {
            pairs.push(("select".to_string(), select));
        }
        pairs.extend(self.filters);
        if let Some(order) = self.order {
            pairs.push(("order".to_string(), order));
        }
        if let Some(offset) = self.offset {
            pairs.push(("offset".to_string(), offset.to_string()));
        }
        if let Some(limit) = self.limit {
            pairs.push(("limit".to_string(), limit.to_string()));
        }
        pairs
    }
}

/// Strip the characters the filter grammar reserves. The term is user input
/// headed for an `or=(...)` clause.
fn sanitize_term(term: &str) -> String {
    term.chars()
        .filter(|ch| !matches!(ch, '*' | ',' | '(' | ')' | '.' | '"'))
        .collect::<String>()
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_equality_order_and_window() {
        let pairs = TableQuery::new()
            .select("*")
            .eq("country", "us")
            .order_desc("created_at")
            .window(24, 12)
            .into_pairs();

        assert_eq!(
            pairs,
            vec![
                ("select".to_string(), "*".to_string()),
                ("country".to_string(), "eq.us".to_string()),
                ("order".to_string(), "created_at.desc".to_string()),
                ("offset".to_string(), "24".to_string()),
                ("limit".to_string(), "12".to_string()),
            ]
        );
    }

    #[test]
    fn ilike_any_combines_columns_with_or() {
        let pairs = TableQuery::new()
            .ilike_any(&["name", "description"], "spa")
            .into_pairs();
        assert_eq!(
            pairs,
            vec![(
                "or".to_string(),
                "(name.ilike.*spa*,description.ilike.*spa*)".to_string()
            )]
        );
    }

    #[test]
    fn search_term_is_sanitized() {
        let pairs = TableQuery::new()
            .ilike_any(&["name"], "a*b,(c).d\"")
            .into_pairs();
        assert_eq!(pairs[0].1, "(name.ilike.*abcd*)");
    }

    #[test]
    fn blank_term_adds_no_filter() {
        let pairs = TableQuery::new().ilike_any(&["name"], "  **  ").into_pairs();
        assert!(pairs.is_empty());
    }

    #[test]
    fn timestamp_range_uses_both_bounds() {
        let pairs = TableQuery::new()
            .created_between("created_at", "2024-01-01", "2024-12-31")
            .into_pairs();
        assert_eq!(pairs.len(), 2);
        assert_eq!(pairs[0].1, "gte.2024-01-01");
        assert_eq!(pairs[1].1, "lte.2024-12-31");
    }
}
