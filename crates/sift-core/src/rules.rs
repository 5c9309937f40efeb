//! Keyword rule matching for category suggestions
//!
//! Rules are first-match: the caller supplies them ordered by descending
//! priority, then recency (the order [`crate::db::Database::list_rules`]
//! returns), and the first rule whose keyword is a case-insensitive
//! substring of the description wins.

use crate::models::{CategoryRule, ParsedTransaction};

/// Maximum length of a keyword derived from a description
const DERIVED_KEYWORD_MAX: usize = 20;

/// Find the winning rule for a description, if any
pub fn match_rule<'a>(description: &str, rules: &'a [CategoryRule]) -> Option<&'a CategoryRule> {
    let haystack = description.to_lowercase();
    rules
        .iter()
        .find(|rule| haystack.contains(&rule.keyword.to_lowercase()))
}

/// Pre-fill suggested categories on freshly ingested transactions.
///
/// Transactions that already carry a category are left alone; the decision
/// to persist a suggestion belongs to the caller.
pub fn apply_suggestions(transactions: &mut [ParsedTransaction], rules: &[CategoryRule]) {
    for tx in transactions.iter_mut() {
        if tx.category_id.is_some() {
            continue;
        }
        if let Some(rule) = match_rule(&tx.description, rules) {
            tx.category_id = Some(rule.category_id);
            tx.category_name = rule.category_name.clone();
        }
    }
}

/// Derive a rule keyword from a transaction description: the first two
/// words, or the first 20 characters when the description has no spaces.
pub fn derive_keyword(description: &str) -> String {
    let mut words = description.split_whitespace();
    match (words.next(), words.next()) {
        (Some(first), Some(second)) => format!("{} {}", first, second),
        (Some(first), None) => first.chars().take(DERIVED_KEYWORD_MAX).collect(),
        (None, _) => description.chars().take(DERIVED_KEYWORD_MAX).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn make_rule(keyword: &str, category_id: i64, priority: i32) -> CategoryRule {
        CategoryRule {
            id: category_id,
            user_id: 1,
            category_id,
            keyword: keyword.to_string(),
            priority,
            category_name: None,
            created_at: Utc::now(),
        }
    }

    /// Order rules the way the store returns them: priority desc, newest first
    fn ordered(mut rules: Vec<CategoryRule>) -> Vec<CategoryRule> {
        rules.sort_by(|a, b| b.priority.cmp(&a.priority).then(b.id.cmp(&a.id)));
        rules
    }

    #[test]
    fn test_match_case_insensitive_substring() {
        let rules = vec![make_rule("uber", 1, 1)];
        let matched = match_rule("UBER RIDE DOWNTOWN", &rules).unwrap();
        assert_eq!(matched.category_id, 1);
    }

    #[test]
    fn test_no_match() {
        let rules = vec![make_rule("uber", 1, 1)];
        assert!(match_rule("STARBUCKS", &rules).is_none());
    }

    #[test]
    fn test_higher_priority_wins() {
        let rules = ordered(vec![
            make_rule("uber", 1, 1),
            make_rule("uber eats", 2, 5),
        ]);
        // Both keywords match; the priority-5 rule comes first
        let matched = match_rule("UBER EATS TRIP", &rules).unwrap();
        assert_eq!(matched.category_id, 2);
    }

    #[test]
    fn test_first_match_not_longest_match() {
        // Same priority: recency (higher id here) decides, not keyword length
        let rules = ordered(vec![
            make_rule("uber eats delivery", 1, 1),
            make_rule("uber", 2, 1),
        ]);
        let matched = match_rule("UBER EATS DELIVERY", &rules).unwrap();
        assert_eq!(matched.category_id, 2);
    }

    #[test]
    fn test_apply_suggestions_skips_categorized() {
        let rules = vec![make_rule("uber", 7, 1)];
        let mut txs = vec![
            ParsedTransaction {
                date: chrono::NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
                amount: rust_decimal::Decimal::new(5000, 2),
                direction: crate::models::Direction::Debit,
                description: "Uber ride".to_string(),
                category_id: None,
                category_name: None,
            },
            ParsedTransaction {
                date: chrono::NaiveDate::from_ymd_opt(2024, 1, 16).unwrap(),
                amount: rust_decimal::Decimal::new(5000, 2),
                direction: crate::models::Direction::Debit,
                description: "Uber ride".to_string(),
                category_id: Some(3),
                category_name: None,
            },
        ];
        apply_suggestions(&mut txs, &rules);
        assert_eq!(txs[0].category_id, Some(7));
        assert_eq!(txs[1].category_id, Some(3));
    }

    #[test]
    fn test_derive_keyword_two_words() {
        assert_eq!(derive_keyword("Uber ride downtown"), "Uber ride");
    }

    #[test]
    fn test_derive_keyword_single_word_capped() {
        assert_eq!(derive_keyword("Uber"), "Uber");
        assert_eq!(
            derive_keyword("PAYPAL*REALLYLONGMERCHANTNAME123"),
            "PAYPAL*REALLYLONGMER"
        );
    }
}
