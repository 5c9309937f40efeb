//! Database layer tests

use std::str::FromStr;

use chrono::NaiveDate;
use rust_decimal::Decimal;

use super::Database;
use crate::error::Error;
use crate::models::{Direction, NewTransaction};

fn test_db() -> Database {
    let db = Database::in_memory().unwrap();
    db.seed_default_categories().unwrap();
    db
}

fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

fn new_tx(date_str: &str, amount: &str, direction: Direction, description: &str) -> NewTransaction {
    NewTransaction {
        date: date(date_str),
        amount: dec(amount),
        direction,
        description: description.to_string(),
        category_id: None,
        notes: None,
    }
}

// ========== Users & Sessions ==========

#[test]
fn test_create_user_and_authenticate() {
    let db = test_db();
    let user = db.create_user("alice", "alice@example.com", "hunter2").unwrap();
    assert_eq!(user.username, "alice");

    let authed = db.authenticate("alice", "hunter2").unwrap();
    assert_eq!(authed.id, user.id);

    assert!(matches!(
        db.authenticate("alice", "wrong"),
        Err(Error::Auth(_))
    ));
    assert!(matches!(
        db.authenticate("nobody", "hunter2"),
        Err(Error::Auth(_))
    ));
}

#[test]
fn test_duplicate_username_rejected() {
    let db = test_db();
    db.create_user("alice", "", "pw").unwrap();
    assert!(matches!(
        db.create_user("alice", "", "pw2"),
        Err(Error::InvalidData(_))
    ));
}

#[test]
fn test_session_roundtrip() {
    let db = test_db();
    let user = db.create_user("alice", "", "pw").unwrap();

    let token = db.create_session(user.id).unwrap();
    let resolved = db.user_for_token(&token).unwrap().unwrap();
    assert_eq!(resolved.id, user.id);

    assert!(db.user_for_token("bogus-token").unwrap().is_none());

    db.delete_session(&token).unwrap();
    assert!(db.user_for_token(&token).unwrap().is_none());
}

#[test]
fn test_local_user_is_stable() {
    let db = test_db();
    let first = db.get_or_create_local_user().unwrap();
    let second = db.get_or_create_local_user().unwrap();
    assert_eq!(first.id, second.id);
}

// ========== Categories ==========

#[test]
fn test_defaults_visible_to_all_users() {
    let db = test_db();
    let alice = db.create_user("alice", "", "pw").unwrap();
    let bob = db.create_user("bob", "", "pw").unwrap();

    let alice_cats = db.list_categories(alice.id).unwrap();
    let bob_cats = db.list_categories(bob.id).unwrap();
    assert!(!alice_cats.is_empty());
    assert_eq!(alice_cats.len(), bob_cats.len());
    assert!(alice_cats.iter().all(|c| c.is_default));
}

#[test]
fn test_custom_category_scoped_to_owner() {
    let db = test_db();
    let alice = db.create_user("alice", "", "pw").unwrap();
    let bob = db.create_user("bob", "", "pw").unwrap();

    let custom = db.create_category(alice.id, "Crafts", Some("#112233")).unwrap();
    assert!(!custom.is_default);

    let alice_names: Vec<_> = db
        .list_categories(alice.id)
        .unwrap()
        .into_iter()
        .map(|c| c.name)
        .collect();
    assert!(alice_names.contains(&"Crafts".to_string()));

    let bob_names: Vec<_> = db
        .list_categories(bob.id)
        .unwrap()
        .into_iter()
        .map(|c| c.name)
        .collect();
    assert!(!bob_names.contains(&"Crafts".to_string()));

    assert!(db.get_visible_category(custom.id, bob.id).unwrap().is_none());
}

#[test]
fn test_default_category_is_read_only() {
    let db = test_db();
    let alice = db.create_user("alice", "", "pw").unwrap();
    let default = db.list_categories(alice.id).unwrap().remove(0);

    assert!(matches!(
        db.update_category(default.id, alice.id, Some("Renamed"), None),
        Err(Error::NotFound(_))
    ));
    assert!(matches!(
        db.delete_category(default.id, alice.id),
        Err(Error::NotFound(_))
    ));
}

// ========== Rules ==========

#[test]
fn test_rule_upsert_never_duplicates() {
    let db = test_db();
    let alice = db.create_user("alice", "", "pw").unwrap();
    let cats = db.list_categories(alice.id).unwrap();
    let transport = cats.iter().find(|c| c.name == "Transport").unwrap();
    let food = cats.iter().find(|c| c.name == "Food & Dining").unwrap();

    let first = db.upsert_rule(alice.id, "uber", transport.id, 0).unwrap();
    let second = db.upsert_rule(alice.id, "uber", food.id, 3).unwrap();

    assert_eq!(first.id, second.id);
    assert_eq!(second.category_id, food.id);
    assert_eq!(second.priority, 3);
    assert_eq!(db.list_rules(alice.id).unwrap().len(), 1);
}

#[test]
fn test_rules_ordered_by_priority_then_recency() {
    let db = test_db();
    let alice = db.create_user("alice", "", "pw").unwrap();
    let cats = db.list_categories(alice.id).unwrap();
    let transport = cats.iter().find(|c| c.name == "Transport").unwrap();
    let food = cats.iter().find(|c| c.name == "Food & Dining").unwrap();

    db.upsert_rule(alice.id, "uber", transport.id, 1).unwrap();
    db.upsert_rule(alice.id, "uber eats", food.id, 5).unwrap();

    let rules = db.list_rules(alice.id).unwrap();
    assert_eq!(rules[0].keyword, "uber eats");
    assert_eq!(rules[1].keyword, "uber");
}

#[test]
fn test_rules_scoped_per_user() {
    let db = test_db();
    let alice = db.create_user("alice", "", "pw").unwrap();
    let bob = db.create_user("bob", "", "pw").unwrap();
    let cats = db.list_categories(alice.id).unwrap();
    let transport = cats.iter().find(|c| c.name == "Transport").unwrap();

    db.upsert_rule(alice.id, "uber", transport.id, 0).unwrap();
    assert_eq!(db.list_rules(alice.id).unwrap().len(), 1);
    assert!(db.list_rules(bob.id).unwrap().is_empty());
}

#[test]
fn test_backfill_applies_only_to_uncategorized() {
    let db = test_db();
    let alice = db.create_user("alice", "", "pw").unwrap();
    let cats = db.list_categories(alice.id).unwrap();
    let transport = cats.iter().find(|c| c.name == "Transport").unwrap();
    let food = cats.iter().find(|c| c.name == "Food & Dining").unwrap();

    let uncategorized = db
        .insert_transaction(alice.id, &new_tx("2024-01-15", "50.00", Direction::Debit, "UBER RIDE"))
        .unwrap();
    let mut categorized = new_tx("2024-01-16", "30.00", Direction::Debit, "Uber eats order");
    categorized.category_id = Some(food.id);
    let categorized = db.insert_transaction(alice.id, &categorized).unwrap();
    let unrelated = db
        .insert_transaction(alice.id, &new_tx("2024-01-17", "9.00", Direction::Debit, "Tea house"))
        .unwrap();

    // Case-insensitive containment; only the uncategorized Uber row changes
    let applied = db
        .apply_rule_to_uncategorized(alice.id, "uber", transport.id)
        .unwrap();
    assert_eq!(applied, 1);

    let reloaded = db.get_transaction(uncategorized.id, alice.id).unwrap().unwrap();
    assert_eq!(reloaded.category_id, Some(transport.id));
    let untouched = db.get_transaction(categorized.id, alice.id).unwrap().unwrap();
    assert_eq!(untouched.category_id, Some(food.id));
    let unrelated = db.get_transaction(unrelated.id, alice.id).unwrap().unwrap();
    assert_eq!(unrelated.category_id, None);
}

// ========== Transactions ==========

#[test]
fn test_insert_and_get_transaction() {
    let db = test_db();
    let alice = db.create_user("alice", "", "pw").unwrap();

    let tx = db
        .insert_transaction(alice.id, &new_tx("2024-01-15", "50.00", Direction::Debit, "Uber ride"))
        .unwrap();
    assert_eq!(tx.amount, dec("50.00"));
    assert_eq!(tx.direction, Direction::Debit);
    assert_eq!(tx.description, "Uber ride");
    assert_eq!(tx.category_name, None);
}

#[test]
fn test_insert_rejects_negative_amount() {
    let db = test_db();
    let alice = db.create_user("alice", "", "pw").unwrap();
    let result = db.insert_transaction(
        alice.id,
        &new_tx("2024-01-15", "-50.00", Direction::Debit, "Bad"),
    );
    assert!(matches!(result, Err(Error::InvalidData(_))));
}

#[test]
fn test_insert_rejects_empty_description() {
    let db = test_db();
    let alice = db.create_user("alice", "", "pw").unwrap();
    let result =
        db.insert_transaction(alice.id, &new_tx("2024-01-15", "50.00", Direction::Debit, "   "));
    assert!(matches!(result, Err(Error::InvalidData(_))));
}

#[test]
fn test_insert_rejects_foreign_category() {
    let db = test_db();
    let alice = db.create_user("alice", "", "pw").unwrap();
    let bob = db.create_user("bob", "", "pw").unwrap();
    let bobs = db.create_category(bob.id, "Secret", None).unwrap();

    let mut tx = new_tx("2024-01-15", "50.00", Direction::Debit, "Uber");
    tx.category_id = Some(bobs.id);
    assert!(matches!(
        db.insert_transaction(alice.id, &tx),
        Err(Error::InvalidData(_))
    ));
}

#[test]
fn test_list_transactions_filters() {
    let db = test_db();
    let alice = db.create_user("alice", "", "pw").unwrap();

    db.insert_transaction(alice.id, &new_tx("2024-01-15", "50.00", Direction::Debit, "Uber"))
        .unwrap();
    db.insert_transaction(alice.id, &new_tx("2024-01-20", "1500.00", Direction::Credit, "Salary"))
        .unwrap();
    db.insert_transaction(alice.id, &new_tx("2024-02-01", "9.00", Direction::Debit, "Tea"))
        .unwrap();

    let all = db
        .list_transactions(alice.id, &super::TransactionQuery::default())
        .unwrap();
    assert_eq!(all.len(), 3);
    // Newest first
    assert_eq!(all[0].description, "Tea");

    let debits = db
        .list_transactions(
            alice.id,
            &super::TransactionQuery {
                direction: Some(Direction::Debit),
                ..Default::default()
            },
        )
        .unwrap();
    assert_eq!(debits.len(), 2);

    let january = db
        .list_transactions(
            alice.id,
            &super::TransactionQuery {
                start_date: Some(date("2024-01-01")),
                end_date: Some(date("2024-01-31")),
                ..Default::default()
            },
        )
        .unwrap();
    assert_eq!(january.len(), 2);
}

#[test]
fn test_transactions_scoped_per_user() {
    let db = test_db();
    let alice = db.create_user("alice", "", "pw").unwrap();
    let bob = db.create_user("bob", "", "pw").unwrap();

    let tx = db
        .insert_transaction(alice.id, &new_tx("2024-01-15", "50.00", Direction::Debit, "Uber"))
        .unwrap();

    assert!(db.get_transaction(tx.id, bob.id).unwrap().is_none());
    assert!(matches!(
        db.delete_transaction(tx.id, bob.id),
        Err(Error::NotFound(_))
    ));
}

#[test]
fn test_set_transaction_category() {
    let db = test_db();
    let alice = db.create_user("alice", "", "pw").unwrap();
    let cats = db.list_categories(alice.id).unwrap();
    let transport = cats.iter().find(|c| c.name == "Transport").unwrap();

    let tx = db
        .insert_transaction(alice.id, &new_tx("2024-01-15", "50.00", Direction::Debit, "Uber"))
        .unwrap();

    let updated = db
        .set_transaction_category(tx.id, alice.id, Some(transport.id))
        .unwrap();
    assert_eq!(updated.category_id, Some(transport.id));
    assert_eq!(updated.category_name, Some("Transport".to_string()));

    let cleared = db.set_transaction_category(tx.id, alice.id, None).unwrap();
    assert_eq!(cleared.category_id, None);
}

#[test]
fn test_update_transaction_partial() {
    let db = test_db();
    let alice = db.create_user("alice", "", "pw").unwrap();
    let tx = db
        .insert_transaction(alice.id, &new_tx("2024-01-15", "50.00", Direction::Debit, "Uber"))
        .unwrap();

    let updated = db
        .update_transaction(
            tx.id,
            alice.id,
            None,
            Some(dec("55.00")),
            None,
            None,
            Some("late-night surge"),
        )
        .unwrap();
    assert_eq!(updated.amount, dec("55.00"));
    assert_eq!(updated.description, "Uber");
    assert_eq!(updated.notes, "late-night surge");
}

// ========== Budgets ==========

#[test]
fn test_budget_unique_per_category_month() {
    let db = test_db();
    let alice = db.create_user("alice", "", "pw").unwrap();
    let cats = db.list_categories(alice.id).unwrap();
    let food = cats.iter().find(|c| c.name == "Food & Dining").unwrap();

    let budget = db
        .create_budget(alice.id, food.id, dec("400.00"), date("2024-01-15"))
        .unwrap();
    // Month snaps to its first day
    assert_eq!(budget.month, date("2024-01-01"));

    assert!(matches!(
        db.create_budget(alice.id, food.id, dec("500.00"), date("2024-01-20")),
        Err(Error::InvalidData(_))
    ));

    let updated = db.update_budget(budget.id, alice.id, dec("450.00")).unwrap();
    assert_eq!(updated.amount, dec("450.00"));

    db.delete_budget(budget.id, alice.id).unwrap();
    assert!(db.get_budget(budget.id, alice.id).unwrap().is_none());
}

// ========== Reports ==========

#[test]
fn test_summary_totals() {
    let db = test_db();
    let alice = db.create_user("alice", "", "pw").unwrap();

    db.insert_transaction(alice.id, &new_tx("2024-01-15", "50.00", Direction::Debit, "Uber"))
        .unwrap();
    db.insert_transaction(alice.id, &new_tx("2024-01-16", "25.50", Direction::Debit, "Lunch"))
        .unwrap();
    db.insert_transaction(alice.id, &new_tx("2024-01-20", "1500.00", Direction::Credit, "Salary"))
        .unwrap();
    // Outside the period
    db.insert_transaction(alice.id, &new_tx("2023-12-31", "99.00", Direction::Debit, "Old"))
        .unwrap();

    let summary = db
        .summary(alice.id, date("2024-01-01"), date("2024-01-31"))
        .unwrap();
    assert_eq!(summary.total_expenses, 75.50);
    assert_eq!(summary.total_income, 1500.00);
    assert_eq!(summary.net_balance, 1424.50);
    assert_eq!(summary.transaction_count, 3);
}

#[test]
fn test_spending_by_category() {
    let db = test_db();
    let alice = db.create_user("alice", "", "pw").unwrap();
    let cats = db.list_categories(alice.id).unwrap();
    let transport = cats.iter().find(|c| c.name == "Transport").unwrap();
    let food = cats.iter().find(|c| c.name == "Food & Dining").unwrap();

    for (amount, category) in [("50.00", transport.id), ("30.00", transport.id), ("20.00", food.id)]
    {
        let mut tx = new_tx("2024-01-15", amount, Direction::Debit, "Something");
        tx.category_id = Some(category);
        db.insert_transaction(alice.id, &tx).unwrap();
    }
    // Uncategorized rows are excluded from the breakdown
    db.insert_transaction(alice.id, &new_tx("2024-01-16", "5.00", Direction::Debit, "Misc"))
        .unwrap();

    let breakdown = db.spending_by_category(alice.id, Direction::Debit).unwrap();
    assert_eq!(breakdown.len(), 2);
    assert_eq!(breakdown[0].category_name, "Transport");
    assert_eq!(breakdown[0].total, 80.00);
    assert_eq!(breakdown[0].transaction_count, 2);
    assert_eq!(breakdown[1].total, 20.00);
}

#[test]
fn test_monthly_trends_grouping() {
    let db = test_db();
    let alice = db.create_user("alice", "", "pw").unwrap();

    let today = chrono::Utc::now().date_naive();
    let this_month = today.format("%Y-%m").to_string();

    db.insert_transaction(
        alice.id,
        &new_tx(&today.to_string(), "50.00", Direction::Debit, "Uber"),
    )
    .unwrap();
    db.insert_transaction(
        alice.id,
        &new_tx(&today.to_string(), "1500.00", Direction::Credit, "Salary"),
    )
    .unwrap();

    let trends = db.monthly_trends(alice.id, 6).unwrap();
    assert_eq!(trends.len(), 2);
    assert!(trends.iter().all(|t| t.month == this_month));
    assert!(trends
        .iter()
        .any(|t| t.direction == Direction::Credit && t.total == 1500.00));
}
