//! Integration tests for extrato-core
//!
//! These tests exercise the full import -> detect -> categorize workflow.

use extrato_core::{
    annotate_suggestions, Category, CategoryCatalog, ColumnMapping, ImportPipeline,
    IntegrityGuard, MemoryStore, MockSuggester, RawRow, StatementStore, Subcategory,
    TransactionType, UnifiedStatus,
};

fn mapping() -> ColumnMapping {
    ColumnMapping::new("Data", "Valor", "Identificador", "Descrição")
}

fn row(date: &str, amount: &str, id: &str, description: &str) -> RawRow {
    RawRow::from_pairs([
        ("Data", date),
        ("Valor", amount),
        ("Identificador", id),
        ("Descrição", description),
    ])
}

/// Statement with a refund cycle, a PIX settlement cycle, a duplicate id and
/// one unparsable row.
fn sample_statement() -> Vec<RawRow> {
    vec![
        row("01/03/2024", "-100,00", "TX-UBER", "Uber"),
        row("03/03/2024", "100,00", "TX-EST", "Estorno Uber"),
        row("01/03/2024", "-200,00", "TX-PIX", "PIX Enviado"),
        row("01/03/2024", "200,00", "TX-CRED", "Pagamento recebido"),
        row("02/03/2024", "-150,50", "TX1", "Compra Supermercado"),
        row("02/03/2024", "-89,90", "TX1", "Farmácia São João"),
        row("05/03/2024", "2.500,00", "TX-SAL", "Salário Janeiro"),
        row("06/03/2024", "not-a-number", "TX-BAD", "Linha corrompida"),
    ]
}

fn catalog() -> CategoryCatalog {
    CategoryCatalog::new(vec![
        Category {
            id: "cat-food".to_string(),
            name: "Alimentação".to_string(),
            subcategories: vec![Subcategory {
                id: "sub-market".to_string(),
                name: "Supermercado".to_string(),
            }],
        },
        Category {
            id: "cat-pix".to_string(),
            name: "Transferências PIX".to_string(),
            subcategories: Vec::new(),
        },
    ])
}

#[test]
fn test_full_import_workflow() {
    let catalog = catalog();
    let outcome = ImportPipeline::new(mapping())
        .catalog(&catalog)
        .run(&sample_statement())
        .expect("pipeline should succeed");

    // One row dropped, one duplicate id repaired.
    assert_eq!(outcome.rows_total, 8);
    assert_eq!(outcome.dropped.len(), 1);
    assert_eq!(outcome.duplicate_report.len(), 1);
    assert_eq!(outcome.duplicate_report.rewrites[0].original_id, "TX1");
    assert_eq!(outcome.duplicate_report.rewrites[0].new_id, "TX1-2");
    assert_eq!(outcome.working_set.len(), 7);

    // Both cycles detected; the remaining three lines stay single.
    assert_eq!(outcome.detection.refund_pairs.len(), 1);
    assert_eq!(outcome.detection.pix_pairs.len(), 1);
    assert_eq!(outcome.detection.singles.len(), 3);

    // Pair constituents are off the needs-category surface.
    let needs: Vec<&str> = outcome
        .detection
        .needs_category()
        .iter()
        .map(|t| t.id.as_str())
        .collect();
    assert_eq!(needs, vec!["TX1", "TX1-2", "TX-SAL"]);

    // The PIX pair picked up the catalog's PIX category.
    assert_eq!(
        outcome.detection.pix_pairs[0]
            .pix_transaction
            .category_id
            .as_deref(),
        Some("cat-pix")
    );
}

#[test]
fn test_unified_records_aggregate_once() {
    let outcome = ImportPipeline::new(mapping())
        .run(&sample_statement())
        .unwrap();

    let unified = outcome.detection.unified();
    assert_eq!(unified.len(), 5);

    let refunded = unified
        .iter()
        .find(|u| u.status == UnifiedStatus::Refunded)
        .unwrap();
    assert_eq!(refunded.grouped_transaction_ids.len(), 2);

    // -150.50 - 89.90 + 2500.00 from the singles, -200.00 from the PIX
    // settlement counted once, 0 from the refunded purchase.
    let total: f64 = unified.iter().map(|u| u.net_signed_amount()).sum();
    assert!((total - 2059.60).abs() < 1e-9);
}

#[test]
fn test_guarded_categorization_keeps_siblings_intact() {
    let catalog = catalog();
    let outcome = ImportPipeline::new(mapping())
        .catalog(&catalog)
        .run(&sample_statement())
        .unwrap();

    let mut set = outcome.working_set;
    let snapshot: Vec<_> = set.transactions().to_vec();

    let guard = IntegrityGuard::with_catalog(&catalog);
    guard
        .assign_category(
            &mut set,
            "TX1",
            Some("cat-food".to_string()),
            Some("sub-market".to_string()),
        )
        .expect("assignment should pass the guard");

    for before in &snapshot {
        let after = set.get(&before.id).unwrap();
        if before.id == "TX1" {
            assert_eq!(after.category_id.as_deref(), Some("cat-food"));
            assert_eq!(after.subcategory_id.as_deref(), Some("sub-market"));
        } else {
            assert_eq!(after, before);
        }
    }
}

#[test]
fn test_rejected_mutation_keeps_previous_state() {
    let outcome = ImportPipeline::new(mapping())
        .run(&sample_statement())
        .unwrap();

    let mut set = outcome.working_set;
    let before = set.clone();

    let guard = IntegrityGuard::new();
    let result = guard.apply(&mut set, "TX1", |tx| {
        // Classifier output is not part of the interactive surface.
        tx.tx_type = TransactionType::Income;
    });

    assert!(result.is_err());
    assert_eq!(set, before);
}

#[test]
fn test_suggestions_then_commit() {
    let outcome = ImportPipeline::new(mapping())
        .run(&sample_statement())
        .unwrap();
    let mut set = outcome.working_set;

    let suggester = MockSuggester::new()
        .with_hint("supermercado", "cat-food")
        .with_fallback("cat-other");
    let annotated = annotate_suggestions(&mut set, &suggester);
    assert_eq!(annotated, set.len());

    let hinted = set.get("TX1").unwrap().ai_suggestion.as_ref().unwrap();
    assert_eq!(hinted.category_id, "cat-food");
    assert!(!hinted.used_fallback);

    let fallback = set.get("TX-SAL").unwrap().ai_suggestion.as_ref().unwrap();
    assert!(fallback.used_fallback);

    // Accepting a suggestion goes through the guard like any other edit.
    let guard = IntegrityGuard::new();
    let suggested = hinted.category_id.clone();
    guard
        .assign_category(&mut set, "TX1", Some(suggested), None)
        .unwrap();

    // Commit the canonical list; re-committing surfaces duplicate keys.
    let mut store = MemoryStore::new();
    let committed = store.commit(set.transactions()).unwrap();
    assert_eq!(committed.inserted, set.len());
    assert!(committed.duplicate_key_ids.is_empty());

    let recommitted = store.commit(set.transactions()).unwrap();
    assert_eq!(recommitted.inserted, 0);
    assert_eq!(recommitted.duplicate_key_ids.len(), set.len());
}

#[test]
fn test_import_replaces_previous_working_set() {
    // A new file produces a wholly new working set; nothing leaks across.
    let first = ImportPipeline::new(mapping())
        .run(&sample_statement())
        .unwrap();

    let second_rows = vec![row("10/04/2024", "-42,00", "NEW-1", "Livraria")];
    let second = ImportPipeline::new(mapping()).run(&second_rows).unwrap();

    assert_eq!(second.working_set.len(), 1);
    assert!(second.working_set.get("TX1").is_none());
    assert!(first.working_set.get("TX1").is_some());
}
