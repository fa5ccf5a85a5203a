//! Tests for the CLI's statement-file helpers

use std::io::Write;

use tempfile::NamedTempFile;

use crate::commands::{mapping_for, parse_mapping_override, read_rows, resolve_mapping};

fn headers(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}

#[test]
fn test_resolve_mapping_nubank_style() {
    let headers = headers(&["Data", "Valor", "Identificador", "Descrição"]);
    let mapping = resolve_mapping(&headers).unwrap();
    assert_eq!(mapping.date, "Data");
    assert_eq!(mapping.amount, "Valor");
    assert_eq!(mapping.identifier, "Identificador");
    assert_eq!(mapping.description, "Descrição");
}

#[test]
fn test_resolve_mapping_bank_export_style() {
    let headers = headers(&["Data Lançamento", "Histórico", "Valor", "Código"]);
    let mapping = resolve_mapping(&headers).unwrap();
    assert_eq!(mapping.date, "Data Lançamento");
    assert_eq!(mapping.description, "Histórico");
    assert_eq!(mapping.identifier, "Código");
}

#[test]
fn test_resolve_mapping_unknown_layout() {
    let headers = headers(&["Some", "Random", "Headers", "Here"]);
    assert!(resolve_mapping(&headers).is_none());
}

#[test]
fn test_parse_mapping_override() {
    let mapping =
        parse_mapping_override("date=Dia,amount=Quantia,id=Ref,description=Detalhe").unwrap();
    assert_eq!(mapping.date, "Dia");
    assert_eq!(mapping.amount, "Quantia");
    assert_eq!(mapping.identifier, "Ref");
    assert_eq!(mapping.description, "Detalhe");
}

#[test]
fn test_parse_mapping_override_rejects_bad_specs() {
    assert!(parse_mapping_override("date=Dia,amount").is_err());
    assert!(parse_mapping_override("date=Dia,banana=X").is_err());
    // Missing required fields
    assert!(parse_mapping_override("date=Dia,amount=Quantia").is_err());
}

#[test]
fn test_mapping_for_prefers_override() {
    let headers = headers(&["Data", "Valor", "Identificador", "Descrição"]);
    let mapping = mapping_for(
        &headers,
        Some("date=Data,amount=Valor,id=Identificador,desc=Descrição"),
    )
    .unwrap();
    assert_eq!(mapping.description, "Descrição");

    let auto = mapping_for(&headers, None).unwrap();
    assert_eq!(auto.date, "Data");
}

#[test]
fn test_read_rows_tokenizes_statement() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "Data,Valor,Identificador,Descrição").unwrap();
    writeln!(file, "01/03/2024,\"-150,50\",TX1,Compra Supermercado").unwrap();
    writeln!(file, "05/03/2024,\"2.500,00\",TX2,Salário Janeiro").unwrap();
    file.flush().unwrap();

    let (headers, rows) = read_rows(file.path()).unwrap();
    assert_eq!(headers, vec!["Data", "Valor", "Identificador", "Descrição"]);
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].get("Valor"), Some("-150,50"));
    assert_eq!(rows[1].get("Descrição"), Some("Salário Janeiro"));
}
