//! Pure comparison, merge, and display helpers for entity payloads.
//!
//! Everything here is side-effect free and operates on the structural
//! key/value view of a payload, so the same code serves every store.

use crate::domain::value_objects::EntityPayload;
use serde_json::{Map, Value};
use std::collections::BTreeSet;

/// One row of the conflict comparison view.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDiff {
    pub field: String,
    pub local_value: Value,
    pub server_value: Value,
    pub is_different: bool,
}

/// Key-by-key comparison over the union of both payloads' keys, in
/// lexicographic key order. A key missing on one side compares as null.
pub fn compare_fields(local: &EntityPayload, server: &EntityPayload) -> Vec<FieldDiff> {
    let local_fields = local.fields();
    let server_fields = server.fields();

    let keys: BTreeSet<&String> = local_fields.keys().chain(server_fields.keys()).collect();

    keys.into_iter()
        .map(|key| {
            let local_value = local_fields.get(key).cloned().unwrap_or(Value::Null);
            let server_value = server_fields.get(key).cloned().unwrap_or(Value::Null);
            let is_different = !values_equal(&local_value, &server_value);
            FieldDiff {
                field: key.clone(),
                local_value,
                server_value,
                is_different,
            }
        })
        .collect()
}

/// Deep equality: order-insensitive for arrays of primitives, recursive
/// for nested objects, plain equality otherwise.
pub fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Array(left), Value::Array(right)) => {
            if left.len() != right.len() {
                return false;
            }
            if left.iter().all(is_primitive) && right.iter().all(is_primitive) {
                let mut left_sorted: Vec<String> = left.iter().map(Value::to_string).collect();
                let mut right_sorted: Vec<String> = right.iter().map(Value::to_string).collect();
                left_sorted.sort();
                right_sorted.sort();
                left_sorted == right_sorted
            } else {
                left.iter().zip(right).all(|(l, r)| values_equal(l, r))
            }
        }
        (Value::Object(left), Value::Object(right)) => {
            let keys: BTreeSet<&String> = left.keys().chain(right.keys()).collect();
            keys.into_iter().all(|key| {
                values_equal(
                    left.get(key).unwrap_or(&Value::Null),
                    right.get(key).unwrap_or(&Value::Null),
                )
            })
        }
        _ => a == b,
    }
}

/// Renders one field value for the comparison UI. Null and missing
/// values get an explicit marker so the two sides are never ambiguously
/// blank.
pub fn format_field_value(value: &Value) -> String {
    match value {
        Value::Null => "(vazio)".to_string(),
        Value::String(text) if text.is_empty() => "(vazio)".to_string(),
        Value::String(text) => text.clone(),
        Value::Bool(true) => "Sim".to_string(),
        Value::Bool(false) => "Não".to_string(),
        Value::Number(number) => number.to_string(),
        Value::Array(items) => match items.len() {
            1 => "1 item".to_string(),
            n => format!("{n} itens"),
        },
        Value::Object(fields) => match fields.len() {
            1 => "1 campo".to_string(),
            n => format!("{n} campos"),
        },
    }
}

/// Human label for a field key; falls back to the raw key when unmapped.
pub fn field_label(field_key: &str) -> &str {
    match field_key {
        "titulo" => "Título",
        "descricao" => "Descrição",
        "status" => "Status",
        "prioridade" => "Prioridade",
        "responsavel" => "Responsável",
        "categoria" => "Categoria",
        "valor" => "Valor",
        "unidade" => "Unidade",
        "dataVencimento" => "Data de vencimento",
        "dataInicio" => "Data de início",
        "dataFim" => "Data de término",
        "observacoes" => "Observações",
        "anexos" => "Anexos",
        "criadoPor" => "Criado por",
        other => other,
    }
}

/// Additive-bias field union: for every key in either payload, the local
/// value wins unless it is empty (null, missing, or an empty string), in
/// which case the server value fills the gap.
///
/// This is a heuristic biased toward the side carrying more information,
/// not a semantically correct merge; overlapping non-empty edits keep
/// the local value.
pub fn merge_conflict_data(local: &EntityPayload, server: &EntityPayload) -> EntityPayload {
    let local_fields = local.fields();
    let server_fields = server.fields();

    let keys: BTreeSet<&String> = local_fields.keys().chain(server_fields.keys()).collect();

    let mut merged = Map::new();
    for key in keys {
        let local_value = local_fields.get(key).unwrap_or(&Value::Null);
        let chosen = if is_empty_value(local_value) {
            server_fields.get(key).unwrap_or(&Value::Null)
        } else {
            local_value
        };
        merged.insert(key.clone(), chosen.clone());
    }
    EntityPayload::from(merged)
}

fn is_primitive(value: &Value) -> bool {
    !matches!(value, Value::Array(_) | Value::Object(_))
}

fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(text) => text.is_empty(),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn payload(value: Value) -> EntityPayload {
        EntityPayload::new(value).unwrap()
    }

    #[test]
    fn compare_fields_covers_union_of_keys() {
        let local = payload(json!({"titulo": "A", "valor": 10}));
        let server = payload(json!({"titulo": "B", "status": "aberta"}));

        let diffs = compare_fields(&local, &server);
        let fields: Vec<&str> = diffs.iter().map(|d| d.field.as_str()).collect();
        assert_eq!(fields, vec!["status", "titulo", "valor"]);

        let titulo = diffs.iter().find(|d| d.field == "titulo").unwrap();
        assert!(titulo.is_different);
        assert_eq!(titulo.local_value, json!("A"));
        assert_eq!(titulo.server_value, json!("B"));

        let status = diffs.iter().find(|d| d.field == "status").unwrap();
        assert_eq!(status.local_value, Value::Null);
        assert!(status.is_different);
    }

    #[test]
    fn primitive_arrays_compare_order_insensitively() {
        assert!(values_equal(&json!([1, 2, 3]), &json!([3, 1, 2])));
        assert!(!values_equal(&json!([1, 2]), &json!([1, 2, 3])));
        // Arrays of objects stay positional.
        assert!(!values_equal(
            &json!([{"a": 1}, {"a": 2}]),
            &json!([{"a": 2}, {"a": 1}])
        ));
    }

    #[test]
    fn nested_objects_compare_missing_keys_as_null() {
        assert!(values_equal(
            &json!({"a": 1, "b": null}),
            &json!({"a": 1})
        ));
        assert!(!values_equal(&json!({"a": 1}), &json!({"a": 2})));
    }

    #[test]
    fn merge_prefers_local_and_fills_gaps_from_server() {
        let local = payload(json!({"a": 1}));
        let server = payload(json!({"a": 2, "b": "x"}));

        let merged = merge_conflict_data(&local, &server);
        assert_eq!(merged.to_value(), json!({"a": 1, "b": "x"}));
    }

    #[test]
    fn merge_treats_null_and_empty_string_as_gaps() {
        let local = payload(json!({"titulo": "", "descricao": null, "status": "aberta"}));
        let server = payload(json!({"titulo": "B", "descricao": "detalhes", "status": "fechada"}));

        let merged = merge_conflict_data(&local, &server);
        assert_eq!(
            merged.to_value(),
            json!({"titulo": "B", "descricao": "detalhes", "status": "aberta"})
        );
    }

    #[test]
    fn format_marks_empty_values_explicitly() {
        assert_eq!(format_field_value(&Value::Null), "(vazio)");
        assert_eq!(format_field_value(&json!("")), "(vazio)");
        assert_eq!(format_field_value(&json!("texto")), "texto");
        assert_eq!(format_field_value(&json!(42)), "42");
        assert_eq!(format_field_value(&json!(true)), "Sim");
        assert_eq!(format_field_value(&json!([1, 2, 3])), "3 itens");
        assert_eq!(format_field_value(&json!({"a": 1})), "1 campo");
    }

    #[test]
    fn field_label_falls_back_to_raw_key() {
        assert_eq!(field_label("titulo"), "Título");
        assert_eq!(field_label("campoDesconhecido"), "campoDesconhecido");
    }
}
