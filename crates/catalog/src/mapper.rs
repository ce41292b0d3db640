//! Expression mapper — pure derivation from a field descriptor to the
//! storage-access expression the query engine executes.

use audience_core::fields::FieldDescriptor;
use serde_json::Value;

/// Storage-layer access expression for one catalog field.
///
/// JSON leaves keep their remaining path as structured segments; the
/// segments are bound as parameters at render time, never concatenated into
/// the SQL text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageExpr {
    Column { name: String },
    JsonPath { column: String, path: Vec<String> },
}

impl StorageExpr {
    /// Render to SQL, appending one bound parameter per JSON path segment.
    pub fn render(&self, sql: &mut String, params: &mut Vec<Value>) {
        match self {
            StorageExpr::Column { name } => {
                sql.push('"');
                sql.push_str(name);
                sql.push('"');
            }
            StorageExpr::JsonPath { column, path } => {
                sql.push('"');
                sql.push_str(column);
                sql.push('"');
                for (i, segment) in path.iter().enumerate() {
                    // Last segment extracts text, intermediates stay JSON.
                    if i + 1 == path.len() {
                        sql.push_str("->>?");
                    } else {
                        sql.push_str("->?");
                    }
                    params.push(Value::String(segment.clone()));
                }
            }
        }
    }
}

/// Compiled storage expression, keyed by its catalog field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpressionEntry {
    pub key: String,
    pub expr: StorageExpr,
}

/// Derive the storage expression for a descriptor. Deterministic and
/// side-effect-free: the same descriptor always maps to the same entry.
pub fn to_expression(descriptor: &FieldDescriptor) -> ExpressionEntry {
    let expr = if descriptor.nested {
        StorageExpr::JsonPath {
            column: descriptor.container().to_string(),
            path: descriptor
                .path_segments()
                .into_iter()
                .map(str::to_string)
                .collect(),
        }
    } else {
        StorageExpr::Column {
            name: descriptor.key.clone(),
        }
    };
    ExpressionEntry {
        key: descriptor.key.clone(),
        expr,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use audience_core::fields::{FieldGroup, FieldType};
    use serde_json::json;

    #[test]
    fn test_plain_column_renders_quoted_identifier() {
        let d = FieldDescriptor::column("event_name", FieldGroup::PixelEvent, FieldType::String);
        let entry = to_expression(&d);
        let mut sql = String::new();
        let mut params = Vec::new();
        entry.expr.render(&mut sql, &mut params);
        assert_eq!(sql, "\"event_name\"");
        assert!(params.is_empty());
    }

    #[test]
    fn test_json_leaf_parameterizes_path_segments() {
        let d = FieldDescriptor::nested(
            "event_data.purchase_amount",
            FieldGroup::PixelEvent,
            FieldType::Number,
        );
        let entry = to_expression(&d);
        let mut sql = String::new();
        let mut params = Vec::new();
        entry.expr.render(&mut sql, &mut params);
        assert_eq!(sql, "\"event_data\"->>?");
        assert_eq!(params, vec![json!("purchase_amount")]);
    }

    #[test]
    fn test_deep_path_keeps_intermediate_json_arrows() {
        let d = FieldDescriptor::nested(
            "event_data.cart.total",
            FieldGroup::PixelEvent,
            FieldType::Number,
        );
        let entry = to_expression(&d);
        let mut sql = String::new();
        let mut params = Vec::new();
        entry.expr.render(&mut sql, &mut params);
        assert_eq!(sql, "\"event_data\"->?->>?");
        assert_eq!(params, vec![json!("cart"), json!("total")]);
    }

    #[test]
    fn test_mapping_is_pure() {
        let d = FieldDescriptor::nested(
            "event_data.purchase_amount",
            FieldGroup::PixelEvent,
            FieldType::Number,
        );
        assert_eq!(to_expression(&d), to_expression(&d));
    }
}
