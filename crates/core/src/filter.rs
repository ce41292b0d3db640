//! Filter trees — recursive boolean combinations of field predicates, and
//! the operator/type compatibility table.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::fields::FieldType;

/// User-authored predicate tree. Leaves reference catalog fields by key;
/// groups combine children with a boolean combinator.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FilterNode {
    Leaf {
        field_key: String,
        operator: ComparisonOperator,
        #[serde(default)]
        value: serde_json::Value,
    },
    Group {
        combinator: Combinator,
        children: Vec<FilterNode>,
    },
}

impl FilterNode {
    pub fn leaf(
        field_key: impl Into<String>,
        operator: ComparisonOperator,
        value: serde_json::Value,
    ) -> Self {
        FilterNode::Leaf {
            field_key: field_key.into(),
            operator,
            value,
        }
    }

    pub fn and(children: Vec<FilterNode>) -> Self {
        FilterNode::Group {
            combinator: Combinator::And,
            children,
        }
    }

    pub fn or(children: Vec<FilterNode>) -> Self {
        FilterNode::Group {
            combinator: Combinator::Or,
            children,
        }
    }

    /// Every field key referenced by this tree, in pre-order.
    pub fn field_keys(&self) -> Vec<&str> {
        let mut keys = Vec::new();
        self.collect_keys(&mut keys);
        keys
    }

    fn collect_keys<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            FilterNode::Leaf { field_key, .. } => out.push(field_key),
            FilterNode::Group { children, .. } => {
                for child in children {
                    child.collect_keys(out);
                }
            }
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Combinator {
    And,
    Or,
}

impl Combinator {
    pub fn sql_keyword(&self) -> &'static str {
        match self {
            Combinator::And => "AND",
            Combinator::Or => "OR",
        }
    }
}

/// How many values an operator consumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueArity {
    None,
    Scalar,
    List,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ComparisonOperator {
    Eq,
    Neq,
    Gt,
    Gte,
    Lt,
    Lte,
    Contains,
    NotContains,
    StartsWith,
    EndsWith,
    InList,
    NotInList,
    IsSet,
    IsNotSet,
}

impl ComparisonOperator {
    pub fn as_str(&self) -> &'static str {
        match self {
            ComparisonOperator::Eq => "eq",
            ComparisonOperator::Neq => "neq",
            ComparisonOperator::Gt => "gt",
            ComparisonOperator::Gte => "gte",
            ComparisonOperator::Lt => "lt",
            ComparisonOperator::Lte => "lte",
            ComparisonOperator::Contains => "contains",
            ComparisonOperator::NotContains => "not_contains",
            ComparisonOperator::StartsWith => "starts_with",
            ComparisonOperator::EndsWith => "ends_with",
            ComparisonOperator::InList => "in_list",
            ComparisonOperator::NotInList => "not_in_list",
            ComparisonOperator::IsSet => "is_set",
            ComparisonOperator::IsNotSet => "is_not_set",
        }
    }

    /// Finite compatibility table over `(field type, operator)` pairs.
    pub fn valid_for(&self, field_type: FieldType) -> bool {
        use ComparisonOperator::*;
        match field_type {
            FieldType::String => !matches!(self, Gt | Gte | Lt | Lte),
            FieldType::Number => {
                matches!(self, Eq | Neq | Gt | Gte | Lt | Lte | InList | NotInList | IsSet | IsNotSet)
            }
            FieldType::Boolean => matches!(self, Eq | Neq | IsSet | IsNotSet),
            FieldType::Date => {
                matches!(self, Eq | Neq | Gt | Gte | Lt | Lte | IsSet | IsNotSet)
            }
            FieldType::Json => {
                matches!(self, Eq | Neq | Contains | NotContains | IsSet | IsNotSet)
            }
        }
    }

    pub fn value_arity(&self) -> ValueArity {
        use ComparisonOperator::*;
        match self {
            IsSet | IsNotSet => ValueArity::None,
            InList | NotInList => ValueArity::List,
            _ => ValueArity::Scalar,
        }
    }
}

impl fmt::Display for ComparisonOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_contains_only_for_string_and_json() {
        for ft in [FieldType::String, FieldType::Json] {
            assert!(ComparisonOperator::Contains.valid_for(ft));
        }
        for ft in [FieldType::Number, FieldType::Boolean, FieldType::Date] {
            assert!(!ComparisonOperator::Contains.valid_for(ft));
        }
    }

    #[test]
    fn test_ordering_operators_reject_strings() {
        for op in [
            ComparisonOperator::Gt,
            ComparisonOperator::Gte,
            ComparisonOperator::Lt,
            ComparisonOperator::Lte,
        ] {
            assert!(!op.valid_for(FieldType::String));
            assert!(op.valid_for(FieldType::Number));
            assert!(op.valid_for(FieldType::Date));
        }
    }

    #[test]
    fn test_presence_operators_valid_everywhere() {
        for ft in [
            FieldType::String,
            FieldType::Number,
            FieldType::Boolean,
            FieldType::Date,
            FieldType::Json,
        ] {
            assert!(ComparisonOperator::IsSet.valid_for(ft));
            assert!(ComparisonOperator::IsNotSet.valid_for(ft));
        }
    }

    #[test]
    fn test_leaf_value_defaults_to_null() {
        let node: FilterNode = serde_json::from_value(json!({
            "kind": "leaf",
            "field_key": "email",
            "operator": "is_set"
        }))
        .unwrap();
        match node {
            FilterNode::Leaf { value, .. } => assert!(value.is_null()),
            _ => panic!("expected leaf"),
        }
    }

    #[test]
    fn test_field_keys_pre_order() {
        let tree = FilterNode::and(vec![
            FilterNode::leaf("a", ComparisonOperator::Eq, json!(1)),
            FilterNode::or(vec![
                FilterNode::leaf("b", ComparisonOperator::Eq, json!(2)),
                FilterNode::leaf("c", ComparisonOperator::Eq, json!(3)),
            ]),
        ]);
        assert_eq!(tree.field_keys(), vec!["a", "b", "c"]);
    }
}
