//! Recursive tree walk over [`FilterNode`], emitting SQL and parameters in
//! pre-order so placeholders and the parameter list stay positionally
//! aligned.

use std::sync::Arc;

use audience_catalog::CatalogRegistry;
use audience_core::fields::CatalogVersion;
use audience_core::filter::{ComparisonOperator, FilterNode, ValueArity};
use audience_core::{AudienceError, AudienceResult};
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

/// Emitted for an empty predicate group, either combinator: a group with no
/// children matches every record.
const TAUTOLOGY: &str = "1 = 1";

/// Compiled query fragment. `sql` uses `?` placeholders; substituting
/// `params` in order reproduces the authored predicate.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CompiledFilter {
    pub sql: String,
    pub params: Vec<Value>,
}

impl CompiledFilter {
    pub fn placeholder_count(&self) -> usize {
        self.sql.matches('?').count()
    }
}

/// Compiles filter trees against a catalog version. Pure per call: no
/// storage or network access, thread-safe over the shared registry.
pub struct FilterCompiler {
    registry: Arc<CatalogRegistry>,
}

impl FilterCompiler {
    pub fn new(registry: Arc<CatalogRegistry>) -> Self {
        Self { registry }
    }

    /// Compile `node` under `version`. All-or-nothing: any invalid leaf
    /// fails the whole tree.
    pub fn compile(
        &self,
        node: &FilterNode,
        version: CatalogVersion,
    ) -> AudienceResult<CompiledFilter> {
        let mut sql = String::new();
        let mut params = Vec::new();
        self.emit(node, version, &mut sql, &mut params)?;
        debug!(version = %version, params = params.len(), "compiled filter tree");
        Ok(CompiledFilter { sql, params })
    }

    fn emit(
        &self,
        node: &FilterNode,
        version: CatalogVersion,
        sql: &mut String,
        params: &mut Vec<Value>,
    ) -> AudienceResult<()> {
        match node {
            FilterNode::Group {
                combinator,
                children,
            } => {
                if children.is_empty() {
                    sql.push_str(TAUTOLOGY);
                    return Ok(());
                }
                sql.push('(');
                for (i, child) in children.iter().enumerate() {
                    if i > 0 {
                        sql.push(' ');
                        sql.push_str(combinator.sql_keyword());
                        sql.push(' ');
                    }
                    self.emit(child, version, sql, params)?;
                }
                sql.push(')');
                Ok(())
            }
            FilterNode::Leaf {
                field_key,
                operator,
                value,
            } => self.emit_leaf(field_key, *operator, value, version, sql, params),
        }
    }

    fn emit_leaf(
        &self,
        field_key: &str,
        operator: ComparisonOperator,
        value: &Value,
        version: CatalogVersion,
        sql: &mut String,
        params: &mut Vec<Value>,
    ) -> AudienceResult<()> {
        let descriptor = self.registry.lookup(field_key, version)?;
        if !operator.valid_for(descriptor.field_type) {
            return Err(AudienceError::TypeMismatch {
                key: field_key.to_string(),
                field_type: descriptor.field_type,
                operator,
            });
        }
        check_value_shape(field_key, operator, value)?;

        let entry = self.registry.expression(version, field_key)?;
        sql.push('(');
        entry.expr.render(sql, params);

        use ComparisonOperator::*;
        match operator {
            Eq => {
                sql.push_str(" = ?");
                params.push(value.clone());
            }
            Neq => {
                sql.push_str(" <> ?");
                params.push(value.clone());
            }
            Gt => {
                sql.push_str(" > ?");
                params.push(value.clone());
            }
            Gte => {
                sql.push_str(" >= ?");
                params.push(value.clone());
            }
            Lt => {
                sql.push_str(" < ?");
                params.push(value.clone());
            }
            Lte => {
                sql.push_str(" <= ?");
                params.push(value.clone());
            }
            Contains => {
                sql.push_str(" LIKE ?");
                params.push(like_param(field_key, value, true, true)?);
            }
            NotContains => {
                sql.push_str(" NOT LIKE ?");
                params.push(like_param(field_key, value, true, true)?);
            }
            StartsWith => {
                sql.push_str(" LIKE ?");
                params.push(like_param(field_key, value, false, true)?);
            }
            EndsWith => {
                sql.push_str(" LIKE ?");
                params.push(like_param(field_key, value, true, false)?);
            }
            InList | NotInList => {
                let items = value.as_array().filter(|a| !a.is_empty()).ok_or_else(|| {
                    AudienceError::Validation(format!(
                        "operator '{}' requires a non-empty array value for field '{}'",
                        operator, field_key
                    ))
                })?;
                if operator == NotInList {
                    sql.push_str(" NOT");
                }
                sql.push_str(" IN (");
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        sql.push_str(", ");
                    }
                    sql.push('?');
                    params.push(item.clone());
                }
                sql.push(')');
            }
            IsSet => sql.push_str(" IS NOT NULL"),
            IsNotSet => sql.push_str(" IS NULL"),
        }
        sql.push(')');
        Ok(())
    }
}

/// Reject value shapes the operator cannot consume before any SQL is
/// emitted, so failures never leave partial output semantics to the caller.
fn check_value_shape(
    field_key: &str,
    operator: ComparisonOperator,
    value: &Value,
) -> AudienceResult<()> {
    match operator.value_arity() {
        ValueArity::None => {
            if !value.is_null() {
                return Err(AudienceError::Validation(format!(
                    "operator '{}' takes no value for field '{}'",
                    operator, field_key
                )));
            }
        }
        ValueArity::Scalar => {
            if value.is_null() || value.is_array() {
                return Err(AudienceError::Validation(format!(
                    "operator '{}' requires a scalar value for field '{}'",
                    operator, field_key
                )));
            }
        }
        // Array presence and non-emptiness are checked at emission.
        ValueArity::List => {}
    }
    Ok(())
}

fn like_param(
    field_key: &str,
    value: &Value,
    leading_wildcard: bool,
    trailing_wildcard: bool,
) -> AudienceResult<Value> {
    let text = value.as_str().ok_or_else(|| {
        AudienceError::Validation(format!(
            "substring operators require a string value for field '{}'",
            field_key
        ))
    })?;
    let mut pattern = String::with_capacity(text.len() + 2);
    if leading_wildcard {
        pattern.push('%');
    }
    pattern.push_str(text);
    if trailing_wildcard {
        pattern.push('%');
    }
    Ok(Value::String(pattern))
}
