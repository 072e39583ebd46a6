use super::{ResolvedProperties, ValidationContext};
use crate::diagnostic::{Diagnostic, DiagnosticCode, ElementRef};
use serde_json::Value;

/// Checks supplied property values against each block's schema and resolves
/// the typed values (falling back to schema defaults).
pub(super) fn check_properties(ctx: &mut ValidationContext) {
    let graph = ctx.graph;
    for idx in graph.indices() {
        let Some(kind) = ctx.kinds[idx.index()] else {
            continue;
        };
        let block = graph.block(idx);
        let mut resolved = ResolvedProperties::with_capacity(kind.properties.len());

        for definition in &kind.properties {
            let element = ElementRef::Block {
                id: block.id.clone(),
                property: Some(definition.id.clone()),
            };
            let supplied = block
                .properties
                .get(&definition.id)
                .filter(|value| !value.is_null())
                .filter(|value| !(definition.required && is_blank(value)));

            let value = match supplied {
                Some(value) => value,
                None if definition.required => {
                    ctx.push(Diagnostic::error(
                        DiagnosticCode::MissingProperty,
                        element,
                        format!(
                            "block '{}' is missing required property '{}'",
                            block.id, definition.id
                        ),
                    ));
                    continue;
                }
                None => match &definition.default {
                    Some(default) => default,
                    // Registry loading guarantees optional properties have defaults.
                    None => continue,
                },
            };

            match definition.check(value) {
                Ok(typed) => {
                    resolved.insert(definition.id.clone(), typed);
                }
                Err(violation) => ctx.push(Diagnostic::error(
                    violation.code,
                    element,
                    format!(
                        "property '{}' of block '{}' ({}): {}",
                        definition.id,
                        block.id,
                        definition.type_name(),
                        violation.message
                    ),
                )),
            }
        }

        for name in block.properties.keys() {
            if kind.property(name).is_none() {
                ctx.push(Diagnostic::warning(
                    DiagnosticCode::UnknownProperty,
                    ElementRef::Block {
                        id: block.id.clone(),
                        property: Some(name.clone()),
                    },
                    format!(
                        "block '{}' sets property '{}', which kind '{}' does not declare",
                        block.id, name, kind.id
                    ),
                ));
            }
        }

        ctx.properties[idx.index()] = resolved;
    }
}

fn is_blank(value: &Value) -> bool {
    matches!(value, Value::String(s) if s.trim().is_empty())
}
