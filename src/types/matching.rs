// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use super::RegoType;
use crate::value::Value;

impl RegoType {
    /// Whether `value` satisfies this type.
    ///
    /// Function types describe builtins, not values, and never match.
    pub fn matches(&self, value: &Value) -> bool {
        match (self, value) {
            (RegoType::Named { ty, .. }, _) => ty.matches(value),
            (RegoType::Any(of), _) => of.is_empty() || of.iter().any(|t| t.matches(value)),

            (RegoType::Null, Value::Null)
            | (RegoType::Boolean, Value::Bool(_))
            | (RegoType::Number, Value::Number(_))
            | (RegoType::String, Value::String(_)) => true,

            (
                RegoType::Array {
                    static_types,
                    dynamic,
                },
                Value::Array(items),
            ) => {
                if items.len() < static_types.len() {
                    return false;
                }
                items.iter().enumerate().all(|(idx, item)| {
                    match (static_types.get(idx), dynamic) {
                        (Some(t), _) => t.matches(item),
                        (None, Some(d)) => d.matches(item),
                        (None, None) => false,
                    }
                })
            }

            (RegoType::Set { of }, Value::Set(items)) => match of {
                Some(t) => items.iter().all(|item| t.matches(item)),
                None => true,
            },

            (
                RegoType::Object {
                    static_props,
                    dynamic,
                },
                Value::Object(fields),
            ) => {
                for prop in static_props {
                    match fields.get(&prop.key) {
                        Some(v) if prop.value.matches(v) => (),
                        _ => return false,
                    }
                }
                fields.iter().all(|(k, v)| {
                    if static_props.iter().any(|p| &p.key == k) {
                        return true;
                    }
                    match dynamic {
                        Some(d) => d.key.matches(k) && d.value.matches(v),
                        None => false,
                    }
                })
            }

            _ => false,
        }
    }
}
