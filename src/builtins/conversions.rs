// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use crate::builtins;
use crate::builtins::utils::ensure_args_count;
use crate::builtins::{BuiltinContext, BuiltinError};
use crate::value::Value;

pub fn register(m: &mut builtins::BuiltinsMap<&'static str, (builtins::BuiltinFcn, u8)>) {
    m.insert("to_number", (to_number, 1));
}

fn to_number(_ctx: &BuiltinContext, args: &[Value]) -> Result<Value, BuiltinError> {
    let name = "to_number";
    ensure_args_count(name, args, 1)?;

    Ok(match &args[0] {
        Value::Null => Value::from(0u64),
        Value::Bool(true) => Value::from(1u64),
        Value::Bool(false) => Value::from(0u64),
        Value::Number(_) => args[0].clone(),
        // Strings are read as json numbers, so large integers keep their precision.
        Value::String(s) => match Value::from_json_str(s) {
            Ok(Value::Number(n)) => Value::Number(n),
            _ => {
                return Err(BuiltinError::eval(
                    name,
                    format!("could not parse `{s}` as number"),
                ))
            }
        },
        _ => {
            return Err(BuiltinError::eval(
                name,
                format!("`{name}` expects bool/number/string/null argument."),
            ))
        }
    })
}
