// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use crate::builtins;
use crate::builtins::utils::ensure_args_count;
use crate::builtins::{BuiltinContext, BuiltinError};
use crate::value::Value;

pub fn register(m: &mut builtins::BuiltinsMap<&'static str, (builtins::BuiltinFcn, u8)>) {
    m.insert("internal.member_2", (member_2, 2));
    m.insert("internal.member_3", (member_3, 3));
}

// `x in coll`
fn member_2(_ctx: &BuiltinContext, args: &[Value]) -> Result<Value, BuiltinError> {
    let name = "internal.member_2";
    ensure_args_count(name, args, 2)?;

    let x = &args[0];
    Ok(Value::Bool(match &args[1] {
        Value::Array(a) => a.contains(x),
        Value::Set(s) => s.contains(x),
        Value::Object(o) => o.values().any(|v| v == x),
        _ => false,
    }))
}

// `k, v in coll`
fn member_3(_ctx: &BuiltinContext, args: &[Value]) -> Result<Value, BuiltinError> {
    let name = "internal.member_3";
    ensure_args_count(name, args, 3)?;

    let (key, value) = (&args[0], &args[1]);
    Ok(Value::Bool(match &args[2] {
        Value::Array(a) => match key {
            Value::Number(n) => match n.as_u64() {
                Some(idx) => a.get(idx as usize) == Some(value),
                None => false,
            },
            _ => false,
        },
        Value::Object(o) => o.get(key) == Some(value),
        _ => false,
    }))
}
