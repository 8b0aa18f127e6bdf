// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use crate::builtins;
use crate::builtins::utils::{ensure_args_count, ensure_array, ensure_numeric};
use crate::builtins::{BuiltinContext, BuiltinError};
use crate::number::Number;
use crate::Rc;
use crate::Value;

pub fn register(m: &mut builtins::BuiltinsMap<&'static str, (builtins::BuiltinFcn, u8)>) {
    m.insert("array.concat", (concat, 2));
    m.insert("array.reverse", (reverse, 1));
    m.insert("array.slice", (slice, 3));
}

fn concat(_ctx: &BuiltinContext, args: &[Value]) -> Result<Value, BuiltinError> {
    let name = "array.concat";
    ensure_args_count(name, args, 2)?;
    let mut v1 = ensure_array(name, &args[0])?;
    let v2 = ensure_array(name, &args[1])?;

    Rc::make_mut(&mut v1).extend(v2.iter().cloned());
    Ok(Value::Array(v1))
}

fn reverse(_ctx: &BuiltinContext, args: &[Value]) -> Result<Value, BuiltinError> {
    let name = "array.reverse";
    ensure_args_count(name, args, 1)?;

    let mut v1 = ensure_array(name, &args[0])?;
    Rc::make_mut(&mut v1).reverse();
    Ok(Value::Array(v1))
}

// Clamps an index into `0..=len`.
fn clamp_index(n: &Number, len: usize) -> usize {
    if n.is_negative() {
        return 0;
    }
    match n.trunc().as_u64() {
        Some(i) if (i as usize) < len => i as usize,
        _ => len,
    }
}

fn slice(_ctx: &BuiltinContext, args: &[Value]) -> Result<Value, BuiltinError> {
    let name = "array.slice";
    ensure_args_count(name, args, 3)?;

    let array = ensure_array(name, &args[0])?;
    let start = ensure_numeric(name, &args[1])?;
    let stop = ensure_numeric(name, &args[2])?;

    let start = clamp_index(&start, array.len());
    let stop = clamp_index(&stop, array.len());

    if start >= stop {
        return Ok(Value::new_array());
    }

    Ok(Value::from(array[start..stop].to_vec()))
}
