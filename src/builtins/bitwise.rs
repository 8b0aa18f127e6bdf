// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use crate::builtins;
use crate::builtins::utils::{ensure_args_count, ensure_numeric};
use crate::builtins::{BuiltinContext, BuiltinError};
use crate::number::Number;
use crate::value::Value;

pub fn register(m: &mut builtins::BuiltinsMap<&'static str, (builtins::BuiltinFcn, u8)>) {
    m.insert("bits.and", (and, 2));
    m.insert("bits.lsh", (lsh, 2));
    m.insert("bits.negate", (negate, 1));
    m.insert("bits.or", (or, 2));
    m.insert("bits.rsh", (rsh, 2));
    m.insert("bits.xor", (xor, 2));
}

fn ensure_integer_arg(name: &str, v: &Value, allow_negative: bool) -> Result<Number, BuiltinError> {
    let n = ensure_numeric(name, v)?;
    if !n.is_integer() {
        return Err(BuiltinError::eval(
            name,
            format!("`{name}` expects integer argument. Got `{v}` instead"),
        ));
    }
    if !allow_negative && n.is_negative() {
        return Err(BuiltinError::eval(
            name,
            format!("`{name}` expects a non-negative shift. Got `{v}` instead"),
        ));
    }
    Ok(n)
}

fn binary(
    name: &'static str,
    args: &[Value],
    shift: bool,
    op: fn(&Number, &Number) -> Option<Number>,
) -> Result<Value, BuiltinError> {
    ensure_args_count(name, args, 2)?;
    let v1 = ensure_integer_arg(name, &args[0], true)?;
    let v2 = ensure_integer_arg(name, &args[1], !shift)?;

    match op(&v1, &v2) {
        Some(v) => Ok(Value::from(v)),
        None => Err(BuiltinError::eval(
            name,
            format!("`{name}` could not be applied to `{v1}` and `{v2}`"),
        )),
    }
}

fn and(_ctx: &BuiltinContext, args: &[Value]) -> Result<Value, BuiltinError> {
    binary("bits.and", args, false, Number::and)
}

fn lsh(_ctx: &BuiltinContext, args: &[Value]) -> Result<Value, BuiltinError> {
    binary("bits.lsh", args, true, Number::lsh)
}

fn or(_ctx: &BuiltinContext, args: &[Value]) -> Result<Value, BuiltinError> {
    binary("bits.or", args, false, Number::or)
}

fn rsh(_ctx: &BuiltinContext, args: &[Value]) -> Result<Value, BuiltinError> {
    binary("bits.rsh", args, true, Number::rsh)
}

fn xor(_ctx: &BuiltinContext, args: &[Value]) -> Result<Value, BuiltinError> {
    binary("bits.xor", args, false, Number::xor)
}

fn negate(_ctx: &BuiltinContext, args: &[Value]) -> Result<Value, BuiltinError> {
    let name = "bits.negate";
    ensure_args_count(name, args, 1)?;

    let v = ensure_integer_arg(name, &args[0], true)?;
    match v.neg() {
        Some(v) => Ok(Value::from(v)),
        None => Err(BuiltinError::eval(name, format!("cannot negate `{v}`"))),
    }
}
