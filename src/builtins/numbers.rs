// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use crate::builtins;
use crate::builtins::utils::{ensure_args_count, ensure_integer, ensure_numeric, ensure_string};
use crate::builtins::{BuiltinContext, BuiltinError};
use crate::number::Number;
use crate::value::Value;
use crate::Rc;

pub fn register(m: &mut builtins::BuiltinsMap<&'static str, (builtins::BuiltinFcn, u8)>) {
    m.insert("abs", (abs, 1));
    m.insert("ceil", (ceil, 1));
    m.insert("div", (div, 2));
    m.insert("floor", (floor, 1));
    m.insert("minus", (minus, 2));
    m.insert("mul", (mul, 2));
    m.insert("numbers.range", (range, 2));
    m.insert("numbers.range_step", (range_step, 3));
    m.insert("plus", (plus, 2));
    m.insert("rand.intn", (intn, 2));
    m.insert("rem", (rem, 2));
    m.insert("round", (round, 1));
}

#[derive(Debug, Clone, Copy)]
pub enum ArithOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
}

pub fn arithmetic_operation(
    name: &'static str,
    op: ArithOp,
    v1: &Value,
    v2: &Value,
) -> Result<Value, BuiltinError> {
    let v1 = ensure_numeric(name, v1)?;
    let v2 = ensure_numeric(name, v2)?;

    let result = match op {
        ArithOp::Add => v1.add(&v2),
        ArithOp::Sub => v1.sub(&v2),
        ArithOp::Mul => v1.mul(&v2),
        ArithOp::Div => v1.divide(&v2),
        ArithOp::Mod => v1.modulo(&v2),
    };
    result
        .map(Value::from)
        .map_err(|e| BuiltinError::eval(name, e.to_string()))
}

fn plus(_ctx: &BuiltinContext, args: &[Value]) -> Result<Value, BuiltinError> {
    let name = "plus";
    ensure_args_count(name, args, 2)?;
    arithmetic_operation(name, ArithOp::Add, &args[0], &args[1])
}

fn minus(_ctx: &BuiltinContext, args: &[Value]) -> Result<Value, BuiltinError> {
    let name = "minus";
    ensure_args_count(name, args, 2)?;

    match (&args[0], &args[1]) {
        (Value::Set(s1), Value::Set(s2)) => {
            Ok(Value::from_set(s1.difference(s2).cloned().collect()))
        }
        (Value::Set(_), v) | (v, Value::Set(_)) => Err(BuiltinError::eval(
            name,
            format!("`{name}` expects both arguments to be sets. Got `{v}`"),
        )),
        (v1, v2) => arithmetic_operation(name, ArithOp::Sub, v1, v2),
    }
}

fn mul(_ctx: &BuiltinContext, args: &[Value]) -> Result<Value, BuiltinError> {
    let name = "mul";
    ensure_args_count(name, args, 2)?;
    arithmetic_operation(name, ArithOp::Mul, &args[0], &args[1])
}

fn div(_ctx: &BuiltinContext, args: &[Value]) -> Result<Value, BuiltinError> {
    let name = "div";
    ensure_args_count(name, args, 2)?;
    arithmetic_operation(name, ArithOp::Div, &args[0], &args[1])
}

fn rem(_ctx: &BuiltinContext, args: &[Value]) -> Result<Value, BuiltinError> {
    let name = "rem";
    ensure_args_count(name, args, 2)?;
    arithmetic_operation(name, ArithOp::Mod, &args[0], &args[1])
}

fn abs(_ctx: &BuiltinContext, args: &[Value]) -> Result<Value, BuiltinError> {
    ensure_args_count("abs", args, 1)?;
    Ok(Value::from(ensure_numeric("abs", &args[0])?.abs()))
}

fn ceil(_ctx: &BuiltinContext, args: &[Value]) -> Result<Value, BuiltinError> {
    ensure_args_count("ceil", args, 1)?;
    Ok(Value::from(ensure_numeric("ceil", &args[0])?.ceil()))
}

fn floor(_ctx: &BuiltinContext, args: &[Value]) -> Result<Value, BuiltinError> {
    ensure_args_count("floor", args, 1)?;
    Ok(Value::from(ensure_numeric("floor", &args[0])?.floor()))
}

fn round(_ctx: &BuiltinContext, args: &[Value]) -> Result<Value, BuiltinError> {
    ensure_args_count("round", args, 1)?;
    Ok(Value::from(ensure_numeric("round", &args[0])?.round()))
}

fn stepped(start: i64, stop: i64, step: i64) -> Value {
    let mut values = vec![];
    let mut v = start;
    if start <= stop {
        while v <= stop {
            values.push(Value::from(v));
            match v.checked_add(step) {
                Some(n) => v = n,
                None => break,
            }
        }
    } else {
        while v >= stop {
            values.push(Value::from(v));
            match v.checked_sub(step) {
                Some(n) => v = n,
                None => break,
            }
        }
    }
    Value::from_array(values)
}

fn range(_ctx: &BuiltinContext, args: &[Value]) -> Result<Value, BuiltinError> {
    let name = "numbers.range";
    ensure_args_count(name, args, 2)?;
    let v1 = ensure_integer(name, &args[0])?;
    let v2 = ensure_integer(name, &args[1])?;

    Ok(stepped(v1, v2, 1))
}

fn range_step(_ctx: &BuiltinContext, args: &[Value]) -> Result<Value, BuiltinError> {
    let name = "numbers.range_step";
    ensure_args_count(name, args, 3)?;
    let v1 = ensure_integer(name, &args[0])?;
    let v2 = ensure_integer(name, &args[1])?;
    let step = ensure_integer(name, &args[2])?;

    if step <= 0 {
        return Err(BuiltinError::eval(
            name,
            format!("`{name}` step must be a positive integer. Got `{step}`"),
        ));
    }
    Ok(stepped(v1, v2, step))
}

// Results are memoized per query by the registry, so the same seed and bound
// yield the same number within one evaluation.
fn intn(ctx: &BuiltinContext, args: &[Value]) -> Result<Value, BuiltinError> {
    let name = "rand.intn";
    ensure_args_count(name, args, 2)?;
    let _seed: Rc<str> = ensure_string(name, &args[0])?;
    let n = ensure_numeric(name, &args[1])?;

    let bound = match n.abs().as_u64() {
        Some(b) => b,
        None => {
            return Err(BuiltinError::eval(
                name,
                format!("`{name}` expects an integer bound. Got `{n}`"),
            ))
        }
    };

    if bound == 0 {
        return Ok(Value::from(Number::from(0u64)));
    }

    Ok(Value::from(ctx.next_u64() % bound))
}
