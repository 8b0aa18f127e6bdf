// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use crate::builtins;
use crate::builtins::utils::ensure_args_count;
use crate::builtins::{BuiltinContext, BuiltinError};
use crate::value::Value;

pub fn register(m: &mut builtins::BuiltinsMap<&'static str, (builtins::BuiltinFcn, u8)>) {
    m.insert("equal", (equal, 2));
    m.insert("gt", (gt, 2));
    m.insert("gte", (gte, 2));
    m.insert("lt", (lt, 2));
    m.insert("lte", (lte, 2));
    m.insert("neq", (neq, 2));
}

#[derive(Debug, Clone, Copy)]
pub enum BoolOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

/// compare two values
///
/// When comparing values of different kinds, the following order is honored.
/// That is, null is less than all other kinds of values. bool is greater than
/// null, but less than other kinds of values, and so on.
///
///   1. null
///   2. bool
///   3. number
///   4. string
///   5. Array
///   6. Object
///   7. Set
///
/// Arrays compare element-wise, then by length. Objects compare entry by
/// entry, then by size. Sets compare like arrays of their sorted members.
/// Numbers compare by value, so `1 == 1.0`.
pub fn compare(op: BoolOp, v1: &Value, v2: &Value) -> Value {
    // The variants of Value are declared in the order necessary to obtain
    // the desired semantics.
    Value::Bool(match op {
        BoolOp::Eq => v1 == v2,
        BoolOp::Ne => v1 != v2,
        BoolOp::Lt => v1 < v2,
        BoolOp::Le => v1 <= v2,
        BoolOp::Gt => v1 > v2,
        BoolOp::Ge => v1 >= v2,
    })
}

fn binary(name: &'static str, op: BoolOp, args: &[Value]) -> Result<Value, BuiltinError> {
    ensure_args_count(name, args, 2)?;
    Ok(compare(op, &args[0], &args[1]))
}

fn equal(_ctx: &BuiltinContext, args: &[Value]) -> Result<Value, BuiltinError> {
    binary("equal", BoolOp::Eq, args)
}

fn neq(_ctx: &BuiltinContext, args: &[Value]) -> Result<Value, BuiltinError> {
    binary("neq", BoolOp::Ne, args)
}

fn lt(_ctx: &BuiltinContext, args: &[Value]) -> Result<Value, BuiltinError> {
    binary("lt", BoolOp::Lt, args)
}

fn lte(_ctx: &BuiltinContext, args: &[Value]) -> Result<Value, BuiltinError> {
    binary("lte", BoolOp::Le, args)
}

fn gt(_ctx: &BuiltinContext, args: &[Value]) -> Result<Value, BuiltinError> {
    binary("gt", BoolOp::Gt, args)
}

fn gte(_ctx: &BuiltinContext, args: &[Value]) -> Result<Value, BuiltinError> {
    binary("gte", BoolOp::Ge, args)
}
