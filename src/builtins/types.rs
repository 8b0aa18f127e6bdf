// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use crate::builtins;
use crate::builtins::utils::ensure_args_count;
use crate::builtins::{BuiltinContext, BuiltinError};
use crate::value::Value;

pub fn register(m: &mut builtins::BuiltinsMap<&'static str, (builtins::BuiltinFcn, u8)>) {
    m.insert("is_array", (is_array, 1));
    m.insert("is_boolean", (is_boolean, 1));
    m.insert("is_null", (is_null, 1));
    m.insert("is_number", (is_number, 1));
    m.insert("is_object", (is_object, 1));
    m.insert("is_set", (is_set, 1));
    m.insert("is_string", (is_string, 1));
    m.insert("type_name", (type_name, 1));
}

// The predicates never fail. Undefined is not any of the kinds.

fn is_array(_ctx: &BuiltinContext, args: &[Value]) -> Result<Value, BuiltinError> {
    ensure_args_count("is_array", args, 1)?;
    Ok(Value::Bool(matches!(&args[0], Value::Array(_))))
}

fn is_boolean(_ctx: &BuiltinContext, args: &[Value]) -> Result<Value, BuiltinError> {
    ensure_args_count("is_boolean", args, 1)?;
    Ok(Value::Bool(matches!(&args[0], Value::Bool(_))))
}

fn is_null(_ctx: &BuiltinContext, args: &[Value]) -> Result<Value, BuiltinError> {
    ensure_args_count("is_null", args, 1)?;
    Ok(Value::Bool(matches!(&args[0], Value::Null)))
}

fn is_number(_ctx: &BuiltinContext, args: &[Value]) -> Result<Value, BuiltinError> {
    ensure_args_count("is_number", args, 1)?;
    Ok(Value::Bool(matches!(&args[0], Value::Number(_))))
}

fn is_object(_ctx: &BuiltinContext, args: &[Value]) -> Result<Value, BuiltinError> {
    ensure_args_count("is_object", args, 1)?;
    Ok(Value::Bool(matches!(&args[0], Value::Object(_))))
}

fn is_set(_ctx: &BuiltinContext, args: &[Value]) -> Result<Value, BuiltinError> {
    ensure_args_count("is_set", args, 1)?;
    Ok(Value::Bool(matches!(&args[0], Value::Set(_))))
}

fn is_string(_ctx: &BuiltinContext, args: &[Value]) -> Result<Value, BuiltinError> {
    ensure_args_count("is_string", args, 1)?;
    Ok(Value::Bool(matches!(&args[0], Value::String(_))))
}

pub fn type_name(_ctx: &BuiltinContext, args: &[Value]) -> Result<Value, BuiltinError> {
    ensure_args_count("type_name", args, 1)?;
    Ok(Value::String(args[0].type_name().into()))
}
