// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use crate::builtins::BuiltinError;
use crate::number::Number;
use crate::Rc;
use crate::Value;

use std::collections::{BTreeMap, BTreeSet};

pub fn ensure_args_count(
    fcn: &'static str,
    args: &[Value],
    expected: usize,
) -> Result<(), BuiltinError> {
    if args.len() != expected {
        if expected == 1 {
            return Err(BuiltinError::halt(fcn, format!("`{fcn}` expects 1 argument")));
        }
        return Err(BuiltinError::halt(
            fcn,
            format!("`{fcn}` expects {expected} arguments"),
        ));
    }
    Ok(())
}

pub fn ensure_numeric(fcn: &str, v: &Value) -> Result<Number, BuiltinError> {
    Ok(match &v {
        Value::Number(n) => n.clone(),
        _ => {
            return Err(BuiltinError::eval(
                fcn,
                format!("`{fcn}` expects numeric argument. Got `{v}` instead"),
            ))
        }
    })
}

pub fn ensure_integer(fcn: &str, v: &Value) -> Result<i64, BuiltinError> {
    match ensure_numeric(fcn, v)?.as_i64() {
        Some(n) => Ok(n),
        None => Err(BuiltinError::eval(
            fcn,
            format!("`{fcn}` expects integer argument. Got `{v}` instead"),
        )),
    }
}

pub fn ensure_string(fcn: &str, v: &Value) -> Result<Rc<str>, BuiltinError> {
    Ok(match &v {
        Value::String(s) => s.clone(),
        _ => {
            return Err(BuiltinError::eval(
                fcn,
                format!("`{fcn}` expects string argument. Got `{v}` instead"),
            ))
        }
    })
}

pub fn ensure_string_element<'a>(
    fcn: &str,
    v: &'a Value,
    idx: usize,
) -> Result<&'a str, BuiltinError> {
    Ok(match &v {
        Value::String(s) => s.as_ref(),
        _ => {
            return Err(BuiltinError::eval(
                fcn,
                format!("`{fcn}` expects string collection. Element {idx} is not a string."),
            ))
        }
    })
}

pub fn ensure_string_collection<'a>(
    fcn: &str,
    v: &'a Value,
) -> Result<Vec<&'a str>, BuiltinError> {
    let mut collection = vec![];
    match &v {
        Value::Array(a) => {
            for (idx, elem) in a.iter().enumerate() {
                collection.push(ensure_string_element(fcn, elem, idx)?);
            }
        }
        Value::Set(s) => {
            for (idx, elem) in s.iter().enumerate() {
                collection.push(ensure_string_element(fcn, elem, idx)?);
            }
        }
        _ => {
            return Err(BuiltinError::eval(
                fcn,
                format!("`{fcn}` expects array/set of strings."),
            ))
        }
    }
    Ok(collection)
}

pub fn ensure_array(fcn: &str, v: &Value) -> Result<Rc<Vec<Value>>, BuiltinError> {
    Ok(match v {
        Value::Array(a) => a.clone(),
        _ => {
            return Err(BuiltinError::eval(
                fcn,
                format!("`{fcn}` expects array argument. Got `{v}` instead"),
            ))
        }
    })
}

pub fn ensure_set(fcn: &str, v: &Value) -> Result<Rc<BTreeSet<Value>>, BuiltinError> {
    Ok(match v {
        Value::Set(s) => s.clone(),
        _ => {
            return Err(BuiltinError::eval(
                fcn,
                format!("`{fcn}` expects set argument. Got `{v}` instead"),
            ))
        }
    })
}

pub fn ensure_object(fcn: &str, v: &Value) -> Result<Rc<BTreeMap<Value, Value>>, BuiltinError> {
    Ok(match v {
        Value::Object(o) => o.clone(),
        _ => {
            return Err(BuiltinError::eval(
                fcn,
                format!("`{fcn}` expects object argument. Got `{v}` instead"),
            ))
        }
    })
}
