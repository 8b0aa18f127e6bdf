// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use crate::builtins;
use crate::builtins::utils::{ensure_args_count, ensure_array, ensure_object};
use crate::builtins::{BuiltinContext, BuiltinError};
use crate::Rc;
use crate::Value;

pub fn register(m: &mut builtins::BuiltinsMap<&'static str, (builtins::BuiltinFcn, u8)>) {
    m.insert("object.get", (get, 3));
    m.insert("object.keys", (keys, 1));
    m.insert("object.union", (object_union, 2));
    m.insert("object.union_n", (object_union_n, 1));
}

fn get(_ctx: &BuiltinContext, args: &[Value]) -> Result<Value, BuiltinError> {
    let name = "object.get";
    ensure_args_count(name, args, 3)?;
    let obj = ensure_object(name, &args[0])?;
    let default = &args[2];

    Ok(match &args[1] {
        // A path of keys.
        Value::Array(keys) => {
            let mut v = &args[0];
            for a in keys.iter() {
                v = &v[a];
                if v == &Value::Undefined {
                    v = default;
                    break;
                }
            }
            v.clone()
        }
        key => match obj.get(key) {
            Some(v) => v.clone(),
            _ => default.clone(),
        },
    })
}

fn keys(_ctx: &BuiltinContext, args: &[Value]) -> Result<Value, BuiltinError> {
    let name = "object.keys";
    ensure_args_count(name, args, 1)?;
    let obj = ensure_object(name, &args[0])?;
    Ok(Value::from_set(obj.keys().cloned().collect()))
}

/// Right-biased recursive merge. Only keys whose values are objects on both
/// sides are merged; otherwise `obj2` wins.
pub fn union(obj1: &Value, obj2: &Value) -> Value {
    match (obj1, obj2) {
        (Value::Object(m1), Value::Object(m2)) => {
            let mut u = m1.clone();
            let um = Rc::make_mut(&mut u);

            for (key2, value2) in m2.iter() {
                let vm = match um.get(key2) {
                    Some(value1) => union(value1, value2),
                    _ => value2.clone(),
                };
                um.insert(key2.clone(), vm);
            }
            Value::Object(u)
        }
        _ => obj2.clone(),
    }
}

fn object_union(_ctx: &BuiltinContext, args: &[Value]) -> Result<Value, BuiltinError> {
    let name = "object.union";
    ensure_args_count(name, args, 2)?;

    let _ = ensure_object(name, &args[0])?;
    let _ = ensure_object(name, &args[1])?;

    Ok(union(&args[0], &args[1]))
}

fn object_union_n(_ctx: &BuiltinContext, args: &[Value]) -> Result<Value, BuiltinError> {
    let name = "object.union_n";
    ensure_args_count(name, args, 1)?;

    let arr = ensure_array(name, &args[0])?;

    let mut u = Value::new_object();
    for (idx, a) in arr.iter().enumerate() {
        if a.as_object().is_err() {
            return Err(BuiltinError::eval(
                name,
                format!("item at index {idx} is not an object"),
            ));
        }
        u = union(&u, a);
    }

    Ok(u)
}
