// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use crate::builtins;
use crate::builtins::utils::ensure_args_count;
use crate::builtins::{BuiltinContext, BuiltinError};
use crate::value::Value;

use std::time::UNIX_EPOCH;

pub fn register(m: &mut builtins::BuiltinsMap<&'static str, (builtins::BuiltinFcn, u8)>) {
    m.insert("time.now_ns", (now_ns, 0));
}

// Every call within one query observes the context's creation time.
fn now_ns(ctx: &BuiltinContext, args: &[Value]) -> Result<Value, BuiltinError> {
    let name = "time.now_ns";
    ensure_args_count(name, args, 0)?;

    let elapsed = ctx
        .timestamp
        .duration_since(UNIX_EPOCH)
        .map_err(|e| BuiltinError::eval(name, format!("could not fetch time: {e}")))?;
    Ok(Value::from(elapsed.as_nanos()))
}
