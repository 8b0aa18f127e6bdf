// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use crate::builtins;
use crate::builtins::utils::{ensure_args_count, ensure_string};
use crate::builtins::{BuiltinContext, BuiltinError};
use crate::trace::{TraceEvent, TraceOperation};
use crate::value::Value;

pub fn register(m: &mut builtins::BuiltinsMap<&'static str, (builtins::BuiltinFcn, u8)>) {
    m.insert("trace", (trace, 1));
}

// A context without a tracer drops the note.
fn trace(ctx: &BuiltinContext, args: &[Value]) -> Result<Value, BuiltinError> {
    let name = "trace";
    ensure_args_count(name, args, 1)?;
    let msg = ensure_string(name, &args[0])?;

    if let Some(tracer) = &ctx.tracer {
        tracer.trace(TraceEvent {
            operation: TraceOperation::Note,
            message: msg.to_string(),
            location: ctx.location.clone(),
        });
    }

    Ok(Value::Bool(true))
}
