// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use crate::builtins;
use crate::builtins::utils::{ensure_args_count, ensure_string};
use crate::builtins::{BuiltinContext, BuiltinError};
use crate::value::Value;

use std::collections::BTreeMap;

use uuid::{Builder, Timestamp, Uuid};

pub fn register(m: &mut builtins::BuiltinsMap<&'static str, (builtins::BuiltinFcn, u8)>) {
    m.insert("uuid.parse", (parse, 1));
    m.insert("uuid.rfc4122", (rfc4122, 1));
}

fn parse(_ctx: &BuiltinContext, args: &[Value]) -> Result<Value, BuiltinError> {
    let name = "uuid.parse";
    ensure_args_count(name, args, 1)?;

    let val = ensure_string(name, &args[0])?;
    let Ok(uuid) = Uuid::parse_str(&val) else {
        return Ok(Value::Undefined);
    };
    let version = uuid.get_version_num();

    let mut result = BTreeMap::new();
    result.insert(Value::from("version"), Value::from(version));
    result.insert(
        Value::from("variant"),
        Value::from(uuid.get_variant().to_string()),
    );

    if let Some(time) = timestamp(&uuid) {
        let (sec, nanosec) = time.to_unix();
        let time = sec.wrapping_mul(1_000_000_000).wrapping_add(nanosec as u64);
        result.insert(Value::from("time"), Value::from(time));
    }

    if version == 1 || version == 2 {
        let (f1, _, _, f4) = uuid.as_fields();

        result.insert(
            Value::from("nodeid"),
            Value::from(
                f4[2..]
                    .iter()
                    .map(|f| format!("{f:02x}"))
                    .collect::<Vec<_>>()
                    .join("-"),
            ),
        );
        result.insert(Value::from("macvariables"), Value::from(mac_vars(f4[2])));

        let clock_seq = u16::from_be_bytes([f4[0], f4[1]]) & 0x3fff;
        result.insert(Value::from("clocksequence"), Value::from(clock_seq as u64));

        if version == 2 {
            result.insert(Value::from("id"), Value::from(f1 as u64));
            result.insert(Value::from("domain"), Value::from(domain(f4[1])));
        }
    }

    Ok(Value::from(result))
}

// Version 4 UUID drawn from the context generator. The registry caches the
// result per seed string, so repeated calls in one query agree.
fn rfc4122(ctx: &BuiltinContext, args: &[Value]) -> Result<Value, BuiltinError> {
    let name = "uuid.rfc4122";
    ensure_args_count(name, args, 1)?;
    ensure_string(name, &args[0])?;

    let mut bytes = [0u8; 16];
    ctx.fill_bytes(&mut bytes);
    let uuid = Builder::from_random_bytes(bytes).into_uuid();
    Ok(Value::from(uuid.to_string()))
}

fn mac_vars(b: u8) -> &'static str {
    if b & 0b11 == 0b11 {
        return "local:multicast";
    } else if b & 0b01 == 0b01 {
        return "global:multicast";
    } else if b & 0b10 == 0b10 {
        return "local:unicast";
    }
    "global:unicast"
}

fn domain(b: u8) -> String {
    match b {
        0 => "Person".to_string(),
        1 => "Group".to_string(),
        2 => "Org".to_string(),
        n => format!("Domain{n}"),
    }
}

// Version 2 UUIDs carry a version 1 style timestamp that `Uuid::get_timestamp`
// does not decode.
fn timestamp(uuid: &Uuid) -> Option<Timestamp> {
    if uuid.get_version_num() == 2 {
        let (ticks, counter) = rfc4122_ticks(uuid.as_bytes());
        #[allow(deprecated)]
        return Some(Timestamp::from_rfc4122(ticks, counter));
    }

    uuid.get_timestamp()
}

fn rfc4122_ticks(bytes: &[u8; 16]) -> (u64, u16) {
    let time_low = u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]) as u64;
    let time_mid = u16::from_be_bytes([bytes[4], bytes[5]]) as u64;
    let time_hi = (u16::from_be_bytes([bytes[6], bytes[7]]) & 0x0fff) as u64;

    let ticks = time_hi << 48 | time_mid << 32 | time_low;
    let counter = u16::from_be_bytes([bytes[8], bytes[9]]) & 0x3fff;
    (ticks, counter)
}
