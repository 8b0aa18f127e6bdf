// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use crate::builtins;
use crate::builtins::utils::{ensure_args_count, ensure_string};
use crate::builtins::{BuiltinContext, BuiltinError};
use crate::number::Number;
use crate::value::Value;

use core::str::FromStr;

pub fn register(m: &mut builtins::BuiltinsMap<&'static str, (builtins::BuiltinFcn, u8)>) {
    m.insert("units.parse", (parse, 1));
    m.insert("units.parse_bytes", (parse_bytes, 1));
}

fn ten_exp(suffix: &str) -> Option<i32> {
    Some(match suffix {
        "E" | "e" => 18,
        "P" | "p" => 15,
        "T" | "t" => 12,
        "G" | "g" => 9,
        "M" => 6,
        "K" | "k" => 3,
        "m" => -3,
        "" => 0,
        _ => return None,
    })
}

fn two_exp(suffix: &str) -> Option<i32> {
    Some(match suffix.to_ascii_lowercase().as_str() {
        "ki" => 10,
        "mi" => 20,
        "gi" => 30,
        "ti" => 40,
        "pi" => 50,
        "ei" => 60,
        _ => return None,
    })
}

fn twob_exp(suffix: &str) -> Option<i32> {
    Some(match suffix.to_ascii_lowercase().as_str() {
        "ei" | "eib" => 60,
        "pi" | "pib" => 50,
        "ti" | "tib" => 40,
        "gi" | "gib" => 30,
        "mi" | "mib" => 20,
        "ki" | "kib" => 10,
        "" => 0,
        _ => return None,
    })
}

fn tenb_exp(suffix: &str) -> Option<i32> {
    Some(match suffix.to_ascii_lowercase().as_str() {
        "e" | "eb" => 18,
        "p" | "pb" => 15,
        "t" | "tb" => 12,
        "g" | "gb" => 9,
        "m" | "mb" => 6,
        "k" | "kb" => 3,
        _ => return None,
    })
}

// Splits `"10Ki"` into its number and its unit suffix.
fn split_quantity<'a>(name: &str, s: &'a str) -> Result<(Number, &'a str), BuiltinError> {
    let s = if s.len() >= 2 && s.starts_with('"') && s.ends_with('"') {
        &s[1..s.len() - 1]
    } else {
        s
    };

    if s.chars().any(char::is_whitespace) {
        return Err(BuiltinError::eval(
            name,
            "spaces not allowed in resource strings",
        ));
    }

    let (number_part, suffix) = match s.rfind(|c: char| c.is_ascii_digit()) {
        Some(p) => (&s[0..p + 1], &s[p + 1..]),
        None => (s, ""),
    };

    let number = if number_part.starts_with('.') {
        Number::from_str(&format!("0{number_part}"))
    } else {
        Number::from_str(number_part)
    }
    .map_err(|_| BuiltinError::eval(name, format!("could not parse number `{number_part}`")))?;

    Ok((number, suffix))
}

fn scale(name: &str, n: &Number, pow: anyhow::Result<Number>) -> Result<Number, BuiltinError> {
    pow.and_then(|p| n.mul(&p))
        .map_err(|e| BuiltinError::eval(name, e.to_string()))
}

fn parse(_ctx: &BuiltinContext, args: &[Value]) -> Result<Value, BuiltinError> {
    let name = "units.parse";
    ensure_args_count(name, args, 1)?;
    let string = ensure_string(name, &args[0])?;

    let (n, suffix) = split_quantity(name, &string)?;

    if let Some(e) = ten_exp(suffix) {
        Ok(Value::from(scale(name, &n, Number::ten_pow(e))?))
    } else if let Some(e) = two_exp(suffix) {
        Ok(Value::from(scale(name, &n, Number::two_pow(e))?))
    } else {
        Err(BuiltinError::eval(
            name,
            format!("unknown unit suffix `{suffix}`"),
        ))
    }
}

// Byte counts are whole numbers.
fn parse_bytes(_ctx: &BuiltinContext, args: &[Value]) -> Result<Value, BuiltinError> {
    let name = "units.parse_bytes";
    ensure_args_count(name, args, 1)?;
    let string = ensure_string(name, &args[0])?;

    let (n, suffix) = split_quantity(name, &string)?;

    if let Some(e) = twob_exp(suffix) {
        Ok(Value::from(scale(name, &n, Number::two_pow(e))?.round()))
    } else if let Some(e) = tenb_exp(suffix) {
        Ok(Value::from(scale(name, &n, Number::ten_pow(e))?.round()))
    } else {
        Err(BuiltinError::eval(
            name,
            format!("unknown byte unit suffix `{suffix}`"),
        ))
    }
}
