// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use crate::builtins;
#[allow(unused)]
use crate::builtins::utils::{ensure_args_count, ensure_string};
#[allow(unused)]
use crate::builtins::{BuiltinContext, BuiltinError};
#[allow(unused)]
use crate::value::Value;

#[cfg(any(feature = "base64", feature = "base64url"))]
use data_encoding::BASE64;
#[cfg(feature = "base64url")]
use data_encoding::{BASE64URL, BASE64URL_NOPAD};
#[cfg(feature = "hex")]
use data_encoding::{HEXLOWER, HEXLOWER_PERMISSIVE};

pub fn register(m: &mut builtins::BuiltinsMap<&'static str, (builtins::BuiltinFcn, u8)>) {
    #[cfg(feature = "base64")]
    {
        m.insert("base64.decode", (base64_decode, 1));
        m.insert("base64.encode", (base64_encode, 1));
        m.insert("base64.is_valid", (base64_is_valid, 1));
    }
    #[cfg(feature = "base64url")]
    {
        m.insert("base64url.decode", (base64url_decode, 1));
        m.insert("base64url.encode", (base64url_encode, 1));
        m.insert("base64url.encode_no_pad", (base64url_encode_no_pad, 1));
    }
    #[cfg(feature = "hex")]
    {
        m.insert("hex.decode", (hex_decode, 1));
        m.insert("hex.encode", (hex_encode, 1));
    }
}

#[cfg(any(feature = "base64", feature = "base64url", feature = "hex"))]
fn decoded_string(bytes: &[u8]) -> Value {
    Value::String(String::from_utf8_lossy(bytes).into())
}

#[cfg(feature = "base64")]
fn base64_decode(_ctx: &BuiltinContext, args: &[Value]) -> Result<Value, BuiltinError> {
    let name = "base64.decode";
    ensure_args_count(name, args, 1)?;

    let encoded_str = ensure_string(name, &args[0])?;
    let decoded_bytes = BASE64
        .decode(encoded_str.as_bytes())
        .map_err(|e| BuiltinError::eval(name, format!("invalid base64: {e}")))?;
    Ok(decoded_string(&decoded_bytes))
}

#[cfg(feature = "base64")]
fn base64_encode(_ctx: &BuiltinContext, args: &[Value]) -> Result<Value, BuiltinError> {
    let name = "base64.encode";
    ensure_args_count(name, args, 1)?;

    let s = ensure_string(name, &args[0])?;
    Ok(Value::String(BASE64.encode(s.as_bytes()).into()))
}

#[cfg(feature = "base64")]
fn base64_is_valid(_ctx: &BuiltinContext, args: &[Value]) -> Result<Value, BuiltinError> {
    let name = "base64.is_valid";
    ensure_args_count(name, args, 1)?;

    let encoded_str = ensure_string(name, &args[0])?;
    Ok(Value::Bool(BASE64.decode(encoded_str.as_bytes()).is_ok()))
}

// Accepts both the padded and the unpadded alphabet.
#[cfg(feature = "base64url")]
fn base64url_decode(_ctx: &BuiltinContext, args: &[Value]) -> Result<Value, BuiltinError> {
    let name = "base64url.decode";
    ensure_args_count(name, args, 1)?;

    let encoded_str = ensure_string(name, &args[0])?;
    let decoded_bytes = match BASE64URL.decode(encoded_str.as_bytes()) {
        Ok(b) => b,
        Err(_) => BASE64URL_NOPAD
            .decode(encoded_str.as_bytes())
            .map_err(|e| BuiltinError::eval(name, format!("invalid base64url: {e}")))?,
    };
    Ok(decoded_string(&decoded_bytes))
}

#[cfg(feature = "base64url")]
fn base64url_encode(_ctx: &BuiltinContext, args: &[Value]) -> Result<Value, BuiltinError> {
    let name = "base64url.encode";
    ensure_args_count(name, args, 1)?;

    let s = ensure_string(name, &args[0])?;
    Ok(Value::String(BASE64URL.encode(s.as_bytes()).into()))
}

#[cfg(feature = "base64url")]
fn base64url_encode_no_pad(_ctx: &BuiltinContext, args: &[Value]) -> Result<Value, BuiltinError> {
    let name = "base64url.encode_no_pad";
    ensure_args_count(name, args, 1)?;

    let s = ensure_string(name, &args[0])?;
    Ok(Value::String(BASE64URL_NOPAD.encode(s.as_bytes()).into()))
}

#[cfg(feature = "hex")]
fn hex_decode(_ctx: &BuiltinContext, args: &[Value]) -> Result<Value, BuiltinError> {
    let name = "hex.decode";
    ensure_args_count(name, args, 1)?;

    let encoded_str = ensure_string(name, &args[0])?;
    let decoded_bytes = HEXLOWER_PERMISSIVE
        .decode(encoded_str.as_bytes())
        .map_err(|e| BuiltinError::eval(name, format!("invalid hex: {e}")))?;
    Ok(decoded_string(&decoded_bytes))
}

#[cfg(feature = "hex")]
fn hex_encode(_ctx: &BuiltinContext, args: &[Value]) -> Result<Value, BuiltinError> {
    let name = "hex.encode";
    ensure_args_count(name, args, 1)?;

    let s = ensure_string(name, &args[0])?;
    Ok(Value::String(HEXLOWER.encode(s.as_bytes()).into()))
}
