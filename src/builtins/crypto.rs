// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use crate::builtins;
use crate::builtins::utils::{ensure_args_count, ensure_string};
use crate::builtins::{BuiltinContext, BuiltinError};
use crate::value::Value;

use data_encoding::HEXLOWER;
use hmac::{Hmac, Mac};
use md5::{Digest, Md5};
use sha1::Sha1;
use sha2::{Sha256, Sha512};
use subtle::ConstantTimeEq;

pub fn register(m: &mut builtins::BuiltinsMap<&'static str, (builtins::BuiltinFcn, u8)>) {
    m.insert("crypto.hmac.equal", (hmac_equal_fixed_time, 2));
    m.insert("crypto.hmac.md5", (hmac_md5, 2));
    m.insert("crypto.hmac.sha1", (hmac_sha1, 2));
    m.insert("crypto.hmac.sha256", (hmac_sha256, 2));
    m.insert("crypto.hmac.sha512", (hmac_sha512, 2));

    m.insert("crypto.md5", (crypto_md5, 1));
    m.insert("crypto.sha1", (crypto_sha1, 1));
    m.insert("crypto.sha256", (crypto_sha256, 1));
}

// Runs in time independent of where the inputs differ.
fn hmac_equal_fixed_time(_ctx: &BuiltinContext, args: &[Value]) -> Result<Value, BuiltinError> {
    let name = "crypto.hmac.equal";
    ensure_args_count(name, args, 2)?;

    let hmac1 = ensure_string(name, &args[0])?;
    let hmac2 = ensure_string(name, &args[1])?;

    Ok(Value::Bool(
        hmac1.as_bytes().ct_eq(hmac2.as_bytes()).into(),
    ))
}

fn hmac_hex<M: Mac + hmac::digest::KeyInit>(
    name: &'static str,
    args: &[Value],
) -> Result<Value, BuiltinError> {
    ensure_args_count(name, args, 2)?;

    let x = ensure_string(name, &args[0])?;
    let key = ensure_string(name, &args[1])?;

    let mut hmac = <M as Mac>::new_from_slice(key.as_bytes())
        .map_err(|_| BuiltinError::halt(name, "failed to create hmac instance"))?;

    hmac.update(x.as_bytes());
    let result = hmac.finalize();

    Ok(Value::String(HEXLOWER.encode(&result.into_bytes()).into()))
}

fn hmac_md5(_ctx: &BuiltinContext, args: &[Value]) -> Result<Value, BuiltinError> {
    hmac_hex::<Hmac<Md5>>("crypto.hmac.md5", args)
}

fn hmac_sha1(_ctx: &BuiltinContext, args: &[Value]) -> Result<Value, BuiltinError> {
    hmac_hex::<Hmac<Sha1>>("crypto.hmac.sha1", args)
}

fn hmac_sha256(_ctx: &BuiltinContext, args: &[Value]) -> Result<Value, BuiltinError> {
    hmac_hex::<Hmac<Sha256>>("crypto.hmac.sha256", args)
}

fn hmac_sha512(_ctx: &BuiltinContext, args: &[Value]) -> Result<Value, BuiltinError> {
    hmac_hex::<Hmac<Sha512>>("crypto.hmac.sha512", args)
}

fn digest_hex<D: Digest>(name: &'static str, args: &[Value]) -> Result<Value, BuiltinError> {
    ensure_args_count(name, args, 1)?;

    let x = ensure_string(name, &args[0])?;

    let mut h = D::new();
    h.update(x.as_bytes());
    let result = h.finalize();

    Ok(Value::String(HEXLOWER.encode(&result).into()))
}

fn crypto_md5(_ctx: &BuiltinContext, args: &[Value]) -> Result<Value, BuiltinError> {
    digest_hex::<Md5>("crypto.md5", args)
}

fn crypto_sha1(_ctx: &BuiltinContext, args: &[Value]) -> Result<Value, BuiltinError> {
    digest_hex::<Sha1>("crypto.sha1", args)
}

fn crypto_sha256(_ctx: &BuiltinContext, args: &[Value]) -> Result<Value, BuiltinError> {
    digest_hex::<Sha256>("crypto.sha256", args)
}
