// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use crate::builtins;
use crate::builtins::utils::{
    ensure_args_count, ensure_array, ensure_integer, ensure_numeric, ensure_string,
    ensure_string_collection,
};
use crate::builtins::{BuiltinContext, BuiltinError};
use crate::number::Number;
use crate::Value;

pub fn register(m: &mut builtins::BuiltinsMap<&'static str, (builtins::BuiltinFcn, u8)>) {
    m.insert("concat", (concat, 2));
    m.insert("contains", (contains, 2));
    m.insert("endswith", (endswith, 2));
    m.insert("format_int", (format_int, 2));
    m.insert("indexof", (indexof, 2));
    m.insert("indexof_n", (indexof_n, 2));
    m.insert("internal.template_string", (template_string, 1));
    m.insert("lower", (lower, 1));
    m.insert("replace", (replace, 3));
    m.insert("split", (split, 2));
    m.insert("sprintf", (sprintf, 2));
    m.insert("startswith", (startswith, 2));
    m.insert("strings.count", (strings_count, 2));
    m.insert("strings.reverse", (reverse, 1));
    m.insert("substring", (substring, 3));
    m.insert("trim", (trim, 2));
    m.insert("trim_left", (trim_left, 2));
    m.insert("trim_prefix", (trim_prefix, 2));
    m.insert("trim_right", (trim_right, 2));
    m.insert("trim_space", (trim_space, 1));
    m.insert("trim_suffix", (trim_suffix, 2));
    m.insert("upper", (upper, 1));
}

fn concat(_ctx: &BuiltinContext, args: &[Value]) -> Result<Value, BuiltinError> {
    let name = "concat";
    ensure_args_count(name, args, 2)?;
    let delimiter = ensure_string(name, &args[0])?;
    let collection = ensure_string_collection(name, &args[1])?;
    Ok(Value::String(collection.join(delimiter.as_ref()).into()))
}

fn contains(_ctx: &BuiltinContext, args: &[Value]) -> Result<Value, BuiltinError> {
    let name = "contains";
    ensure_args_count(name, args, 2)?;
    let s1 = ensure_string(name, &args[0])?;
    let s2 = ensure_string(name, &args[1])?;
    Ok(Value::Bool(s1.contains(s2.as_ref())))
}

fn endswith(_ctx: &BuiltinContext, args: &[Value]) -> Result<Value, BuiltinError> {
    let name = "endswith";
    ensure_args_count(name, args, 2)?;
    let s1 = ensure_string(name, &args[0])?;
    let s2 = ensure_string(name, &args[1])?;
    Ok(Value::Bool(s1.ends_with(s2.as_ref())))
}

fn startswith(_ctx: &BuiltinContext, args: &[Value]) -> Result<Value, BuiltinError> {
    let name = "startswith";
    ensure_args_count(name, args, 2)?;
    let s1 = ensure_string(name, &args[0])?;
    let s2 = ensure_string(name, &args[1])?;
    Ok(Value::Bool(s1.starts_with(s2.as_ref())))
}

fn format_int(_ctx: &BuiltinContext, args: &[Value]) -> Result<Value, BuiltinError> {
    let name = "format_int";
    ensure_args_count(name, args, 2)?;
    let n = ensure_numeric(name, &args[0])?;
    let base = ensure_integer(name, &args[1])?;

    let radix = match base {
        2 | 8 | 10 | 16 => base as u32,
        _ => {
            return Err(BuiltinError::eval(
                name,
                format!("`{name}` expects base of 2, 8, 10, 16. Got `{base}`"),
            ))
        }
    };

    match n.format_radix(radix) {
        Some(s) => Ok(Value::String(s.into())),
        None => Err(BuiltinError::eval(
            name,
            format!("`{name}` could not format `{n}`"),
        )),
    }
}

// Code point offset of the byte offset `pos` in `s`.
fn char_index(s: &str, pos: usize) -> usize {
    s[..pos].chars().count()
}

fn indexof(_ctx: &BuiltinContext, args: &[Value]) -> Result<Value, BuiltinError> {
    let name = "indexof";
    ensure_args_count(name, args, 2)?;
    let s1 = ensure_string(name, &args[0])?;
    let s2 = ensure_string(name, &args[1])?;
    if s2.is_empty() {
        return Err(BuiltinError::eval(name, "empty search character"));
    }

    Ok(match s1.find(s2.as_ref()) {
        Some(pos) => Value::from(char_index(&s1, pos)),
        None => Value::from(-1i64),
    })
}

fn indexof_n(_ctx: &BuiltinContext, args: &[Value]) -> Result<Value, BuiltinError> {
    let name = "indexof_n";
    ensure_args_count(name, args, 2)?;
    let s1 = ensure_string(name, &args[0])?;
    let s2 = ensure_string(name, &args[1])?;
    if s2.is_empty() {
        return Err(BuiltinError::eval(name, "empty search character"));
    }

    let mut positions = vec![];
    let mut start = 0;
    // Matches may overlap, so the search resumes one code point after each hit.
    while let Some(pos) = s1[start..].find(s2.as_ref()) {
        let at = start + pos;
        positions.push(Value::from(char_index(&s1, at)));
        match s1[at..].chars().next() {
            Some(c) => start = at + c.len_utf8(),
            None => break,
        }
    }
    Ok(Value::from_array(positions))
}

fn lower(_ctx: &BuiltinContext, args: &[Value]) -> Result<Value, BuiltinError> {
    let name = "lower";
    ensure_args_count(name, args, 1)?;
    let s = ensure_string(name, &args[0])?;
    Ok(Value::String(s.to_lowercase().into()))
}

fn upper(_ctx: &BuiltinContext, args: &[Value]) -> Result<Value, BuiltinError> {
    let name = "upper";
    ensure_args_count(name, args, 1)?;
    let s = ensure_string(name, &args[0])?;
    Ok(Value::String(s.to_uppercase().into()))
}

fn replace(_ctx: &BuiltinContext, args: &[Value]) -> Result<Value, BuiltinError> {
    let name = "replace";
    ensure_args_count(name, args, 3)?;
    let s = ensure_string(name, &args[0])?;
    let old = ensure_string(name, &args[1])?;
    let new = ensure_string(name, &args[2])?;
    Ok(Value::String(s.replace(old.as_ref(), new.as_ref()).into()))
}

fn split(_ctx: &BuiltinContext, args: &[Value]) -> Result<Value, BuiltinError> {
    let name = "split";
    ensure_args_count(name, args, 2)?;
    let s = ensure_string(name, &args[0])?;
    let delimiter = ensure_string(name, &args[1])?;

    let parts: Vec<Value> = if delimiter.is_empty() {
        s.chars().map(|c| Value::from(c.to_string())).collect()
    } else {
        s.split(delimiter.as_ref()).map(Value::from).collect()
    };
    Ok(Value::from_array(parts))
}

fn strings_count(_ctx: &BuiltinContext, args: &[Value]) -> Result<Value, BuiltinError> {
    let name = "strings.count";
    ensure_args_count(name, args, 2)?;
    let s = ensure_string(name, &args[0])?;
    let substr = ensure_string(name, &args[1])?;

    // An empty substring matches around every code point.
    if substr.is_empty() {
        return Ok(Value::from(s.chars().count() + 1));
    }
    Ok(Value::from(s.matches(substr.as_ref()).count()))
}

fn reverse(_ctx: &BuiltinContext, args: &[Value]) -> Result<Value, BuiltinError> {
    let name = "strings.reverse";
    ensure_args_count(name, args, 1)?;
    let s = ensure_string(name, &args[0])?;
    Ok(Value::String(s.chars().rev().collect::<String>().into()))
}

fn substring(_ctx: &BuiltinContext, args: &[Value]) -> Result<Value, BuiltinError> {
    let name = "substring";
    ensure_args_count(name, args, 3)?;
    let s = ensure_string(name, &args[0])?;
    let offset = ensure_integer(name, &args[1])?;
    let length = ensure_integer(name, &args[2])?;

    let offset = offset.max(0) as usize;
    let chars = s.chars().skip(offset);
    let result: String = if length < 0 {
        chars.collect()
    } else {
        chars.take(length as usize).collect()
    };
    Ok(Value::String(result.into()))
}

fn trim(_ctx: &BuiltinContext, args: &[Value]) -> Result<Value, BuiltinError> {
    let name = "trim";
    ensure_args_count(name, args, 2)?;
    let s = ensure_string(name, &args[0])?;
    let cutset = ensure_string(name, &args[1])?;
    Ok(Value::String(
        s.trim_matches(|c: char| cutset.contains(c)).into(),
    ))
}

fn trim_left(_ctx: &BuiltinContext, args: &[Value]) -> Result<Value, BuiltinError> {
    let name = "trim_left";
    ensure_args_count(name, args, 2)?;
    let s = ensure_string(name, &args[0])?;
    let cutset = ensure_string(name, &args[1])?;
    Ok(Value::String(
        s.trim_start_matches(|c: char| cutset.contains(c)).into(),
    ))
}

fn trim_right(_ctx: &BuiltinContext, args: &[Value]) -> Result<Value, BuiltinError> {
    let name = "trim_right";
    ensure_args_count(name, args, 2)?;
    let s = ensure_string(name, &args[0])?;
    let cutset = ensure_string(name, &args[1])?;
    Ok(Value::String(
        s.trim_end_matches(|c: char| cutset.contains(c)).into(),
    ))
}

fn trim_prefix(_ctx: &BuiltinContext, args: &[Value]) -> Result<Value, BuiltinError> {
    let name = "trim_prefix";
    ensure_args_count(name, args, 2)?;
    let s = ensure_string(name, &args[0])?;
    let prefix = ensure_string(name, &args[1])?;
    Ok(Value::String(match s.strip_prefix(prefix.as_ref()) {
        Some(rest) => rest.into(),
        None => s,
    }))
}

fn trim_suffix(_ctx: &BuiltinContext, args: &[Value]) -> Result<Value, BuiltinError> {
    let name = "trim_suffix";
    ensure_args_count(name, args, 2)?;
    let s = ensure_string(name, &args[0])?;
    let suffix = ensure_string(name, &args[1])?;
    Ok(Value::String(match s.strip_suffix(suffix.as_ref()) {
        Some(rest) => rest.into(),
        None => s,
    }))
}

fn trim_space(_ctx: &BuiltinContext, args: &[Value]) -> Result<Value, BuiltinError> {
    let name = "trim_space";
    ensure_args_count(name, args, 1)?;
    let s = ensure_string(name, &args[0])?;
    Ok(Value::String(s.trim().into()))
}

// Strings render without quotes at the top level; everything else uses
// Rego syntax.
fn to_plain_string(v: &Value) -> String {
    match v {
        Value::String(s) => s.to_string(),
        _ => v.to_rego_string(),
    }
}

fn template_string(_ctx: &BuiltinContext, args: &[Value]) -> Result<Value, BuiltinError> {
    let name = "internal.template_string";
    ensure_args_count(name, args, 1)?;
    let parts = ensure_array(name, &args[0])?;

    let mut out = String::new();
    for part in parts.iter() {
        match part {
            // Template expressions arrive wrapped in a set of their results.
            Value::Set(s) => match s.len() {
                0 => out.push_str("<undefined>"),
                1 => {
                    if let Some(v) = s.iter().next() {
                        out.push_str(&to_plain_string(v));
                    }
                }
                _ => {
                    return Err(BuiltinError::eval(
                        name,
                        "template-strings must not produce multiple outputs",
                    ))
                }
            },
            v => out.push_str(&to_plain_string(v)),
        }
    }
    Ok(Value::String(out.into()))
}

#[derive(Default)]
struct Directive {
    minus: bool,
    plus: bool,
    zero: bool,
    width: Option<usize>,
    precision: Option<usize>,
}

impl Directive {
    fn pad(&self, s: String, numeric: bool) -> String {
        let len = s.chars().count();
        let width = match self.width {
            Some(w) if w > len => w,
            _ => return s,
        };
        let fill = width - len;
        if self.minus {
            format!("{s}{}", " ".repeat(fill))
        } else if self.zero && numeric {
            match s.strip_prefix('-') {
                Some(digits) => format!("-{}{digits}", "0".repeat(fill)),
                None => format!("{}{s}", "0".repeat(fill)),
            }
        } else {
            format!("{}{s}", " ".repeat(fill))
        }
    }

    fn sign(&self, s: String) -> String {
        if self.plus && !s.starts_with('-') {
            format!("+{s}")
        } else {
            s
        }
    }
}

// Go writes exponents with a sign and at least two digits: 1.5e+03.
fn go_exponent(n: &Number, precision: usize, upper: bool) -> String {
    let s = format!("{:.*e}", precision, n.as_f64());
    let (mantissa, exp) = match s.split_once('e') {
        Some(parts) => parts,
        None => return s,
    };
    let (sign, digits) = match exp.strip_prefix('-') {
        Some(d) => ('-', d),
        None => ('+', exp),
    };
    let e = if upper { 'E' } else { 'e' };
    format!("{mantissa}{e}{sign}{digits:0>2}")
}

fn format_integer(n: &Number, radix: u32, upper: bool) -> Option<String> {
    if !n.is_integer() {
        return None;
    }
    let s = n.format_radix(radix)?;
    Some(if upper { s.to_uppercase() } else { s })
}

fn format_verb(verb: char, directive: &Directive, arg: &Value) -> String {
    let bad = || format!("%!{verb}({})", arg.to_rego_string());
    match (verb, arg) {
        ('v' | 's', v) => directive.pad(to_plain_string(v), false),
        ('d', Value::Number(n)) => match format_integer(n, 10, false) {
            Some(s) => directive.pad(directive.sign(s), true),
            None => bad(),
        },
        ('b', Value::Number(n)) => format_integer(n, 2, false).map_or_else(bad, |s| directive.pad(s, true)),
        ('o', Value::Number(n)) => format_integer(n, 8, false).map_or_else(bad, |s| directive.pad(s, true)),
        ('x' | 'X', Value::Number(n)) => {
            format_integer(n, 16, verb == 'X').map_or_else(bad, |s| directive.pad(s, true))
        }
        ('x', Value::String(s)) => directive.pad(s.bytes().map(|b| format!("{b:02x}")).collect(), false),
        ('X', Value::String(s)) => directive.pad(s.bytes().map(|b| format!("{b:02X}")).collect(), false),
        ('f' | 'F', Value::Number(n)) => {
            directive.pad(directive.sign(n.format_fixed(directive.precision.unwrap_or(6))), true)
        }
        ('e' | 'E', Value::Number(n)) => directive.pad(
            directive.sign(go_exponent(n, directive.precision.unwrap_or(6), verb == 'E')),
            true,
        ),
        ('g', Value::Number(n)) => directive.pad(directive.sign(n.format_decimal()), true),
        ('t', Value::Bool(b)) => directive.pad(b.to_string(), false),
        ('q', Value::String(s)) => match serde_json::to_string(s.as_ref()) {
            Ok(q) => directive.pad(q, false),
            Err(_) => bad(),
        },
        _ => bad(),
    }
}

fn sprintf(_ctx: &BuiltinContext, args: &[Value]) -> Result<Value, BuiltinError> {
    let name = "sprintf";
    ensure_args_count(name, args, 2)?;
    let fmt = ensure_string(name, &args[0])?;
    let values = ensure_array(name, &args[1])?;

    let mut out = String::new();
    let mut chars = fmt.chars().peekable();
    let mut next_arg = values.iter();

    while let Some(c) = chars.next() {
        if c != '%' {
            out.push(c);
            continue;
        }

        let mut directive = Directive::default();
        while let Some(&f) = chars.peek() {
            match f {
                '-' => directive.minus = true,
                '+' => directive.plus = true,
                '0' => directive.zero = true,
                ' ' | '#' => (),
                _ => break,
            }
            chars.next();
        }

        let mut width = String::new();
        while let Some(&d) = chars.peek() {
            if !d.is_ascii_digit() {
                break;
            }
            width.push(d);
            chars.next();
        }
        directive.width = width.parse().ok();

        if chars.peek() == Some(&'.') {
            chars.next();
            let mut precision = String::new();
            while let Some(&d) = chars.peek() {
                if !d.is_ascii_digit() {
                    break;
                }
                precision.push(d);
                chars.next();
            }
            directive.precision = Some(precision.parse().unwrap_or(0));
        }

        let verb = match chars.next() {
            Some('%') => {
                out.push('%');
                continue;
            }
            Some(v) => v,
            None => {
                out.push_str("%!(NOVERB)");
                break;
            }
        };

        match next_arg.next() {
            Some(arg) => out.push_str(&format_verb(verb, &directive, arg)),
            None => out.push_str(&format!("%!{verb}(MISSING)")),
        }
    }

    let extra: Vec<String> = next_arg.map(|v| v.to_rego_string()).collect();
    if !extra.is_empty() {
        out.push_str(&format!("%!(EXTRA {})", extra.join(", ")));
    }

    Ok(Value::String(out.into()))
}
