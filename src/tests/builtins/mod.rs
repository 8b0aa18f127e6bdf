// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

#![allow(clippy::panic, clippy::unwrap_used, clippy::indexing_slicing, clippy::print_stderr)]

use std::env;

use crate::test_utils::{match_values, process_value};
use crate::*;

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use test_generator::test_resources;

#[derive(Serialize, Deserialize, PartialEq, Debug)]
#[serde(deny_unknown_fields)]
struct TestCase {
    note: String,
    builtin: String,
    args: Vec<Value>,
    want_result: Option<Value>,
    error: Option<String>,
    halting: Option<bool>,
    strict: Option<bool>,
    seed: Option<u64>,
    // Invokes the builtin this many times with one context; all results must agree.
    repeat: Option<usize>,
    skip: Option<bool>,
}

#[derive(Serialize, Deserialize, PartialEq, Debug)]
#[serde(deny_unknown_fields)]
struct YamlTest {
    cases: Vec<TestCase>,
}

fn context(case: &TestCase) -> BuiltinContext {
    match case.seed {
        Some(seed) => BuiltinContext::new().with_seed(seed),
        None => BuiltinContext::new(),
    }
}

fn run_case(registry: &BuiltinRegistry, case: &TestCase) -> Result<()> {
    match (&case.want_result, &case.error) {
        (Some(_), None) | (None, Some(_)) => (),
        _ => bail!("either want_result or error must be specified in test case"),
    }

    let args = case
        .args
        .iter()
        .map(process_value)
        .collect::<Result<Vec<_>>>()?;
    let strict = case.strict.unwrap_or(true);
    let ctx = context(case);

    let mut results = vec![];
    for _ in 0..case.repeat.unwrap_or(1) {
        results.push(registry.invoke(&ctx, &case.builtin, &args, strict));
    }

    for result in results {
        match (result, &case.want_result, &case.error) {
            (Ok(actual), Some(want), _) => match_values(&actual, &process_value(want)?)?,
            (Ok(actual), None, _) => bail!("call succeeded with `{actual}`; expected an error"),
            (Err(actual), _, Some(expected)) => {
                let message = actual.to_string();
                if !message.contains(expected.as_str()) {
                    bail!("error message\n`{message}`\ndoes not contain `{expected}`");
                }
                if let Some(halting) = case.halting {
                    let is_halting = match &actual {
                        RegistryError::Builtin(e) => e.is_halting(),
                        RegistryError::BuiltinNotFound { .. } => true,
                    };
                    if is_halting != halting {
                        bail!("expected halting = {halting}, got `{message}`");
                    }
                }
            }
            (Err(actual), _, None) => return Err(actual.into()),
        }
    }
    Ok(())
}

fn yaml_test_impl(file: &str) -> Result<()> {
    let yaml_str = std::fs::read_to_string(file)?;
    let test: YamlTest = serde_yaml::from_str(&yaml_str)?;
    let registry = BuiltinRegistry::default();

    std::println!("running {file}");

    for case in &test.cases {
        std::print!("case {} ", case.note);
        if case.skip == Some(true) {
            std::println!("skipped");
            continue;
        }
        if let Err(e) = run_case(&registry, case) {
            bail!("case `{}` failed: {e}", case.note);
        }
        std::println!("passed");
    }

    Ok(())
}

fn yaml_test(file: &str) -> Result<()> {
    #[cfg(not(feature = "crypto"))]
    if file.contains("crypto") {
        return Ok(());
    }

    #[cfg(not(all(feature = "base64", feature = "base64url", feature = "hex")))]
    if file.contains("encoding") {
        return Ok(());
    }

    #[cfg(not(feature = "uuid"))]
    if file.contains("uuid") {
        return Ok(());
    }

    yaml_test_impl(file)
}

#[test]
#[ignore = "intended for running a single case file"]
fn one_yaml() -> Result<()> {
    let mut file = String::default();

    for a in env::args() {
        if a.ends_with(".yaml") {
            file = a;
        }
    }

    if file.is_empty() {
        bail!("missing <yaml-file>");
    }

    yaml_test(file.as_str())
}

#[test_resources("tests/builtins/cases/**/*.yaml")]
fn run(path: &str) {
    yaml_test(path).unwrap()
}
