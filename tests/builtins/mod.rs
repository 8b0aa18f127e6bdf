// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::collections::BTreeSet;
use std::rc::Rc;
use std::time::{Duration, UNIX_EPOCH};

use anyhow::Result;
use proptest::prelude::*;
use regocore::*;

fn double(_ctx: &BuiltinContext, args: &[Value]) -> Result<Value, BuiltinError> {
    let n = args[0].as_number().map_err(|e| BuiltinError::eval("custom.double", e.to_string()))?;
    Ok(Value::from(n.mul(&Number::from(2)).map_err(|e| {
        BuiltinError::eval("custom.double", e.to_string())
    })?))
}

fn explode(_ctx: &BuiltinContext, _args: &[Value]) -> Result<Value, BuiltinError> {
    Err(BuiltinError::halt("custom.explode", "boom"))
}

fn custom_registry() -> BuiltinRegistry {
    BuiltinRegistry::empty()
        .with_builtin(
            "custom.double",
            double,
            BuiltinMetadata::new(
                "custom.double",
                FunctionType::new(
                    vec![RegoType::Number.named("x")],
                    Some(RegoType::Number.named("y")),
                ),
            ),
        )
        .with_builtin(
            "custom.explode",
            explode,
            BuiltinMetadata::new("custom.explode", FunctionType::new(vec![], None)),
        )
}

fn builtin_error(r: Result<Value, RegistryError>) -> Result<BuiltinError> {
    match r {
        Err(RegistryError::Builtin(e)) => Ok(e),
        other => anyhow::bail!("expected a builtin error, got {other:?}"),
    }
}

#[test]
fn unknown_builtin() {
    let ctx = BuiltinContext::new();
    assert_eq!(
        BuiltinRegistry::default().invoke(&ctx, "no.such.builtin", &[], false),
        Err(RegistryError::BuiltinNotFound {
            name: "no.such.builtin".to_string()
        })
    );
    assert!(BuiltinRegistry::empty()
        .invoke(&ctx, "count", &[Value::new_array()], false)
        .is_err());
}

#[test]
fn arity_mismatch_halts() -> Result<()> {
    let ctx = BuiltinContext::new();
    let e = builtin_error(BuiltinRegistry::default().invoke(&ctx, "count", &[], false))?;
    assert!(e.is_halting());
    assert_eq!(e.message, "`count` expects 1 argument(s). Got 0 instead");
    Ok(())
}

#[test]
fn type_mismatch_depends_on_strictness() -> Result<()> {
    let ctx = BuiltinContext::new();
    let registry = custom_registry();
    let args = [Value::from("x")];

    assert_eq!(
        registry.invoke(&ctx, "custom.double", &args, false),
        Ok(Value::Undefined)
    );

    let e = builtin_error(registry.invoke(&ctx, "custom.double", &args, true))?;
    assert!(!e.is_halting());
    assert_eq!(
        e.message,
        "`custom.double` expects argument 1 of type `number`. Got `\"x\"` instead"
    );
    Ok(())
}

#[test]
fn host_builtins() -> Result<()> {
    let ctx = BuiltinContext::new();
    let registry = custom_registry();

    assert_eq!(
        registry.invoke(&ctx, "custom.double", &[Value::from(21)], true)?,
        Value::from(42)
    );
    assert_eq!(
        registry.supported_builtin_names(),
        ["custom.double", "custom.explode"]
            .into_iter()
            .map(String::from)
            .collect::<BTreeSet<_>>()
    );

    // Host builtins can replace defaults.
    let registry = BuiltinRegistry::default().with_builtin(
        "count",
        double,
        BuiltinMetadata::new("count", FunctionType::new(vec![RegoType::any()], None)),
    );
    assert_eq!(
        registry.invoke(&ctx, "count", &[Value::from(2)], true)?,
        Value::from(4)
    );
    Ok(())
}

#[test]
fn halting_errors_ignore_strictness() -> Result<()> {
    let ctx = BuiltinContext::new().with_location(Location::new("policy.rego", 3, 7));
    let e = builtin_error(custom_registry().invoke(&ctx, "custom.explode", &[], false))?;
    assert!(e.is_halting());
    assert_eq!(e.to_string(), "policy.rego:3:7: custom.explode: boom");
    Ok(())
}

#[test]
fn errors_carry_the_call_site() -> Result<()> {
    let ctx = BuiltinContext::new().with_location(Location::new("policy.rego", 10, 2));
    let e = builtin_error(BuiltinRegistry::default().invoke(
        &ctx,
        "div",
        &[Value::from(1), Value::from(0)],
        true,
    ))?;
    assert_eq!(e.location, Some(Location::new("policy.rego", 10, 2)));
    assert!(e.to_string().starts_with("policy.rego:10:2: div: "));
    Ok(())
}

#[test]
fn intn_is_stable_within_a_query() -> Result<()> {
    let registry = BuiltinRegistry::default();
    let ctx = BuiltinContext::new().with_seed(11);
    let args = [Value::from("k"), Value::from(1000)];

    let first = registry.invoke(&ctx, "rand.intn", &args, true)?;
    for _ in 0..5 {
        assert_eq!(registry.invoke(&ctx, "rand.intn", &args, true)?, first);
    }

    // Nested calls share the cache.
    let child = ctx.child(Location::new("nested.rego", 1, 1));
    assert_eq!(registry.invoke(&child, "rand.intn", &args, true)?, first);

    let n = first.as_number()?.as_u64().unwrap_or(u64::MAX);
    assert!(n < 1000);

    // Same seed, same sequence.
    let other = BuiltinContext::new().with_seed(11);
    assert_eq!(registry.invoke(&other, "rand.intn", &args, true)?, first);

    assert_eq!(
        registry.invoke(&ctx, "rand.intn", &[Value::from("k"), Value::from(0)], true)?,
        Value::from(0)
    );
    Ok(())
}

#[cfg(feature = "uuid")]
#[test]
fn rfc4122_is_cached_per_context() -> Result<()> {
    let registry = BuiltinRegistry::default();
    let key = [Value::from("request")];

    let ctx = BuiltinContext::new();
    let a = registry.invoke(&ctx, "uuid.rfc4122", &key, true)?;
    assert_eq!(registry.invoke(&ctx, "uuid.rfc4122", &key, true)?, a);
    assert_ne!(
        registry.invoke(&ctx, "uuid.rfc4122", &[Value::from("other")], true)?,
        a
    );

    let parsed = registry.invoke(&ctx, "uuid.parse", &[a.clone()], true)?;
    assert_eq!(parsed["version"], Value::from(4));

    let fresh = BuiltinContext::new();
    assert_ne!(registry.invoke(&fresh, "uuid.rfc4122", &key, true)?, a);
    Ok(())
}

#[test]
fn now_uses_the_query_timestamp() -> Result<()> {
    let ctx = BuiltinContext::new().with_timestamp(UNIX_EPOCH + Duration::from_secs(5));
    assert_eq!(
        BuiltinRegistry::default().invoke(&ctx, "time.now_ns", &[], true)?,
        Value::from(5_000_000_000u64)
    );
    Ok(())
}

#[test]
fn trace_notes() -> Result<()> {
    let tracer = Rc::new(BufferedTracer::new());
    let location = Location::new("policy.rego", 4, 1);
    let ctx = BuiltinContext::new()
        .with_tracer(tracer.clone())
        .with_location(location.clone());

    let registry = BuiltinRegistry::default();
    assert_eq!(
        registry.invoke(&ctx, "trace", &[Value::from("hello")], true)?,
        Value::Bool(true)
    );

    let events = tracer.take();
    assert_eq!(
        events,
        vec![TraceEvent {
            operation: TraceOperation::Note,
            message: "hello".to_string(),
            location: Some(location),
        }]
    );
    Ok(())
}

#[test]
fn capabilities_document() -> Result<()> {
    let registry = BuiltinRegistry::default();
    let doc: serde_json::Value = serde_json::from_str(&registry.capabilities_json()?)?;

    let builtins = doc["builtins"]
        .as_array()
        .ok_or_else(|| anyhow::anyhow!("builtins is not an array"))?;
    let names: Vec<&str> = builtins.iter().filter_map(|b| b["name"].as_str()).collect();

    let mut sorted = names.clone();
    sorted.sort();
    assert_eq!(names, sorted);
    assert_eq!(names.len(), registry.supported_builtin_names().len());

    let count = builtins
        .iter()
        .find(|b| b["name"] == "count")
        .ok_or_else(|| anyhow::anyhow!("count missing"))?;
    assert_eq!(count["decl"]["type"], "function");

    let decoded = BuiltinMetadata::from_json(&count.to_string())?;
    assert_eq!(decoded.arity(), 1);
    Ok(())
}

fn small_sets() -> impl Strategy<Value = Vec<BTreeSet<i64>>> {
    prop::collection::vec(prop::collection::btree_set(-20i64..20, 0..6), 0..5)
}

fn to_set(items: impl IntoIterator<Item = Value>) -> Value {
    Value::from_set(items.into_iter().collect())
}

proptest! {
    #[test]
    fn union_contains_exactly_the_members(sets in small_sets()) {
        let ctx = BuiltinContext::new();
        let arg = to_set(sets.iter().map(|s| to_set(s.iter().map(|i| Value::from(*i)))));

        let result = BuiltinRegistry::default().invoke(&ctx, "union", &[arg], true).unwrap();

        let expected: BTreeSet<i64> = sets.iter().flatten().copied().collect();
        prop_assert_eq!(result, to_set(expected.into_iter().map(Value::from)));
    }

    #[test]
    fn non_strict_failures_are_undefined(x in any::<i32>()) {
        let ctx = BuiltinContext::new();
        let registry = BuiltinRegistry::default();
        let args = [Value::from(x), Value::from(0)];

        prop_assert!(registry.invoke(&ctx, "div", &args, true).is_err());
        prop_assert_eq!(registry.invoke(&ctx, "div", &args, false), Ok(Value::Undefined));

        let args = [Value::from(x), Value::from(4)];
        prop_assert_eq!(
            registry.invoke(&ctx, "div", &args, true),
            registry.invoke(&ctx, "div", &args, false)
        );
    }
}

#[test]
fn registry_is_shared_across_threads() -> Result<()> {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<Value>();
    assert_send_sync::<RegoType>();
    assert_send_sync::<BuiltinRegistry>();
    assert_send_sync::<regocore::bundle::Bundle>();

    let registry = BuiltinRegistry::default();
    let results = std::thread::scope(|s| {
        let handles: Vec<_> = (0..4)
            .map(|i| {
                let registry = &registry;
                s.spawn(move || {
                    // Contexts are per query and stay on their thread.
                    let ctx = BuiltinContext::new();
                    registry.invoke(&ctx, "plus", &[Value::from(i), Value::from(1)], true)
                })
            })
            .collect();
        let mut results = vec![];
        for h in handles {
            let r = h.join().map_err(|_| anyhow::anyhow!("thread panicked"))?;
            results.push(r?);
        }
        Ok::<_, anyhow::Error>(results)
    })?;

    assert_eq!(results, (1..5).map(Value::from).collect::<Vec<_>>());
    Ok(())
}

#[test]
fn contexts_can_share_a_cache() -> Result<()> {
    let registry = BuiltinRegistry::default();
    let args = [Value::from("shared"), Value::from(1_000_000)];

    let first = BuiltinContext::new().with_seed(1);
    let value = registry.invoke(&first, "rand.intn", &args, true)?;

    // A different generator, but the memoized result wins.
    let second = BuiltinContext::new()
        .with_seed(2)
        .with_cache(first.cache.clone());
    assert_eq!(registry.invoke(&second, "rand.intn", &args, true)?, value);
    assert_eq!(first.cache.borrow().len(), 1);
    Ok(())
}
