// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use crate::trace::{Location, QueryTracer};
use crate::value::Value;

use core::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc as Shared;
use std::time::SystemTime;

use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Results of nondeterministic builtins, keyed by builtin name and arguments.
#[derive(Debug, Default, Clone)]
pub struct BuiltinsCache {
    entries: BTreeMap<(String, Vec<Value>), Value>,
}

impl BuiltinsCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str, args: &[Value]) -> Option<&Value> {
        self.entries.get(&(name.to_string(), args.to_vec()))
    }

    pub fn insert(&mut self, name: &str, args: &[Value], value: Value) {
        self.entries.insert((name.to_string(), args.to_vec()), value);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

/// Per-query state handed to every builtin.
///
/// The cache and random generator are shared handles. Nested calls made
/// through [`BuiltinContext::child`] observe the same cache and RNG, so
/// memoized nondeterministic results stay stable for the whole query. Do not
/// reuse a context across unrelated queries.
#[derive(Clone)]
pub struct BuiltinContext {
    pub location: Option<Location>,
    pub tracer: Option<Shared<dyn QueryTracer>>,
    pub timestamp: SystemTime,
    pub cache: Shared<RefCell<BuiltinsCache>>,
    pub rng: Shared<RefCell<Box<dyn RngCore>>>,
}

impl core::fmt::Debug for BuiltinContext {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        f.debug_struct("BuiltinContext")
            .field("location", &self.location)
            .field("tracer", &self.tracer.is_some())
            .field("timestamp", &self.timestamp)
            .field("cache", &self.cache.borrow().len())
            .finish()
    }
}

impl Default for BuiltinContext {
    fn default() -> Self {
        Self::new()
    }
}

impl BuiltinContext {
    pub fn new() -> Self {
        let rng: Box<dyn RngCore> = Box::new(StdRng::from_entropy());
        Self {
            location: None,
            tracer: None,
            timestamp: SystemTime::now(),
            cache: Shared::new(RefCell::new(BuiltinsCache::new())),
            rng: Shared::new(RefCell::new(rng)),
        }
    }

    pub fn with_location(mut self, location: Location) -> Self {
        self.location = Some(location);
        self
    }

    pub fn with_tracer(mut self, tracer: Shared<dyn QueryTracer>) -> Self {
        self.tracer = Some(tracer);
        self
    }

    pub fn with_timestamp(mut self, timestamp: SystemTime) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// Uses a seeded generator so that random builtins are reproducible.
    pub fn with_seed(self, seed: u64) -> Self {
        self.with_rng(Box::new(ChaCha8Rng::seed_from_u64(seed)))
    }

    pub fn with_rng(mut self, rng: Box<dyn RngCore>) -> Self {
        self.rng = Shared::new(RefCell::new(rng));
        self
    }

    pub fn with_cache(mut self, cache: Shared<RefCell<BuiltinsCache>>) -> Self {
        self.cache = cache;
        self
    }

    /// Context for a nested call at `location`.
    pub fn child(&self, location: Location) -> Self {
        Self {
            location: Some(location),
            ..self.clone()
        }
    }

    pub(crate) fn next_u64(&self) -> u64 {
        self.rng.borrow_mut().next_u64()
    }

    pub(crate) fn fill_bytes(&self, dest: &mut [u8]) {
        self.rng.borrow_mut().fill_bytes(dest)
    }
}
