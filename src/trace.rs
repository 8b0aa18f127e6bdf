// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use core::cell::RefCell;
use core::fmt;

use serde::{Deserialize, Serialize};

/// Position of a call site in policy source.
#[derive(Debug, Default, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Location {
    pub file: String,
    pub row: u32,
    pub col: u32,
}

impl Location {
    pub fn new(file: impl Into<String>, row: u32, col: u32) -> Self {
        Self {
            file: file.into(),
            row,
            col,
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}:{}:{}", self.file, self.row, self.col)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TraceOperation {
    Note,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceEvent {
    pub operation: TraceOperation,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub location: Option<Location>,
}

/// Receives trace events emitted while a query is evaluated.
pub trait QueryTracer {
    fn trace(&self, event: TraceEvent);
}

/// Tracer that keeps every event in memory.
#[derive(Debug, Default)]
pub struct BufferedTracer {
    events: RefCell<Vec<TraceEvent>>,
}

impl BufferedTracer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<TraceEvent> {
        self.events.borrow().clone()
    }

    pub fn take(&self) -> Vec<TraceEvent> {
        self.events.take()
    }
}

impl QueryTracer for BufferedTracer {
    fn trace(&self, event: TraceEvent) {
        self.events.borrow_mut().push(event);
    }
}
