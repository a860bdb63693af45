//! Reports - Memory Accounting and Nested Export
//!
//! Read-only summaries of an array: how many bytes the handle itself and
//! its elements occupy, and the elements as nested lists mirroring the
//! shape.

use serde::Serialize;

use ndview_core::dtype::Value;
use ndview_core::error::Result;

use crate::array::ArrayHandle;

// =============================================================================
// Memory Report
// =============================================================================

/// Memory footprint of one array handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MemoryReport {
    /// Size of the handle struct itself (not including its buffer).
    pub handle_bytes: usize,
    /// Bytes occupied by the elements visible through the handle.
    pub nbytes: usize,
    /// Bytes per element.
    pub itemsize: usize,
    /// Number of elements.
    pub size: usize,
}

impl MemoryReport {
    /// Renders the report as a JSON object.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self)
            .map_err(|e| ndview_core::Error::invalid_operation(e.to_string()))
    }
}

// =============================================================================
// Nested Lists
// =============================================================================

/// Elements arranged as nested lists, one nesting level per dimension.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum NestedList {
    /// A single element (0-d arrays and the innermost level).
    Item(Value),
    /// One level of nesting.
    List(Vec<NestedList>),
}

impl NestedList {
    /// Returns the element if this is a leaf.
    pub fn as_item(&self) -> Option<&Value> {
        match self {
            Self::Item(v) => Some(v),
            Self::List(_) => None,
        }
    }

    /// Returns the children if this is a list.
    pub fn as_list(&self) -> Option<&[NestedList]> {
        match self {
            Self::Item(_) => None,
            Self::List(items) => Some(items),
        }
    }
}

fn nest(values: &mut std::vec::IntoIter<Value>, shape: &[usize]) -> NestedList {
    match shape.split_first() {
        None => NestedList::Item(values.next().unwrap_or(Value::Int(0))),
        Some((&len, rest)) => NestedList::List((0..len).map(|_| nest(values, rest)).collect()),
    }
}

impl ArrayHandle {
    /// Reports the memory footprint of this handle.
    pub fn memory_report(&self) -> MemoryReport {
        MemoryReport {
            handle_bytes: std::mem::size_of::<Self>(),
            nbytes: self.nbytes(),
            itemsize: self.itemsize(),
            size: self.size(),
        }
    }

    /// Exports the elements as nested lists shaped like the array.
    pub fn to_list(&self) -> NestedList {
        let mut values = self.to_values().into_iter();
        nest(&mut values, self.shape())
    }
}

// =============================================================================
// Tests
// =============================================================================
