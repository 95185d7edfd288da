//! Container families and the policy abstraction over them.
//!
//! The diff and replay engines never touch a concrete collection type
//! directly. They go through a [`ContainerPolicy`], which abstracts the
//! behavioral differences between the supported collection families:
//! ordered lists, unordered bags (duplicates significant), and sets.

use relmap_value::Value;
use std::collections::BTreeSet;
use std::fmt;

/// Concrete storage for a collection-valued attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Container {
    /// Ordered sequence; element positions are persisted via an order column.
    List(Vec<Value>),
    /// Unordered collection where duplicates are significant.
    Bag(Vec<Value>),
    /// Unordered collection without duplicates.
    Set(BTreeSet<Value>),
}

impl Container {
    /// Number of elements.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Container::List(v) | Container::Bag(v) => v.len(),
            Container::Set(s) => s.len(),
        }
    }

    /// Returns true if the container holds no elements.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Iterates over the elements.
    ///
    /// Lists and bags iterate in storage order; sets iterate in value order.
    pub fn values(&self) -> Box<dyn Iterator<Item = &Value> + '_> {
        match self {
            Container::List(v) | Container::Bag(v) => Box::new(v.iter()),
            Container::Set(s) => Box::new(s.iter()),
        }
    }

    /// Returns the elements of an ordered container as a slice.
    ///
    /// `None` for bags and sets, which carry no positional semantics.
    #[must_use]
    pub fn as_ordered(&self) -> Option<&[Value]> {
        match self {
            Container::List(v) => Some(v),
            _ => None,
        }
    }
}

/// Capability abstraction over a collection family.
///
/// A policy answers how to create, measure, iterate, and mutate a container
/// of its family. The comparator and differencer are written against this
/// trait rather than any concrete collection type.
pub trait ContainerPolicy: fmt::Debug + Send + Sync {
    /// Creates an empty container of this policy's family.
    fn container_instance(&self) -> Container;

    /// Number of elements in the container.
    fn size(&self, container: &Container) -> usize {
        container.len()
    }

    /// Iterates over the container's elements.
    fn iterate<'a>(&self, container: &'a Container) -> Box<dyn Iterator<Item = &'a Value> + 'a> {
        container.values()
    }

    /// Adds an element. Returns false if the container already held the
    /// element and the family does not admit duplicates.
    fn add_into(&self, value: Value, container: &mut Container) -> bool;

    /// Removes one occurrence of the element. Returns false if absent.
    fn remove_from(&self, value: &Value, container: &mut Container) -> bool;

    /// True when elements carry positional semantics persisted through an
    /// order column.
    fn is_ordered(&self) -> bool {
        false
    }
}

fn remove_one(value: &Value, elements: &mut Vec<Value>) -> bool {
    if let Some(position) = elements.iter().position(|e| e == value) {
        elements.remove(position);
        true
    } else {
        false
    }
}

fn push_into(value: Value, container: &mut Container) -> bool {
    match container {
        Container::List(v) | Container::Bag(v) => {
            v.push(value);
            true
        }
        Container::Set(s) => s.insert(value),
    }
}

fn take_from(value: &Value, container: &mut Container) -> bool {
    match container {
        Container::List(v) | Container::Bag(v) => remove_one(value, v),
        Container::Set(s) => s.remove(value),
    }
}

/// Policy for ordered lists.
#[derive(Debug, Clone, Copy, Default)]
pub struct ListPolicy;

impl ContainerPolicy for ListPolicy {
    fn container_instance(&self) -> Container {
        Container::List(Vec::new())
    }

    fn add_into(&self, value: Value, container: &mut Container) -> bool {
        push_into(value, container)
    }

    fn remove_from(&self, value: &Value, container: &mut Container) -> bool {
        take_from(value, container)
    }

    fn is_ordered(&self) -> bool {
        true
    }
}

/// Policy for unordered bags (duplicates significant, order not persisted).
#[derive(Debug, Clone, Copy, Default)]
pub struct BagPolicy;

impl ContainerPolicy for BagPolicy {
    fn container_instance(&self) -> Container {
        Container::Bag(Vec::new())
    }

    fn add_into(&self, value: Value, container: &mut Container) -> bool {
        push_into(value, container)
    }

    fn remove_from(&self, value: &Value, container: &mut Container) -> bool {
        take_from(value, container)
    }
}

/// Policy for sets (no duplicates, order not persisted).
#[derive(Debug, Clone, Copy, Default)]
pub struct SetPolicy;

impl ContainerPolicy for SetPolicy {
    fn container_instance(&self) -> Container {
        Container::Set(BTreeSet::new())
    }

    fn add_into(&self, value: Value, container: &mut Container) -> bool {
        match container {
            Container::Set(s) => s.insert(value),
            other => push_into(value, other),
        }
    }

    fn remove_from(&self, value: &Value, container: &mut Container) -> bool {
        take_from(value, container)
    }
}
