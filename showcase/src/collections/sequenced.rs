//! Sequenced collections with a defined encounter order
//!
//! `Sequenced` gives lists and sets uniform access to both ends;
//! `SequencedMapOps` does the same for maps. `reversed()` returns a live view
//! that borrows the backing collection: the view's first end is the
//! collection's last end, and writes through the view land in the collection.

use std::collections::VecDeque;
use std::fmt;
use std::hash::Hash;

use indexmap::{IndexMap, IndexSet};

use super::immutable::{render_map, render_seq};

/// Double-ended access to an ordered collection
pub trait Sequenced {
    type Item;

    fn add_first(&mut self, item: Self::Item);

    fn add_last(&mut self, item: Self::Item);

    fn first(&self) -> Option<&Self::Item>;

    fn last(&self) -> Option<&Self::Item>;

    fn remove_first(&mut self) -> Option<Self::Item>;

    fn remove_last(&mut self) -> Option<Self::Item>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Elements in encounter order
    fn items(&self) -> Vec<&Self::Item>;

    /// Live reversed view over the same storage
    fn reversed(&mut self) -> Reversed<'_, Self>
    where
        Self: Sized,
    {
        Reversed { inner: self }
    }
}

/// Reversed view of a `Sequenced` collection
pub struct Reversed<'a, C: Sequenced> {
    inner: &'a mut C,
}

impl<C: Sequenced> Sequenced for Reversed<'_, C> {
    type Item = C::Item;

    fn add_first(&mut self, item: C::Item) {
        self.inner.add_last(item)
    }

    fn add_last(&mut self, item: C::Item) {
        self.inner.add_first(item)
    }

    fn first(&self) -> Option<&C::Item> {
        self.inner.last()
    }

    fn last(&self) -> Option<&C::Item> {
        self.inner.first()
    }

    fn remove_first(&mut self) -> Option<C::Item> {
        self.inner.remove_last()
    }

    fn remove_last(&mut self) -> Option<C::Item> {
        self.inner.remove_first()
    }

    fn len(&self) -> usize {
        self.inner.len()
    }

    fn items(&self) -> Vec<&C::Item> {
        let mut items = self.inner.items();
        items.reverse();
        items
    }
}

impl<C> fmt::Display for Reversed<'_, C>
where
    C: Sequenced,
    C::Item: fmt::Display,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&render_seq(self.items()))
    }
}

/// Ordered list backed by a ring buffer
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SequencedList<T> {
    items: VecDeque<T>,
}

impl<T> SequencedList<T> {
    pub fn new() -> Self {
        Self {
            items: VecDeque::new(),
        }
    }

    pub fn get(&self, index: usize) -> Option<&T> {
        self.items.get(index)
    }

    pub fn iter(&self) -> std::collections::vec_deque::Iter<'_, T> {
        self.items.iter()
    }
}

impl<T> From<Vec<T>> for SequencedList<T> {
    fn from(items: Vec<T>) -> Self {
        Self {
            items: items.into(),
        }
    }
}

impl<T> Sequenced for SequencedList<T> {
    type Item = T;

    fn add_first(&mut self, item: T) {
        self.items.push_front(item);
    }

    fn add_last(&mut self, item: T) {
        self.items.push_back(item);
    }

    fn first(&self) -> Option<&T> {
        self.items.front()
    }

    fn last(&self) -> Option<&T> {
        self.items.back()
    }

    fn remove_first(&mut self) -> Option<T> {
        self.items.pop_front()
    }

    fn remove_last(&mut self) -> Option<T> {
        self.items.pop_back()
    }

    fn len(&self) -> usize {
        self.items.len()
    }

    fn items(&self) -> Vec<&T> {
        self.items.iter().collect()
    }
}

impl<T: fmt::Display> fmt::Display for SequencedList<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&render_seq(&self.items))
    }
}

/// Ordered set of unique elements
///
/// Adding an element that is already present moves it to the requested end.
#[derive(Debug, Clone, Default)]
pub struct SequencedSet<T: Hash + Eq> {
    items: IndexSet<T>,
}

impl<T: Hash + Eq> SequencedSet<T> {
    pub fn new() -> Self {
        Self {
            items: IndexSet::new(),
        }
    }

    pub fn contains(&self, item: &T) -> bool {
        self.items.contains(item)
    }

    pub fn remove(&mut self, item: &T) -> bool {
        self.items.shift_remove(item)
    }

    pub fn iter(&self) -> indexmap::set::Iter<'_, T> {
        self.items.iter()
    }
}

impl<T: Hash + Eq> Sequenced for SequencedSet<T> {
    type Item = T;

    fn add_first(&mut self, item: T) {
        self.items.shift_remove(&item);
        self.items.shift_insert(0, item);
    }

    fn add_last(&mut self, item: T) {
        self.items.shift_remove(&item);
        self.items.insert(item);
    }

    fn first(&self) -> Option<&T> {
        self.items.first()
    }

    fn last(&self) -> Option<&T> {
        self.items.last()
    }

    fn remove_first(&mut self) -> Option<T> {
        self.items.shift_remove_index(0)
    }

    fn remove_last(&mut self) -> Option<T> {
        self.items.pop()
    }

    fn len(&self) -> usize {
        self.items.len()
    }

    fn items(&self) -> Vec<&T> {
        self.items.iter().collect()
    }
}

impl<T: Hash + Eq + fmt::Display> fmt::Display for SequencedSet<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&render_seq(&self.items))
    }
}

/// Double-ended access to an ordered map
pub trait SequencedMapOps {
    type Key;
    type Value;

    /// Insert at the front, relocating an existing key
    fn put_first(&mut self, key: Self::Key, value: Self::Value) -> Option<Self::Value>;

    /// Insert at the back, relocating an existing key
    fn put_last(&mut self, key: Self::Key, value: Self::Value) -> Option<Self::Value>;

    fn first_entry(&self) -> Option<(&Self::Key, &Self::Value)>;

    fn last_entry(&self) -> Option<(&Self::Key, &Self::Value)>;

    fn poll_first_entry(&mut self) -> Option<(Self::Key, Self::Value)>;

    fn poll_last_entry(&mut self) -> Option<(Self::Key, Self::Value)>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Entries in encounter order
    fn entries(&self) -> Vec<(&Self::Key, &Self::Value)>;

    fn reversed(&mut self) -> ReversedMap<'_, Self>
    where
        Self: Sized,
    {
        ReversedMap { inner: self }
    }
}

/// Reversed view of a `SequencedMapOps` map
pub struct ReversedMap<'a, M: SequencedMapOps> {
    inner: &'a mut M,
}

impl<M: SequencedMapOps> SequencedMapOps for ReversedMap<'_, M> {
    type Key = M::Key;
    type Value = M::Value;

    fn put_first(&mut self, key: M::Key, value: M::Value) -> Option<M::Value> {
        self.inner.put_last(key, value)
    }

    fn put_last(&mut self, key: M::Key, value: M::Value) -> Option<M::Value> {
        self.inner.put_first(key, value)
    }

    fn first_entry(&self) -> Option<(&M::Key, &M::Value)> {
        self.inner.last_entry()
    }

    fn last_entry(&self) -> Option<(&M::Key, &M::Value)> {
        self.inner.first_entry()
    }

    fn poll_first_entry(&mut self) -> Option<(M::Key, M::Value)> {
        self.inner.poll_last_entry()
    }

    fn poll_last_entry(&mut self) -> Option<(M::Key, M::Value)> {
        self.inner.poll_first_entry()
    }

    fn len(&self) -> usize {
        self.inner.len()
    }

    fn entries(&self) -> Vec<(&M::Key, &M::Value)> {
        let mut entries = self.inner.entries();
        entries.reverse();
        entries
    }
}

impl<M> fmt::Display for ReversedMap<'_, M>
where
    M: SequencedMapOps,
    M::Key: fmt::Display,
    M::Value: fmt::Display,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&render_map(self.entries()))
    }
}

/// Insertion-ordered map with double-ended operations
#[derive(Debug, Clone, Default)]
pub struct SequencedMap<K: Hash + Eq, V> {
    entries: IndexMap<K, V>,
}

impl<K: Hash + Eq, V> SequencedMap<K, V> {
    pub fn new() -> Self {
        Self {
            entries: IndexMap::new(),
        }
    }

    pub fn get(&self, key: &K) -> Option<&V> {
        self.entries.get(key)
    }

    pub fn contains_key(&self, key: &K) -> bool {
        self.entries.contains_key(key)
    }

    pub fn iter(&self) -> indexmap::map::Iter<'_, K, V> {
        self.entries.iter()
    }
}

impl<K: Hash + Eq, V> SequencedMapOps for SequencedMap<K, V> {
    type Key = K;
    type Value = V;

    fn put_first(&mut self, key: K, value: V) -> Option<V> {
        let previous = self.entries.shift_remove(&key);
        self.entries.shift_insert(0, key, value);
        previous
    }

    fn put_last(&mut self, key: K, value: V) -> Option<V> {
        let previous = self.entries.shift_remove(&key);
        self.entries.insert(key, value);
        previous
    }

    fn first_entry(&self) -> Option<(&K, &V)> {
        self.entries.first()
    }

    fn last_entry(&self) -> Option<(&K, &V)> {
        self.entries.last()
    }

    fn poll_first_entry(&mut self) -> Option<(K, V)> {
        self.entries.shift_remove_index(0)
    }

    fn poll_last_entry(&mut self) -> Option<(K, V)> {
        self.entries.pop()
    }

    fn len(&self) -> usize {
        self.entries.len()
    }

    fn entries(&self) -> Vec<(&K, &V)> {
        self.entries.iter().collect()
    }
}

impl<K: Hash + Eq + fmt::Display, V: fmt::Display> fmt::Display for SequencedMap<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&render_map(&self.entries))
    }
}
