//! Immutable collections built from optional elements
//!
//! Construction rejects absent (`None`) elements, and duplicate elements or
//! keys for the set and map variants. Construction is atomic: a failed build
//! returns no collection at all. Every mutator fails with
//! `CollectionError::UnsupportedOperation`.

use std::fmt;
use std::hash::Hash;
use std::ops::Deref;

use indexmap::{IndexMap, IndexSet};

use super::CollectionError;

/// Mutating operations shared by mutable and immutable collections
pub trait CollectionMut<T> {
    /// Add an element, returning whether the collection changed
    fn add(&mut self, value: T) -> Result<bool, CollectionError>;

    /// Remove an element, returning whether it was present
    fn remove_value(&mut self, value: &T) -> Result<bool, CollectionError>;

    fn clear_all(&mut self) -> Result<(), CollectionError>;
}

/// Mutating operations for key-value collections
pub trait MapMut<K, V> {
    /// Insert or replace a value, returning the previous one
    fn put(&mut self, key: K, value: V) -> Result<Option<V>, CollectionError>;

    fn remove_key(&mut self, key: &K) -> Result<Option<V>, CollectionError>;
}

impl<T: PartialEq> CollectionMut<T> for Vec<T> {
    fn add(&mut self, value: T) -> Result<bool, CollectionError> {
        self.push(value);
        Ok(true)
    }

    fn remove_value(&mut self, value: &T) -> Result<bool, CollectionError> {
        match self.iter().position(|v| v == value) {
            Some(idx) => {
                Vec::remove(self, idx);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn clear_all(&mut self) -> Result<(), CollectionError> {
        self.clear();
        Ok(())
    }
}

impl<T: Hash + Eq> CollectionMut<T> for IndexSet<T> {
    fn add(&mut self, value: T) -> Result<bool, CollectionError> {
        Ok(self.insert(value))
    }

    fn remove_value(&mut self, value: &T) -> Result<bool, CollectionError> {
        Ok(self.shift_remove(value))
    }

    fn clear_all(&mut self) -> Result<(), CollectionError> {
        self.clear();
        Ok(())
    }
}

impl<K: Hash + Eq, V> MapMut<K, V> for IndexMap<K, V> {
    fn put(&mut self, key: K, value: V) -> Result<Option<V>, CollectionError> {
        Ok(self.insert(key, value))
    }

    fn remove_key(&mut self, key: &K) -> Result<Option<V>, CollectionError> {
        Ok(self.shift_remove(key))
    }
}

/// Read-only wrapper around an existing mutable collection
///
/// Reads go through `Deref`; every mutator fails.
#[derive(Debug, Clone)]
pub struct Unmodifiable<C> {
    inner: C,
}

impl<C> Unmodifiable<C> {
    pub fn new(inner: C) -> Self {
        Self { inner }
    }
}

impl<C> Deref for Unmodifiable<C> {
    type Target = C;

    fn deref(&self) -> &C {
        &self.inner
    }
}

impl<T, C> CollectionMut<T> for Unmodifiable<C> {
    fn add(&mut self, _value: T) -> Result<bool, CollectionError> {
        Err(CollectionError::UnsupportedOperation("add"))
    }

    fn remove_value(&mut self, _value: &T) -> Result<bool, CollectionError> {
        Err(CollectionError::UnsupportedOperation("remove"))
    }

    fn clear_all(&mut self) -> Result<(), CollectionError> {
        Err(CollectionError::UnsupportedOperation("clear"))
    }
}

impl<K, V, C> MapMut<K, V> for Unmodifiable<C> {
    fn put(&mut self, _key: K, _value: V) -> Result<Option<V>, CollectionError> {
        Err(CollectionError::UnsupportedOperation("put"))
    }

    fn remove_key(&mut self, _key: &K) -> Result<Option<V>, CollectionError> {
        Err(CollectionError::UnsupportedOperation("remove"))
    }
}

/// Render a sequence as `[a, b, c]`
pub fn render_seq<I>(items: I) -> String
where
    I: IntoIterator,
    I::Item: fmt::Display,
{
    let parts: Vec<String> = items.into_iter().map(|i| i.to_string()).collect();
    format!("[{}]", parts.join(", "))
}

/// Render key-value pairs as `{k1=v1, k2=v2}`
pub fn render_map<I, K, V>(entries: I) -> String
where
    I: IntoIterator<Item = (K, V)>,
    K: fmt::Display,
    V: fmt::Display,
{
    let parts: Vec<String> = entries
        .into_iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect();
    format!("{{{}}}", parts.join(", "))
}

fn absent(what: &str, index: usize) -> CollectionError {
    CollectionError::InvalidArgument(format!("absent {} at index {}", what, index))
}

/// Immutable ordered list; duplicates are allowed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImmutableList<T> {
    items: Vec<T>,
}

impl<T> ImmutableList<T> {
    /// Build a list, failing on the first absent element
    pub fn of<I>(elements: I) -> Result<Self, CollectionError>
    where
        I: IntoIterator<Item = Option<T>>,
    {
        let mut items = Vec::new();
        for (idx, element) in elements.into_iter().enumerate() {
            items.push(element.ok_or_else(|| absent("element", idx))?);
        }
        Ok(Self { items })
    }

    pub fn get(&self, index: usize) -> Option<&T> {
        self.items.get(index)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }

    pub fn as_slice(&self) -> &[T] {
        &self.items
    }
}

impl<T: PartialEq> ImmutableList<T> {
    pub fn contains(&self, value: &T) -> bool {
        self.items.contains(value)
    }
}

impl<T> CollectionMut<T> for ImmutableList<T> {
    fn add(&mut self, _value: T) -> Result<bool, CollectionError> {
        Err(CollectionError::UnsupportedOperation("add"))
    }

    fn remove_value(&mut self, _value: &T) -> Result<bool, CollectionError> {
        Err(CollectionError::UnsupportedOperation("remove"))
    }

    fn clear_all(&mut self) -> Result<(), CollectionError> {
        Err(CollectionError::UnsupportedOperation("clear"))
    }
}

impl<T: fmt::Display> fmt::Display for ImmutableList<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&render_seq(&self.items))
    }
}

/// Immutable set of unique elements, iterated in construction order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImmutableSet<T: Hash + Eq> {
    items: IndexSet<T>,
}

impl<T: Hash + Eq + fmt::Debug> ImmutableSet<T> {
    /// Build a set, failing on an absent or duplicate element
    pub fn of<I>(elements: I) -> Result<Self, CollectionError>
    where
        I: IntoIterator<Item = Option<T>>,
    {
        let mut items = IndexSet::new();
        for (idx, element) in elements.into_iter().enumerate() {
            let element = element.ok_or_else(|| absent("element", idx))?;
            if let Some(existing) = items.get(&element) {
                return Err(CollectionError::InvalidArgument(format!(
                    "duplicate element: {:?}",
                    existing
                )));
            }
            items.insert(element);
        }
        Ok(Self { items })
    }
}

impl<T: Hash + Eq> ImmutableSet<T> {
    pub fn contains(&self, value: &T) -> bool {
        self.items.contains(value)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> indexmap::set::Iter<'_, T> {
        self.items.iter()
    }
}

impl<T: Hash + Eq> CollectionMut<T> for ImmutableSet<T> {
    fn add(&mut self, _value: T) -> Result<bool, CollectionError> {
        Err(CollectionError::UnsupportedOperation("add"))
    }

    fn remove_value(&mut self, _value: &T) -> Result<bool, CollectionError> {
        Err(CollectionError::UnsupportedOperation("remove"))
    }

    fn clear_all(&mut self) -> Result<(), CollectionError> {
        Err(CollectionError::UnsupportedOperation("clear"))
    }
}

impl<T: Hash + Eq + fmt::Display> fmt::Display for ImmutableSet<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&render_seq(&self.items))
    }
}

/// Immutable map with unique keys, iterated in construction order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImmutableMap<K: Hash + Eq, V> {
    entries: IndexMap<K, V>,
}

impl<K: Hash + Eq + fmt::Debug, V> ImmutableMap<K, V> {
    /// Build a map, failing on an absent key or value, or a duplicate key
    pub fn of<I>(entries: I) -> Result<Self, CollectionError>
    where
        I: IntoIterator<Item = (Option<K>, Option<V>)>,
    {
        let mut map = IndexMap::new();
        for (idx, (key, value)) in entries.into_iter().enumerate() {
            let key = key.ok_or_else(|| absent("key", idx))?;
            let value = value.ok_or_else(|| absent("value", idx))?;
            if map.contains_key(&key) {
                return Err(CollectionError::InvalidArgument(format!(
                    "duplicate key: {:?}",
                    key
                )));
            }
            map.insert(key, value);
        }
        Ok(Self { entries: map })
    }
}

impl<K: Hash + Eq, V> ImmutableMap<K, V> {
    pub fn get(&self, key: &K) -> Option<&V> {
        self.entries.get(key)
    }

    pub fn contains_key(&self, key: &K) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> indexmap::map::Iter<'_, K, V> {
        self.entries.iter()
    }
}

impl<K: Hash + Eq, V> MapMut<K, V> for ImmutableMap<K, V> {
    fn put(&mut self, _key: K, _value: V) -> Result<Option<V>, CollectionError> {
        Err(CollectionError::UnsupportedOperation("put"))
    }

    fn remove_key(&mut self, _key: &K) -> Result<Option<V>, CollectionError> {
        Err(CollectionError::UnsupportedOperation("remove"))
    }
}

impl<K: Hash + Eq + fmt::Display, V: fmt::Display> fmt::Display for ImmutableMap<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&render_map(&self.entries))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;

    #[test]
    fn test_list_of_keeps_order_and_duplicates() {
        let list = ImmutableList::of([Some("a"), Some("b"), Some("a")]).unwrap();
        assert_eq!(list.as_slice(), &["a", "b", "a"]);
        assert_eq!(list.to_string(), "[a, b, a]");
    }

    #[test]
    fn test_list_rejects_absent_element() {
        let err = ImmutableList::of([Some("a"), None, Some("c")]).unwrap_err();
        assert!(matches!(err, CollectionError::InvalidArgument(ref m) if m.contains("index 1")));
    }

    #[test]
    fn test_mutation_fails_and_leaves_contents() {
        let mut list = ImmutableList::of([Some("a"), Some("b"), Some("c")]).unwrap();
        let before = list.clone();

        assert_eq!(
            list.add("d"),
            Err(CollectionError::UnsupportedOperation("add"))
        );
        assert!(list.remove_value(&"a").is_err());
        assert!(list.clear_all().is_err());
        assert_eq!(list, before);

        let mut set = ImmutableSet::of([Some(1), Some(2)]).unwrap();
        assert!(set.add(3).is_err());
        assert_eq!(set.len(), 2);

        let mut map = ImmutableMap::of([(Some("One"), Some(1))]).unwrap();
        assert!(map.put("Two", 2).is_err());
        assert!(map.remove_key(&"One").is_err());
        assert_eq!(map.get(&"One"), Some(&1));
    }

    #[test]
    fn test_set_rejects_duplicates() {
        let err = ImmutableSet::of([Some("A"), Some("B"), Some("A")]).unwrap_err();
        assert_eq!(
            err,
            CollectionError::InvalidArgument("duplicate element: \"A\"".to_string())
        );
    }

    #[test]
    fn test_map_rejects_duplicate_key_and_absent_parts() {
        let err = ImmutableMap::of([(Some("Key1"), Some(1)), (Some("Key1"), Some(2))]).unwrap_err();
        assert!(matches!(err, CollectionError::InvalidArgument(ref m) if m.contains("duplicate key")));

        assert!(ImmutableMap::<&str, i32>::of([(None, Some(1))]).is_err());
        assert!(ImmutableMap::<&str, i32>::of([(Some("k"), None)]).is_err());
    }

    #[test]
    fn test_map_display() {
        let map = ImmutableMap::of([(Some("One"), Some(1)), (Some("Two"), Some(2))]).unwrap();
        assert_eq!(map.to_string(), "{One=1, Two=2}");
    }

    #[test]
    fn test_unmodifiable_wrapper_reads_but_refuses_writes() {
        let mut backing = Vec::new();
        backing.add("Java").unwrap();
        backing.add("C++").unwrap();
        let mut view = Unmodifiable::new(backing);

        assert_eq!(view.len(), 2);
        assert!(CollectionMut::<&str>::add(&mut view, "Python").is_err());
        assert_eq!(view.len(), 2);

        let mut map_view = Unmodifiable::new(IndexMap::from([("One", 1)]));
        assert!(MapMut::<&str, i32>::put(&mut map_view, "Two", 2).is_err());
        assert_eq!(map_view.get("One"), Some(&1));
    }

    #[test]
    fn test_randomized_construction_outcomes() {
        let mut rng = rand::rng();
        for _ in 0..200 {
            let len = rng.random_range(0..8);
            let input: Vec<Option<u8>> = (0..len)
                .map(|_| {
                    if rng.random_bool(0.1) {
                        None
                    } else {
                        Some(rng.random_range(0..6))
                    }
                })
                .collect();

            let has_absent = input.iter().any(|e| e.is_none());
            let present: Vec<u8> = input.iter().flatten().copied().collect();
            let unique: IndexSet<u8> = present.iter().copied().collect();
            let has_duplicate = unique.len() != present.len();

            let list = ImmutableList::of(input.clone());
            assert_eq!(list.is_err(), has_absent);
            if let Ok(list) = list {
                assert_eq!(list.as_slice(), present.as_slice());
            }

            let set = ImmutableSet::of(input.clone());
            assert_eq!(set.is_err(), has_absent || has_duplicate);
        }
    }
}
