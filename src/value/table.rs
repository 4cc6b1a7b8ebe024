// Hybrid array/map aggregate.
//
// A table is split into two parts:
//
// - array part: values for keys 1..=n, where n is the length of the maximal
//   contiguous run of present integer keys starting at 1;
// - map part:   every other (key, value) pair, in insertion order.
//
// The split is maintained on every insert and remove, so an integer key in
// [1, len] is never stored in the map part. Keys follow the host's rules:
// reals with an exact integer value are normalized to integers, nil and NaN
// keys are rejected, and assigning nil removes the key.
//
// Scalar keys (boolean, integer, real, string) are deduplicated through a
// hash index. Table, code and userdata keys have identity semantics: every
// insertion adds a new pair.

use std::collections::HashMap;
use std::mem;

use thiserror::Error;

use super::{Value, exact_integer};

/// Rejected table key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TableError {
    #[error("table index is nil")]
    NilKey,
    #[error("table index is NaN")]
    NanKey,
}

/// Hash index key for scalar table keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum ScalarKey {
    Boolean(bool),
    Integer(i64),
    Real(u64),
    String(Vec<u8>),
}

impl ScalarKey {
    /// Index key for an already-normalized table key.
    fn of(key: &Value) -> Option<Self> {
        match key {
            Value::Boolean(b) => Some(Self::Boolean(*b)),
            Value::Integer(i) => Some(Self::Integer(*i)),
            Value::Real(f) => Some(Self::Real(f.to_bits())),
            Value::String(s) => Some(Self::String(s.clone())),
            Value::Nil | Value::Table(_) | Value::Code(_) | Value::Userdata(_) => None,
        }
    }
}

fn normalize_key(key: Value) -> Result<Value, TableError> {
    match key {
        Value::Nil => Err(TableError::NilKey),
        Value::Real(f) if f.is_nan() => Err(TableError::NanKey),
        Value::Real(f) => Ok(exact_integer(f).map_or(Value::Real(f), Value::Integer)),
        other => Ok(other),
    }
}

/// Array index (0-based) for an integer key inside `[1, len]`.
fn array_slot(key: i64, len: usize) -> Option<usize> {
    let slot = usize::try_from(key).ok()?.checked_sub(1)?;
    (slot < len).then_some(slot)
}

/// An associative array with a contiguous array part.
#[derive(Debug, Clone, Default)]
pub struct Table {
    array: Vec<Value>,
    map: Vec<(Value, Value)>,
    index: HashMap<ScalarKey, usize>,
}

impl Table {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-size both parts.
    pub fn with_capacity(array: usize, map: usize) -> Self {
        Self {
            array: Vec::with_capacity(array),
            map: Vec::with_capacity(map),
            index: HashMap::with_capacity(map),
        }
    }

    /// Length of the array part (the border).
    pub fn len(&self) -> usize {
        self.array.len()
    }

    /// Number of pairs in the map part.
    pub fn map_len(&self) -> usize {
        self.map.len()
    }

    /// True when neither part holds anything.
    pub fn is_empty(&self) -> bool {
        self.array.is_empty() && self.map.is_empty()
    }

    /// Values for keys `1..=len()`.
    pub fn array(&self) -> &[Value] {
        &self.array
    }

    /// Map part pairs.
    pub fn pairs(&self) -> impl Iterator<Item = (&Value, &Value)> {
        self.map.iter().map(|(k, v)| (k, v))
    }

    /// Look up a key. Non-scalar keys are matched by structural equality.
    pub fn get(&self, key: &Value) -> Option<&Value> {
        let key = normalize_key(key.clone()).ok()?;
        if let Value::Integer(i) = key
            && let Some(slot) = array_slot(i, self.array.len())
        {
            return Some(&self.array[slot]);
        }
        self.find(&key).map(|pos| &self.map[pos].1)
    }

    /// Append to the array part. Pushing nil is a no-op.
    pub fn push(&mut self, value: impl Into<Value>) {
        let value = value.into();
        if value.is_nil() {
            return;
        }
        self.array.push(value);
        self.absorb_successors();
    }

    /// Set `key` to `value`, returning the previous value.
    ///
    /// Assigning nil removes the key.
    pub fn insert(
        &mut self,
        key: impl Into<Value>,
        value: impl Into<Value>,
    ) -> Result<Option<Value>, TableError> {
        let key = normalize_key(key.into())?;
        let value = value.into();
        if value.is_nil() {
            return Ok(self.remove_normalized(&key));
        }

        if let Value::Integer(i) = key {
            if let Some(slot) = array_slot(i, self.array.len()) {
                return Ok(Some(mem::replace(&mut self.array[slot], value)));
            }
            if usize::try_from(i).is_ok_and(|i| i == self.array.len() + 1) {
                self.array.push(value);
                self.absorb_successors();
                return Ok(None);
            }
        }

        match ScalarKey::of(&key) {
            Some(scalar) => {
                if let Some(&pos) = self.index.get(&scalar) {
                    return Ok(Some(mem::replace(&mut self.map[pos].1, value)));
                }
                self.index.insert(scalar, self.map.len());
                self.map.push((key, value));
            }
            None => self.map.push((key, value)),
        }
        Ok(None)
    }

    /// Remove a key, returning its value.
    ///
    /// Removing an index inside the array part moves every later element
    /// into the map part, keeping the array part contiguous.
    pub fn remove(&mut self, key: &Value) -> Option<Value> {
        let key = normalize_key(key.clone()).ok()?;
        self.remove_normalized(&key)
    }

    fn remove_normalized(&mut self, key: &Value) -> Option<Value> {
        if let Value::Integer(i) = *key
            && let Some(slot) = array_slot(i, self.array.len())
        {
            let tail = self.array.split_off(slot + 1);
            let removed = self.array.pop();
            for (offset, value) in tail.into_iter().enumerate() {
                let key = Value::Integer(i + 1 + offset as i64);
                if let Some(scalar) = ScalarKey::of(&key) {
                    self.index.insert(scalar, self.map.len());
                }
                self.map.push((key, value));
            }
            return removed;
        }
        let pos = self.find(key)?;
        Some(self.take_map(pos).1)
    }

    /// Position of `key` (normalized) in the map part.
    fn find(&self, key: &Value) -> Option<usize> {
        match ScalarKey::of(key) {
            Some(scalar) => self.index.get(&scalar).copied(),
            None => self.map.iter().position(|(k, _)| k == key),
        }
    }

    /// Remove the pair at `pos`, keeping the index consistent.
    fn take_map(&mut self, pos: usize) -> (Value, Value) {
        let pair = self.map.swap_remove(pos);
        if let Some(scalar) = ScalarKey::of(&pair.0) {
            self.index.remove(&scalar);
        }
        if let Some((moved, _)) = self.map.get(pos)
            && let Some(scalar) = ScalarKey::of(moved)
        {
            self.index.insert(scalar, pos);
        }
        pair
    }

    /// Pull keys `len+1, len+2, ...` out of the map part after the array
    /// part grew.
    fn absorb_successors(&mut self) {
        loop {
            let next = ScalarKey::Integer(self.array.len() as i64 + 1);
            let Some(&pos) = self.index.get(&next) else {
                break;
            };
            let (_, value) = self.take_map(pos);
            self.array.push(value);
        }
    }
}

impl PartialEq for Table {
    fn eq(&self, other: &Self) -> bool {
        if self.array != other.array || self.map.len() != other.map.len() {
            return false;
        }
        // Identity keys can repeat, so they are matched as a multiset.
        let mut claimed = vec![false; other.map.len()];
        self.map.iter().all(|(key, value)| {
            let candidate = match ScalarKey::of(key) {
                Some(scalar) => other.index.get(&scalar).copied(),
                None => other
                    .map
                    .iter()
                    .enumerate()
                    .position(|(pos, (k, v))| !claimed[pos] && k == key && v == value),
            };
            match candidate {
                Some(pos) if !claimed[pos] && other.map[pos].1 == *value => {
                    claimed[pos] = true;
                    true
                }
                _ => false,
            }
        })
    }
}

impl<V: Into<Value>> FromIterator<V> for Table {
    /// Builds a sequence: the n-th item is stored under key n. Nil items
    /// leave holes.
    fn from_iter<I: IntoIterator<Item = V>>(iter: I) -> Self {
        let mut table = Table::new();
        for (i, value) in iter.into_iter().enumerate() {
            let value = value.into();
            if value.is_nil() {
                continue;
            }
            // Integer keys are never rejected.
            let _ = table.insert(Value::Integer(i as i64 + 1), value);
        }
        table
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
