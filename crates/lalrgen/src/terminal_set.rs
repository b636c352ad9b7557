//! Sets of terminal symbols, used for lookaheads and FIRST sets.

use crate::grammar::TerminalID;
use bit_set::BitSet;
use std::fmt;

/// A set of terminal symbols backed by a bitset over the terminal ids.
#[derive(Default, Clone)]
pub struct TerminalSet {
    inner: BitSet,
}

impl TerminalSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, id: TerminalID) -> bool {
        self.inner.contains(id.into_raw().into())
    }

    pub fn insert(&mut self, id: TerminalID) -> bool {
        self.inner.insert(id.into_raw().into())
    }

    /// Add all terminals of `other` to this set.
    ///
    /// Returns `true` if the set has grown.
    pub fn union_with(&mut self, other: &Self) -> bool {
        if other.inner.is_subset(&self.inner) {
            return false;
        }
        self.inner.union_with(&other.inner);
        true
    }

    pub fn is_subset(&self, other: &Self) -> bool {
        self.inner.is_subset(&other.inner)
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Iterate over the terminals in ascending id order.
    pub fn iter(&self) -> impl Iterator<Item = TerminalID> + '_ {
        self.inner.iter().map(|raw| {
            let raw = u16::try_from(raw).expect("terminal id out of range");
            TerminalID::from_raw(raw)
        })
    }
}

// BitSet compares its backing storage, which depends on the capacity.
impl PartialEq for TerminalSet {
    fn eq(&self, other: &Self) -> bool {
        self.inner.iter().eq(other.inner.iter())
    }
}

impl Eq for TerminalSet {}

impl fmt::Debug for TerminalSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl FromIterator<TerminalID> for TerminalSet {
    fn from_iter<I>(iter: I) -> Self
    where
        I: IntoIterator<Item = TerminalID>,
    {
        Self {
            inner: iter.into_iter().map(|t| t.into_raw().into()).collect(),
        }
    }
}

impl Extend<TerminalID> for TerminalSet {
    fn extend<I>(&mut self, iter: I)
    where
        I: IntoIterator<Item = TerminalID>,
    {
        for t in iter {
            self.insert(t);
        }
    }
}
