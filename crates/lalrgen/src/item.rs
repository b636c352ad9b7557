//! LALR(1) items and the arena which owns them.
//!
//! An item is identified by its core, i.e. the pair of a production and the
//! marker position.  The lookahead set attached to an item is *not* part of its
//! identity: two items with the same core are the same key in an item set, and
//! their lookaheads are merged.
//!
//! Items refer to each other through propagation links ("if my lookahead grows,
//! forward the growth to that item").  The links may form cycles through
//! recursive productions, so the items are stored in an [`ItemArena`] and the
//! links hold [`ItemID`] handles.

use crate::{
    grammar::{Grammar, NonterminalID, ProductionID, SymbolID},
    terminal_set::TerminalSet,
    types::{Queue, Set},
    util::display_fn,
};
use std::{cmp, fmt, ops};

/// The LR(0) part of an item, a.k.a. item core.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ItemCore {
    pub production: ProductionID,
    pub dot: u16,
}

impl ItemCore {
    pub const fn new(production: ProductionID, dot: u16) -> Self {
        Self { production, dot }
    }

    /// The core with the marker moved over one symbol.
    pub const fn advance(self) -> Self {
        Self {
            production: self.production,
            dot: self.dot + 1,
        }
    }

    pub fn display<'g>(&'g self, g: &'g Grammar) -> impl fmt::Display + 'g {
        display_fn(move |f| {
            let production = g.production(self.production);
            write!(f, "{} := [", g.nonterminal(production.left()))?;
            for (i, symbol) in production.right().iter().enumerate() {
                if i == usize::from(self.dot) {
                    f.write_str(" .")?;
                }
                write!(f, " {}", g.symbol_display(*symbol))?;
            }
            if usize::from(self.dot) >= production.len() {
                f.write_str(" .")?;
            }
            f.write_str(" ]")
        })
    }
}

/// The handle of an item stored in an [`ItemArena`].
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct ItemID(u32);

impl ItemID {
    #[inline]
    pub const fn into_raw(self) -> u32 {
        self.0
    }

    #[inline]
    fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for ItemID {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "I#{:03}", self.0)
    }
}

/// An LALR(1) item.
#[derive(Debug, Clone)]
pub struct LALRItem {
    core: ItemCore,
    lookahead: TerminalSet,
    propagations: Set<ItemID>,
}

impl LALRItem {
    pub fn core(&self) -> ItemCore {
        self.core
    }

    pub fn production(&self) -> ProductionID {
        self.core.production
    }

    pub fn dot(&self) -> usize {
        self.core.dot.into()
    }

    pub fn lookahead(&self) -> &TerminalSet {
        &self.lookahead
    }

    pub fn lookahead_mut(&mut self) -> &mut TerminalSet {
        &mut self.lookahead
    }

    /// The items that receive the lookaheads of this item, in the order the
    /// links were recorded.
    pub fn propagations(&self) -> impl ExactSizeIterator<Item = ItemID> + '_ {
        self.propagations.iter().copied()
    }

    pub fn symbol_after_dot(&self, g: &Grammar) -> Option<SymbolID> {
        g.production(self.production()).symbol_after_dot(self.dot())
    }

    /// Whether the marker has reached the end of the production.
    pub fn is_complete(&self, g: &Grammar) -> bool {
        self.symbol_after_dot(g).is_none()
    }

    /// `[X -> α . N β]` yields `N`.
    pub fn dot_before_nonterminal(&self, g: &Grammar) -> Option<NonterminalID> {
        match self.symbol_after_dot(g) {
            Some(SymbolID::N(n)) => Some(n),
            _ => None,
        }
    }

    /// The lookahead handed to the items spawned by closing this item.
    ///
    /// For `[X -> α . N β, L]` this is `First(β)`, plus `lookahead` when `β`
    /// derives the empty string.
    pub fn first_of_rest(&self, g: &Grammar, lookahead: &TerminalSet) -> TerminalSet {
        let production = g.production(self.production());
        let rest = self.dot() + 1;
        let mut result = production.first_of_suffix(rest).clone();
        if production.is_nullable_suffix(rest) {
            result.union_with(lookahead);
        }
        result
    }

    /// Whether everything after the symbol following the marker is nullable.
    ///
    /// In that case the lookahead of this item flows into the items spawned by
    /// its closure, and later growth has to be propagated to them.
    pub fn lookahead_visible(&self, g: &Grammar) -> bool {
        g.production(self.production())
            .is_nullable_suffix(self.dot() + 1)
    }

    pub fn display<'g>(&'g self, g: &'g Grammar) -> impl fmt::Display + 'g {
        display_fn(move |f| {
            write!(f, "{}  [", self.core.display(g))?;
            for (i, lookahead) in self.lookahead.iter().enumerate() {
                if i > 0 {
                    f.write_str(" ")?;
                }
                write!(f, "{}", g.terminal(lookahead))?;
            }
            f.write_str("]")
        })
    }
}

/// The storage of all items created during the construction of an automaton.
#[derive(Debug, Default)]
pub struct ItemArena {
    items: Vec<LALRItem>,
}

impl ItemArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Create a new item without any propagation links.
    pub fn alloc(&mut self, core: ItemCore, lookahead: TerminalSet) -> ItemID {
        let raw = u32::try_from(self.items.len()).expect("too many items");
        self.items.push(LALRItem {
            core,
            lookahead,
            propagations: Set::default(),
        });
        ItemID(raw)
    }

    /// Create the item with the marker of `id` moved over one symbol.
    ///
    /// The new item starts with a copy of the lookahead of `id`.
    pub fn shift(&mut self, id: ItemID, g: &Grammar) -> ItemID {
        let item = &self[id];
        assert!(!item.is_complete(g), "cannot shift a completed item");
        let core = item.core.advance();
        let lookahead = item.lookahead.clone();
        self.alloc(core, lookahead)
    }

    pub fn iter(&self) -> impl Iterator<Item = (ItemID, &LALRItem)> + '_ {
        self.items
            .iter()
            .enumerate()
            .map(|(i, item)| (ItemID(i as u32), item))
    }

    /// Record that lookaheads of `from` must be forwarded to `to`.
    ///
    /// Returns `false` when the link already exists.
    pub fn add_propagation(&mut self, from: ItemID, to: ItemID) -> bool {
        self[from].propagations.insert(to)
    }

    /// Merge the lookahead of `src` into `dst`, returning whether `dst` grew.
    pub fn union_lookahead(&mut self, dst: ItemID, src: ItemID) -> bool {
        if dst == src {
            return false;
        }
        let (dst, src) = get_two_mut(&mut self.items, dst.index(), src.index());
        dst.lookahead.union_with(&src.lookahead)
    }

    /// Forward lookaheads along the propagation links until nothing changes.
    ///
    /// Returns the number of items whose lookahead grew at least once.
    pub fn propagate_lookaheads(&mut self) -> usize {
        let mut pending: Queue<ItemID> = Queue::with_capacity(self.items.len());
        for (id, item) in self.iter() {
            if !item.propagations.is_empty() {
                pending.push(id);
            }
        }

        let mut grown = Set::default();
        while let Some(from) = pending.pop() {
            for i in 0..self[from].propagations.len() {
                let to = self[from].propagations[i];
                if self.union_lookahead(to, from) {
                    grown.insert(to);
                    pending.push(to);
                }
            }
        }

        tracing::trace!("propagate_lookaheads: {} items grown", grown.len());
        grown.len()
    }

    /// Discard every item allocated after the arena had `len` items.
    ///
    /// The caller must ensure that no handle to these items is kept.
    pub(crate) fn truncate(&mut self, len: usize) {
        self.items.truncate(len);
    }
}

impl ops::Index<ItemID> for ItemArena {
    type Output = LALRItem;

    fn index(&self, id: ItemID) -> &Self::Output {
        self.items
            .get(id.index())
            .unwrap_or_else(|| panic!("{:?} does not belong to this arena", id))
    }
}

impl ops::IndexMut<ItemID> for ItemArena {
    fn index_mut(&mut self, id: ItemID) -> &mut Self::Output {
        self.items
            .get_mut(id.index())
            .unwrap_or_else(|| panic!("{:?} does not belong to this arena", id))
    }
}

fn get_two_mut<T>(slice: &mut [T], x: usize, y: usize) -> (&mut T, &mut T) {
    assert!(
        x != y && cmp::max(x, y) < slice.len(),
        "index condition not satisfied"
    );
    if x < y {
        let (a, b) = slice.split_at_mut(y);
        (&mut a[x], &mut b[0])
    } else {
        let (a, b) = slice.split_at_mut(x);
        (&mut b[0], &mut a[y])
    }
}
