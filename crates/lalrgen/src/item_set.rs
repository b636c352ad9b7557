//! Sets of LALR(1) items keyed by item cores.

use crate::{
    grammar::Grammar,
    item::{ItemArena, ItemCore, ItemID, LALRItem},
    terminal_set::TerminalSet,
    types::Map,
    util::display_fn,
};
use rustc_hash::FxHasher;
use std::{
    cell::Cell,
    fmt,
    hash::{Hash, Hasher},
};

/// A set of LALR(1) items.
///
/// Items are unique by core only: adding an item whose core is already present
/// merges its lookahead into the stored item instead of replacing it. The set
/// stores handles into an [`ItemArena`], so cloning a set yields a structural
/// copy that shares the very same items.
#[derive(Debug, Default, Clone)]
pub struct LALRItemSet {
    items: Map<ItemCore, ItemID>,
    hash_cache: Cell<Option<u64>>,
}

impl LALRItemSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Iterate over the handles of the member items.
    pub fn iter(&self) -> impl ExactSizeIterator<Item = ItemID> + '_ {
        self.items.values().copied()
    }

    pub fn cores(&self) -> impl ExactSizeIterator<Item = ItemCore> + '_ {
        self.items.keys().copied()
    }

    pub fn items<'a>(&'a self, arena: &'a ItemArena) -> impl Iterator<Item = &'a LALRItem> + 'a {
        self.items.values().map(move |id| &arena[*id])
    }

    pub fn contains(&self, core: &ItemCore) -> bool {
        self.items.contains_key(core)
    }

    /// Return the member item with the specified core.
    pub fn find(&self, core: &ItemCore) -> Option<ItemID> {
        self.items.get(core).copied()
    }

    /// Whether every core of this set is also in `other`.
    pub fn is_subset_of(&self, other: &Self) -> bool {
        self.items.keys().all(|core| other.contains(core))
    }

    pub fn is_superset_of(&self, other: &Self) -> bool {
        other.is_subset_of(self)
    }

    /// Add an item, merging its lookahead into the member with the same core
    /// if there is one.
    ///
    /// Returns the item stored in this set after the call.
    pub fn add(&mut self, arena: &mut ItemArena, id: ItemID) -> ItemID {
        let core = arena[id].core();
        match self.items.get(&core) {
            Some(&existing) => {
                arena.union_lookahead(existing, id);
                existing
            }
            None => {
                self.hash_cache.set(None);
                self.items.insert(core, id);
                id
            }
        }
    }

    /// Same as [`add`](Self::add), but only allocates the item when no member
    /// has the specified core.
    ///
    /// The returned flag is `true` when a new item has been created.
    pub fn add_new(
        &mut self,
        arena: &mut ItemArena,
        core: ItemCore,
        lookahead: TerminalSet,
    ) -> (ItemID, bool) {
        match self.items.get(&core) {
            Some(&existing) => {
                arena[existing].lookahead_mut().union_with(&lookahead);
                (existing, false)
            }
            None => {
                let id = arena.alloc(core, lookahead);
                self.hash_cache.set(None);
                self.items.insert(core, id);
                (id, true)
            }
        }
    }

    /// Add all items of `other`, in its iteration order.
    pub fn add_set(&mut self, arena: &mut ItemArena, other: &Self) {
        for id in other.iter() {
            self.add(arena, id);
        }
    }

    pub fn remove(&mut self, core: &ItemCore) -> Option<ItemID> {
        self.hash_cache.set(None);
        self.items.shift_remove(core)
    }

    pub fn remove_set(&mut self, other: &Self) {
        for core in other.items.keys() {
            self.remove(core);
        }
    }

    /// Remove and return one member, the most recently inserted one.
    pub fn take_one(&mut self) -> Option<ItemID> {
        let (_, id) = self.items.pop()?;
        self.hash_cache.set(None);
        Some(id)
    }

    /// Compute the closure of this set in place.
    ///
    /// For every item of the form `[L -> α . N β, l]`, the items
    /// `[N -> . γ, First(β l)]` are added for each production of `N`. Items with
    /// the same core are merged, which is where the lookaheads of LALR(1) get
    /// merged. When `β` is nullable, the lookahead of the original item flows
    /// into the new items, and a propagation link is recorded so that the
    /// later growth of that lookahead can be forwarded.
    ///
    /// An item whose core was already present is not expanded again; growth
    /// of its lookahead is left to [`ItemArena::propagate_lookaheads`].
    pub fn compute_closure(&mut self, g: &Grammar, arena: &mut ItemArena) {
        self.hash_cache.set(None);

        let mut consider = self.clone();
        while let Some(id) = consider.take_one() {
            let item = &arena[id];
            let Some(n) = item.dot_before_nonterminal(g) else {
                continue;
            };
            let new_lookahead = item.first_of_rest(g, item.lookahead());
            let need_prop = item.lookahead_visible(g);

            for &production in g.nonterminal(n).productions() {
                let core = ItemCore::new(production, 0);
                let (added, is_new) = self.add_new(arena, core, new_lookahead.clone());
                if need_prop {
                    arena.add_propagation(id, added);
                }
                if is_new {
                    consider.add(arena, added);
                }
            }
        }

        tracing::trace!("compute_closure: {} items", self.len());
    }

    /// The hash value of this set, derived from the member cores only.
    pub fn hash_code(&self) -> u64 {
        if let Some(hash) = self.hash_cache.get() {
            return hash;
        }
        // All members take part, since equal sets must agree on the hash.
        let hash = self
            .items
            .keys()
            .fold(0, |acc, core| acc ^ core_hash(core));
        self.hash_cache.set(Some(hash));
        hash
    }

    pub fn display<'a>(&'a self, g: &'a Grammar, arena: &'a ItemArena) -> impl fmt::Display + 'a {
        display_fn(move |f| {
            f.write_str("{\n")?;
            for item in self.items(arena) {
                writeln!(f, "  {}", item.display(g))?;
            }
            f.write_str("}")
        })
    }
}

fn core_hash(core: &ItemCore) -> u64 {
    let mut hasher = FxHasher::default();
    core.hash(&mut hasher);
    hasher.finish()
}

impl PartialEq for LALRItemSet {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.is_subset_of(other)
    }
}

impl Eq for LALRItemSet {}

impl Hash for LALRItemSet {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.hash_code());
    }
}
