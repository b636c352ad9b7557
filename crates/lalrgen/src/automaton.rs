//! Construction of the LALR(1) automaton.

use crate::{
    grammar::{Grammar, ProductionID, SymbolID, TerminalID},
    item::{ItemArena, ItemCore, ItemID},
    item_set::LALRItemSet,
    terminal_set::TerminalSet,
    types::{Map, Set},
    util::display_fn,
};
use std::{collections::VecDeque, fmt, time::Instant};

#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("the number of states exceeds the limit ({limit})")]
    TooManyStates { limit: usize },
}

const MAX_STATES: usize = u16::MAX as usize + 1;

#[derive(Debug, Default, Clone)]
pub struct Config {
    state_limit: Option<usize>,
}

impl Config {
    pub const fn new() -> Self {
        Self { state_limit: None }
    }

    /// Set the upper bound of the number of states.
    ///
    /// Regardless of this value, an automaton never has more states than
    /// `StateID` can represent.
    pub fn state_limit(&mut self, limit: Option<usize>) -> &mut Self {
        self.state_limit = limit;
        self
    }

    fn effective_state_limit(&self) -> usize {
        self.state_limit.map_or(MAX_STATES, |limit| limit.min(MAX_STATES))
    }
}

#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct StateID(u16);

impl StateID {
    pub const START: Self = Self(0);

    pub const fn into_raw(self) -> u16 {
        self.0
    }
}

impl fmt::Debug for StateID {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "S#{:03}", self.0)
    }
}

impl fmt::Display for StateID {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

#[derive(Debug)]
pub struct LALRState {
    kernel: LALRItemSet,
    items: LALRItemSet,
    transitions: Map<SymbolID, StateID>,
}

impl LALRState {
    /// The items this state was created from, before taking the closure.
    pub fn kernel(&self) -> &LALRItemSet {
        &self.kernel
    }

    /// The closure of the kernel.
    pub fn items(&self) -> &LALRItemSet {
        &self.items
    }

    pub fn transitions(&self) -> impl ExactSizeIterator<Item = (SymbolID, StateID)> + '_ {
        self.transitions.iter().map(|(symbol, target)| (*symbol, *target))
    }

    pub fn transition(&self, symbol: SymbolID) -> Option<StateID> {
        self.transitions.get(&symbol).copied()
    }

    /// The completed items in this state with their lookaheads.
    ///
    /// The accepting item `$start -> S .` is reported as a reduction of
    /// `ProductionID::ACCEPT`.
    pub fn reductions<'a>(
        &'a self,
        g: &'a Grammar,
        arena: &'a ItemArena,
    ) -> impl Iterator<Item = (ProductionID, &'a TerminalSet)> + 'a {
        self.items
            .items(arena)
            .filter(move |item| item.is_complete(g))
            .map(|item| (item.production(), item.lookahead()))
    }
}

/// The LALR(1) automaton of a grammar.
#[derive(Debug)]
pub struct LALRAutomaton {
    states: Map<StateID, LALRState>,
    arena: ItemArena,
}

impl LALRAutomaton {
    pub fn generate(g: &Grammar) -> Result<Self, BuildError> {
        Self::generate_with_config(g, &Config::new())
    }

    pub fn generate_with_config(g: &Grammar, config: &Config) -> Result<Self, BuildError> {
        let start = Instant::now();

        let mut builder = AutomatonBuilder {
            grammar: g,
            state_limit: config.effective_state_limit(),
            arena: ItemArena::new(),
            states: Map::default(),
            kernels: Map::default(),
            pending: VecDeque::new(),
        };
        builder.populate_states()?;

        let AutomatonBuilder {
            states, mut arena, ..
        } = builder;
        let grown = arena.propagate_lookaheads();

        tracing::info!(
            "generated {} states ({} items, {} grown by propagation) in {:?}",
            states.len(),
            arena.len(),
            grown,
            start.elapsed()
        );

        Ok(Self { states, arena })
    }

    pub fn states(&self) -> impl ExactSizeIterator<Item = (StateID, &LALRState)> + '_ {
        self.states.iter().map(|(id, state)| (*id, state))
    }

    pub fn state(&self, id: StateID) -> &LALRState {
        &self.states[&id]
    }

    pub fn start_state(&self) -> &LALRState {
        self.state(StateID::START)
    }

    /// The storage of every item referred by the states.
    pub fn arena(&self) -> &ItemArena {
        &self.arena
    }

    pub fn display<'g>(&'g self, g: &'g Grammar) -> impl fmt::Display + 'g {
        display_fn(move |f| {
            for (i, (id, state)) in self.states().enumerate() {
                if i > 0 {
                    writeln!(f)?;
                }

                writeln!(f, "#### State {:02}", id)?;
                writeln!(f, "## items")?;
                for item in state.items.items(&self.arena) {
                    writeln!(f, "- {}", item.display(g))?;
                }

                writeln!(f, "## transitions")?;
                for (symbol, target) in state.transitions() {
                    writeln!(f, "- {} => {:02}", g.symbol_display(symbol), target)?;
                }

                writeln!(f, "## reductions")?;
                for (production, lookahead) in state.reductions(g, &self.arena) {
                    write!(f, "- {} on [", g.production(production).display(g))?;
                    for (i, t) in lookahead.iter().enumerate() {
                        if i > 0 {
                            f.write_str(" ")?;
                        }
                        write!(f, "{}", g.terminal(t))?;
                    }
                    f.write_str("]\n")?;
                }
            }
            Ok(())
        })
    }
}

struct AutomatonBuilder<'g> {
    grammar: &'g Grammar,
    state_limit: usize,
    arena: ItemArena,
    states: Map<StateID, LALRState>,
    kernels: Map<LALRItemSet, StateID>,
    pending: VecDeque<StateID>,
}

impl AutomatonBuilder<'_> {
    fn populate_states(&mut self) -> Result<(), BuildError> {
        // [$start -> . S] {$eoi}
        let mut kernel = LALRItemSet::new();
        kernel.add_new(
            &mut self.arena,
            ItemCore::new(ProductionID::ACCEPT, 0),
            Some(TerminalID::EOI).into_iter().collect(),
        );
        self.add_state(kernel)?;

        while let Some(id) = self.pending.pop_front() {
            self.expand_state(id)?;
        }

        Ok(())
    }

    fn add_state(&mut self, kernel: LALRItemSet) -> Result<StateID, BuildError> {
        if self.states.len() >= self.state_limit {
            return Err(BuildError::TooManyStates {
                limit: self.state_limit,
            });
        }
        let id = StateID(u16::try_from(self.states.len()).map_err(|_| {
            BuildError::TooManyStates {
                limit: self.state_limit,
            }
        })?);

        let mut items = kernel.clone();
        items.compute_closure(self.grammar, &mut self.arena);

        tracing::debug!(
            "new state {:?}: {} kernel items, {} items",
            id,
            kernel.len(),
            items.len()
        );

        self.kernels.insert(kernel.clone(), id);
        self.states.insert(
            id,
            LALRState {
                kernel,
                items,
                transitions: Map::default(),
            },
        );
        self.pending.push_back(id);

        Ok(id)
    }

    fn expand_state(&mut self, id: StateID) -> Result<(), BuildError> {
        let g = self.grammar;
        let items: Vec<ItemID> = self.states[&id].items.iter().collect();

        let symbols: Set<SymbolID> = items
            .iter()
            .filter_map(|item| self.arena[*item].symbol_after_dot(g))
            .collect();

        for symbol in symbols {
            let mark = self.arena.len();

            let mut kernel = LALRItemSet::new();
            let mut shifted = vec![];
            for &item in &items {
                if self.arena[item].symbol_after_dot(g) != Some(symbol) {
                    continue;
                }
                let new_item = self.arena.shift(item, g);
                let new_item = kernel.add(&mut self.arena, new_item);
                shifted.push((item, new_item));
            }

            let known = self.kernels.get(&kernel).copied();
            let target = match known {
                Some(target) => {
                    // The items just shifted are never referred again.
                    let cores: Vec<_> = shifted
                        .iter()
                        .map(|(source, new_item)| (*source, self.arena[*new_item].core()))
                        .collect();
                    drop(kernel);
                    self.arena.truncate(mark);

                    let target_kernel = &self.states[&target].kernel;
                    for (source, core) in cores {
                        if let Some(dest) = target_kernel.find(&core) {
                            self.arena.add_propagation(source, dest);
                        }
                    }
                    target
                }
                None => {
                    for (source, new_item) in shifted {
                        self.arena.add_propagation(source, new_item);
                    }
                    self.add_state(kernel)?
                }
            };

            self.states[&id].transitions.insert(symbol, target);
        }

        Ok(())
    }
}
