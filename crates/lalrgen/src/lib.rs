//! LALR(1) automaton construction with lookahead propagation.
//!
//! A [`Grammar`](grammar::Grammar) is defined programmatically, and
//! [`LALRAutomaton`](automaton::LALRAutomaton) builds its LR(0) states while
//! attaching LALR(1) lookaheads to the items. The item sets themselves
//! ([`LALRItemSet`](item_set::LALRItemSet)) are exposed for callers that drive
//! the closure computation on their own.

pub mod automaton;
mod first_sets;
pub mod grammar;
pub mod item;
pub mod item_set;
pub mod terminal_set;
pub mod types;
mod util;
