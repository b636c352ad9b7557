use anyhow::Result;
use lalrgen::{
    automaton::{BuildError, Config, LALRAutomaton},
    grammar::{
        Grammar, GrammarDef, GrammarDefError, NonterminalID, ProductionID, SymbolID, TerminalID,
    },
    item::ItemCore,
    item_set::LALRItemSet,
    terminal_set::TerminalSet,
    types::{Map, Set},
};
use lalrgen_tests::{grammars, init_tracing};
use std::collections::HashSet;

type DefineFn = fn(&mut GrammarDef<'_>) -> Result<(), GrammarDefError>;

const ALL_GRAMMARS: &[(&str, DefineFn)] = &[
    ("g_simple1", grammars::g_simple1),
    ("g_simple2", grammars::g_simple2),
    ("g1", grammars::g1),
    ("g2", grammars::g2),
    ("g4", grammars::g4),
    ("pointer", grammars::pointer),
    ("stmts", grammars::stmts),
];

fn generate(f: DefineFn) -> Result<(Grammar, LALRAutomaton)> {
    init_tracing();
    let grammar = Grammar::define(f)?;
    let automaton = LALRAutomaton::generate(&grammar)?;
    Ok((grammar, automaton))
}

fn production(g: &Grammar, left: &str, index: usize) -> ProductionID {
    g.nonterminal(g.nonterminal_by_name(left).unwrap())
        .productions()[index]
}

fn names(g: &Grammar, lookahead: &TerminalSet) -> Vec<String> {
    lookahead.iter().map(|t| g.terminal(t).to_string()).collect()
}

/// The union of the lookaheads with which `production` is reduced.
fn reduce_lookahead(g: &Grammar, automaton: &LALRAutomaton, production: ProductionID) -> TerminalSet {
    let mut result = TerminalSet::default();
    for (_, state) in automaton.states() {
        for (p, lookahead) in state.reductions(g, automaton.arena()) {
            if p == production {
                result.union_with(lookahead);
            }
        }
    }
    result
}

/// FOLLOW sets computed independently from the automaton.
fn follow_sets(g: &Grammar) -> Map<NonterminalID, TerminalSet> {
    let mut follows: Map<NonterminalID, TerminalSet> = g
        .nonterminals()
        .map(|n| (n.id(), TerminalSet::default()))
        .collect();
    // `$start -> S` carries the end of input to the start symbol.
    follows[&NonterminalID::START].insert(TerminalID::EOI);

    let mut changed = true;
    while changed {
        changed = false;
        for p in g.productions() {
            for (i, symbol) in p.right().iter().enumerate() {
                let SymbolID::N(n) = symbol else { continue };
                let mut follow = p.first_of_suffix(i + 1).clone();
                if p.is_nullable_suffix(i + 1) {
                    follow.union_with(&follows[&p.left()]);
                }
                changed |= follows[n].union_with(&follow);
            }
        }
    }
    follows
}

#[test]
fn lookaheads_are_bounded_by_follow_sets() -> Result<()> {
    for (name, f) in ALL_GRAMMARS {
        let (g, automaton) = generate(*f)?;
        let follows = follow_sets(&g);
        for (id, state) in automaton.states() {
            for (p, lookahead) in state.reductions(&g, automaton.arena()) {
                let left = g.production(p).left();
                assert!(!lookahead.is_empty(), "{}: {:?}", name, id);
                assert!(
                    lookahead.is_subset(&follows[&left]),
                    "{}: {:?}: {} on {:?}",
                    name,
                    id,
                    g.production(p).display(&g),
                    names(&g, lookahead),
                );
            }
        }
    }
    Ok(())
}

#[test]
fn kernels_are_unique() -> Result<()> {
    for (name, f) in ALL_GRAMMARS {
        let (_, automaton) = generate(*f)?;
        let mut kernels: HashSet<&LALRItemSet> = HashSet::new();
        for (id, state) in automaton.states() {
            assert!(kernels.insert(state.kernel()), "{}: {:?}", name, id);
            assert!(state.kernel().is_subset_of(state.items()));
        }
    }
    Ok(())
}

#[test]
fn states_are_closed() -> Result<()> {
    for (name, f) in ALL_GRAMMARS {
        let (g, automaton) = generate(*f)?;
        for (id, state) in automaton.states() {
            for item in state.items().items(automaton.arena()) {
                let Some(n) = item.dot_before_nonterminal(&g) else { continue };
                for &p in g.nonterminal(n).productions() {
                    assert!(
                        state.items().contains(&ItemCore::new(p, 0)),
                        "{}: {:?}",
                        name,
                        id
                    );
                }
            }
        }
    }
    Ok(())
}

#[test]
fn transitions_shift_the_marker() -> Result<()> {
    for (name, f) in ALL_GRAMMARS {
        let (g, automaton) = generate(*f)?;
        let arena = automaton.arena();
        for (id, state) in automaton.states() {
            let symbols: Set<SymbolID> = state
                .items()
                .items(arena)
                .filter_map(|item| item.symbol_after_dot(&g))
                .collect();
            assert_eq!(symbols.len(), state.transitions().len(), "{}: {:?}", name, id);

            for (symbol, target) in state.transitions() {
                let mut expected: Vec<ItemCore> = state
                    .items()
                    .items(arena)
                    .filter(|item| item.symbol_after_dot(&g) == Some(symbol))
                    .map(|item| item.core().advance())
                    .collect();
                let mut actual: Vec<ItemCore> = automaton.state(target).kernel().cores().collect();
                expected.sort();
                actual.sort();
                assert_eq!(expected, actual, "{}: {:?} -> {:?}", name, id, target);
            }
        }
    }
    Ok(())
}

#[test]
fn merged_states_mix_lookaheads() -> Result<()> {
    let (g, automaton) = generate(grammars::g2)?;

    let type_id = production(&g, "TYPE", 0);
    let name_id = production(&g, "NAME", 0);
    let merged: Vec<_> = automaton
        .states()
        .filter(|(_, state)| {
            let kernel = state.kernel();
            kernel.len() == 2
                && kernel.contains(&ItemCore::new(type_id, 1))
                && kernel.contains(&ItemCore::new(name_id, 1))
        })
        .collect();
    assert_eq!(merged.len(), 1);

    let (_, state) = merged[0];
    let lookahead = |p| {
        let item = state.kernel().find(&ItemCore::new(p, 1)).unwrap();
        names(&g, automaton.arena()[item].lookahead())
    };
    // both reductions are possible on COMMA.
    assert_eq!(lookahead(type_id), ["COMMA", "ID"]);
    assert_eq!(lookahead(name_id), ["COMMA", "COLON"]);

    Ok(())
}

#[test]
fn lookaheads_flow_through_nullable_tails() -> Result<()> {
    let (g, automaton) = generate(grammars::stmts)?;

    let stmts_empty = production(&g, "STMTS", 0);
    let semi_opt_empty = production(&g, "SEMI_OPT", 0);
    let init_empty = production(&g, "INIT", 0);
    let mutability_empty = production(&g, "MUTABILITY", 0);

    assert_eq!(
        names(&g, &reduce_lookahead(&g, &automaton, stmts_empty)),
        ["$eoi", "ID", "LET", "LBRACE", "RBRACE"]
    );
    // `STMTS -> STMTS STMT . SEMI_OPT` is reached from the top level and
    // from inside of a block.
    assert_eq!(
        names(&g, &reduce_lookahead(&g, &automaton, semi_opt_empty)),
        ["$eoi", "ID", "LET", "LBRACE", "RBRACE"]
    );
    assert_eq!(
        names(&g, &reduce_lookahead(&g, &automaton, init_empty)),
        ["$eoi", "SEMI", "ID", "LET", "LBRACE", "RBRACE"]
    );
    assert_eq!(
        names(&g, &reduce_lookahead(&g, &automaton, mutability_empty)),
        ["ID"]
    );

    Ok(())
}

#[test]
fn state_limit_is_reported() -> Result<()> {
    init_tracing();
    let g = Grammar::define(grammars::g_simple2)?;
    let total = LALRAutomaton::generate(&g)?.states().len();

    let result = LALRAutomaton::generate_with_config(&g, Config::new().state_limit(Some(total - 1)))
        .map_err(anyhow::Error::from);
    let err = result.unwrap_err();
    match err.downcast_ref::<BuildError>() {
        Some(BuildError::TooManyStates { limit }) => assert_eq!(*limit, total - 1),
        _ => panic!("unexpected error: {:?}", err),
    }

    let automaton = LALRAutomaton::generate_with_config(&g, Config::new().state_limit(Some(total)))?;
    assert_eq!(automaton.states().len(), total);
    Ok(())
}

#[test]
fn malformed_grammar_is_rejected() {
    let err = Grammar::define(|g| {
        let a = g.nonterminal("A")?;
        let b = g.nonterminal("B")?;
        g.rule(a, [SymbolID::N(b)])?;
        Ok(())
    })
    .unwrap_err();
    assert!(matches!(err, GrammarDefError::MissingProductions { .. }));
}
