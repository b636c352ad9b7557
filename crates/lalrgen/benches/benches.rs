use criterion::{criterion_group, criterion_main, Criterion};
use lalrgen::{
    automaton::{Config, LALRAutomaton},
    grammar::{Grammar, GrammarDef, GrammarDefError, SymbolID::*, TerminalID},
    item::{ItemArena, ItemCore},
    item_set::LALRItemSet,
    terminal_set::TerminalSet,
};

criterion_main!(benches);
criterion_group!(benches, bench_arithmetic, bench_chain, bench_closure);

fn arithmetic(g: &mut GrammarDef<'_>) -> Result<(), GrammarDefError> {
    let lparen = g.terminal("LPAREN")?;
    let rparen = g.terminal("RPAREN")?;
    let plus = g.terminal("PLUS")?;
    let minus = g.terminal("MINUS")?;
    let star = g.terminal("STAR")?;
    let slash = g.terminal("SLASH")?;
    let num = g.terminal("NUM")?;

    let expr = g.nonterminal("EXPR")?;
    let factor = g.nonterminal("FACTOR")?;
    let term = g.nonterminal("TERM")?;

    g.rule(expr, [N(expr), T(plus), N(factor)])?;
    g.rule(expr, [N(expr), T(minus), N(factor)])?;
    g.rule(expr, [N(factor)])?;
    g.rule(factor, [N(factor), T(star), N(term)])?;
    g.rule(factor, [N(factor), T(slash), N(term)])?;
    g.rule(factor, [N(term)])?;
    g.rule(term, [T(num)])?;
    g.rule(term, [T(lparen), N(expr), T(rparen)])?;
    Ok(())
}

// E0 -> E0 OP0 E1 | E1 ; ... ; En -> LPAREN E0 RPAREN | ATOM
fn chain(depth: usize) -> Grammar {
    Grammar::define(|g| {
        let lparen = g.terminal("LPAREN")?;
        let rparen = g.terminal("RPAREN")?;
        let atom = g.terminal("ATOM")?;
        let levels = (0..=depth)
            .map(|i| g.nonterminal(&format!("E{}", i)))
            .collect::<Result<Vec<_>, _>>()?;
        for i in 0..depth {
            let op = g.terminal(&format!("OP{}", i))?;
            g.rule(levels[i], [N(levels[i]), T(op), N(levels[i + 1])])?;
            g.rule(levels[i], [N(levels[i + 1])])?;
        }
        g.rule(levels[depth], [T(lparen), N(levels[0]), T(rparen)])?;
        g.rule(levels[depth], [T(atom)])?;
        Ok(())
    })
    .unwrap()
}

fn bench_arithmetic(c: &mut Criterion) {
    let grammar = Grammar::define(arithmetic).unwrap();
    c.bench_function("arithmetic", |b| {
        b.iter(|| LALRAutomaton::generate(&grammar).unwrap());
    });
}

fn bench_chain(c: &mut Criterion) {
    let mut group = c.benchmark_group("chain");
    for depth in [4, 16, 32] {
        let grammar = chain(depth);
        group.bench_function(format!("depth{}", depth), |b| {
            b.iter(|| {
                LALRAutomaton::generate_with_config(&grammar, Config::new().state_limit(None))
                    .unwrap()
            });
        });
    }
    group.finish();
}

fn bench_closure(c: &mut Criterion) {
    let grammar = chain(32);
    let eoi: TerminalSet = Some(TerminalID::EOI).into_iter().collect();
    let start = grammar.nonterminal(grammar.start_symbol()).productions()[0];
    c.bench_function("closure", |b| {
        b.iter(|| {
            let mut arena = ItemArena::new();
            let mut set = LALRItemSet::new();
            set.add_new(&mut arena, ItemCore::new(start, 0), eoi.clone());
            set.compute_closure(&grammar, &mut arena);
            set
        });
    });
}
