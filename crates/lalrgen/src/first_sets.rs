//! Calculation of nullable symbols and first sets.

use crate::{
    grammar::{NonterminalID, Production, ProductionID, SymbolID},
    terminal_set::TerminalSet,
    types::{Map, Set},
};

#[derive(Debug)]
pub(crate) struct FirstSets {
    nulls: Set<NonterminalID>,
    first_sets: Map<NonterminalID, TerminalSet>,
}

impl FirstSets {
    pub(crate) fn new<I>(nonterminals: I, productions: &Map<ProductionID, Production>) -> Self
    where
        I: IntoIterator<Item = NonterminalID>,
    {
        let nulls = nulls_set(productions);
        let first_sets = first_sets(nonterminals, productions, &nulls);
        Self { nulls, first_sets }
    }

    pub(crate) fn is_nullable(&self, n: NonterminalID) -> bool {
        self.nulls.contains(&n)
    }

    pub(crate) fn first_set(&self, n: NonterminalID) -> &TerminalSet {
        &self.first_sets[&n]
    }

    /// `First(symbols[pos..])` and its nullability for every `pos` in `0..=symbols.len()`.
    pub(crate) fn suffixes(&self, symbols: &[SymbolID]) -> (Vec<TerminalSet>, Vec<bool>) {
        let mut firsts = vec![TerminalSet::default(); symbols.len() + 1];
        let mut nullables = vec![true; symbols.len() + 1];
        for (pos, symbol) in symbols.iter().enumerate().rev() {
            match symbol {
                SymbolID::T(t) => {
                    firsts[pos].insert(*t);
                    nullables[pos] = false;
                }
                SymbolID::N(n) => {
                    let mut first = self.first_set(*n).clone();
                    if self.is_nullable(*n) {
                        first.union_with(&firsts[pos + 1]);
                        nullables[pos] = nullables[pos + 1];
                    } else {
                        nullables[pos] = false;
                    }
                    firsts[pos] = first;
                }
            }
        }
        (firsts, nullables)
    }
}

/// Calculate the set of nullable symbols in this grammar.
fn nulls_set(productions: &Map<ProductionID, Production>) -> Set<NonterminalID> {
    // ruleからnullableであることが分かっている場合は追加する
    let mut nulls: Set<NonterminalID> = productions
        .values()
        .filter_map(|p| p.is_empty().then_some(p.left()))
        .collect();

    // 値が更新されなくなるまで繰り返す
    let mut changed = true;
    while changed {
        changed = false;
        for p in productions.values() {
            if nulls.contains(&p.left()) {
                continue;
            }
            // 右辺のsymbolsがすべてnullableかどうか
            let is_rhs_nullable = p
                .right()
                .iter()
                .all(|s| matches!(s, SymbolID::N(n) if nulls.contains(n)));
            if is_rhs_nullable {
                changed = true;
                nulls.insert(p.left());
            }
        }
    }

    nulls
}

fn first_sets<I>(
    nonterminals: I,
    productions: &Map<ProductionID, Production>,
    nulls: &Set<NonterminalID>,
) -> Map<NonterminalID, TerminalSet>
where
    I: IntoIterator<Item = NonterminalID>,
{
    // nonterminal symbols は First(N) = {} と初期化する
    let mut map: Map<NonterminalID, TerminalSet> = nonterminals
        .into_iter()
        .map(|n| (n, TerminalSet::default()))
        .collect();

    // 制約条件の抽出
    // X -> Y1 Y2 ... Yn という構文規則に対し、
    //  1. Y1,Y2,...と検索していき、最初に来る非nullableな記号を Yk とする
    //  2. Yi (i=1,2,..,k) それぞれに対し First(X) \supseteq First(Yi) という制約を追加する
    // 終端記号 t については First(t) = {t} なので直接追加する
    #[derive(Debug)]
    struct Constraint {
        sup: NonterminalID,
        sub: NonterminalID,
    }
    let mut constraints = vec![];
    for p in productions.values() {
        for symbol in p.right() {
            match symbol {
                SymbolID::T(t) => {
                    map[&p.left()].insert(*t);
                    break;
                }
                SymbolID::N(n) => {
                    if *n != p.left() {
                        constraints.push(Constraint {
                            sup: p.left(),
                            sub: *n,
                        });
                    }
                    if !nulls.contains(n) {
                        break;
                    }
                }
            }
        }
    }

    // 制約条件の解消
    // First(sub) \subseteq First(sup) が満たされるまで要素を追加し続ける
    let mut changed = true;
    while changed {
        changed = false;
        for Constraint { sup, sub } in &constraints {
            let subset = map[sub].clone();
            changed |= map[sup].union_with(&subset);
        }
    }

    map
}

#[cfg(test)]
mod tests {
    use crate::grammar::{Grammar, SymbolID::*, TerminalID};

    #[test]
    fn nullable_and_first_sets() {
        // S -> A B c
        // A -> a | ε
        // B -> A b | A
        let grammar = Grammar::define(|g| {
            let a = g.terminal("a")?;
            let b = g.terminal("b")?;
            let c = g.terminal("c")?;
            let s = g.nonterminal("S")?;
            let a_ = g.nonterminal("A")?;
            let b_ = g.nonterminal("B")?;
            g.rule(s, [N(a_), N(b_), T(c)])?;
            g.rule(a_, [T(a)])?;
            g.rule(a_, [])?;
            g.rule(b_, [N(a_), T(b)])?;
            g.rule(b_, [N(a_)])?;
            Ok(())
        })
        .unwrap();

        let t = |name: &str| grammar.terminal_by_name(name).unwrap();
        let n = |name: &str| grammar.nonterminal(grammar.nonterminal_by_name(name).unwrap());

        assert!(n("A").is_nullable());
        assert!(n("B").is_nullable());
        assert!(!n("S").is_nullable());

        assert_eq!(n("A").first_set().iter().collect::<Vec<_>>(), [t("a")]);
        assert_eq!(
            n("B").first_set().iter().collect::<Vec<_>>(),
            [t("a"), t("b")]
        );
        assert_eq!(
            n("S").first_set().iter().collect::<Vec<_>>(),
            [t("a"), t("b"), t("c")]
        );

        // S -> A B c
        let p = grammar.production(n("S").productions()[0]);
        assert_eq!(
            p.first_of_suffix(1).iter().collect::<Vec<_>>(),
            [t("a"), t("b"), t("c")]
        );
        assert!(!p.is_nullable_suffix(1));
        assert_eq!(p.first_of_suffix(2).iter().collect::<Vec<_>>(), [t("c")]);
        assert!(p.first_of_suffix(3).is_empty());
        assert!(p.is_nullable_suffix(3));
        // past the end behaves like the empty suffix.
        assert!(p.first_of_suffix(4).is_empty());
        assert!(p.is_nullable_suffix(4));

        // B -> A
        let p = grammar.production(n("B").productions()[1]);
        assert!(p.is_nullable_suffix(0));
        assert_eq!(p.first_of_suffix(0).iter().collect::<Vec<_>>(), [t("a")]);
        assert!(!p.first_of_suffix(0).contains(TerminalID::EOI));
    }

    #[test]
    fn left_recursion_terminates() {
        // E -> E + n | n
        let grammar = Grammar::define(|g| {
            let plus = g.terminal("PLUS")?;
            let num = g.terminal("NUM")?;
            let e = g.nonterminal("E")?;
            g.rule(e, [N(e), T(plus), T(num)])?;
            g.rule(e, [T(num)])?;
            Ok(())
        })
        .unwrap();

        let e = grammar.nonterminal(grammar.start_symbol());
        let num = grammar.terminal_by_name("NUM").unwrap();
        assert_eq!(e.first_set().iter().collect::<Vec<_>>(), [num]);
        assert!(!e.is_nullable());
    }
}
