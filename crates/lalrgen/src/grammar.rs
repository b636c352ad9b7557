//! Grammar types.

use crate::{
    first_sets::FirstSets,
    terminal_set::TerminalSet,
    types::{Map, Set},
    util::display_fn,
};
use std::{borrow::Cow, fmt, marker::PhantomData};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct TerminalID {
    raw: u16,
}

impl TerminalID {
    /// Reserved symbol used as a terminal symbol that means the end of input.
    pub const EOI: Self = Self::from_raw(0);

    const OFFSET: u16 = 1;

    #[inline]
    pub const fn from_raw(raw: u16) -> Self {
        Self { raw }
    }

    #[inline]
    pub const fn into_raw(self) -> u16 {
        self.raw
    }
}

#[derive(Debug)]
pub struct Terminal {
    id: TerminalID,
    export_name: Option<Cow<'static, str>>,
}

impl Terminal {
    pub fn id(&self) -> TerminalID {
        self.id
    }

    pub fn export_name(&self) -> Option<&str> {
        self.export_name.as_deref()
    }
}

impl fmt::Display for Terminal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.id {
            TerminalID::EOI => f.write_str("$eoi"),
            _ => f.write_str(self.export_name().unwrap_or("<unknown>")),
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct NonterminalID {
    raw: u16,
}

impl NonterminalID {
    /// Reserved symbol used as the left-hand side of the augmented production.
    pub const START: Self = Self::from_raw(0);

    const OFFSET: u16 = 1;

    #[inline]
    pub const fn from_raw(raw: u16) -> Self {
        Self { raw }
    }

    #[inline]
    pub const fn into_raw(self) -> u16 {
        self.raw
    }
}

#[derive(Debug)]
pub struct Nonterminal {
    id: NonterminalID,
    export_name: Option<Cow<'static, str>>,
    productions: Vec<ProductionID>,
    nullable: bool,
    first_set: TerminalSet,
}

impl Nonterminal {
    pub fn id(&self) -> NonterminalID {
        self.id
    }

    pub fn export_name(&self) -> Option<&str> {
        self.export_name.as_deref()
    }

    /// The productions whose left-hand side is this symbol, in definition order.
    pub fn productions(&self) -> &[ProductionID] {
        &self.productions[..]
    }

    /// Whether this symbol derives the empty string.
    pub fn is_nullable(&self) -> bool {
        self.nullable
    }

    pub fn first_set(&self) -> &TerminalSet {
        &self.first_set
    }
}

impl fmt::Display for Nonterminal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.id {
            NonterminalID::START => f.write_str("$start"),
            _ => f.write_str(self.export_name().unwrap_or("<unknown>")),
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum SymbolID {
    T(TerminalID),
    N(NonterminalID),
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct ProductionID {
    raw: u16,
}

impl ProductionID {
    /// The augmented production `$start := S`.
    pub const ACCEPT: Self = Self::from_raw(0);

    const OFFSET: u16 = 1;

    #[inline]
    pub const fn from_raw(raw: u16) -> Self {
        Self { raw }
    }

    #[inline]
    pub const fn into_raw(self) -> u16 {
        self.raw
    }
}

/// The type that represents a production rule in grammar.
#[derive(Debug)]
pub struct Production {
    id: ProductionID,
    left: NonterminalID,
    right: Vec<SymbolID>,
    // indexed by position in `0..=right.len()`.
    suffix_firsts: Vec<TerminalSet>,
    suffix_nullables: Vec<bool>,
}

impl Production {
    pub fn id(&self) -> ProductionID {
        self.id
    }

    /// Return the left-hand side of this production.
    pub fn left(&self) -> NonterminalID {
        self.left
    }

    /// Return the right-hand side of this production.
    pub fn right(&self) -> &[SymbolID] {
        &self.right[..]
    }

    pub fn len(&self) -> usize {
        self.right.len()
    }

    pub fn is_empty(&self) -> bool {
        self.right.is_empty()
    }

    /// The symbol immediately after the marker at `dot`, if any.
    pub fn symbol_after_dot(&self, dot: usize) -> Option<SymbolID> {
        self.right.get(dot).copied()
    }

    /// `First(right[pos..])`.
    ///
    /// Positions past the end are treated as the empty suffix.
    pub fn first_of_suffix(&self, pos: usize) -> &TerminalSet {
        &self.suffix_firsts[pos.min(self.right.len())]
    }

    /// Whether `right[pos..]` derives the empty string.
    pub fn is_nullable_suffix(&self, pos: usize) -> bool {
        self.suffix_nullables[pos.min(self.right.len())]
    }

    // `"LHS := R1 R2 R3"`
    pub fn display<'g>(&'g self, g: &'g Grammar) -> impl fmt::Display + 'g {
        display_fn(move |f| {
            write!(f, "{} := ", g.nonterminal(self.left))?;
            if self.right.is_empty() {
                return f.write_str("ε");
            }
            for (i, symbol) in self.right.iter().enumerate() {
                if i > 0 {
                    f.write_str(" ")?;
                }
                write!(f, "{}", g.symbol_display(*symbol))?;
            }
            Ok(())
        })
    }
}

/// The grammar definition used to derive the LALR automaton.
///
/// Nullability and FIRST sets are computed when the definition ends, so every
/// `Grammar` is ready for closure computation.
#[derive(Debug)]
pub struct Grammar {
    terminals: Map<TerminalID, Terminal>,
    nonterminals: Map<NonterminalID, Nonterminal>,
    productions: Map<ProductionID, Production>,
    start_symbol: NonterminalID,
}

impl fmt::Display for Grammar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "## terminals:")?;
        for terminal in self.terminals.values() {
            writeln!(f, "{}", terminal)?;
        }

        writeln!(f, "\n## nonterminals:")?;
        for nonterminal in self.nonterminals.values() {
            write!(f, "{}", nonterminal)?;
            if nonterminal.id() == self.start_symbol {
                write!(f, " (start)")?;
            }
            if nonterminal.is_nullable() {
                write!(f, " (nullable)")?;
            }
            writeln!(f)?;
        }

        writeln!(f, "\n## productions:")?;
        for production in self.productions.values() {
            writeln!(f, "{}", production.display(self))?;
        }

        Ok(())
    }
}

impl Grammar {
    /// Define a grammar using the specified function.
    pub fn define<F>(f: F) -> Result<Self, GrammarDefError>
    where
        F: FnOnce(&mut GrammarDef) -> Result<(), GrammarDefError>,
    {
        let mut def = GrammarDef {
            terminals: Map::default(),
            nonterminals: Map::default(),
            productions: Map::default(),
            start: None,
            next_terminal_id: TerminalID::OFFSET,
            next_nonterminal_id: NonterminalID::OFFSET,
            next_production_id: ProductionID::OFFSET,
            _marker: PhantomData,
        };

        def.terminals.insert(
            TerminalID::EOI,
            Terminal {
                id: TerminalID::EOI,
                export_name: None,
            },
        );
        def.nonterminals.insert(
            NonterminalID::START,
            Nonterminal {
                id: NonterminalID::START,
                export_name: None,
                productions: vec![],
                nullable: false,
                first_set: TerminalSet::default(),
            },
        );

        f(&mut def)?;

        def.end()
    }

    pub fn terminals(&self) -> impl Iterator<Item = &Terminal> + '_ {
        self.terminals.values()
    }

    pub fn nonterminals(&self) -> impl Iterator<Item = &Nonterminal> + '_ {
        self.nonterminals.values()
    }

    pub fn productions(&self) -> impl Iterator<Item = &Production> + '_ {
        self.productions.values()
    }

    pub fn terminal(&self, id: TerminalID) -> &Terminal {
        &self.terminals[&id]
    }

    pub fn nonterminal(&self, id: NonterminalID) -> &Nonterminal {
        &self.nonterminals[&id]
    }

    pub fn production(&self, id: ProductionID) -> &Production {
        &self.productions[&id]
    }

    pub fn start_symbol(&self) -> NonterminalID {
        self.start_symbol
    }

    pub fn terminal_by_name(&self, name: &str) -> Option<TerminalID> {
        self.terminals
            .values()
            .find(|t| t.export_name() == Some(name))
            .map(|t| t.id())
    }

    pub fn nonterminal_by_name(&self, name: &str) -> Option<NonterminalID> {
        self.nonterminals
            .values()
            .find(|n| n.export_name() == Some(name))
            .map(|n| n.id())
    }

    pub fn symbol_display(&self, symbol: SymbolID) -> impl fmt::Display + '_ {
        display_fn(move |f| match symbol {
            SymbolID::T(t) => write!(f, "{}", self.terminal(t)),
            SymbolID::N(n) => write!(f, "{}", self.nonterminal(n)),
        })
    }
}

/// The contextural values for building a `Grammar`.
#[derive(Debug)]
pub struct GrammarDef<'def> {
    terminals: Map<TerminalID, Terminal>,
    nonterminals: Map<NonterminalID, Nonterminal>,
    productions: Map<ProductionID, Production>,
    start: Option<NonterminalID>,
    next_terminal_id: u16,
    next_nonterminal_id: u16,
    next_production_id: u16,
    _marker: PhantomData<&'def mut ()>,
}

impl<'def> GrammarDef<'def> {
    /// Declare a terminal symbol used in this grammar.
    pub fn terminal(&mut self, export_name: &str) -> Result<TerminalID, GrammarDefError> {
        self.verify_new_name(export_name)?;

        let id = TerminalID::from_raw(self.next_terminal_id);
        self.next_terminal_id = bump(self.next_terminal_id)?;

        self.terminals.insert(
            id,
            Terminal {
                id,
                export_name: Some(export_name.to_owned().into()),
            },
        );

        Ok(id)
    }

    /// Declare a nonterminal symbol used in this grammar.
    pub fn nonterminal(&mut self, export_name: &str) -> Result<NonterminalID, GrammarDefError> {
        self.verify_new_name(export_name)?;

        let id = NonterminalID::from_raw(self.next_nonterminal_id);
        self.next_nonterminal_id = bump(self.next_nonterminal_id)?;

        self.nonterminals.insert(
            id,
            Nonterminal {
                id,
                export_name: Some(export_name.to_owned().into()),
                productions: vec![],
                nullable: false,
                first_set: TerminalSet::default(),
            },
        );

        Ok(id)
    }

    /// Specify a production rule into this grammer.
    pub fn rule<I>(&mut self, left: NonterminalID, right: I) -> Result<ProductionID, GrammarDefError>
    where
        I: IntoIterator<Item = SymbolID>,
    {
        if left == NonterminalID::START || !self.nonterminals.contains_key(&left) {
            return Err(GrammarDefError::UnknownSymbol {
                symbol: SymbolID::N(left),
            });
        }

        let right: Vec<SymbolID> = right.into_iter().collect();
        for symbol in &right {
            let known = match symbol {
                SymbolID::T(t) => self.terminals.contains_key(t),
                SymbolID::N(n) => *n != NonterminalID::START && self.nonterminals.contains_key(n),
            };
            if !known {
                return Err(GrammarDefError::UnknownSymbol { symbol: *symbol });
            }
        }

        for production in self.productions.values() {
            if production.left == left && production.right == right {
                return Err(GrammarDefError::DuplicateProduction {
                    left: self.nonterminals[&left].to_string(),
                });
            }
        }

        let id = ProductionID::from_raw(self.next_production_id);
        self.next_production_id = bump(self.next_production_id)?;
        self.productions.insert(id, Production::new(id, left, right));
        self.nonterminals[&left].productions.push(id);

        Ok(id)
    }

    /// Specify the start symbol for this grammar.
    pub fn start_symbol(&mut self, symbol: NonterminalID) -> Result<(), GrammarDefError> {
        if symbol == NonterminalID::START || !self.nonterminals.contains_key(&symbol) {
            return Err(GrammarDefError::UnknownSymbol {
                symbol: SymbolID::N(symbol),
            });
        }
        self.start.replace(symbol);
        Ok(())
    }

    fn verify_new_name(&self, export_name: &str) -> Result<(), GrammarDefError> {
        if !verify_ident(export_name) {
            return Err(GrammarDefError::InvalidName {
                name: export_name.to_owned(),
            });
        }

        let exported = self
            .terminals
            .values()
            .filter_map(|t| t.export_name())
            .chain(self.nonterminals.values().filter_map(|n| n.export_name()));
        for name in exported {
            if name == export_name {
                return Err(GrammarDefError::DuplicateName {
                    name: export_name.to_owned(),
                });
            }
        }

        Ok(())
    }

    fn end(mut self) -> Result<Grammar, GrammarDefError> {
        // 指定されていない場合は最初に登録されたnonterminal symbolを用いる
        let start = match self.start.take() {
            Some(start) => start,
            None => self
                .nonterminals
                .keys()
                .find(|id| **id != NonterminalID::START)
                .copied()
                .ok_or(GrammarDefError::NoNonterminals)?,
        };

        self.productions.insert(
            ProductionID::ACCEPT,
            Production::new(
                ProductionID::ACCEPT,
                NonterminalID::START,
                vec![SymbolID::N(start)],
            ),
        );
        self.productions.sort_keys();
        self.nonterminals[&NonterminalID::START]
            .productions
            .push(ProductionID::ACCEPT);

        // 右辺に現れる非終端記号は少なくとも一つの構文規則を持つ必要がある
        let mut used = Set::default();
        used.insert(start);
        for production in self.productions.values() {
            for symbol in &production.right {
                if let SymbolID::N(n) = symbol {
                    used.insert(*n);
                }
            }
        }
        for nonterminal in self.nonterminals.values() {
            if !nonterminal.productions.is_empty() {
                continue;
            }
            if used.contains(&nonterminal.id) {
                return Err(GrammarDefError::MissingProductions {
                    name: nonterminal.to_string(),
                });
            }
            tracing::warn!(
                "The nonterminal `{}' has no associated production rule",
                nonterminal
            );
        }

        let first_sets = FirstSets::new(self.nonterminals.keys().copied(), &self.productions);
        for (id, nonterminal) in &mut self.nonterminals {
            nonterminal.nullable = first_sets.is_nullable(*id);
            nonterminal.first_set = first_sets.first_set(*id).clone();
        }
        for production in self.productions.values_mut() {
            let (firsts, nullables) = first_sets.suffixes(&production.right);
            production.suffix_firsts = firsts;
            production.suffix_nullables = nullables;
        }

        Ok(Grammar {
            terminals: self.terminals,
            nonterminals: self.nonterminals,
            productions: self.productions,
            start_symbol: start,
        })
    }
}

impl Production {
    fn new(id: ProductionID, left: NonterminalID, right: Vec<SymbolID>) -> Self {
        Self {
            id,
            left,
            right,
            suffix_firsts: vec![],
            suffix_nullables: vec![],
        }
    }
}

fn bump(id: u16) -> Result<u16, GrammarDefError> {
    id.checked_add(1).ok_or(GrammarDefError::TooManySymbols)
}

#[derive(Debug, thiserror::Error)]
pub enum GrammarDefError {
    #[error("incorrect symbol name: `{name}'")]
    InvalidName { name: String },

    #[error("the symbol `{name}' has already been declared")]
    DuplicateName { name: String },

    #[error("duplicate production rule detected for `{left}'")]
    DuplicateProduction { left: String },

    #[error("the symbol {symbol:?} is not declared in this grammar")]
    UnknownSymbol { symbol: SymbolID },

    #[error("the nonterminal `{name}' is used but has no production rule")]
    MissingProductions { name: String },

    #[error("empty nonterminal symbols")]
    NoNonterminals,

    #[error("too many symbols or production rules")]
    TooManySymbols,

    #[error("Other error: {}", msg)]
    Other { msg: String },
}

impl From<&str> for GrammarDefError {
    fn from(msg: &str) -> Self {
        Self::Other { msg: msg.into() }
    }
}

impl From<String> for GrammarDefError {
    fn from(msg: String) -> Self {
        Self::Other { msg }
    }
}

fn verify_ident(mut s: &str) -> bool {
    if s.is_empty() {
        // The identifier must not be empty.
        return false;
    }

    if s.bytes().all(|b| b.is_ascii_digit()) {
        // The number must not be identifer.
        return false;
    }

    if let Some(raw) = s.strip_prefix("r#") {
        if matches!(raw, "crate" | "self" | "super" | "Self") {
            // unexpected raw identifier
            return false;
        }
        s = raw;
    } else if is_strict_keyword(s) || is_reserved(s) {
        // Reserved keyword specified.
        return false;
    }

    let mut chars = s.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    if !is_ident_start(first) {
        // The identifier must be started with XID-Start.
        return false;
    }
    if chars.any(|ch| !is_ident_continue(ch)) {
        // The idenfier must be continued with XID-Continue.
        return false;
    }

    true
}

fn is_ident_start(ch: char) -> bool {
    ch == '_' || unicode_ident::is_xid_start(ch)
}

fn is_ident_continue(ch: char) -> bool {
    unicode_ident::is_xid_continue(ch)
}

fn is_strict_keyword(s: &str) -> bool {
    matches!(
        s,
        "as" | "break" | "const" | "continue" | "crate" | "else" | "enum" | "extern"
        | "false" | "fn" | "for" | "if" | "impl" | "in" | "let" | "loop" | "match" | "mod"
        | "move" | "mut" | "pub" | "ref" | "return" | "self" | "Self" | "static" | "struct"
        | "super" | "trait" | "true" | "type" | "unsafe" | "use" | "where" | "while"
        // since Rust 2018
        | "async" | "await" | "dyn"
    )
}

fn is_reserved(s: &str) -> bool {
    matches!(
        s,
        "abstract" | "become" | "box" | "do" | "final" | "macro" | "override" | "priv"
        | "typeof" | "unsized" | "virtual" | "yield"
        // since Rust 2018
        | "try"
    )
}
