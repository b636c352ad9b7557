//! Grammar definition for integration tests.

use lalrgen::grammar::{GrammarDef, GrammarDefError, SymbolID::*};

type Result = std::result::Result<(), GrammarDefError>;

pub fn g_simple1(g: &mut GrammarDef<'_>) -> Result {
    let equal = g.terminal("EQUAL")?;
    let plus = g.terminal("PLUS")?;
    let ident = g.terminal("ID")?;
    let num = g.terminal("NUM")?;

    let a = g.nonterminal("A")?;
    let e = g.nonterminal("E")?;
    let t = g.nonterminal("T")?;

    g.start_symbol(a)?;

    g.rule(a, [N(e), T(equal), N(e)])?;
    g.rule(a, [T(ident)])?;
    g.rule(e, [N(e), T(plus), N(t)])?;
    g.rule(e, [N(t)])?;
    g.rule(t, [T(num)])?;
    g.rule(t, [T(ident)])?;
    Ok(())
}

pub fn g_simple2(g: &mut GrammarDef<'_>) -> Result {
    // declare terminal symbols.
    let lparen = g.terminal("LPAREN")?;
    let rparen = g.terminal("RPAREN")?;
    let plus = g.terminal("PLUS")?;
    let minus = g.terminal("MINUS")?;
    let star = g.terminal("STAR")?;
    let slash = g.terminal("SLASH")?;
    let num = g.terminal("NUM")?;

    // declare nonterminal symbols.
    let expr = g.nonterminal("EXPR")?;
    let factor = g.nonterminal("FACTOR")?;
    let term = g.nonterminal("TERM")?;

    g.start_symbol(expr)?;

    // declare syntax rules.
    g.rule(expr, [N(expr), T(plus), N(factor)])?; // expr '+' factor
    g.rule(expr, [N(expr), T(minus), N(factor)])?; // expr '-' factor
    g.rule(expr, [N(factor)])?; // factor
    g.rule(factor, [N(factor), T(star), N(term)])?; // factor '*' term
    g.rule(factor, [N(factor), T(slash), N(term)])?; // factor '/' term
    g.rule(factor, [N(term)])?; // term
    g.rule(term, [T(num)])?; // num
    g.rule(term, [T(lparen), N(expr), T(rparen)])?; // '(' expr ')'
    Ok(())
}

pub fn g1(g: &mut GrammarDef<'_>) -> Result {
    let plus = g.terminal("PLUS")?;
    let star = g.terminal("STAR")?;
    let a = g.terminal("A")?;

    let e = g.nonterminal("E")?;
    let t = g.nonterminal("T")?;

    g.rule(e, [N(e), T(plus), N(t)])?;
    g.rule(e, [N(t)])?;
    g.rule(t, [N(t), T(star), T(a)])?;
    g.rule(t, [T(a)])?;
    Ok(())
}

/// The grammar is LR(1), but merging the states by their cores mixes the
/// lookaheads of `TYPE -> ID` and `NAME -> ID`.
pub fn g2(g: &mut GrammarDef<'_>) -> Result {
    let comma = g.terminal("COMMA")?;
    let colon = g.terminal("COLON")?;
    let ident = g.terminal("ID")?;

    let def = g.nonterminal("DEF")?;
    let param_spec = g.nonterminal("PARAM_SPEC")?;
    let return_spec = g.nonterminal("RETURN_SPEC")?;
    let type_ = g.nonterminal("TYPE")?;
    let name = g.nonterminal("NAME")?;
    let name_list = g.nonterminal("NAME_LIST")?;

    g.rule(def, [N(param_spec), N(return_spec), T(comma)])?;
    g.rule(param_spec, [N(type_)])?;
    g.rule(param_spec, [N(name_list), T(colon), N(type_)])?;
    g.rule(return_spec, [N(type_)])?;
    g.rule(return_spec, [N(name), T(colon), N(type_)])?;
    g.rule(type_, [T(ident)])?;
    g.rule(name, [T(ident)])?;
    g.rule(name_list, [N(name)])?;
    g.rule(name_list, [N(name), T(comma), N(name_list)])?;
    Ok(())
}

pub fn g4(g: &mut GrammarDef<'_>) -> Result {
    let plus = g.terminal("PLUS")?;
    let lparen = g.terminal("LPAREN")?;
    let rparen = g.terminal("RPAREN")?;
    let num = g.terminal("NUM")?;

    let e = g.nonterminal("E")?;
    let t = g.nonterminal("T")?;
    // E → E + T | T
    // T → ( E ) | n

    g.rule(e, [N(e), T(plus), N(t)])?;
    g.rule(e, [N(t)])?;
    g.rule(t, [T(lparen), N(e), T(rparen)])?;
    g.rule(t, [T(num)])?;
    Ok(())
}

/// S → L = R | R ; L → * R | id ; R → L
pub fn pointer(g: &mut GrammarDef<'_>) -> Result {
    let equal = g.terminal("EQUAL")?;
    let star = g.terminal("STAR")?;
    let ident = g.terminal("ID")?;

    let s = g.nonterminal("S")?;
    let l = g.nonterminal("L")?;
    let r = g.nonterminal("R")?;

    g.rule(s, [N(l), T(equal), N(r)])?;
    g.rule(s, [N(r)])?;
    g.rule(l, [T(star), N(r)])?;
    g.rule(l, [T(ident)])?;
    g.rule(r, [N(l)])?;
    Ok(())
}

/// Statement lists with optional parts, where most lookaheads are inherited
/// through nullable suffixes.
pub fn stmts(g: &mut GrammarDef<'_>) -> Result {
    let semi = g.terminal("SEMI")?;
    let ident = g.terminal("ID")?;
    let equal = g.terminal("EQUAL")?;
    let t_let = g.terminal("LET")?;
    let t_mut = g.terminal("MUT")?;
    let lbrace = g.terminal("LBRACE")?;
    let rbrace = g.terminal("RBRACE")?;

    let block = g.nonterminal("BLOCK")?;
    let stmts = g.nonterminal("STMTS")?;
    let stmt = g.nonterminal("STMT")?;
    let mutability = g.nonterminal("MUTABILITY")?;
    let init = g.nonterminal("INIT")?;
    let semi_opt = g.nonterminal("SEMI_OPT")?;

    g.start_symbol(stmts)?;

    g.rule(stmts, [])?;
    g.rule(stmts, [N(stmts), N(stmt), N(semi_opt)])?;
    g.rule(stmt, [T(t_let), N(mutability), T(ident), N(init)])?;
    g.rule(stmt, [N(block)])?;
    g.rule(stmt, [T(ident)])?;
    g.rule(block, [T(lbrace), N(stmts), T(rbrace)])?;
    g.rule(mutability, [])?;
    g.rule(mutability, [T(t_mut)])?;
    g.rule(init, [])?;
    g.rule(init, [T(equal), T(ident)])?;
    g.rule(semi_opt, [])?;
    g.rule(semi_opt, [T(semi)])?;
    Ok(())
}
