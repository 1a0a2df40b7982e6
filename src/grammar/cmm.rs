//! The grammar of C--.
//!
//! Terminal names match [`TokenKind::terminal`](crate::lexer::token::TokenKind::terminal).

use once_cell::sync::Lazy;

use super::Grammar;

/// The start symbol of C--.
pub const START: &str = "Program";

/// The C-- production rules, in registration order (production ids 1 and up).
pub static RULES: &[(&str, &[&str])] = &[
    ("Program",      &["compUnit"]),
    ("compUnit",     &["compUnit", "element"]),
    ("compUnit",     &["element"]),
    ("element",      &["decl"]),
    ("element",      &["funcDef"]),
    ("decl",         &["constDecl"]),
    ("decl",         &["varDecl"]),
    ("constDecl",    &["const", "bType", "constDefList", ";"]),
    ("constDefList", &["constDefList", ",", "constDef"]),
    ("constDefList", &["constDef"]),
    ("bType",        &["int"]),
    ("bType",        &["float"]),
    ("constDef",     &["Ident", "=", "constInitVal"]),
    ("constInitVal", &["constExp"]),
    ("varDecl",      &["bType", "varDefList", ";"]),
    ("varDefList",   &["varDefList", ",", "varDef"]),
    ("varDefList",   &["varDef"]),
    ("varDef",       &["Ident"]),
    ("varDef",       &["Ident", "=", "initVal"]),
    ("initVal",      &["exp"]),
    ("funcDef",      &["funcType", "Ident", "(", ")", "block"]),
    ("funcDef",      &["bType", "Ident", "(", ")", "block"]),
    ("funcDef",      &["funcType", "Ident", "(", "funcFParams", ")", "block"]),
    ("funcDef",      &["bType", "Ident", "(", "funcFParams", ")", "block"]),
    ("funcType",     &["void"]),
    ("funcFParams",  &["funcFParams", ",", "funcFParam"]),
    ("funcFParams",  &["funcFParam"]),
    ("funcFParam",   &["bType", "Ident"]),
    ("block",        &["{", "blockItemList", "}"]),
    ("block",        &["{", "}"]),
    ("blockItemList",&["blockItemList", "blockItem"]),
    ("blockItemList",&["blockItem"]),
    ("blockItem",    &["decl"]),
    ("blockItem",    &["stmt"]),
    ("stmt",         &["lVal", "=", "exp", ";"]),
    ("stmt",         &["exp", ";"]),
    ("stmt",         &[";"]),
    ("stmt",         &["block"]),
    ("stmt",         &["if", "(", "cond", ")", "stmt", "ElsePart"]),
    ("stmt",         &["while", "(", "cond", ")", "stmt"]),
    ("stmt",         &["break", ";"]),
    ("stmt",         &["continue", ";"]),
    ("stmt",         &["return", "exp", ";"]),
    ("stmt",         &["return", ";"]),
    ("ElsePart",     &["else", "stmt"]),
    ("ElsePart",     &[]),
    ("lVal",         &["Ident"]),
    ("exp",          &["lOrExp"]),
    ("cond",         &["lOrExp"]),
    ("lOrExp",       &["lAndExp"]),
    ("lOrExp",       &["lOrExp", "||", "lAndExp"]),
    ("lAndExp",      &["eqExp"]),
    ("lAndExp",      &["lAndExp", "&&", "eqExp"]),
    ("eqExp",        &["relExp"]),
    ("eqExp",        &["eqExp", "==", "relExp"]),
    ("eqExp",        &["eqExp", "!=", "relExp"]),
    ("relExp",       &["addExp"]),
    ("relExp",       &["relExp", "<", "addExp"]),
    ("relExp",       &["relExp", ">", "addExp"]),
    ("relExp",       &["relExp", "<=", "addExp"]),
    ("relExp",       &["relExp", ">=", "addExp"]),
    ("addExp",       &["mulExp"]),
    ("addExp",       &["addExp", "+", "mulExp"]),
    ("addExp",       &["addExp", "-", "mulExp"]),
    ("mulExp",       &["unaryExp"]),
    ("mulExp",       &["mulExp", "*", "unaryExp"]),
    ("mulExp",       &["mulExp", "/", "unaryExp"]),
    ("mulExp",       &["mulExp", "%", "unaryExp"]),
    ("unaryExp",     &["primaryExp"]),
    ("unaryExp",     &["unaryOp", "unaryExp"]),
    ("unaryExp",     &["Ident", "(", ")"]),
    ("unaryExp",     &["Ident", "(", "funcRParams", ")"]),
    ("primaryExp",   &["(", "exp", ")"]),
    ("primaryExp",   &["lVal"]),
    ("primaryExp",   &["number"]),
    ("number",       &["IntConst"]),
    ("number",       &["floatConst"]),
    ("unaryOp",      &["+"]),
    ("unaryOp",      &["-"]),
    ("unaryOp",      &["!"]),
    ("funcRParams",  &["exp", ",", "funcRParams"]),
    ("funcRParams",  &["exp"]),
    ("constExp",     &["addExp"]),
];

/// The C-- grammar, built on first use.
pub static GRAMMAR: Lazy<Grammar> = Lazy::new(|| Grammar::new(START, RULES));

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::Symbol;
    use crate::lexer::token::TokenKind;

    #[test]
    fn shape() {
        let g = &*GRAMMAR;
        assert_eq!(g.productions().len(), RULES.len() + 1);
        assert_eq!(g.start(), Symbol::nt("Program"));

        let eps: Vec<_> = g.productions().iter()
            .filter(|p| p.is_epsilon())
            .map(|p| p.left.name())
            .collect();
        assert_eq!(eps, vec!["ElsePart"]);
    }

    /// Every terminal of the grammar is produced by some token kind.
    #[test]
    fn terminals_are_tokens() {
        let kinds = [
            TokenKind::Int, TokenKind::Void, TokenKind::Return, TokenKind::Const, TokenKind::Float,
            TokenKind::If, TokenKind::Else, TokenKind::While, TokenKind::Break, TokenKind::Continue,
            TokenKind::Plus, TokenKind::Minus, TokenKind::Star, TokenKind::Slash, TokenKind::Percent,
            TokenKind::Assign, TokenKind::Gt, TokenKind::Lt, TokenKind::Eq, TokenKind::Le,
            TokenKind::Ge, TokenKind::Ne, TokenKind::And, TokenKind::Or, TokenKind::Not,
            TokenKind::LParen, TokenKind::RParen, TokenKind::LBrace, TokenKind::RBrace,
            TokenKind::Semi, TokenKind::Comma, TokenKind::Ident, TokenKind::IntConst,
            TokenKind::FloatConst, TokenKind::Eof
        ];
        let names: Vec<_> = kinds.iter().filter_map(|k| k.terminal()).collect();

        for t in GRAMMAR.terminals() {
            assert!(names.contains(&t.name()), "terminal {t} has no token");
        }
        assert_eq!(GRAMMAR.terminals().len(), names.len());
    }
}
