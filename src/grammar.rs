//! Context-free grammars, as consumed by the SLR(1) table builder.
//!
//! A [`Grammar`] is built from a list of rules (see [`Grammar::new`]),
//! and is immutable afterwards. The grammar for C-- is in [`cmm`].

use std::fmt::Display;

use indexmap::{IndexMap, IndexSet};

pub mod cmm;

/// A grammar symbol.
///
/// Symbols are identified by their name and whether they are terminals.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct Symbol {
    name: &'static str,
    terminal: bool
}

impl Symbol {
    /// The empty string, ε.
    ///
    /// It only appears in FIRST sets and as the sole right-hand side of a nullable production.
    pub const EPSILON: Symbol = Symbol::t("ε");

    /// The end-of-input marker, `$`.
    pub const END: Symbol = Symbol::t("$");

    /// A terminal symbol.
    pub const fn t(name: &'static str) -> Self {
        Symbol { name, terminal: true }
    }

    /// A non-terminal symbol.
    pub const fn nt(name: &'static str) -> Self {
        Symbol { name, terminal: false }
    }

    /// The name of this symbol.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Whether this symbol is a terminal.
    pub fn is_terminal(&self) -> bool {
        self.terminal
    }

    /// Whether this symbol is ε.
    pub fn is_epsilon(&self) -> bool {
        *self == Self::EPSILON
    }
}

impl Display for Symbol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name)
    }
}

/// A production rule, `left → right`.
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub struct Production {
    /// The index of this production in its grammar
    pub id: usize,
    /// The non-terminal being produced
    pub left: Symbol,
    /// The symbols it is produced from (exactly `[ε]` for a nullable production)
    pub right: Vec<Symbol>
}

impl Production {
    /// Whether this is a production of ε.
    pub fn is_epsilon(&self) -> bool {
        matches!(&*self.right, [s] if s.is_epsilon())
    }

    /// The number of symbols popped when reducing this production.
    pub fn len(&self) -> usize {
        if self.is_epsilon() { 0 } else { self.right.len() }
    }

    /// Whether reducing this production pops nothing.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The names of the right-hand side symbols (empty for a nullable production).
    pub fn rhs_names(&self) -> Vec<&'static str> {
        match self.is_epsilon() {
            true  => vec![],
            false => self.right.iter().map(Symbol::name).collect(),
        }
    }
}

impl Display for Production {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ->", self.left)?;
        for s in &self.right {
            write!(f, " {s}")?;
        }
        Ok(())
    }
}

/// A context-free grammar, augmented with a fresh start rule.
#[derive(Debug)]
pub struct Grammar {
    productions: Vec<Production>,
    by_left: IndexMap<Symbol, Vec<usize>>,
    terminals: IndexSet<Symbol>,
    nonterminals: IndexSet<Symbol>,
    start: Symbol
}

impl Grammar {
    /// The left-hand side of the augmented start rule, `S' → start`.
    pub const AUGMENTED_START: Symbol = Symbol::nt("S'");

    /// Creates a grammar from a start symbol and a list of rules.
    ///
    /// Each rule is a left-hand side name and a right-hand side of names.
    /// An empty right-hand side (or `["ε"]`) is a nullable production.
    ///
    /// Names that appear on a left-hand side are non-terminals, and all other names are terminals.
    /// Production 0 is always `S' → start`, and the rules follow in order from id 1.
    ///
    /// # Example
    /// ```
    /// use cmmc::grammar::{Grammar, Symbol};
    ///
    /// let g = Grammar::new("E", &[
    ///     ("E", &["E", "+", "T"]),
    ///     ("E", &["T"]),
    ///     ("T", &["id"]),
    /// ]);
    ///
    /// assert_eq!(g.productions().len(), 4);
    /// assert_eq!(g.production(0).right, vec![Symbol::nt("E")]);
    /// assert!(g.terminals().contains(&Symbol::t("+")));
    /// ```
    pub fn new(start: &'static str, rules: &[(&'static str, &[&'static str])]) -> Self {
        let lhs: IndexSet<&str> = rules.iter().map(|&(l, _)| l).collect();
        let symbol = |name: &'static str| match lhs.contains(name) {
            true  => Symbol::nt(name),
            false => Symbol::t(name),
        };

        let start = Symbol::nt(start);
        let mut productions = vec![Production {
            id: 0,
            left: Self::AUGMENTED_START,
            right: vec![start]
        }];

        for &(left, right) in rules {
            let right = match right {
                [] => vec![Symbol::EPSILON],
                r  => r.iter().map(|&n| symbol(n)).collect(),
            };

            productions.push(Production { id: productions.len(), left: Symbol::nt(left), right });
        }

        let mut by_left: IndexMap<_, Vec<_>> = IndexMap::new();
        let mut terminals = IndexSet::new();
        let mut nonterminals = IndexSet::new();
        for p in &productions {
            by_left.entry(p.left).or_default().push(p.id);
            nonterminals.insert(p.left);
        }
        for p in &productions {
            terminals.extend(p.right.iter().filter(|s| s.is_terminal() && !s.is_epsilon()));
        }
        terminals.insert(Symbol::END);

        Grammar { productions, by_left, terminals, nonterminals, start }
    }

    /// All productions, indexed by id.
    pub fn productions(&self) -> &[Production] {
        &self.productions
    }

    /// The production with the given id.
    pub fn production(&self, id: usize) -> &Production {
        &self.productions[id]
    }

    /// The productions with the given non-terminal on the left, in registration order.
    pub fn productions_of(&self, left: Symbol) -> impl Iterator<Item=&Production> {
        self.by_left.get(&left)
            .into_iter()
            .flatten()
            .map(|&i| &self.productions[i])
    }

    /// The terminals of the grammar (including `$`), in order of first appearance.
    pub fn terminals(&self) -> &IndexSet<Symbol> {
        &self.terminals
    }

    /// The non-terminals of the grammar (including `S'`), in order of first appearance.
    pub fn nonterminals(&self) -> &IndexSet<Symbol> {
        &self.nonterminals
    }

    /// The start symbol (not the augmented one).
    pub fn start(&self) -> Symbol {
        self.start
    }

    /// Finds the terminal with the given name.
    pub fn terminal(&self, name: &str) -> Option<Symbol> {
        self.terminals.iter().find(|s| s.name() == name).copied()
    }
}

impl Display for Grammar {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for p in &self.productions {
            writeln!(f, "{:>3}: {p}", p.id)?;
        }
        Ok(())
    }
}
