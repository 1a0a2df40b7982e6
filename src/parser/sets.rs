//! FIRST and FOLLOW sets of a grammar.
//!
//! Both are computed by iterating to a fixed point:
//! sets only ever grow, and they are bounded by the terminals of the grammar.

use std::collections::BTreeSet;
use std::fmt::Display;

use indexmap::IndexMap;

use crate::grammar::{Grammar, Symbol};

/// A map from a symbol to its FIRST or FOLLOW set.
pub type SymbolSets = IndexMap<Symbol, BTreeSet<Symbol>>;

/// The FIRST and FOLLOW sets of a grammar.
#[derive(PartialEq, Eq, Debug, Clone)]
pub struct Sets {
    first: SymbolSets,
    follow: SymbolSets
}

impl Sets {
    /// Computes the FIRST and FOLLOW sets of a grammar.
    pub fn compute(g: &Grammar) -> Self {
        let first = first_sets(g);
        let follow = follow_sets(g, &first);
        Sets { first, follow }
    }

    /// All FIRST sets (of terminals, ε, and non-terminals).
    pub fn first_sets(&self) -> &SymbolSets {
        &self.first
    }

    /// All FOLLOW sets (of non-terminals).
    pub fn follow_sets(&self) -> &SymbolSets {
        &self.follow
    }

    /// FIRST(symbol).
    pub fn first(&self, s: Symbol) -> BTreeSet<Symbol> {
        first_of(&self.first, s)
    }

    /// FIRST of a sequence of symbols.
    pub fn first_of_seq(&self, seq: &[Symbol]) -> BTreeSet<Symbol> {
        first_of_seq(&self.first, seq)
    }

    /// FOLLOW(symbol). Empty for terminals.
    pub fn follow(&self, s: Symbol) -> BTreeSet<Symbol> {
        self.follow.get(&s).cloned().unwrap_or_default()
    }

    /// Whether the symbol can derive ε.
    pub fn nullable(&self, s: Symbol) -> bool {
        self.first(s).contains(&Symbol::EPSILON)
    }
}

fn first_of(first: &SymbolSets, s: Symbol) -> BTreeSet<Symbol> {
    match first.get(&s) {
        Some(set) => set.clone(),
        None if s.is_terminal() => BTreeSet::from([s]),
        None => BTreeSet::new(),
    }
}

/// FIRST of a sequence `Y1 Y2 ... Yk`.
///
/// Accumulates FIRST(Yi) - {ε} from the left, stopping at the first non-nullable Yi.
/// If every Yi is nullable (or the sequence is empty or exactly `[ε]`), ε is included.
pub fn first_of_seq(first: &SymbolSets, seq: &[Symbol]) -> BTreeSet<Symbol> {
    let mut out = BTreeSet::new();

    for &y in seq {
        let fy = first_of(first, y);
        let nullable = fy.contains(&Symbol::EPSILON);
        out.extend(fy.into_iter().filter(|s| !s.is_epsilon()));

        if !nullable {
            return out;
        }
    }

    out.insert(Symbol::EPSILON);
    out
}

/// Computes FIRST for every terminal, ε, and non-terminal of the grammar.
pub fn first_sets(g: &Grammar) -> SymbolSets {
    let mut first = SymbolSets::new();

    for &t in g.terminals() {
        first.insert(t, BTreeSet::from([t]));
    }
    first.insert(Symbol::EPSILON, BTreeSet::from([Symbol::EPSILON]));
    for &nt in g.nonterminals() {
        first.insert(nt, BTreeSet::new());
    }

    let mut changed = true;
    while changed {
        changed = false;

        for p in g.productions() {
            let add = first_of_seq(&first, &p.right);
            let set = first.entry(p.left).or_default();
            let before = set.len();
            set.extend(add);
            changed |= set.len() != before;
        }
    }

    first
}

/// Computes FOLLOW for every non-terminal of the grammar.
///
/// `$` is in FOLLOW of both the augmented and the user start symbol.
pub fn follow_sets(g: &Grammar, first: &SymbolSets) -> SymbolSets {
    let mut follow = SymbolSets::new();
    for &nt in g.nonterminals() {
        follow.insert(nt, BTreeSet::new());
    }
    follow.entry(Grammar::AUGMENTED_START).or_default().insert(Symbol::END);
    follow.entry(g.start()).or_default().insert(Symbol::END);

    let mut changed = true;
    while changed {
        changed = false;

        for p in g.productions().iter().filter(|p| !p.is_epsilon()) {
            for (i, &b) in p.right.iter().enumerate() {
                if b.is_terminal() { continue; }

                let beta = &p.right[i + 1..];
                let fb = first_of_seq(first, beta);

                let mut add: BTreeSet<_> = fb.iter()
                    .filter(|s| !s.is_epsilon())
                    .copied()
                    .collect();
                if fb.contains(&Symbol::EPSILON) {
                    add.extend(follow.get(&p.left).into_iter().flatten().copied());
                }

                let set = follow.entry(b).or_default();
                let before = set.len();
                set.extend(add);
                changed |= set.len() != before;
            }
        }
    }

    follow
}

impl Display for Sets {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        fn fmt_set(set: &BTreeSet<Symbol>) -> String {
            set.iter().map(Symbol::name).collect::<Vec<_>>().join(" ")
        }

        for (s, set) in self.first.iter().filter(|(s, _)| !s.is_terminal()) {
            writeln!(f, "FIRST({s}) = {{ {} }}", fmt_set(set))?;
        }
        for (s, set) in &self.follow {
            writeln!(f, "FOLLOW({s}) = {{ {} }}", fmt_set(set))?;
        }
        Ok(())
    }
}
