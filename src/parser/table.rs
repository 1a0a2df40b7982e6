//! Construction of SLR(1) parse tables.
//!
//! This module provides:
//! - [`Item`], [`closure`], [`goto`]: LR(0) items and the operations over item sets.
//! - [`Automaton`]: The canonical collection of LR(0) item sets and the transitions between them.
//! - [`ParseTable`]: The ACTION and GOTO tables, filled in from the automaton and FOLLOW sets.
//!
//! Conflicts are resolved while filling:
//! a shift always wins over a reduce, and between two reduces the first one filled in is kept.

use std::collections::BTreeSet;
use std::fmt::Display;

use indexmap::{IndexMap, IndexSet};

use crate::grammar::{Grammar, Symbol};

use super::sets::Sets;

/// An LR(0) item: a production with a dot somewhere in its right-hand side.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct Item {
    /// The production id
    pub prod: usize,
    /// How many symbols of the right-hand side are before the dot
    pub dot: usize
}

impl Item {
    /// An item with the dot at the start of a production.
    pub fn start(prod: usize) -> Self {
        Item { prod, dot: 0 }
    }

    /// The symbol after the dot.
    ///
    /// None if the dot is at the end, or if the production is a production of ε
    /// (such items are ready to reduce).
    pub fn next_symbol(&self, g: &Grammar) -> Option<Symbol> {
        let p = g.production(self.prod);
        match p.is_epsilon() {
            true  => None,
            false => p.right.get(self.dot).copied(),
        }
    }

    /// This item with the dot moved over one symbol.
    pub fn advance(&self) -> Self {
        Item { prod: self.prod, dot: self.dot + 1 }
    }

    /// Whether this item is ready to reduce.
    pub fn is_complete(&self, g: &Grammar) -> bool {
        self.next_symbol(g).is_none()
    }

    /// Displays this item, given its grammar.
    pub fn display<'g>(&self, g: &'g Grammar) -> ItemDisplay<'g> {
        ItemDisplay { item: *self, grammar: g }
    }
}

/// Display of an [`Item`], in the form `A -> α . β`.
pub struct ItemDisplay<'g> {
    item: Item,
    grammar: &'g Grammar
}

impl Display for ItemDisplay<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let p = self.grammar.production(self.item.prod);
        write!(f, "{} ->", p.left)?;

        let rhs = p.rhs_names();
        for (i, s) in rhs.iter().enumerate() {
            if i == self.item.dot { f.write_str(" .")?; }
            write!(f, " {s}")?;
        }
        if self.item.dot >= rhs.len() { f.write_str(" .")?; }
        Ok(())
    }
}

/// A set of LR(0) items.
pub type ItemSet = BTreeSet<Item>;

/// Closes an item set.
///
/// For every item `A → α·Bβ` with non-terminal `B`, the items `B → ·γ` are added,
/// until nothing more can be added.
pub fn closure(g: &Grammar, items: ItemSet) -> ItemSet {
    let mut set = items;
    let mut stack: Vec<_> = set.iter().copied().collect();

    while let Some(item) = stack.pop() {
        let Some(b) = item.next_symbol(g) else { continue };
        if b.is_terminal() { continue; }

        for p in g.productions_of(b) {
            let new = Item::start(p.id);
            if set.insert(new) {
                stack.push(new);
            }
        }
    }

    set
}

/// The closure of the items of `items` with the dot moved over `x`.
///
/// Empty if no item has `x` after its dot.
pub fn goto(g: &Grammar, items: &ItemSet, x: Symbol) -> ItemSet {
    let kernel = items.iter()
        .filter(|it| it.next_symbol(g) == Some(x))
        .map(Item::advance)
        .collect();

    closure(g, kernel)
}

/// The canonical collection of LR(0) item sets of a grammar.
#[derive(Debug)]
pub struct Automaton {
    /// The states, in order of discovery (the index is the state id)
    pub states: IndexSet<ItemSet>,
    /// The transitions, (state, symbol) → state
    pub transitions: IndexMap<(usize, Symbol), usize>
}

impl Automaton {
    /// Builds the canonical collection.
    ///
    /// State 0 is the closure of `S' → ·start`. States are processed in order of discovery,
    /// and each distinct item set gets the next sequential id.
    pub fn build(g: &Grammar) -> Self {
        let mut states = IndexSet::new();
        let mut transitions = IndexMap::new();
        states.insert(closure(g, ItemSet::from([Item::start(0)])));

        let mut i = 0;
        while let Some(state) = states.get_index(i).cloned() {
            let symbols: IndexSet<_> = state.iter()
                .filter_map(|it| it.next_symbol(g))
                .collect();

            for x in symbols {
                let target = goto(g, &state, x);
                if target.is_empty() { continue; }

                let (j, _) = states.insert_full(target);
                transitions.insert((i, x), j);
            }

            i += 1;
        }

        Automaton { states, transitions }
    }

    /// The state reached from `state` over `x`.
    pub fn transition(&self, state: usize, x: Symbol) -> Option<usize> {
        self.transitions.get(&(state, x)).copied()
    }
}

/// An entry of the ACTION table.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Action {
    /// Push the lookahead and go to the given state
    Shift(usize),
    /// Reduce by the production with the given id
    Reduce(usize),
    /// The input was accepted
    Accept
}

impl Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Action::Shift(s)  => write!(f, "s{s}"),
            Action::Reduce(p) => write!(f, "r{p}"),
            Action::Accept    => write!(f, "acc"),
        }
    }
}

/// A conflict found (and resolved) while filling the ACTION table.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Conflict {
    /// The state of the conflicting cell
    pub state: usize,
    /// The terminal of the conflicting cell
    pub terminal: Symbol,
    /// The action that stayed in the cell
    pub kept: Action,
    /// The action that was discarded
    pub dropped: Action
}

impl Conflict {
    /// Whether this is a conflict between two reduces.
    pub fn is_reduce_reduce(&self) -> bool {
        matches!((self.kept, self.dropped), (Action::Reduce(_), Action::Reduce(_)))
    }
}

impl Display for Conflict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let kind = match self.is_reduce_reduce() {
            true  => "reduce/reduce",
            false => "shift/reduce",
        };
        write!(f, "{kind} conflict in state {} on {}: kept {}, dropped {}",
            self.state, self.terminal, self.kept, self.dropped)
    }
}

/// The SLR(1) ACTION and GOTO tables.
#[derive(Debug)]
pub struct ParseTable {
    action: IndexMap<(usize, Symbol), Action>,
    goto: IndexMap<(usize, Symbol), usize>,
    conflicts: Vec<Conflict>,
    state_count: usize
}

impl ParseTable {
    /// Builds the tables of a grammar from its automaton and FOLLOW sets.
    ///
    /// - Shift on every terminal after a dot.
    /// - Accept on `$` for `S' → start ·`.
    /// - Reduce `A → α` on every terminal of FOLLOW(A) for a complete item.
    pub fn build(g: &Grammar, automaton: &Automaton, sets: &Sets) -> Self {
        let mut table = ParseTable {
            action: IndexMap::new(),
            goto: IndexMap::new(),
            conflicts: vec![],
            state_count: automaton.states.len()
        };

        for (i, state) in automaton.states.iter().enumerate() {
            for item in state {
                match item.next_symbol(g) {
                    Some(x) if x.is_terminal() => {
                        if let Some(j) = automaton.transition(i, x) {
                            table.set_action(i, x, Action::Shift(j));
                        }
                    },
                    Some(_) => {},
                    None if item.prod == 0 => table.set_action(i, Symbol::END, Action::Accept),
                    None => {
                        let left = g.production(item.prod).left;
                        for t in sets.follow(left) {
                            table.set_action(i, t, Action::Reduce(item.prod));
                        }
                    }
                }
            }
        }

        for (&(i, x), &j) in &automaton.transitions {
            if !x.is_terminal() {
                table.goto.insert((i, x), j);
            }
        }

        log::debug!("built SLR(1) table: {} states, {} conflicts", table.state_count, table.conflicts.len());
        table
    }

    /// Convenience to build the tables directly from a grammar.
    pub fn from_grammar(g: &Grammar) -> Self {
        let sets = Sets::compute(g);
        let automaton = Automaton::build(g);
        Self::build(g, &automaton, &sets)
    }

    fn set_action(&mut self, state: usize, terminal: Symbol, new: Action) {
        let Some(&old) = self.action.get(&(state, terminal)) else {
            self.action.insert((state, terminal), new);
            return;
        };
        if old == new { return; }

        let (kept, dropped) = match (old, new) {
            (Action::Reduce(_), Action::Shift(_) | Action::Accept) => (new, old),
            _ => (old, new),
        };
        let conflict = Conflict { state, terminal, kept, dropped };

        if conflict.is_reduce_reduce() {
            log::warn!("{conflict}");
        } else {
            log::debug!("{conflict}");
        }

        self.action.insert((state, terminal), kept);
        self.conflicts.push(conflict);
    }

    /// ACTION[state, terminal]. None is an error entry.
    pub fn action(&self, state: usize, terminal: Symbol) -> Option<Action> {
        self.action.get(&(state, terminal)).copied()
    }

    /// GOTO[state, non-terminal].
    pub fn goto(&self, state: usize, nonterminal: Symbol) -> Option<usize> {
        self.goto.get(&(state, nonterminal)).copied()
    }

    /// The terminals with a non-error entry in the given state, in table order.
    pub fn expected(&self, state: usize) -> Vec<Symbol> {
        self.action.keys()
            .filter(|(s, _)| *s == state)
            .map(|&(_, t)| t)
            .collect()
    }

    /// The conflicts that were resolved while building.
    pub fn conflicts(&self) -> &[Conflict] {
        &self.conflicts
    }

    /// The number of states.
    pub fn state_count(&self) -> usize {
        self.state_count
    }

    /// All ACTION entries.
    pub fn actions(&self) -> impl Iterator<Item=(usize, Symbol, Action)> + '_ {
        self.action.iter().map(|(&(s, t), &a)| (s, t, a))
    }

    /// All GOTO entries.
    pub fn gotos(&self) -> impl Iterator<Item=(usize, Symbol, usize)> + '_ {
        self.goto.iter().map(|(&(s, x), &j)| (s, x, j))
    }
}
