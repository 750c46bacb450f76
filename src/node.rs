//! Search-tree records.
//!
//! A `Node` pairs a board with where it came from. Nodes are created once and
//! never modified; children hold a shared `Rc` to their parent, so a goal node
//! keeps its whole path alive while abandoned branches are freed as soon as the
//! frontier lets go of them.
use crate::engine::{Board, Operator};
use std::fmt;
use std::rc::Rc;

#[derive(Debug)]
pub struct Node {
    state: Board,
    parent: Option<Rc<Node>>,
    operator: Option<Operator>,
    depth: u32,
    path_cost: u32,
}

impl Node {
    /// The start of a search: depth 0, cost 0, no parent and no operator.
    pub fn root(state: Board) -> Rc<Self> {
        Rc::new(Node {
            state,
            parent: None,
            operator: None,
            depth: 0,
            path_cost: 0,
        })
    }

    /// A node reached from `parent` by `operator`, which produced `state` at `step_cost`.
    pub fn child(parent: &Rc<Node>, operator: Operator, state: Board, step_cost: u32) -> Rc<Self> {
        Rc::new(Node {
            state,
            parent: Some(Rc::clone(parent)),
            operator: Some(operator),
            depth: parent.depth + 1,
            path_cost: parent.path_cost + step_cost,
        })
    }

    pub fn state(&self) -> &Board {
        &self.state
    }

    pub fn parent(&self) -> Option<&Rc<Node>> {
        self.parent.as_ref()
    }

    pub fn operator(&self) -> Option<Operator> {
        self.operator
    }

    pub fn depth(&self) -> u32 {
        self.depth
    }

    pub fn path_cost(&self) -> u32 {
        self.path_cost
    }

    pub fn is_goal(&self) -> bool {
        self.state.is_solved()
    }

    /// Walks the parent chain, nearest ancestor first. The node itself is not included.
    pub fn ancestors(&self) -> Ancestors<'_> {
        Ancestors {
            next: self.parent.as_deref(),
        }
    }

    /// Returns `true` if some ancestor holds a board structurally equal to this one.
    ///
    /// Only the node's own ancestry is checked; the same board reached along a
    /// different branch is not detected.
    pub fn repeats_ancestor_state(&self) -> bool {
        self.ancestors().any(|ancestor| ancestor.state == self.state)
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}\n\nDepth: {}\n\nCost: {}\n\nOperator: ",
            self.state, self.depth, self.path_cost
        )?;
        match self.operator {
            Some(op) => write!(f, "{}", op),
            None => write!(f, "none"),
        }
    }
}

pub struct Ancestors<'a> {
    next: Option<&'a Node>,
}

impl<'a> Iterator for Ancestors<'a> {
    type Item = &'a Node;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.next?;
        self.next = node.parent.as_deref();
        Some(node)
    }
}

/// Returns the nodes from the root down to `goal`, root first.
pub fn path_of(goal: &Rc<Node>) -> Vec<Rc<Node>> {
    let mut path = vec![Rc::clone(goal)];
    let mut current = goal.parent.clone();
    while let Some(node) = current {
        current = node.parent.clone();
        path.push(node);
    }
    path.reverse();
    path
}
