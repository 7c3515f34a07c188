//! Variable dependency graph.
//!
//! Nodes are the variables of a schema, inserted in declaration order so that a
//! node's index doubles as its declaration position. An edge `A → B` means
//! `A` references `B`, so `B` must be generated first.

use petgraph::Direction;
use petgraph::graph::{DiGraph, NodeIndex};
use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap, HashSet};

use crate::core::EnvgenError;
use crate::schema::EnvSchema;
use crate::templating::references;

/// Color for DFS-based cycle detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Color {
    /// Node has not been visited.
    White,
    /// Node is currently being visited (in the DFS stack).
    Gray,
    /// Node has been fully visited.
    Black,
}

/// Dependency graph over schema variables.
#[derive(Debug, Default)]
pub struct DependencyGraph {
    /// The underlying directed graph.
    graph: DiGraph<String, ()>,
    /// Map from variable names to their graph indices.
    node_map: HashMap<String, NodeIndex>,
}

impl DependencyGraph {
    /// Create a new empty dependency graph.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the graph for every variable of `schema`.
    ///
    /// Each template-bearing field of each rule is scanned for references to
    /// declared variables; undeclared names are not edges.
    #[must_use]
    pub fn from_schema(schema: &EnvSchema) -> Self {
        let mut graph = Self::new();
        let known: HashSet<String> = schema.variables.keys().cloned().collect();

        for name in schema.variables.keys() {
            graph.ensure_node(name);
        }

        for (name, var) in &schema.variables {
            for field in var.generation.template_fields() {
                for referenced in references(field, &known) {
                    graph.add_dependency(name, &referenced);
                }
            }
        }

        graph
    }

    /// Add a node if it doesn't already exist and return its index.
    pub fn ensure_node(&mut self, name: &str) -> NodeIndex {
        if let Some(&index) = self.node_map.get(name) {
            index
        } else {
            let index = self.graph.add_node(name.to_string());
            self.node_map.insert(name.to_string(), index);
            index
        }
    }

    /// Record that `from` references `to`.
    pub fn add_dependency(&mut self, from: &str, to: &str) {
        let from_idx = self.ensure_node(from);
        let to_idx = self.ensure_node(to);

        if !self.graph.contains_edge(from_idx, to_idx) {
            self.graph.add_edge(from_idx, to_idx, ());
        }
    }

    /// Generation order: every variable after all variables it references.
    ///
    /// Kahn's algorithm, where the ready set is a min-heap keyed by insertion
    /// index. Among variables whose dependencies are all satisfied, the one
    /// declared first is always emitted first, so the order is reproducible.
    ///
    /// # Errors
    ///
    /// Returns [`EnvgenError::CircularDependency`] if any variables remain after
    /// the sort; the reported chain is one concrete cycle among them.
    pub fn generation_order(&self) -> Result<Vec<String>, EnvgenError> {
        let mut remaining: Vec<usize> = self
            .graph
            .node_indices()
            .map(|idx| self.graph.neighbors(idx).count())
            .collect();

        let mut ready: BinaryHeap<Reverse<NodeIndex>> = self
            .graph
            .node_indices()
            .filter(|idx| remaining[idx.index()] == 0)
            .map(Reverse)
            .collect();

        let mut order = Vec::with_capacity(self.graph.node_count());
        while let Some(Reverse(node)) = ready.pop() {
            order.push(self.graph[node].clone());
            for dependent in self.graph.neighbors_directed(node, Direction::Incoming) {
                let count = &mut remaining[dependent.index()];
                *count -= 1;
                if *count == 0 {
                    ready.push(Reverse(dependent));
                }
            }
        }

        if order.len() < self.graph.node_count() {
            let unresolved: HashSet<NodeIndex> =
                self.graph.node_indices().filter(|idx| remaining[idx.index()] > 0).collect();
            return Err(self.cycle_error(&unresolved));
        }

        tracing::debug!(target: "resolver", "Generation order: {}", order.join(", "));
        Ok(order)
    }

    fn cycle_error(&self, unresolved: &HashSet<NodeIndex>) -> EnvgenError {
        match self.find_cycle(unresolved) {
            Some(cycle) => Self::cycle_to_error(cycle),
            // Kahn only leaves nodes behind when a cycle exists; report them all regardless
            None => {
                let mut members: Vec<NodeIndex> = unresolved.iter().copied().collect();
                members.sort();
                let members: Vec<String> =
                    members.into_iter().map(|idx| self.graph[idx].clone()).collect();
                EnvgenError::CircularDependency {
                    chain: members.join(", "),
                    members,
                }
            }
        }
    }

    fn cycle_to_error(cycle: Vec<String>) -> EnvgenError {
        let chain = cycle.join(" → ");
        let mut members = cycle;
        // The closing node repeats the first
        members.pop();
        EnvgenError::CircularDependency {
            chain,
            members,
        }
    }

    /// Find one cycle among `within`, visiting nodes in insertion order.
    ///
    /// Returns the cycle path with the first node repeated at the end.
    fn find_cycle(&self, within: &HashSet<NodeIndex>) -> Option<Vec<String>> {
        let mut colors: HashMap<NodeIndex, Color> =
            within.iter().map(|&idx| (idx, Color::White)).collect();
        let mut path: Vec<NodeIndex> = Vec::new();

        let mut starts: Vec<NodeIndex> = within.iter().copied().collect();
        starts.sort();

        for node in starts {
            if colors.get(&node) == Some(&Color::White) {
                if let Some(cycle) = self.dfs_visit(node, &mut colors, &mut path) {
                    return Some(cycle.into_iter().map(|idx| self.graph[idx].clone()).collect());
                }
            }
        }

        None
    }

    /// DFS visit for cycle detection.
    ///
    /// Returns `Some(cycle_path)` if a cycle is detected, None otherwise.
    fn dfs_visit(
        &self,
        node: NodeIndex,
        colors: &mut HashMap<NodeIndex, Color>,
        path: &mut Vec<NodeIndex>,
    ) -> Option<Vec<NodeIndex>> {
        colors.insert(node, Color::Gray);
        path.push(node);

        let mut neighbors: Vec<NodeIndex> = self.graph.neighbors(node).collect();
        neighbors.sort();

        for neighbor in neighbors {
            match colors.get(&neighbor) {
                Some(Color::Gray) => {
                    let cycle_start = path.iter().position(|n| *n == neighbor).unwrap_or(0);
                    let mut cycle = path[cycle_start..].to_vec();
                    cycle.push(neighbor);
                    return Some(cycle);
                }
                Some(Color::White) => {
                    if let Some(cycle) = self.dfs_visit(neighbor, colors, path) {
                        return Some(cycle);
                    }
                }
                // Black, or outside the subgraph being searched
                _ => {}
            }
        }

        path.pop();
        colors.insert(node, Color::Black);
        None
    }
}
