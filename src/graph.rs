//! Dependency graph module.
//!
//! Provides the `StatGraph` type, which represents derived-stat
//! dependencies as a directed acyclic graph (DAG). Used to decide the
//! order in which derived stats are refreshed after an input changes.

use crate::error::StatError;
use crate::stat_type::StatType;
use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction;
use std::collections::{HashMap, HashSet};

/// A DAG of stat dependencies.
///
/// If stat A is derived from stat B, B must be refreshed before A.
/// Edges point from the input to the derived stat.
///
/// # Examples
///
/// ```rust
/// use charstat::graph::StatGraph;
/// use charstat::StatType;
///
/// let mut graph = StatGraph::new();
///
/// // Attack is derived from Strength, Power from Attack
/// graph.add_edge(StatType::Attack, StatType::Strength);
/// graph.add_edge(StatType::Power, StatType::Attack);
///
/// let order = graph.topological_sort().unwrap();
/// let pos = |s: &StatType| order.iter().position(|o| o == s).unwrap();
/// assert!(pos(&StatType::Strength) < pos(&StatType::Attack));
/// assert!(pos(&StatType::Attack) < pos(&StatType::Power));
/// ```
#[derive(Debug, Clone, Default)]
pub struct StatGraph {
    graph: DiGraph<StatType, ()>,
    node_map: HashMap<StatType, NodeIndex>,
}

impl StatGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node if it doesn't exist and return its index.
    pub fn add_node(&mut self, stat: StatType) -> NodeIndex {
        if let Some(&idx) = self.node_map.get(&stat) {
            idx
        } else {
            let idx = self.graph.add_node(stat.clone());
            self.node_map.insert(stat, idx);
            idx
        }
    }

    /// Record that `from` is derived from `to`.
    pub fn add_edge(&mut self, from: StatType, to: StatType) {
        let from_idx = self.add_node(from);
        let to_idx = self.add_node(to);
        self.graph.add_edge(to_idx, from_idx, ());
    }

    pub fn contains_node(&self, stat: &StatType) -> bool {
        self.node_map.contains_key(stat)
    }

    /// Detect cycles with a depth-first search.
    ///
    /// Returns `StatError::Cycle` with the offending path, first stat
    /// repeated at the end.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use charstat::graph::StatGraph;
    /// use charstat::StatType;
    ///
    /// let mut graph = StatGraph::new();
    /// graph.add_edge(StatType::Attack, StatType::Strength);
    /// assert!(graph.detect_cycles().is_ok());
    ///
    /// graph.add_edge(StatType::Strength, StatType::Attack);
    /// assert!(graph.detect_cycles().is_err());
    /// ```
    pub fn detect_cycles(&self) -> Result<(), StatError> {
        let mut visited = HashSet::new();
        let mut rec_stack = HashSet::new();

        for node_idx in self.graph.node_indices() {
            if !visited.contains(&node_idx) {
                let mut cycle_path = Vec::new();
                if let Some(cycle) =
                    self.dfs_cycle_detect(node_idx, &mut visited, &mut rec_stack, &mut cycle_path)
                {
                    return Err(cycle);
                }
            }
        }

        Ok(())
    }

    fn dfs_cycle_detect(
        &self,
        node: NodeIndex,
        visited: &mut HashSet<NodeIndex>,
        rec_stack: &mut HashSet<NodeIndex>,
        cycle_path: &mut Vec<StatType>,
    ) -> Option<StatError> {
        visited.insert(node);
        rec_stack.insert(node);
        cycle_path.push(self.graph[node].clone());

        for neighbor in self.graph.neighbors_directed(node, Direction::Outgoing) {
            if !visited.contains(&neighbor) {
                if let Some(cycle) = self.dfs_cycle_detect(neighbor, visited, rec_stack, cycle_path)
                {
                    return Some(cycle);
                }
            } else if rec_stack.contains(&neighbor) {
                let neighbor_stat = self.graph[neighbor].clone();
                let start = cycle_path
                    .iter()
                    .position(|stat| stat == &neighbor_stat)
                    .unwrap_or(0);
                let mut path = cycle_path[start..].to_vec();
                path.push(neighbor_stat);
                return Some(StatError::Cycle { path });
            }
        }

        rec_stack.remove(&node);
        cycle_path.pop();
        None
    }

    /// All nodes, inputs before the stats derived from them.
    pub fn topological_sort(&self) -> Result<Vec<StatType>, StatError> {
        self.detect_cycles()?;

        toposort(&self.graph, None)
            .map(|indices| {
                indices
                    .into_iter()
                    .map(|idx| self.graph[idx].clone())
                    .collect()
            })
            .map_err(|cycle| StatError::Cycle {
                path: vec![self.graph[cycle.node_id()].clone()],
            })
    }

    /// Every stat transitively derived from `stat`, excluding `stat` itself.
    pub fn downstream_of(&self, stat: &StatType) -> HashSet<StatType> {
        let mut reached = HashSet::new();
        let Some(&start) = self.node_map.get(stat) else {
            return reached;
        };

        let mut stack = vec![start];
        while let Some(idx) = stack.pop() {
            for next in self.graph.neighbors_directed(idx, Direction::Outgoing) {
                if reached.insert(self.graph[next].clone()) {
                    stack.push(next);
                }
            }
        }
        reached
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_graph_add_edge() {
        let mut graph = StatGraph::new();
        graph.add_edge(StatType::Health, StatType::Stamina);

        assert!(graph.contains_node(&StatType::Health));
        assert!(graph.contains_node(&StatType::Stamina));
        assert!(!graph.contains_node(&StatType::Mana));
    }

    #[test]
    fn test_graph_detect_cycle_path() {
        let mut graph = StatGraph::new();
        let a = StatType::custom("A");
        let b = StatType::custom("B");
        let c = StatType::custom("C");

        graph.add_edge(b.clone(), a.clone());
        graph.add_edge(c.clone(), b.clone());
        graph.add_edge(a.clone(), c.clone());

        match graph.detect_cycles() {
            Err(StatError::Cycle { path }) => {
                assert_eq!(path.len(), 4);
                assert_eq!(path.first(), path.last());
            }
            other => panic!("expected cycle, got {:?}", other),
        }
        assert!(graph.topological_sort().is_err());
    }

    #[test]
    fn test_downstream_of() {
        let mut graph = StatGraph::new();
        graph.add_edge(StatType::Attack, StatType::Strength);
        graph.add_edge(StatType::Power, StatType::Attack);
        graph.add_edge(StatType::Health, StatType::Stamina);

        let downstream = graph.downstream_of(&StatType::Strength);
        assert!(downstream.contains(&StatType::Attack));
        assert!(downstream.contains(&StatType::Power));
        assert!(!downstream.contains(&StatType::Health));
        assert!(!downstream.contains(&StatType::Strength));

        assert!(graph.downstream_of(&StatType::Mana).is_empty());
    }
}
