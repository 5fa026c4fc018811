//! Style dependency graph and sequencing
//!
//! Orders components so that every component's stylesheet is imported after
//! the stylesheets of the components it depends on. Uses petgraph for graph
//! operations.
//!
//! Ordering is stable: among components with no constraint between them, the
//! one declared first in the input name list comes first. Running the
//! sequencer twice on the same input yields the same order.

use std::cmp::Reverse;
use std::collections::{BTreeMap, BTreeSet, BinaryHeap, HashMap};

use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum GraphError {
    #[error("Style dependency cycle between: {}", .0.join(", "))]
    CycleDetected(Vec<String>),

    #[error("Component '{component}' depends on unknown component '{dependency}'")]
    UnknownComponent {
        component: String,
        dependency: String,
    },

    #[error("Component listed twice: {0}")]
    DuplicateComponent(String),
}

/// Map from component name to the components whose styles it requires first
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DependencyGraph {
    deps: BTreeMap<String, BTreeSet<String>>,
}

impl DependencyGraph {
    /// Creates an empty dependency graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Records that `component` depends on `depends_on`
    pub fn add_dependency(&mut self, component: impl Into<String>, depends_on: impl Into<String>) {
        self.deps
            .entry(component.into())
            .or_default()
            .insert(depends_on.into());
    }

    /// Makes sure `component` has an entry, even with no dependencies
    pub fn add_component(&mut self, component: impl Into<String>) {
        self.deps.entry(component.into()).or_default();
    }

    /// Returns the direct dependencies of a component
    pub fn dependencies(&self, component: &str) -> impl Iterator<Item = &str> {
        self.deps
            .get(component)
            .into_iter()
            .flat_map(|set| set.iter().map(String::as_str))
    }

    /// Iterates over `(component, dependency)` edges
    pub fn edges(&self) -> impl Iterator<Item = (&str, &str)> {
        self.deps
            .iter()
            .flat_map(|(c, deps)| deps.iter().map(move |d| (c.as_str(), d.as_str())))
    }

    /// Returns the number of components with an entry
    pub fn len(&self) -> usize {
        self.deps.len()
    }

    /// Returns true if the graph has no entries
    pub fn is_empty(&self) -> bool {
        self.deps.is_empty()
    }
}

impl FromIterator<(String, String)> for DependencyGraph {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        let mut graph = Self::new();
        for (component, depends_on) in iter {
            graph.add_dependency(component, depends_on);
        }
        graph
    }
}

/// Produces a total order over `names` that respects `graph`
///
/// Kahn's algorithm with a min-heap on declaration index, so unconstrained
/// components keep their input order.
pub fn sequence(names: &[String], graph: &DependencyGraph) -> Result<Vec<String>, GraphError> {
    let mut dag: DiGraph<&str, ()> = DiGraph::with_capacity(names.len(), graph.len());
    let mut node_map: HashMap<&str, NodeIndex> = HashMap::with_capacity(names.len());

    // Node indices follow declaration order
    for name in names {
        if node_map.contains_key(name.as_str()) {
            return Err(GraphError::DuplicateComponent(name.clone()));
        }
        let idx = dag.add_node(name.as_str());
        node_map.insert(name.as_str(), idx);
    }

    // Edge direction: dependency -> dependent
    for (component, dependency) in graph.edges() {
        let unknown = |missing: &str| GraphError::UnknownComponent {
            component: component.to_string(),
            dependency: missing.to_string(),
        };
        let to = *node_map.get(component).ok_or_else(|| unknown(component))?;
        let from = *node_map.get(dependency).ok_or_else(|| unknown(dependency))?;
        dag.update_edge(from, to, ());
    }

    let mut in_degree: Vec<usize> = dag
        .node_indices()
        .map(|idx| dag.neighbors_directed(idx, Direction::Incoming).count())
        .collect();

    let mut ready: BinaryHeap<Reverse<usize>> = in_degree
        .iter()
        .enumerate()
        .filter(|(_, degree)| **degree == 0)
        .map(|(i, _)| Reverse(i))
        .collect();

    let mut order = Vec::with_capacity(names.len());
    while let Some(Reverse(i)) = ready.pop() {
        let idx = NodeIndex::new(i);
        order.push(dag[idx].to_string());

        for next in dag.neighbors_directed(idx, Direction::Outgoing) {
            let degree = &mut in_degree[next.index()];
            *degree -= 1;
            if *degree == 0 {
                ready.push(Reverse(next.index()));
            }
        }
    }

    if order.len() < names.len() {
        return Err(GraphError::CycleDetected(cycle_members(&dag)));
    }

    Ok(order)
}

/// Names on a cycle: every SCC larger than one node, plus self-loops
fn cycle_members(dag: &DiGraph<&str, ()>) -> Vec<String> {
    let mut members: Vec<NodeIndex> = tarjan_scc(dag)
        .into_iter()
        .filter(|scc| scc.len() > 1 || dag.contains_edge(scc[0], scc[0]))
        .flatten()
        .collect();
    members.sort();
    members.into_iter().map(|idx| dag[idx].to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn position(order: &[String], name: &str) -> usize {
        order.iter().position(|n| n == name).unwrap()
    }

    #[test]
    fn empty_input() {
        let order = sequence(&[], &DependencyGraph::new()).unwrap();
        assert!(order.is_empty());
    }

    #[test]
    fn unconstrained_keeps_declaration_order() {
        let input = names(&["cell", "button", "area"]);
        let order = sequence(&input, &DependencyGraph::new()).unwrap();
        assert_eq!(order, input);
    }

    #[test]
    fn dependencies_come_first() {
        let input = names(&["dialog", "button", "popup", "icon"]);
        let mut graph = DependencyGraph::new();
        graph.add_dependency("dialog", "button");
        graph.add_dependency("dialog", "popup");
        graph.add_dependency("button", "icon");

        let order = sequence(&input, &graph).unwrap();

        assert_eq!(order, names(&["popup", "icon", "button", "dialog"]));
        assert!(position(&order, "button") < position(&order, "dialog"));
        assert!(position(&order, "icon") < position(&order, "button"));
    }

    #[test]
    fn ties_broken_by_declaration_order() {
        // Both `b` and `a` become ready once `root` is placed; `b` was declared first
        let input = names(&["root", "b", "a", "leaf"]);
        let mut graph = DependencyGraph::new();
        graph.add_dependency("leaf", "a");
        graph.add_dependency("leaf", "b");
        graph.add_dependency("a", "root");
        graph.add_dependency("b", "root");

        let order = sequence(&input, &graph).unwrap();
        assert_eq!(order, names(&["root", "b", "a", "leaf"]));
    }

    #[test]
    fn cycle_detection_reports_members() {
        let input = names(&["a", "b", "c", "d"]);
        let mut graph = DependencyGraph::new();
        graph.add_dependency("a", "c");
        graph.add_dependency("c", "b");
        graph.add_dependency("b", "a");
        graph.add_dependency("d", "a");

        let err = sequence(&input, &graph).unwrap_err();
        assert_eq!(err, GraphError::CycleDetected(names(&["a", "b", "c"])));
    }

    #[test]
    fn self_dependency_is_a_cycle() {
        let input = names(&["a", "b"]);
        let mut graph = DependencyGraph::new();
        graph.add_dependency("b", "b");

        let err = sequence(&input, &graph).unwrap_err();
        assert_eq!(err, GraphError::CycleDetected(names(&["b"])));
    }

    #[test]
    fn unknown_dependency_returns_error() {
        let input = names(&["a"]);
        let mut graph = DependencyGraph::new();
        graph.add_dependency("a", "ghost");

        let err = sequence(&input, &graph).unwrap_err();
        assert!(matches!(err, GraphError::UnknownComponent { ref dependency, .. } if dependency == "ghost"));
    }

    #[test]
    fn duplicate_names_rejected() {
        let input = names(&["a", "b", "a"]);
        let err = sequence(&input, &DependencyGraph::new()).unwrap_err();
        assert_eq!(err, GraphError::DuplicateComponent("a".into()));
    }

    #[test]
    fn serde_form_is_a_plain_map() {
        let mut graph = DependencyGraph::new();
        graph.add_dependency("dialog", "popup");
        graph.add_dependency("dialog", "button");
        graph.add_component("icon");

        let json = serde_json::to_string(&graph).unwrap();
        assert_eq!(json, r#"{"dialog":["button","popup"],"icon":[]}"#);

        let back: DependencyGraph = serde_json::from_str(&json).unwrap();
        assert_eq!(back, graph);
    }

    /// Random DAG: edges only point from a later index to an earlier one
    fn dag_strategy() -> impl Strategy<Value = (Vec<String>, DependencyGraph)> {
        (1usize..24)
            .prop_flat_map(|n| {
                let names: Vec<String> = (0..n).map(|i| format!("c{}", i)).collect();
                let edges = prop::collection::vec((0..n, 0..n), 0..(n * 2));
                // Declaration order is shuffled so it differs from the DAG order
                (Just(names.clone()), Just(names).prop_shuffle(), edges)
            })
            .prop_map(|(names, declared, edges)| {
                let mut graph = DependencyGraph::new();
                for (a, b) in edges {
                    if a > b {
                        graph.add_dependency(names[a].clone(), names[b].clone());
                    }
                }
                (declared, graph)
            })
    }

    proptest! {
        #[test]
        fn every_edge_respected((input, graph) in dag_strategy()) {
            let order = sequence(&input, &graph).unwrap();
            prop_assert_eq!(order.len(), input.len());
            for (component, dependency) in graph.edges() {
                prop_assert!(position(&order, dependency) < position(&order, component));
            }
        }

        #[test]
        fn sequencing_is_idempotent((input, graph) in dag_strategy()) {
            let first = sequence(&input, &graph).unwrap();
            let second = sequence(&input, &graph).unwrap();
            prop_assert_eq!(first, second);
        }
    }
}
