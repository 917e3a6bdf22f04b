//! Graph builder (C6): a deterministic dependency graph over the resolved
//! projects — nodes, tagged edges, topological order, concurrency levels,
//! and cycles. See spec §3 and §4.6.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::PathBuf;

use serde::Serialize;

use crate::project::Project;

/// Why an edge exists. Manifest edges win when both sources name the
/// same pair (spec §4.6: "manifest wins").
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum EdgeReason {
    /// Declared in a package manifest (or a local alias dialect).
    Manifest,
    /// Discovered only by scanning source files for import specifiers.
    InferredImport,
}

/// One node in the graph: a project's name and root.
#[derive(Debug, Clone, Serialize)]
pub struct GraphNode {
    /// The project's unique name.
    pub name: String,
    /// The project's absolute root.
    pub root: PathBuf,
}

/// A directed `from → to` edge: `from` must run before `to`.
#[derive(Debug, Clone, Serialize)]
pub struct Edge {
    /// The dependency (runs first).
    pub from: String,
    /// The dependent (runs after `from`).
    pub to: String,
    /// Why this edge exists.
    pub reason: EdgeReason,
}

/// The derived, immutable dependency graph (spec §3).
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Graph {
    /// Nodes sorted by `(name, root)`.
    pub nodes: Vec<GraphNode>,
    /// Edges sorted by `(from, to, reason)`.
    pub edges: Vec<Edge>,
    /// A permutation of node names such that every edge's `from` precedes
    /// its `to`.
    pub topological_order: Vec<String>,
    /// A partition of `topological_order` into maximally-parallel ranks.
    pub levels: Vec<Vec<String>>,
    /// Strongly-connected components of size ≥ 2, plus self-loops. Each
    /// cycle is sorted lexicographically; the list is sorted by first
    /// element. Empty iff the graph is acyclic.
    pub cycles: Vec<Vec<String>>,
}

impl Graph {
    /// Whether the graph has no cycles (spec P8).
    #[must_use]
    pub fn is_acyclic(&self) -> bool {
        self.cycles.is_empty()
    }
}

/// Builds the nodes and tagged, deduplicated edge set from each project's
/// resolved `dependencies`/`inferred_dependencies`. Manifest edges are
/// computed first so they always win a pair collision (spec §4.6).
fn build_nodes_and_edges(projects: &[Project]) -> (Vec<GraphNode>, Vec<Edge>) {
    let mut nodes: Vec<GraphNode> = projects
        .iter()
        .map(|project| GraphNode {
            name: project.name.clone(),
            root: project.root.clone(),
        })
        .collect();
    nodes.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.root.cmp(&b.root)));

    let mut reasons: BTreeMap<(String, String), EdgeReason> = BTreeMap::new();
    for project in projects {
        for dependency in &project.dependencies {
            reasons.insert(
                (dependency.clone(), project.name.clone()),
                EdgeReason::Manifest,
            );
        }
    }
    for project in projects {
        for dependency in &project.inferred_dependencies {
            reasons
                .entry((dependency.clone(), project.name.clone()))
                .or_insert(EdgeReason::InferredImport);
        }
    }

    let mut edges: Vec<Edge> = reasons
        .into_iter()
        .map(|((from, to), reason)| Edge { from, to, reason })
        .collect();
    edges.sort_by(|a, b| {
        a.from
            .cmp(&b.from)
            .then_with(|| a.to.cmp(&b.to))
            .then_with(|| a.reason.cmp(&b.reason))
    });

    (nodes, edges)
}

/// Kahn's algorithm: repeatedly peel off the lexicographically-sorted set
/// of nodes with zero remaining in-degree as one level, decrementing the
/// in-degree of their dependents. Returns the levels and the flattened
/// topological order; nodes left over (non-zero remaining in-degree) are
/// the unresolved subgraph passed to cycle detection.
fn kahn_layers(
    node_names: &[String],
    edges: &[Edge],
) -> (Vec<Vec<String>>, Vec<String>, BTreeSet<String>) {
    let mut adjacency: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
    let mut in_degree: HashMap<&str, usize> = node_names.iter().map(|n| (n.as_str(), 0)).collect();

    for edge in edges {
        adjacency.entry(edge.from.as_str()).or_default().push(edge.to.as_str());
        *in_degree.entry(edge.to.as_str()).or_insert(0) += 1;
    }
    for dependents in adjacency.values_mut() {
        dependents.sort_unstable();
    }

    let mut remaining = in_degree.clone();
    let mut levels: Vec<Vec<String>> = Vec::new();
    let mut topo_order: Vec<String> = Vec::new();

    let mut ready: BTreeSet<String> = remaining
        .iter()
        .filter(|(_, degree)| **degree == 0)
        .map(|(name, _)| (*name).to_string())
        .collect();

    while !ready.is_empty() {
        let level: Vec<String> = ready.iter().cloned().collect();
        for name in &level {
            remaining.remove(name.as_str());
        }
        topo_order.extend(level.iter().cloned());

        let mut next_ready: BTreeSet<String> = BTreeSet::new();
        for name in &level {
            let Some(dependents) = adjacency.get(name.as_str()) else {
                continue;
            };
            for dependent in dependents {
                if let Some(degree) = remaining.get_mut(*dependent) {
                    *degree -= 1;
                    if *degree == 0 {
                        next_ready.insert((*dependent).to_string());
                    }
                }
            }
        }
        levels.push(level);
        ready = next_ready;
    }

    let unresolved: BTreeSet<String> = remaining.keys().map(|name| (*name).to_string()).collect();
    (levels, topo_order, unresolved)
}

/// Tarjan's strongly-connected-components algorithm, restricted to the
/// subgraph induced by `unresolved` (the nodes Kahn's algorithm could not
/// place). SCCs of size 1 only count as a cycle when they contain a
/// self-loop (spec §4.6).
fn tarjan_cycles(unresolved: &BTreeSet<String>, edges: &[Edge]) -> Vec<Vec<String>> {
    if unresolved.is_empty() {
        return Vec::new();
    }

    let mut adjacency: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
    let mut self_loops: BTreeSet<&str> = BTreeSet::new();
    for edge in edges {
        if !unresolved.contains(&edge.from) || !unresolved.contains(&edge.to) {
            continue;
        }
        if edge.from == edge.to {
            self_loops.insert(edge.from.as_str());
        }
        adjacency.entry(edge.from.as_str()).or_default().push(edge.to.as_str());
    }
    for dependents in adjacency.values_mut() {
        dependents.sort_unstable();
    }

    struct Tarjan<'a> {
        adjacency: &'a BTreeMap<&'a str, Vec<&'a str>>,
        index_counter: usize,
        index: HashMap<&'a str, usize>,
        lowlink: HashMap<&'a str, usize>,
        on_stack: HashMap<&'a str, bool>,
        stack: Vec<&'a str>,
        sccs: Vec<Vec<&'a str>>,
    }

    impl<'a> Tarjan<'a> {
        fn visit(&mut self, node: &'a str) {
            self.index.insert(node, self.index_counter);
            self.lowlink.insert(node, self.index_counter);
            self.index_counter += 1;
            self.stack.push(node);
            self.on_stack.insert(node, true);

            if let Some(dependents) = self.adjacency.get(node) {
                for &dependent in dependents {
                    if !self.index.contains_key(dependent) {
                        self.visit(dependent);
                        let dependent_low = self.lowlink[dependent];
                        let node_low = self.lowlink[node];
                        self.lowlink.insert(node, node_low.min(dependent_low));
                    } else if *self.on_stack.get(dependent).unwrap_or(&false) {
                        let dependent_index = self.index[dependent];
                        let node_low = self.lowlink[node];
                        self.lowlink.insert(node, node_low.min(dependent_index));
                    }
                }
            }

            if self.lowlink[node] == self.index[node] {
                let mut component = Vec::new();
                loop {
                    let Some(member) = self.stack.pop() else {
                        break;
                    };
                    self.on_stack.insert(member, false);
                    component.push(member);
                    if member == node {
                        break;
                    }
                }
                self.sccs.push(component);
            }
        }
    }

    let mut tarjan = Tarjan {
        adjacency: &adjacency,
        index_counter: 0,
        index: HashMap::new(),
        lowlink: HashMap::new(),
        on_stack: HashMap::new(),
        stack: Vec::new(),
        sccs: Vec::new(),
    };

    for &node in unresolved.iter().map(|s| s.as_str()).collect::<Vec<_>>().iter() {
        if !tarjan.index.contains_key(node) {
            tarjan.visit(node);
        }
    }

    let mut cycles: Vec<Vec<String>> = tarjan
        .sccs
        .into_iter()
        .filter(|component| component.len() >= 2 || self_loops.contains(component[0]))
        .map(|component| {
            let mut names: Vec<String> = component.into_iter().map(str::to_string).collect();
            names.sort();
            names
        })
        .collect();

    cycles.sort_by(|a, b| a.first().cmp(&b.first()));
    cycles
}

/// Builds the full [`Graph`] from a resolved project set (spec §4.6).
/// Performs no I/O; a pure function of its inputs.
#[must_use]
pub fn build_graph(projects: &[Project]) -> Graph {
    let (nodes, edges) = build_nodes_and_edges(projects);
    let node_names: Vec<String> = nodes.iter().map(|n| n.name.clone()).collect();

    let (levels, mut topo_order, unresolved) = kahn_layers(&node_names, &edges);
    let cycles = tarjan_cycles(&unresolved, &edges);

    // Nodes the layering couldn't place (cyclic) still belong in the
    // topological order for display purposes; append them in name order
    // after every resolvable node so `topological_order` always covers
    // every node (callers consult `cycles` to know the graph is invalid).
    let mut unresolved_sorted: Vec<String> = unresolved.into_iter().collect();
    unresolved_sorted.sort();
    topo_order.extend(unresolved_sorted);

    Graph {
        nodes,
        edges,
        topological_order: topo_order,
        levels,
        cycles,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;
    use std::path::PathBuf;

    fn project(name: &str, deps: &[&str], inferred: &[&str]) -> Project {
        Project {
            name: name.to_string(),
            root: PathBuf::from(format!("/ws/{name}")),
            config_file: None,
            args: Vec::new(),
            package_name: Some(name.to_string()),
            dependency_package_names: BTreeSet::new(),
            dependencies: deps.iter().map(|s| (*s).to_string()).collect(),
            inferred_dependencies: inferred.iter().map(|s| (*s).to_string()).collect(),
        }
    }

    #[test]
    fn two_package_chain_orders_dependency_first() {
        let projects = vec![project("@s/app", &["@s/shared"], &[]), project("@s/shared", &[], &[])];
        let graph = build_graph(&projects);
        assert_eq!(graph.topological_order, vec!["@s/shared", "@s/app"]);
        assert_eq!(
            graph.levels,
            vec![vec!["@s/shared".to_string()], vec!["@s/app".to_string()]]
        );
        assert!(graph.is_acyclic());
        assert_eq!(graph.edges[0].reason, EdgeReason::Manifest);
    }

    #[test]
    fn manifest_edge_wins_over_inferred_for_same_pair() {
        let projects = vec![
            project("@s/app", &["@s/shared"], &["@s/shared"]),
            project("@s/shared", &[], &[]),
        ];
        let graph = build_graph(&projects);
        assert_eq!(graph.edges.len(), 1);
        assert_eq!(graph.edges[0].reason, EdgeReason::Manifest);
    }

    #[test]
    fn detects_two_node_cycle() {
        let projects = vec![project("@s/a", &["@s/b"], &[]), project("@s/b", &["@s/a"], &[])];
        let graph = build_graph(&projects);
        assert!(!graph.is_acyclic());
        assert_eq!(graph.cycles, vec![vec!["@s/a".to_string(), "@s/b".to_string()]]);
    }

    #[test]
    fn independent_projects_share_one_level() {
        let projects = vec![project("@s/a", &[], &[]), project("@s/b", &[], &[])];
        let graph = build_graph(&projects);
        assert_eq!(graph.levels, vec![vec!["@s/a".to_string(), "@s/b".to_string()]]);
    }

    #[test]
    fn diamond_shape_levels_correctly() {
        // shared <- (left, right) <- app
        let projects = vec![
            project("shared", &[], &[]),
            project("left", &["shared"], &[]),
            project("right", &["shared"], &[]),
            project("app", &["left", "right"], &[]),
        ];
        let graph = build_graph(&projects);
        assert_eq!(
            graph.levels,
            vec![
                vec!["shared".to_string()],
                vec!["left".to_string(), "right".to_string()],
                vec!["app".to_string()],
            ]
        );
    }
}
