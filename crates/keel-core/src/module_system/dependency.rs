use std::collections::{BTreeMap, HashMap, HashSet};

use crate::module_system::registry::ModuleRegistry;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    /// On the current DFS path
    Visiting,
    /// Fully explored, no cycle through this node
    Done,
}

/// Directed graph of module -> declared dependencies
#[derive(Debug, Default, Clone)]
pub struct DependencyGraph {
    /// Sorted so cycle reports are deterministic
    edges: BTreeMap<String, Vec<String>>,
}

impl DependencyGraph {
    /// Create a new dependency graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the graph of every registered module
    pub fn from_registry(registry: &ModuleRegistry) -> Self {
        let mut graph = Self::new();
        for descriptor in registry.iter() {
            graph.add_node(descriptor.name());
            for dep in descriptor.dependencies() {
                graph.add_edge(descriptor.name(), dep);
            }
        }
        graph
    }

    pub fn add_node(&mut self, node: &str) {
        self.edges.entry(node.to_string()).or_default();
    }

    /// Add an edge to the graph (`module` depends on `dependency`)
    pub fn add_edge(&mut self, module: &str, dependency: &str) {
        self.add_node(dependency);
        let deps = self.edges.entry(module.to_string()).or_default();
        if !deps.iter().any(|d| d == dependency) {
            deps.push(dependency.to_string());
        }
    }

    pub fn contains(&self, node: &str) -> bool {
        self.edges.contains_key(node)
    }

    /// Get the dependencies of a node
    pub fn dependencies_of(&self, node: &str) -> &[String] {
        self.edges.get(node).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Find any cycle in the graph.
    ///
    /// Returns the cycle as a path that starts and ends with the same node,
    /// e.g. `["a", "b", "a"]`.
    pub fn find_cycle(&self) -> Option<Vec<String>> {
        let mut marks = HashMap::new();
        let mut path = Vec::new();
        self.edges
            .keys()
            .find_map(|node| self.visit(node, &mut marks, &mut path))
    }

    /// Find a cycle reachable from `start`
    pub fn find_cycle_from(&self, start: &str) -> Option<Vec<String>> {
        let mut marks = HashMap::new();
        let mut path = Vec::new();
        self.visit(start, &mut marks, &mut path)
    }

    pub fn has_cycles(&self) -> bool {
        self.find_cycle().is_some()
    }

    /// Colour-marking DFS
    fn visit<'a>(
        &'a self,
        node: &'a str,
        marks: &mut HashMap<&'a str, Mark>,
        path: &mut Vec<&'a str>,
    ) -> Option<Vec<String>> {
        match marks.get(node) {
            Some(Mark::Done) => return None,
            Some(Mark::Visiting) => {
                let start = path.iter().position(|n| *n == node).unwrap_or(0);
                let mut cycle: Vec<String> = path[start..].iter().map(|n| n.to_string()).collect();
                cycle.push(node.to_string());
                return Some(cycle);
            }
            None => {}
        }

        marks.insert(node, Mark::Visiting);
        path.push(node);
        for dep in self.dependencies_of(node) {
            if let Some(cycle) = self.visit(dep, marks, path) {
                return Some(cycle);
            }
        }
        path.pop();
        marks.insert(node, Mark::Done);
        None
    }

    /// Dependencies-first ordering of every node, or the cycle that prevents one
    pub fn topological_order(&self) -> Result<Vec<String>, Vec<String>> {
        if let Some(cycle) = self.find_cycle() {
            return Err(cycle);
        }

        let mut visited = HashSet::new();
        let mut order = Vec::new();
        for node in self.edges.keys() {
            self.visit_topsort(node, &mut visited, &mut order);
        }
        Ok(order)
    }

    fn visit_topsort<'a>(&'a self, node: &'a str, visited: &mut HashSet<&'a str>, order: &mut Vec<String>) {
        if !visited.insert(node) {
            return;
        }
        for dep in self.dependencies_of(node) {
            self.visit_topsort(dep, visited, order);
        }
        order.push(node.to_string());
    }
}
