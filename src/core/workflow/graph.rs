use crate::core::workflow::model::Workflow;
use petgraph::algo::{tarjan_scc, toposort};
use petgraph::dot::Dot;
use petgraph::graph::{DiGraph, NodeIndex};
use std::collections::HashMap;
use std::fmt;

/// Edge weight; rendered as the edge label in DOT output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Needs;

impl fmt::Display for Needs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("needs")
    }
}

/// Job dependency graph. Edges point from a dependency to the job that needs it;
/// `needs` entries naming unknown jobs are skipped.
pub struct JobGraph {
    graph: DiGraph<String, Needs>,
    nodes: HashMap<String, NodeIndex>,
}

impl JobGraph {
    pub fn from_workflow(workflow: &Workflow) -> Self {
        let mut graph = DiGraph::new();
        let mut nodes = HashMap::new();
        for (id, _) in workflow.jobs() {
            let index = graph.add_node(id.to_string());
            nodes.insert(id.to_string(), index);
        }
        for (id, job) in workflow.jobs() {
            let to = nodes[id];
            for dependency in &job.needs {
                if let Some(&from) = nodes.get(dependency) {
                    graph.update_edge(from, to, Needs);
                }
            }
        }
        Self { graph, nodes }
    }

    /// Jobs in an order where every job follows its dependencies.
    ///
    /// On failure returns the jobs involved in cycles, in declaration order.
    pub fn topological_order(&self) -> Result<Vec<String>, Vec<String>> {
        match toposort(&self.graph, None) {
            Ok(order) => Ok(order
                .into_iter()
                .map(|index| self.graph[index].clone())
                .collect()),
            Err(_) => {
                let mut members: Vec<String> = self.cycles().into_iter().flatten().collect();
                members.sort_by_key(|id| self.nodes[id].index());
                Err(members)
            }
        }
    }

    /// Strongly connected components that form cycles, including self-dependencies.
    /// Members are in declaration order; components are ordered by their first member.
    pub fn cycles(&self) -> Vec<Vec<String>> {
        let mut cycles: Vec<Vec<NodeIndex>> = tarjan_scc(&self.graph)
            .into_iter()
            .filter(|component| {
                component.len() > 1
                    || self.graph.contains_edge(component[0], component[0])
            })
            .map(|mut component| {
                component.sort();
                component
            })
            .collect();
        cycles.sort();
        cycles
            .into_iter()
            .map(|component| {
                component
                    .into_iter()
                    .map(|index| self.graph[index].clone())
                    .collect()
            })
            .collect()
    }

    pub fn to_dot(&self) -> String {
        format!("{}", Dot::new(&self.graph))
    }
}
