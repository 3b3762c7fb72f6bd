//! Build graph: steps as nodes, must-complete-before edges.
//!
//! The one hard ordering rule of the pipeline, clean before any transform,
//! is an edge here rather than a convention buried in call order. The
//! scheduler in the parent module evaluates the graph wave by wave.

use std::fmt;

use thiserror::Error;

use crate::paths::AssetCategory;

/// A schedulable unit of a build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuildStep {
    /// Remove the destination tree.
    Clean,
    /// Run one category's transform task.
    Task(AssetCategory),
}

impl fmt::Display for BuildStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Clean => f.write_str("clean"),
            Self::Task(category) => f.write_str(category.label()),
        }
    }
}

#[derive(Debug, Error)]
#[error("build graph contains a cycle")]
pub struct CycleError;

/// Directed acyclic composition of build steps.
#[derive(Debug, Default)]
pub struct BuildGraph {
    nodes: Vec<BuildStep>,
    /// `(before, after)` pairs
    edges: Vec<(BuildStep, BuildStep)>,
}

impl BuildGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clean plus every transform task, transforms fanned out behind clean.
    pub fn full_build() -> Self {
        let mut graph = Self::new();
        for category in AssetCategory::ALL {
            graph.add_edge(BuildStep::Clean, BuildStep::Task(category));
        }
        graph
    }

    /// One task in isolation. No clean: single-task runs refresh their own
    /// outputs without discarding the rest of the destination tree.
    pub fn single(category: AssetCategory) -> Self {
        let mut graph = Self::new();
        graph.add_step(BuildStep::Task(category));
        graph
    }

    pub fn add_step(&mut self, step: BuildStep) {
        if !self.nodes.contains(&step) {
            self.nodes.push(step);
        }
    }

    pub fn add_edge(&mut self, before: BuildStep, after: BuildStep) {
        self.add_step(before);
        self.add_step(after);
        if !self.edges.contains(&(before, after)) {
            self.edges.push((before, after));
        }
    }

    /// Steps that must complete before `step` may start.
    pub fn predecessors(&self, step: BuildStep) -> impl Iterator<Item = BuildStep> + '_ {
        self.edges
            .iter()
            .filter(move |(_, after)| *after == step)
            .map(|(before, _)| *before)
    }

    /// Group steps into waves: every step's predecessors sit in an earlier
    /// wave, and steps inside one wave carry no ordering among themselves.
    pub fn waves(&self) -> Result<Vec<Vec<BuildStep>>, CycleError> {
        let mut indegree: Vec<usize> = self
            .nodes
            .iter()
            .map(|node| self.predecessors(*node).count())
            .collect();
        let mut placed = vec![false; self.nodes.len()];
        let mut waves = Vec::new();
        let mut remaining = self.nodes.len();

        while remaining > 0 {
            let ready: Vec<usize> = (0..self.nodes.len())
                .filter(|&i| !placed[i] && indegree[i] == 0)
                .collect();
            if ready.is_empty() {
                return Err(CycleError);
            }
            for &i in &ready {
                placed[i] = true;
                remaining -= 1;
                for (before, after) in &self.edges {
                    if *before == self.nodes[i] {
                        let j = self
                            .nodes
                            .iter()
                            .position(|n| n == after)
                            .expect("edge endpoints are nodes");
                        indegree[j] -= 1;
                    }
                }
            }
            waves.push(ready.into_iter().map(|i| self.nodes[i]).collect());
        }

        Ok(waves)
    }
}
