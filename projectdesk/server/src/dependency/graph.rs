//! In-memory view of a project's dependency edges.
//!
//! The database is the source of truth; a [`DependencyGraph`] is built from the
//! edges of one project for the duration of a single operation and answers
//! reachability questions that SQL expresses poorly.

use std::collections::{BTreeMap, BTreeSet};

/// Directed graph where an edge `task -> depends_on` means `task` waits on `depends_on`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DependencyGraph {
    nodes: BTreeSet<i32>,
    depends_on: BTreeMap<i32, BTreeSet<i32>>,
    dependents: BTreeMap<i32, BTreeSet<i32>>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Dependency graph contains a cycle through tasks {0:?}")]
pub struct CycleDetected(pub Vec<i32>);

impl DependencyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a graph from `(task_id, depends_on)` pairs.
    pub fn from_edges(edges: impl IntoIterator<Item = (i32, i32)>) -> Self {
        let mut graph = Self::new();
        for (task_id, depends_on) in edges {
            graph.add_edge(task_id, depends_on);
        }
        graph
    }

    /// Registers a task without edges so it shows up in [`Self::topological_order`].
    pub fn add_task(&mut self, task_id: i32) {
        self.nodes.insert(task_id);
    }

    pub fn add_edge(&mut self, task_id: i32, depends_on: i32) {
        self.nodes.insert(task_id);
        self.nodes.insert(depends_on);
        self.depends_on.entry(task_id).or_default().insert(depends_on);
        self.dependents.entry(depends_on).or_default().insert(task_id);
    }

    pub fn contains_edge(&self, task_id: i32, depends_on: i32) -> bool {
        self.depends_on
            .get(&task_id)
            .is_some_and(|deps| deps.contains(&depends_on))
    }

    pub fn edge_count(&self) -> usize {
        self.depends_on.values().map(BTreeSet::len).sum()
    }

    /// Direct dependencies of `task_id`, in ascending id order.
    pub fn dependencies_of(&self, task_id: i32) -> impl Iterator<Item = i32> + '_ {
        self.depends_on
            .get(&task_id)
            .into_iter()
            .flat_map(|deps| deps.iter().copied())
    }

    /// Returns true if `to` can be reached from `from` by following dependency edges.
    pub fn reaches(&self, from: i32, to: i32) -> bool {
        let mut visited = BTreeSet::new();
        let mut stack = vec![from];

        while let Some(current) = stack.pop() {
            if current == to {
                return true;
            }
            if visited.insert(current) {
                stack.extend(self.dependencies_of(current));
            }
        }

        false
    }

    /// Returns true if adding `task_id -> depends_on` would close a cycle.
    ///
    /// A self-loop counts as a cycle.
    pub fn would_create_cycle(&self, task_id: i32, depends_on: i32) -> bool {
        task_id == depends_on || self.reaches(depends_on, task_id)
    }

    /// Finds one cycle, returned as the task ids along it, if the graph has any.
    pub fn find_cycle(&self) -> Option<Vec<i32>> {
        #[derive(Clone, Copy, PartialEq)]
        enum Mark {
            InProgress,
            Done,
        }

        let mut marks: BTreeMap<i32, Mark> = BTreeMap::new();

        for &start in &self.nodes {
            if marks.contains_key(&start) {
                continue;
            }
            // Iterative DFS; each frame holds a node and its not-yet-visited dependencies.
            let mut path: Vec<i32> = vec![start];
            let mut frames: Vec<Vec<i32>> = vec![self.dependencies_of(start).collect()];
            marks.insert(start, Mark::InProgress);

            while let Some(pending) = frames.last_mut() {
                match pending.pop() {
                    Some(next) => match marks.get(&next) {
                        Some(Mark::InProgress) => {
                            let from = path.iter().position(|&id| id == next).unwrap_or(0);
                            return Some(path[from..].to_vec());
                        }
                        Some(Mark::Done) => {}
                        None => {
                            marks.insert(next, Mark::InProgress);
                            path.push(next);
                            frames.push(self.dependencies_of(next).collect());
                        }
                    },
                    None => {
                        frames.pop();
                        if let Some(finished) = path.pop() {
                            marks.insert(finished, Mark::Done);
                        }
                    }
                }
            }
        }

        None
    }

    /// Orders every task so that dependencies come before the tasks waiting on them.
    ///
    /// Ties are broken by ascending task id, so the order is deterministic.
    pub fn topological_order(&self) -> Result<Vec<i32>, CycleDetected> {
        let mut remaining: BTreeMap<i32, usize> = self
            .nodes
            .iter()
            .map(|&id| (id, self.dependencies_of(id).count()))
            .collect();
        let mut ready: BTreeSet<i32> = remaining
            .iter()
            .filter(|&(_, &count)| count == 0)
            .map(|(&id, _)| id)
            .collect();
        let mut order = Vec::with_capacity(self.nodes.len());

        while let Some(id) = ready.pop_first() {
            order.push(id);
            for dependent in self.dependents.get(&id).into_iter().flatten() {
                if let Some(count) = remaining.get_mut(dependent) {
                    *count -= 1;
                    if *count == 0 {
                        ready.insert(*dependent);
                    }
                }
            }
        }

        if order.len() == self.nodes.len() {
            Ok(order)
        } else {
            Err(CycleDetected(self.find_cycle().unwrap_or_default()))
        }
    }
}
