// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job tree topology.
//!
//! A [`JobTree`] is built once from a nested [`TreeDescriptor`] and never
//! changes afterwards. Nodes are indexed by id in discovery order, which
//! is the pre-order of the descriptor.

use crate::id::JobId;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TreeError {
    #[error("duplicate job id in tree: {0}")]
    DuplicateId(JobId),
    #[error("job id must not be empty")]
    EmptyId,
}

/// Nested, already-parsed description of a job tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeDescriptor {
    pub id: JobId,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub jobs: Vec<TreeDescriptor>,
}

impl TreeDescriptor {
    pub fn leaf(id: impl Into<JobId>) -> Self {
        Self { id: id.into(), jobs: Vec::new() }
    }

    pub fn group(id: impl Into<JobId>, jobs: Vec<TreeDescriptor>) -> Self {
        Self { id: id.into(), jobs }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobTreeNode {
    pub job_id: JobId,
    /// `None` for the root.
    pub parent_id: Option<JobId>,
    /// In declaration order.
    pub child_ids: Vec<JobId>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobTree {
    root: JobId,
    nodes: IndexMap<JobId, JobTreeNode>,
}

impl JobTree {
    pub fn from_descriptor(descriptor: &TreeDescriptor) -> Result<Self, TreeError> {
        let mut nodes = IndexMap::new();
        index_node(None, descriptor, &mut nodes)?;
        Ok(Self { root: descriptor.id.clone(), nodes })
    }

    /// Rebuild the nested descriptor this tree was indexed from.
    pub fn to_descriptor(&self) -> TreeDescriptor {
        self.describe(&self.root)
    }

    fn describe(&self, id: &JobId) -> TreeDescriptor {
        TreeDescriptor {
            id: id.clone(),
            jobs: self.child_ids(id).iter().map(|c| self.describe(c)).collect(),
        }
    }

    pub fn root_id(&self) -> &JobId {
        &self.root
    }

    pub fn get(&self, id: &str) -> Option<&JobTreeNode> {
        self.nodes.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.nodes.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Children of `id` in declaration order; empty for leaves and unknown ids.
    pub fn child_ids(&self, id: &str) -> &[JobId] {
        self.nodes.get(id).map(|n| n.child_ids.as_slice()).unwrap_or(&[])
    }

    /// Parent of `id`; `None` for the root and unknown ids.
    pub fn parent_id(&self, id: &str) -> Option<&JobId> {
        self.nodes.get(id).and_then(|n| n.parent_id.as_ref())
    }

    /// Every id in discovery order.
    pub fn ids(&self) -> impl Iterator<Item = &JobId> {
        self.nodes.keys()
    }

    /// Depth-first pre-order from the root, honouring child order.
    pub fn pre_order(&self) -> Vec<&JobId> {
        let mut out = Vec::with_capacity(self.nodes.len());
        let mut stack = vec![&self.root];
        while let Some(id) = stack.pop() {
            out.push(id);
            stack.extend(self.child_ids(id).iter().rev());
        }
        out
    }

    /// ASCII rendering of the tree, for diagnostics.
    pub fn render(&self) -> String {
        let mut out = String::new();
        self.render_node(&mut out, &self.root, 0);
        out
    }

    fn render_node(&self, out: &mut String, id: &JobId, depth: usize) {
        for _ in 0..depth {
            out.push_str("│  ");
        }
        out.push_str("├──");
        out.push_str(id);
        out.push('\n');
        for child in self.child_ids(id) {
            self.render_node(out, child, depth + 1);
        }
    }
}

impl fmt::Display for JobTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

fn index_node(
    parent: Option<&JobId>,
    descriptor: &TreeDescriptor,
    nodes: &mut IndexMap<JobId, JobTreeNode>,
) -> Result<(), TreeError> {
    if descriptor.id.is_empty() {
        return Err(TreeError::EmptyId);
    }
    if nodes.contains_key(&descriptor.id) {
        return Err(TreeError::DuplicateId(descriptor.id.clone()));
    }
    nodes.insert(
        descriptor.id.clone(),
        JobTreeNode {
            job_id: descriptor.id.clone(),
            parent_id: parent.cloned(),
            child_ids: descriptor.jobs.iter().map(|c| c.id.clone()).collect(),
        },
    );
    for child in &descriptor.jobs {
        index_node(Some(&descriptor.id), child, nodes)?;
    }
    Ok(())
}

#[cfg(test)]
#[path = "tree_tests.rs"]
mod tests;
