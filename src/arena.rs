// src/arena.rs
//! Bump allocator for policy tree nodes. Grounded on `wallet.c`'s `buffer_alloc`
//! (append-only, alignment-padded, `NULL` on exhaustion) and on the teacher's own framing
//! of the payload reader as a "Bounded Reader" (`payload/reader.rs`) that rejects
//! over-budget input before committing any allocation.
//!
//! Nodes here are a homogeneous Rust enum (`crate::policy::node::Node`) rather than raw
//! bytes at caller-chosen offsets: DESIGN.md records this as the resolution of spec.md's
//! "arena over a caller-supplied byte region" requirement, chosen to avoid unsafe pointer
//! casts over heterogeneous variant payloads. The caller sizes the budget directly in
//! node count — every token in the grammar consumes at least one source byte per node
//! it allocates, so a policy body of `L` bytes can produce at most `L` nodes, and callers
//! size off the body length rather than an arbitrary byte region. Monotonic growth, no
//! compaction, no free, `OutOfMemory` as a first-class recoverable error rather than a
//! panic or a silent reallocation.

use alloc::vec::Vec;

use crate::error::CoreError;
use crate::policy::node::Node;

/// A stable, append-only index into an `Arena`. Indices never change once issued: the
/// arena never frees or moves a node, so a `NodeId` returned from `alloc` remains valid
/// for the arena's entire lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(u32);

impl NodeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Bump allocator over a pre-sized node budget.
pub struct Arena {
    nodes: Vec<Node>,
    capacity: usize,
}

impl Arena {
    /// Allocates directly from a node count. Every node the script parser allocates
    /// consumes at least one source byte, so a policy body of `L` bytes can never need
    /// more than `L` nodes of headroom (`parse_policy_script`'s caller sizes off that).
    pub fn with_node_capacity(capacity: usize) -> Self {
        Self {
            nodes: Vec::with_capacity(capacity.max(1)),
            capacity: capacity.max(1),
        }
    }

    /// Appends `node` to the arena, returning its stable id, or `OutOfMemory` if the
    /// pre-sized budget is exhausted. Never reallocates past `capacity`.
    pub fn alloc(&mut self, node: Node) -> Result<NodeId, CoreError> {
        if self.nodes.len() >= self.capacity {
            return Err(CoreError::OutOfMemory);
        }
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(node);
        Ok(id)
    }

    pub fn get(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    pub fn get_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.index()]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}
