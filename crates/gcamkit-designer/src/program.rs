//! Block tree
//!
//! A [`Program`] owns every block in a slot arena. Nodes keep an ordered child
//! list, an optional extruder and a non-owning parent id, so the tree has no
//! ownership cycles and ids stay stable across edits.

use gcamkit_core::{Aabb, Offset, ProgramConfig, Vec2};
use slotmap::{new_key_type, SlotMap};
use tracing::debug;

use crate::block::{
    Arc, Block, BlockKind, Line, Operation, OffsetRef, Payload, Profile, Tool,
};
use crate::error::{BlockError, Result};

new_key_type! {
    /// Stable handle of a block inside a [`Program`].
    pub struct BlockId;
}

/// Where a block is attached under its parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Slot {
    Child,
    Extruder,
}

#[derive(Debug, Clone)]
struct Node {
    block: Block,
    parent: Option<BlockId>,
    children: Vec<BlockId>,
    extruder: Option<BlockId>,
}

/// A CAM program: configuration plus the block tree.
#[derive(Debug, Clone)]
pub struct Program {
    pub config: ProgramConfig,
    nodes: SlotMap<BlockId, Node>,
    roots: Vec<BlockId>,
    default_offset: Offset,
}

impl Default for Program {
    fn default() -> Self {
        Self::new(ProgramConfig::default())
    }
}

fn root_accepts(kind: BlockKind) -> bool {
    !matches!(
        kind,
        BlockKind::Extrusion | BlockKind::Line | BlockKind::Arc | BlockKind::Point
    )
}

impl Program {
    pub fn new(config: ProgramConfig) -> Self {
        Self {
            config,
            nodes: SlotMap::with_key(),
            roots: Vec::new(),
            default_offset: Offset::default(),
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains(&self, id: BlockId) -> bool {
        self.nodes.contains_key(id)
    }

    pub fn get(&self, id: BlockId) -> Option<&Block> {
        self.nodes.get(id).map(|n| &n.block)
    }

    pub fn get_mut(&mut self, id: BlockId) -> Option<&mut Block> {
        self.nodes.get_mut(id).map(|n| &mut n.block)
    }

    pub fn block(&self, id: BlockId) -> Result<&Block> {
        self.get(id).ok_or(BlockError::NotFound)
    }

    pub fn block_mut(&mut self, id: BlockId) -> Result<&mut Block> {
        self.get_mut(id).ok_or(BlockError::NotFound)
    }

    pub fn roots(&self) -> &[BlockId] {
        &self.roots
    }

    /// Ordered children; empty for unknown ids.
    pub fn children(&self, id: BlockId) -> &[BlockId] {
        self.nodes
            .get(id)
            .map(|n| n.children.as_slice())
            .unwrap_or(&[])
    }

    pub fn parent(&self, id: BlockId) -> Option<BlockId> {
        self.nodes.get(id).and_then(|n| n.parent)
    }

    pub fn extruder(&self, id: BlockId) -> Option<BlockId> {
        self.nodes.get(id).and_then(|n| n.extruder)
    }

    /// `id` and everything below it, pre-order, extruders after children.
    pub fn descendants(&self, id: BlockId) -> Vec<BlockId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            let Some(node) = self.nodes.get(current) else {
                continue;
            };
            out.push(current);
            if let Some(extruder) = node.extruder {
                stack.push(extruder);
            }
            stack.extend(node.children.iter().rev());
        }
        out
    }

    /// Every block in tree order.
    pub fn ids(&self) -> Vec<BlockId> {
        self.roots
            .iter()
            .flat_map(|root| self.descendants(*root))
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (BlockId, &Block)> + '_ {
        self.ids()
            .into_iter()
            .filter_map(move |id| self.get(id).map(|b| (id, b)))
    }

    fn check_parent(&self, parent: Option<BlockId>, child: BlockKind) -> Result<()> {
        match parent {
            None if root_accepts(child) => Ok(()),
            None => Err(BlockError::InvalidParent {
                parent: "Program".to_string(),
                child,
            }),
            Some(id) => {
                let kind = self.block(id)?.kind();
                if kind.accepts_child(child) {
                    Ok(())
                } else {
                    Err(BlockError::InvalidParent {
                        parent: kind.to_string(),
                        child,
                    })
                }
            }
        }
    }

    /// Whether a `kind` block may be attached to `parent` in `slot`.
    pub(crate) fn check_placement(
        &self,
        parent: Option<BlockId>,
        slot: Slot,
        kind: BlockKind,
    ) -> Result<()> {
        match (slot, parent) {
            (Slot::Extruder, Some(p)) => {
                let parent_kind = self.block(p)?.kind();
                if parent_kind.accepts_extruder() && kind == BlockKind::Extrusion {
                    Ok(())
                } else {
                    Err(BlockError::InvalidParent {
                        parent: parent_kind.to_string(),
                        child: kind,
                    })
                }
            }
            _ => self.check_parent(parent, kind),
        }
    }

    /// Append a block under `parent` (or at the top level).
    ///
    /// Sketch and BoltHoles blocks get a default Extrusion extruder cutting
    /// straight through the material.
    pub fn insert(&mut self, parent: Option<BlockId>, block: Block) -> Result<BlockId> {
        self.insert_at(parent, usize::MAX, block)
    }

    /// Insert a block at `index` among the parent's children, clamped to the
    /// end of the list.
    pub fn insert_at(
        &mut self,
        parent: Option<BlockId>,
        index: usize,
        block: Block,
    ) -> Result<BlockId> {
        let kind = block.kind();
        self.check_parent(parent, kind)?;

        let id = self.attach(parent, Slot::Child, block);
        self.move_in_siblings(id, index);

        if kind.accepts_extruder() && self.extruder(id).is_none() {
            let depth = self.config.material_size.z;
            let extrusion = Block::new(BlockKind::Extrusion, &self.config);
            let extruder = self.attach(Some(id), Slot::Extruder, extrusion);
            self.attach(
                Some(extruder),
                Slot::Child,
                Block::from_payload(Line::new(Vec2::ZERO, Vec2::new(0.0, -depth))),
            );
        }
        self.refresh_derived(id);
        debug!("inserted {} {:?}", kind, id);
        Ok(id)
    }

    /// Replace the extruder of a Sketch or BoltHoles.
    pub fn set_extruder(&mut self, parent: BlockId, block: Block) -> Result<BlockId> {
        let parent_kind = self.block(parent)?.kind();
        if !parent_kind.accepts_extruder() || block.kind() != BlockKind::Extrusion {
            return Err(BlockError::InvalidParent {
                parent: parent_kind.to_string(),
                child: block.kind(),
            });
        }
        if let Some(old) = self.extruder(parent) {
            self.remove(old)?;
        }
        let id = self.attach(Some(parent), Slot::Extruder, block);
        self.refresh_derived(parent);
        Ok(id)
    }

    /// Add a node without validation. Used by the codecs and tree edits
    /// that have already checked placement.
    pub(crate) fn attach(&mut self, parent: Option<BlockId>, slot: Slot, block: Block) -> BlockId {
        let parent = parent.filter(|p| self.nodes.contains_key(*p));
        let id = self.nodes.insert(Node {
            block,
            parent,
            children: Vec::new(),
            extruder: None,
        });
        match (parent, slot) {
            (Some(p), Slot::Child) => self.nodes[p].children.push(id),
            (Some(p), Slot::Extruder) => self.nodes[p].extruder = Some(id),
            (None, _) => self.roots.push(id),
        }
        self.bind_offset(id);
        id
    }

    fn siblings_mut(&mut self, parent: Option<BlockId>) -> Option<&mut Vec<BlockId>> {
        match parent {
            Some(p) => self.nodes.get_mut(p).map(|n| &mut n.children),
            None => Some(&mut self.roots),
        }
    }

    fn move_in_siblings(&mut self, id: BlockId, index: usize) {
        let parent = self.parent(id);
        if let Some(siblings) = self.siblings_mut(parent) {
            if let Some(pos) = siblings.iter().position(|s| *s == id) {
                siblings.remove(pos);
                let index = index.min(siblings.len());
                siblings.insert(index, id);
            }
        }
    }

    /// Unlink `id` from its parent without freeing it.
    fn detach(&mut self, id: BlockId) {
        let parent = self.parent(id);
        if let Some(p) = parent {
            if let Some(node) = self.nodes.get_mut(p) {
                if node.extruder == Some(id) {
                    node.extruder = None;
                }
                node.children.retain(|c| *c != id);
            }
        } else {
            self.roots.retain(|r| *r != id);
        }
        if let Some(node) = self.nodes.get_mut(id) {
            node.parent = None;
        }
    }

    /// Point an inherited offset at the nearest owning ancestor.
    fn bind_offset(&mut self, id: BlockId) {
        let Some(node) = self.nodes.get(id) else {
            return;
        };
        if matches!(node.block.offset, OffsetRef::Owned(_)) {
            return;
        }
        let mut ancestor = node.parent;
        let mut binding = OffsetRef::Default;
        while let Some(a) = ancestor {
            let Some(anode) = self.nodes.get(a) else {
                break;
            };
            if matches!(anode.block.offset, OffsetRef::Owned(_)) {
                binding = OffsetRef::Inherited(a);
                break;
            }
            ancestor = anode.parent;
        }
        self.nodes[id].block.offset = binding;
    }

    fn rebind_subtree(&mut self, id: BlockId) {
        for node in self.descendants(id) {
            self.bind_offset(node);
        }
    }

    /// Remove a block and its subtree, post-order. Returns the removed block.
    pub fn remove(&mut self, id: BlockId) -> Result<Block> {
        if !self.contains(id) {
            return Err(BlockError::NotFound);
        }
        self.detach(id);
        let mut subtree = self.descendants(id);
        subtree.reverse();
        let mut removed = None;
        for node in subtree {
            removed = self.nodes.remove(node).map(|n| n.block);
        }
        debug!("removed {:?}", id);
        removed.ok_or(BlockError::NotFound)
    }

    /// Move a block under a new parent at `index`, rebinding inherited
    /// offsets of the moved subtree.
    pub fn reparent(
        &mut self,
        id: BlockId,
        new_parent: Option<BlockId>,
        index: usize,
    ) -> Result<()> {
        let kind = self.block(id)?.kind();
        self.check_parent(new_parent, kind)?;
        if let Some(p) = new_parent {
            if self.descendants(id).contains(&p) {
                return Err(BlockError::InvalidParent {
                    parent: self.block(p)?.kind().to_string(),
                    child: kind,
                });
            }
        }

        let old_parent = self.parent(id);
        self.detach(id);
        match new_parent {
            Some(p) => self.nodes[p].children.push(id),
            None => self.roots.push(id),
        }
        self.nodes[id].parent = new_parent;
        self.move_in_siblings(id, index);
        self.rebind_subtree(id);

        for parent in [old_parent, new_parent].into_iter().flatten() {
            self.refresh_derived(parent);
        }
        Ok(())
    }

    /// Deep copy `id` (children and extruder included) and append it under
    /// `new_parent`.
    pub fn clone_block(&mut self, id: BlockId, new_parent: Option<BlockId>) -> Result<BlockId> {
        let kind = self.block(id)?.kind();
        self.check_parent(new_parent, kind)?;
        let copy = self.copy_subtree(id, new_parent, Slot::Child)?;
        self.refresh_derived(copy);
        Ok(copy)
    }

    fn copy_subtree(
        &mut self,
        source: BlockId,
        parent: Option<BlockId>,
        slot: Slot,
    ) -> Result<BlockId> {
        let node = self.nodes.get(source).ok_or(BlockError::NotFound)?;
        let block = node.block.clone();
        let children = node.children.clone();
        let extruder = node.extruder;

        let copy = self.attach(parent, slot, block);
        for child in children {
            self.copy_subtree(child, Some(copy), Slot::Child)?;
        }
        if let Some(extruder) = extruder {
            self.copy_subtree(extruder, Some(copy), Slot::Extruder)?;
        }
        Ok(copy)
    }

    /// Placement of `id` in absolute coordinates.
    pub fn resolve_offset(&self, id: BlockId) -> Offset {
        let Some(node) = self.nodes.get(id) else {
            return self.default_offset;
        };
        match node.block.offset {
            OffsetRef::Owned(own) => {
                let parent = match node.parent {
                    Some(p) => self.resolve_offset(p),
                    None => self.default_offset,
                };
                node.block.payload.refine_offset(own.placed_under(&parent))
            }
            OffsetRef::Inherited(owner) => self.resolve_offset(owner),
            OffsetRef::Default => self.default_offset,
        }
    }

    /// The tool in effect for `id`: the nearest earlier non-suppressed Tool
    /// sibling, searching outward through the ancestors.
    pub fn find_enclosing_tool(&self, id: BlockId) -> Option<&Tool> {
        let mut current = id;
        loop {
            let parent = self.parent(current);
            let siblings = match parent {
                Some(p) => self.children(p),
                None => self.roots.as_slice(),
            };
            if let Some(pos) = siblings.iter().position(|s| *s == current) {
                let tool = siblings[..pos]
                    .iter()
                    .rev()
                    .filter_map(|s| self.get(*s))
                    .filter(|b| !b.is_suppressed())
                    .find_map(|b| b.as_tool());
                if tool.is_some() {
                    return tool;
                }
            }
            current = parent?;
        }
    }

    /// Recompute data derived from a block's parameters.
    pub(crate) fn refresh_derived(&mut self, id: BlockId) {
        if matches!(self.get(id).map(|b| b.kind()), Some(BlockKind::BoltHoles)) {
            self.rebuild_bolt_holes(id);
        }
    }

    /// Replace a BoltHoles block's children with one full circle per hole.
    pub fn rebuild_bolt_holes(&mut self, id: BlockId) {
        let Some(Payload::BoltHoles(holes)) = self.get(id).map(|b| &b.payload) else {
            return;
        };
        let radius = holes.hole_radius();
        let centers = holes.hole_centers();

        let old: Vec<BlockId> = self.children(id).to_vec();
        for child in old {
            if let Err(e) = self.remove(child) {
                debug!("derived hole {:?} already gone: {}", child, e);
            }
        }
        for center in centers {
            self.attach(
                Some(id),
                Slot::Child,
                Block::from_payload(Arc::circle(center, radius)),
            );
        }
    }

    /// Local start and end of a geometry block.
    pub fn ends(&self, id: BlockId) -> Result<(Vec2, Vec2)> {
        let block = self.block(id)?;
        block.payload.ends().ok_or(BlockError::Unsupported {
            kind: block.kind(),
            operation: Operation::Ends,
        })
    }

    /// Depth profile of an Extrusion block.
    pub fn profile(&self, id: BlockId) -> Option<Profile> {
        let Payload::Extrusion(extrusion) = &self.get(id)?.payload else {
            return None;
        };
        let segments = self
            .children(id)
            .iter()
            .filter_map(|c| self.get(*c))
            .filter(|b| !b.is_suppressed())
            .filter_map(|b| match &b.payload {
                Payload::Line(line) => Some((line.p0, line.p1)),
                _ => None,
            })
            .collect();
        Some(Profile {
            segments,
            resolution: extrusion.resolution,
            cut_side: extrusion.cut_side,
        })
    }

    /// Bounding box in absolute coordinates. Blocks without content give
    /// [`Aabb::EMPTY`].
    pub fn aabb(&self, id: BlockId) -> Result<Aabb> {
        let block = self.block(id)?;
        let kind = block.kind();
        if !kind.supports(Operation::Aabb) {
            return Err(BlockError::Unsupported {
                kind,
                operation: Operation::Aabb,
            });
        }

        let offset = self.resolve_offset(id);
        let aabb = match &block.payload {
            Payload::Point(point) => Aabb::from_points([offset.apply(point.position)]),
            Payload::Line(line) => Aabb::from_points([offset.apply(line.p0), offset.apply(line.p1)]),
            Payload::Arc(arc) => Aabb::of_arc(
                offset.apply(arc.center()),
                arc.radius,
                offset.apply_angle(arc.start_angle),
                arc.sweep,
            ),
            Payload::Extrusion(_) => self
                .profile(id)
                .map(|p| Aabb::from_points(p.segments.iter().flat_map(|(a, b)| [*a, *b])))
                .unwrap_or(Aabb::EMPTY),
            Payload::Image(image) => {
                let p = image.position;
                let s = image.size;
                Aabb::from_points(
                    [
                        p,
                        p + Vec2::new(s.x, 0.0),
                        p + Vec2::new(s.x, s.y),
                        p + Vec2::new(0.0, s.y),
                    ]
                    .map(|c| offset.apply(c)),
                )
            }
            Payload::Stl(stl) => {
                Aabb::from_points(stl.triangles.iter().flatten().map(|v| offset.apply(v.xy())))
            }
            _ => self
                .children(id)
                .iter()
                .filter(|c| {
                    self.get(**c)
                        .is_some_and(|b| b.kind().supports(Operation::Aabb))
                })
                .filter_map(|c| self.aabb(*c).ok())
                .fold(Aabb::EMPTY, |acc, b| acc.union(&b)),
        };
        Ok(aabb)
    }
}
