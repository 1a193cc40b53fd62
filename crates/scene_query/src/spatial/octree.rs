//! Loose octree spatial partitioning structure
//!
//! Divides 3D space into hierarchical regions for fast candidate lookup.
//! Each entry is filed by the center of its bounding box; node bounds are
//! inflated by the largest half-extent ever inserted when tested, so an entry
//! that pokes out of its node is still found from a neighbouring region.
//! Entries whose center falls outside the world bounds are kept in an
//! overflow list that every query scans.

use crate::entity::Entity;
use crate::foundation::math::Vec3;
use crate::spatial::AABB;
use serde::{Deserialize, Serialize};

/// Configuration for octree behavior
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OctreeConfig {
    /// Maximum entities per node before subdivision
    pub max_entities_per_node: usize,

    /// Maximum subdivision depth
    pub max_depth: u32,

    /// Minimum node size (prevents excessive subdivision)
    pub min_node_size: f32,
}

impl Default for OctreeConfig {
    fn default() -> Self {
        Self {
            max_entities_per_node: 8,
            max_depth: 8,
            min_node_size: 1.0,
        }
    }
}

/// Entry stored in the octree
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OctreeEntry {
    /// Owning entity
    pub id: Entity,
    /// World-space bounds of the entity's volume
    pub bounds: AABB,
}

impl OctreeEntry {
    fn position(&self) -> Vec3 {
        self.bounds.center()
    }
}

/// Single node in the octree hierarchy
#[derive(Debug, Clone)]
pub struct OctreeNode {
    /// World-space bounds of this node
    pub bounds: AABB,

    /// Entries contained in this node (if leaf)
    pub entries: Vec<OctreeEntry>,

    /// Child nodes (8 octants), None if this is a leaf
    pub children: Option<Box<[OctreeNode; 8]>>,

    /// Depth in the tree (0 = root)
    pub depth: u32,
}

impl OctreeNode {
    /// Create a new leaf node
    pub fn new(bounds: AABB, depth: u32) -> Self {
        Self {
            bounds,
            entries: Vec::new(),
            children: None,
            depth,
        }
    }

    /// Check if this node is a leaf (has no children)
    pub fn is_leaf(&self) -> bool {
        self.children.is_none()
    }

    // Octant layout: bit 0 = +X, bit 1 = +Y, bit 2 = +Z
    fn octant_index(&self, position: Vec3) -> usize {
        let center = self.bounds.center();
        let x_bit = usize::from(position.x >= center.x);
        let y_bit = usize::from(position.y >= center.y);
        let z_bit = usize::from(position.z >= center.z);
        (z_bit << 2) | (y_bit << 1) | x_bit
    }

    /// Subdivide this node into 8 children
    fn subdivide(&mut self) {
        if self.children.is_some() {
            return;
        }

        let center = self.bounds.center();
        let quarter_extents = self.bounds.extents() * 0.5;
        let depth = self.depth + 1;

        let children: [OctreeNode; 8] = std::array::from_fn(|octant| {
            let sign = |bit: usize| if octant & bit != 0 { 1.0 } else { -1.0 };
            let child_center = Vec3::new(
                center.x + quarter_extents.x * sign(1),
                center.y + quarter_extents.y * sign(2),
                center.z + quarter_extents.z * sign(4),
            );
            OctreeNode::new(AABB::from_center_extents(child_center, quarter_extents), depth)
        });
        self.children = Some(Box::new(children));

        // Redistribute existing entries to children
        let entries = std::mem::take(&mut self.entries);
        for entry in entries {
            let octant = self.octant_index(entry.position());
            if let Some(children) = self.children.as_mut() {
                children[octant].entries.push(entry);
            }
        }
    }

    /// Insert an entry into this node; false if its center lies outside
    pub fn insert(&mut self, entry: OctreeEntry, config: &OctreeConfig) -> bool {
        if !self.bounds.contains_point(entry.position()) {
            return false;
        }

        if self.is_leaf() {
            let should_subdivide = self.entries.len() >= config.max_entities_per_node
                && self.depth < config.max_depth
                && self.bounds.extents().x > config.min_node_size;

            if !should_subdivide {
                self.entries.push(entry);
                return true;
            }
            self.subdivide();
        }

        let octant = self.octant_index(entry.position());
        match self.children.as_mut() {
            Some(children) => children[octant].insert(entry, config),
            None => false,
        }
    }

    /// Remove an entry from this node or its children
    pub fn remove(&mut self, entity_id: Entity) -> Option<OctreeEntry> {
        if let Some(index) = self.entries.iter().position(|e| e.id == entity_id) {
            return Some(self.entries.swap_remove(index));
        }

        self.children
            .as_mut()?
            .iter_mut()
            .find_map(|child| child.remove(entity_id))
    }

    /// Collect entries whose bounds touch `region`
    pub fn query_aabb(&self, region: &AABB, looseness: f32, results: &mut Vec<Entity>) {
        if !self.bounds.expanded(looseness).intersects(region) {
            return;
        }

        results.extend(
            self.entries
                .iter()
                .filter(|entry| entry.bounds.intersects(region))
                .map(|entry| entry.id),
        );

        if let Some(children) = &self.children {
            for child in children.iter() {
                child.query_aabb(region, looseness, results);
            }
        }
    }

    /// Collect entries whose bounds, grown by `inflate`, touch the segment
    pub fn query_segment(
        &self,
        origin: Vec3,
        dir: Vec3,
        max_t: f32,
        looseness: f32,
        inflate: f32,
        results: &mut Vec<Entity>,
    ) {
        // Skip the whole subtree if the segment misses the loosened node bounds
        if self
            .bounds
            .expanded(looseness + inflate)
            .clip_segment(origin, dir, max_t)
            .is_none()
        {
            return;
        }

        results.extend(
            self.entries
                .iter()
                .filter(|entry| {
                    entry
                        .bounds
                        .expanded(inflate)
                        .clip_segment(origin, dir, max_t)
                        .is_some()
                })
                .map(|entry| entry.id),
        );

        if let Some(children) = &self.children {
            for child in children.iter() {
                child.query_segment(origin, dir, max_t, looseness, inflate, results);
            }
        }
    }

    /// Get all leaf nodes
    pub fn get_all_leaves<'a>(&'a self, leaves: &mut Vec<&'a OctreeNode>) {
        if self.is_leaf() {
            leaves.push(self);
        } else if let Some(children) = &self.children {
            for child in children.iter() {
                child.get_all_leaves(leaves);
            }
        }
    }

    /// Count total entries in this node and all children
    pub fn count_entries(&self) -> usize {
        self.entries.len()
            + self
                .children
                .as_ref()
                .map_or(0, |children| children.iter().map(OctreeNode::count_entries).sum())
    }
}

/// Loose octree spatial partitioning structure
#[derive(Debug, Clone)]
pub struct Octree {
    /// Root node containing the entire world space
    pub root: OctreeNode,

    /// Entries whose center lies outside the root bounds
    overflow: Vec<OctreeEntry>,

    /// Configuration
    config: OctreeConfig,

    /// Largest half-extent inserted since the last clear
    max_half_extent: f32,
}

impl Octree {
    /// Create a new octree with given world bounds
    pub fn new(world_bounds: AABB, config: OctreeConfig) -> Self {
        Self {
            root: OctreeNode::new(world_bounds, 0),
            overflow: Vec::new(),
            config,
            max_half_extent: 0.0,
        }
    }

    /// Insert an entity's bounds into the octree
    pub fn insert(&mut self, id: Entity, bounds: AABB) {
        let entry = OctreeEntry { id, bounds };

        // The looseness only ever grows, which keeps stale nodes sound
        self.max_half_extent = self.max_half_extent.max(bounds.extents().max());

        if !self.root.insert(entry, &self.config) {
            self.overflow.push(entry);
        }
    }

    /// Remove an entity from the octree
    pub fn remove(&mut self, id: Entity) -> Option<OctreeEntry> {
        if let Some(index) = self.overflow.iter().position(|e| e.id == id) {
            return Some(self.overflow.swap_remove(index));
        }
        self.root.remove(id)
    }

    /// Entities whose bounds touch `region`
    pub fn query_aabb(&self, region: &AABB) -> Vec<Entity> {
        let mut results: Vec<Entity> = self
            .overflow
            .iter()
            .filter(|entry| entry.bounds.intersects(region))
            .map(|entry| entry.id)
            .collect();
        self.root.query_aabb(region, self.max_half_extent, &mut results);
        results
    }

    /// Entities whose bounds, grown by `inflate`, touch `origin + dir * [0, max_t]`
    pub fn query_segment(&self, origin: Vec3, dir: Vec3, max_t: f32, inflate: f32) -> Vec<Entity> {
        let mut results: Vec<Entity> = self
            .overflow
            .iter()
            .filter(|entry| {
                entry
                    .bounds
                    .expanded(inflate)
                    .clip_segment(origin, dir, max_t)
                    .is_some()
            })
            .map(|entry| entry.id)
            .collect();
        self.root
            .query_segment(origin, dir, max_t, self.max_half_extent, inflate, &mut results);
        results
    }

    /// Get all leaf nodes
    pub fn get_all_leaves(&self) -> Vec<&OctreeNode> {
        let mut leaves = Vec::new();
        self.root.get_all_leaves(&mut leaves);
        leaves
    }

    /// Number of entries outside the world bounds
    pub fn overflow_count(&self) -> usize {
        self.overflow.len()
    }

    /// Get total entry count
    pub fn entity_count(&self) -> usize {
        self.root.count_entries() + self.overflow.len()
    }

    /// Clear the octree
    pub fn clear(&mut self) {
        self.root = OctreeNode::new(self.root.bounds, 0);
        self.overflow.clear();
        self.max_half_extent = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn world() -> AABB {
        AABB::new(Vec3::new(-100.0, -100.0, -100.0), Vec3::new(100.0, 100.0, 100.0))
    }

    fn cube(center: Vec3, half: f32) -> AABB {
        AABB::from_center_extents(center, Vec3::repeat(half))
    }

    #[test]
    fn test_octree_basic_insertion() {
        let mut octree = Octree::new(world(), OctreeConfig::default());
        octree.insert(Entity::new(0), cube(Vec3::zeros(), 1.0));
        assert_eq!(octree.entity_count(), 1);
        assert_eq!(octree.overflow_count(), 0);
    }

    #[test]
    fn test_octree_subdivision() {
        let config = OctreeConfig {
            max_entities_per_node: 4,
            max_depth: 3,
            min_node_size: 1.0,
        };
        let mut octree = Octree::new(world(), config);

        for i in 0..10 {
            octree.insert(Entity::new(i), cube(Vec3::new(i as f32, 0.0, 0.0), 1.0));
        }

        assert_eq!(octree.entity_count(), 10);
        assert!(octree.root.children.is_some());
        assert!(octree.get_all_leaves().len() >= 8);
    }

    #[test]
    fn test_octree_aabb_query() {
        let mut octree = Octree::new(world(), OctreeConfig::default());
        octree.insert(Entity::new(1), cube(Vec3::zeros(), 1.0));
        octree.insert(Entity::new(2), cube(Vec3::new(5.0, 0.0, 0.0), 1.0));
        octree.insert(Entity::new(3), cube(Vec3::new(50.0, 0.0, 0.0), 1.0));

        let mut found = octree.query_aabb(&cube(Vec3::zeros(), 5.0));
        found.sort();
        assert_eq!(found, vec![Entity::new(1), Entity::new(2)]);
    }

    #[test]
    fn test_large_entry_found_across_node_boundary() {
        let config = OctreeConfig {
            max_entities_per_node: 1,
            max_depth: 6,
            min_node_size: 1.0,
        };
        let mut octree = Octree::new(world(), config);
        // Big slab centered just right of the root split, reaching far left
        octree.insert(Entity::new(7), AABB::new(Vec3::new(-40.0, -1.0, -1.0), Vec3::new(42.0, 1.0, 1.0)));
        for i in 0..8 {
            octree.insert(Entity::new(100 + i), cube(Vec3::new(60.0, 60.0, i as f32), 0.5));
        }

        let found = octree.query_aabb(&cube(Vec3::new(-35.0, 0.0, 0.0), 0.5));
        assert_eq!(found, vec![Entity::new(7)]);

        let along = octree.query_segment(Vec3::new(-35.0, 20.0, 0.0), Vec3::new(0.0, -1.0, 0.0), 40.0, 0.0);
        assert_eq!(along, vec![Entity::new(7)]);
    }

    #[test]
    fn test_out_of_bounds_entries_overflow() {
        let mut octree = Octree::new(world(), OctreeConfig::default());
        octree.insert(Entity::new(9), cube(Vec3::new(500.0, 0.0, 0.0), 1.0));
        assert_eq!(octree.overflow_count(), 1);

        let found = octree.query_segment(Vec3::new(400.0, 0.0, 0.0), Vec3::new(1.0, 0.0, 0.0), 200.0, 0.0);
        assert_eq!(found, vec![Entity::new(9)]);

        assert!(octree.remove(Entity::new(9)).is_some());
        assert_eq!(octree.entity_count(), 0);
    }

    #[test]
    fn test_segment_query_respects_length() {
        let mut octree = Octree::new(world(), OctreeConfig::default());
        octree.insert(Entity::new(1), cube(Vec3::new(0.0, 0.0, 5.0), 1.0));

        let dir = Vec3::new(0.0, 0.0, 1.0);
        assert_eq!(octree.query_segment(Vec3::zeros(), dir, 10.0, 0.0), vec![Entity::new(1)]);
        assert!(octree.query_segment(Vec3::zeros(), dir, 3.0, 0.0).is_empty());
        // Inflating by the sweep radius lets a short sweep reach the box
        assert_eq!(octree.query_segment(Vec3::zeros(), dir, 3.0, 1.5), vec![Entity::new(1)]);
    }
}
