//! The dense per-cell state store (component A).
//!
//! `TerritoryMatrix` owns every typed-array layer plus the nation registry,
//! per-nation records, running counters and the chunk grid. Ownership is
//! only ever written through [`TerritoryMatrix::set_owner`], the single
//! centralized mutator described in the component design — it is the only
//! place that keeps `owned_cell_count`, `nation_bbox` and the chunk dirty
//! flags consistent with `ownership`.

pub mod chunks;
pub mod nation;

use crate::registry::{NationIndex, NationRegistry, UNOWNED};
use chunks::ChunkGrid;
pub use nation::{Arrow, ArrowId, City, CityType, NationRecord, NationStatus};

/// Monotonically-grown bounding box over a nation's owned cells.
///
/// `dirty` is set on loss (a cell the box may have depended on changed
/// owner) so a lazy shrink pass can recompute the tight box later; growth on
/// claim never needs recomputation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BBox {
    pub min_x: u32,
    pub min_y: u32,
    pub max_x: u32,
    pub max_y: u32,
    pub dirty: bool,
}

impl BBox {
    pub fn empty() -> Self {
        Self {
            min_x: u32::MAX,
            min_y: u32::MAX,
            max_x: 0,
            max_y: 0,
            dirty: false,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.min_x > self.max_x || self.min_y > self.max_y
    }

    pub fn grow(&mut self, x: u32, y: u32) {
        if self.is_empty() {
            self.min_x = x;
            self.max_x = x;
            self.min_y = y;
            self.max_y = y;
        } else {
            self.min_x = self.min_x.min(x);
            self.max_x = self.max_x.max(x);
            self.min_y = self.min_y.min(y);
            self.max_y = self.max_y.max(y);
        }
    }

    /// Expands the box by `margin` cells, clamped to `[0, width)x[0, height)`.
    pub fn expanded(&self, margin: i64, width: u32, height: u32) -> BBox {
        if self.is_empty() {
            return *self;
        }
        let min_x = (self.min_x as i64 - margin).max(0) as u32;
        let min_y = (self.min_y as i64 - margin).max(0) as u32;
        let max_x = ((self.max_x as i64 + margin).max(0) as u32).min(width.saturating_sub(1));
        let max_y = ((self.max_y as i64 + margin).max(0) as u32).min(height.saturating_sub(1));
        BBox {
            min_x,
            min_y,
            max_x,
            max_y,
            dirty: self.dirty,
        }
    }

    pub fn union(&self, other: &BBox) -> BBox {
        if self.is_empty() {
            return *other;
        }
        if other.is_empty() {
            return *self;
        }
        BBox {
            min_x: self.min_x.min(other.min_x),
            min_y: self.min_y.min(other.min_y),
            max_x: self.max_x.max(other.max_x),
            max_y: self.max_y.max(other.max_y),
            dirty: self.dirty || other.dirty,
        }
    }
}

#[derive(Debug, Clone)]
pub struct TerritoryMatrix {
    pub width: u32,
    pub height: u32,
    pub nation_capacity: usize,

    pub registry: NationRegistry,
    pub nations: Vec<Option<NationRecord>>,

    // --- cell-indexed layers (len = width*height) ---
    pub ownership: Vec<i8>,
    pub prev_ownership: Vec<i8>,
    pub biome_index: Vec<u8>,
    pub elevation: Vec<f32>,
    pub moisture: Vec<f32>,
    pub ocean_mask: Vec<u8>,
    pub is_river: Vec<u8>,
    pub resource_type: Vec<u8>,
    pub resource_level: Vec<u8>,
    pub resource_claim_owner: Vec<i8>,
    pub resource_claim_progress: Vec<f32>,
    /// The nation whose progress is currently accruing at each cell —
    /// distinct from `resource_claim_owner`, which only ever holds a
    /// *finalized* claimant. Lets the claim system detect a direct
    /// rival-to-rival capture (not just a drop to `UNOWNED`) and reset.
    pub resource_claim_progress_owner: Vec<i8>,
    pub population_density: Vec<f32>,
    pub defense_strength: Vec<f32>,
    pub diffusion_resistance: Vec<f32>,
    /// Static, externally-supplied regional partition id; `0` everywhere
    /// when no region metadata was provided (regional boosts then degenerate
    /// to a single global region).
    pub region_id: Vec<u16>,

    // --- nation-cell layers (len = width*height*nation_capacity) ---
    pub loyalty: Vec<f32>,
    pub troop_density: Vec<f32>,

    // --- running counters ---
    pub owned_cell_count: Vec<i32>,
    pub troop_density_sum: Vec<f64>,
    pub nation_bbox: Vec<BBox>,

    pub chunks: ChunkGrid,
}

impl TerritoryMatrix {
    pub fn new(width: u32, height: u32, nation_capacity: usize) -> Self {
        let cells = (width as usize) * (height as usize);
        let stride = cells * nation_capacity;
        Self {
            width,
            height,
            nation_capacity,
            registry: NationRegistry::new(nation_capacity),
            nations: vec![None; nation_capacity],
            ownership: vec![UNOWNED; cells],
            prev_ownership: vec![UNOWNED; cells],
            biome_index: vec![0; cells],
            elevation: vec![0.0; cells],
            moisture: vec![0.0; cells],
            ocean_mask: vec![0; cells],
            is_river: vec![0; cells],
            resource_type: vec![0; cells],
            resource_level: vec![0; cells],
            resource_claim_owner: vec![UNOWNED; cells],
            resource_claim_progress: vec![0.0; cells],
            resource_claim_progress_owner: vec![UNOWNED; cells],
            population_density: vec![0.0; cells],
            defense_strength: vec![1.0; cells],
            diffusion_resistance: vec![0.0; cells],
            region_id: vec![0; cells],
            loyalty: vec![0.0; stride],
            troop_density: vec![0.0; stride],
            owned_cell_count: vec![0; nation_capacity],
            troop_density_sum: vec![0.0; nation_capacity],
            nation_bbox: vec![BBox::empty(); nation_capacity],
            chunks: ChunkGrid::new(width, height),
        }
    }

    #[inline]
    pub fn cells(&self) -> usize {
        (self.width as usize) * (self.height as usize)
    }

    #[inline]
    pub fn in_bounds(&self, x: i64, y: i64) -> bool {
        x >= 0 && y >= 0 && (x as u32) < self.width && (y as u32) < self.height
    }

    #[inline]
    pub fn idx(&self, x: u32, y: u32) -> usize {
        (y as usize) * (self.width as usize) + (x as usize)
    }

    #[inline]
    pub fn nation_idx(&self, x: u32, y: u32, n: NationIndex) -> usize {
        debug_assert!(n >= 0, "nation_idx called with UNOWNED");
        (n as usize) * self.cells() + self.idx(x, y)
    }

    #[inline]
    pub fn owner(&self, x: u32, y: u32) -> NationIndex {
        self.ownership[self.idx(x, y)]
    }

    #[inline]
    pub fn is_ocean(&self, x: u32, y: u32) -> bool {
        self.ocean_mask[self.idx(x, y)] != 0
    }

    #[inline]
    pub fn loyalty_at(&self, x: u32, y: u32, n: NationIndex) -> f32 {
        self.loyalty[self.nation_idx(x, y, n)]
    }

    #[inline]
    pub fn troop_density_at(&self, x: u32, y: u32, n: NationIndex) -> f32 {
        self.troop_density[self.nation_idx(x, y, n)]
    }

    /// The 4-connected in-bounds neighbours of `(x,y)`.
    pub fn neighbors4(&self, x: u32, y: u32) -> impl Iterator<Item = (u32, u32)> + '_ {
        const DELTAS: [(i64, i64); 4] = [(1, 0), (-1, 0), (0, 1), (0, -1)];
        DELTAS.iter().filter_map(move |&(dx, dy)| {
            let nx = x as i64 + dx;
            let ny = y as i64 + dy;
            self.in_bounds(nx, ny).then_some((nx as u32, ny as u32))
        })
    }

    /// The 8-connected in-bounds neighbours of `(x,y)`.
    pub fn neighbors8(&self, x: u32, y: u32) -> impl Iterator<Item = (u32, u32)> + '_ {
        const DELTAS: [(i64, i64); 8] = [
            (1, 0),
            (-1, 0),
            (0, 1),
            (0, -1),
            (1, 1),
            (1, -1),
            (-1, 1),
            (-1, -1),
        ];
        DELTAS.iter().filter_map(move |&(dx, dy)| {
            let nx = x as i64 + dx;
            let ny = y as i64 + dy;
            self.in_bounds(nx, ny).then_some((nx as u32, ny as u32))
        })
    }

    /// The single centralized mutator for ownership changes (component A).
    ///
    /// Atomically updates `owned_cell_count`, `nation_bbox` and the
    /// enclosing chunk's dirty/sleep state alongside the `ownership` write.
    /// This is the only place allowed to touch `ownership`.
    pub fn set_owner(&mut self, x: u32, y: u32, new: NationIndex) {
        let i = self.idx(x, y);
        let old = self.ownership[i];
        if old == new {
            return;
        }
        if old >= 0 {
            self.owned_cell_count[old as usize] -= 1;
            self.nation_bbox[old as usize].dirty = true;
        }
        if new >= 0 {
            self.owned_cell_count[new as usize] += 1;
            self.nation_bbox[new as usize].grow(x, y);
        }
        self.ownership[i] = new;
        self.chunks.mark_dirty_cell(x, y);
    }

    /// Copies `ownership` into `prevOwnership`; the delta pass diffs against this.
    pub fn snapshot_ownership(&mut self) {
        self.prev_ownership.copy_from_slice(&self.ownership);
    }

    /// Recomputes `owned_cell_count` and `nation_bbox` by scanning `ownership`
    /// from scratch. Used after deserialization.
    pub fn rebuild_counters_from_ownership(&mut self) {
        self.owned_cell_count.iter_mut().for_each(|c| *c = 0);
        self.nation_bbox.iter_mut().for_each(|b| *b = BBox::empty());
        for y in 0..self.height {
            for x in 0..self.width {
                let owner = self.owner(x, y);
                if owner >= 0 {
                    self.owned_cell_count[owner as usize] += 1;
                    self.nation_bbox[owner as usize].grow(x, y);
                }
            }
        }
    }

    /// Recomputes each chunk's `has_border` flag: a chunk has a border if any
    /// of its cells has a 4-neighbour that is out-of-map, ocean, or a
    /// different (possibly unowned) owner. Used after deserialization.
    pub fn rebuild_chunk_border_flags(&mut self) {
        let n = self.chunks.dirty.len();
        let mut border = vec![false; n];
        for y in 0..self.height {
            for x in 0..self.width {
                let is_border = self.is_border_cell(x, y);
                if is_border {
                    let ci = self.chunks.chunk_index_for_cell(x, y);
                    border[ci] = true;
                }
            }
        }
        for (i, b) in border.into_iter().enumerate() {
            self.chunks.set_has_border(i, b);
        }
    }

    /// `true` if `(x,y)` differs in owner from some 4-neighbour, including
    /// the map edge (treated as a perpetual border).
    pub fn is_border_cell(&self, x: u32, y: u32) -> bool {
        let owner = self.owner(x, y);
        let mut count = 0;
        for (nx, ny) in self.neighbors4(x, y) {
            count += 1;
            if self.owner(nx, ny) != owner || self.is_ocean(nx, ny) {
                return true;
            }
        }
        count < 4
    }

    /// Defeats a nation: ownership, loyalty, troop density and resource
    /// claims are all reset and the registry index retired (never reused
    /// until matrix re-creation), but the record itself survives with its
    /// status flipped to `Defeated` so its owner name and history stay
    /// queryable.
    pub fn remove_nation(&mut self, n: NationIndex) {
        if n < 0 {
            return;
        }
        let owned: Vec<(u32, u32)> = (0..self.height)
            .flat_map(|y| (0..self.width).map(move |x| (x, y)))
            .filter(|&(x, y)| self.owner(x, y) == n)
            .collect();
        for (x, y) in owned {
            self.set_owner(x, y, UNOWNED);
        }
        let cells = self.cells();
        let base = (n as usize) * cells;
        for i in 0..cells {
            self.loyalty[base + i] = 0.0;
            self.troop_density[base + i] = 0.0;
        }
        for claim in self.resource_claim_owner.iter_mut() {
            if *claim == n {
                *claim = UNOWNED;
            }
        }
        for claimant in self.resource_claim_progress_owner.iter_mut() {
            if *claimant == n {
                *claimant = UNOWNED;
            }
        }
        self.troop_density_sum[n as usize] = 0.0;
        self.nation_bbox[n as usize] = BBox::empty();
        self.registry.retire(n);
        if let Some(record) = self.nations[n as usize].as_mut() {
            record.status = NationStatus::Defeated;
            record.arrow_orders.attacks.clear();
        }
    }
}
