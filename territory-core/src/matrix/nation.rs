//! Per-nation records that live outside the dense cell layers.

use serde::{Deserialize, Serialize};

pub type ArrowId = u32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CityType {
    Capital,
    Town,
    Tower,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct City {
    pub x: u32,
    pub y: u32,
    pub name: String,
    pub kind: CityType,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NationStatus {
    Active,
    Defeated,
}

/// A player-directed attack: an ordered waypoint path, a current position
/// along it, a commitment fraction, and a corridor width.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Arrow {
    pub id: ArrowId,
    pub path: Vec<(u32, u32)>,
    pub current_index: usize,
    pub head_x: f32,
    pub head_y: f32,
    pub percent: f32,
    pub corridor_half_width: f32,
    /// Progress (cells) toward the next waypoint; accumulates by
    /// `arrow_advance_rate` per tick when the local corridor is captured.
    pub advance_progress: f32,
}

impl Arrow {
    pub fn new(id: ArrowId, path: Vec<(u32, u32)>, percent: f32, corridor_half_width: f32) -> Self {
        let (head_x, head_y) = path.first().copied().map(|(x, y)| (x as f32, y as f32)).unwrap_or((0.0, 0.0));
        Self {
            id,
            path,
            current_index: 0,
            head_x,
            head_y,
            percent,
            corridor_half_width,
            advance_progress: 0.0,
        }
    }

    /// The two path points straddling `current_index`: the segment the head
    /// currently travels along. Returns `None` once the head has reached the
    /// final waypoint.
    pub fn current_segment(&self) -> Option<((f32, f32), (f32, f32))> {
        let from = *self.path.get(self.current_index)?;
        let to = *self.path.get(self.current_index + 1).unwrap_or(&from);
        Some((
            (from.0 as f32, from.1 as f32),
            (to.0 as f32, to.1 as f32),
        ))
    }

    /// Unit forward direction along the current segment; `(1.0, 0.0)` if the
    /// head has reached the path's end (degenerate segment).
    pub fn forward_direction(&self) -> (f32, f32) {
        match self.current_segment() {
            Some((from, to)) => {
                let dx = to.0 - from.0;
                let dy = to.1 - from.1;
                let len = (dx * dx + dy * dy).sqrt();
                if len < 1e-6 {
                    (1.0, 0.0)
                } else {
                    (dx / len, dy / len)
                }
            }
            None => (1.0, 0.0),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArrowOrders {
    pub attacks: Vec<Arrow>,
}

impl Default for ArrowOrders {
    fn default() -> Self {
        Self { attacks: Vec::new() }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NationRecord {
    /// Duplicated from the registry's owner map so a defeated nation's name
    /// is still readable after its registry slot is retired.
    pub owner: String,
    pub population: f64,
    pub troop_count: f64,
    pub troop_target: f32,
    pub cities: Vec<City>,
    pub arrow_orders: ArrowOrders,
    pub status: NationStatus,
    next_arrow_id: ArrowId,
}

impl NationRecord {
    pub fn new(population: f64, troop_target: f32) -> Self {
        Self {
            owner: String::new(),
            population,
            troop_count: 0.0,
            troop_target,
            cities: Vec::new(),
            arrow_orders: ArrowOrders::default(),
            status: NationStatus::Active,
            next_arrow_id: 1,
        }
    }

    pub fn capital(&self) -> Option<&City> {
        self.cities.iter().find(|c| c.kind == CityType::Capital)
    }

    pub fn allocate_arrow_id(&mut self) -> ArrowId {
        let id = self.next_arrow_id;
        self.next_arrow_id += 1;
        id
    }
}
