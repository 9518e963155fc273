//! Fluent test harness for building a [`TerritoryMatrix`] fixture without
//! going through a full map description.

use crate::config::StructuresConfig;
use crate::matrix::nation::{City, CityType, NationRecord};
use crate::matrix::TerritoryMatrix;
use crate::registry::NationIndex;

pub struct MatrixBuilder {
    matrix: TerritoryMatrix,
}

impl MatrixBuilder {
    #[allow(clippy::should_implement_trait)]
    pub fn new(width: u32, height: u32, nation_capacity: usize) -> Self {
        Self { matrix: TerritoryMatrix::new(width, height, nation_capacity) }
    }

    pub fn with_ocean(mut self, x: u32, y: u32) -> Self {
        let i = self.matrix.idx(x, y);
        self.matrix.ocean_mask[i] = 1;
        self.matrix.diffusion_resistance[i] = 1.0;
        self
    }

    pub fn with_region(mut self, x: u32, y: u32, region_id: u16) -> Self {
        let i = self.matrix.idx(x, y);
        self.matrix.region_id[i] = region_id;
        self
    }

    /// Founds a nation with a capital at `(x,y)`, loyalty `1.0` at that cell.
    pub fn with_nation(mut self, owner: &str, x: u32, y: u32, population: f64, troop_target: f32) -> Self {
        let n = self.matrix.registry.allocate(owner).expect("test nation capacity exceeded");
        let mut record = NationRecord::new(population, troop_target);
        record.cities.push(City { x, y, name: format!("{owner} capital"), kind: CityType::Capital });
        self.matrix.nations[n as usize] = Some(record);
        self.matrix.set_owner(x, y, n);
        self.matrix.loyalty[self.matrix.nation_idx(x, y, n)] = 1.0;
        self
    }

    /// Owns `(x,y)` for `owner` (must already exist) without touching loyalty.
    pub fn with_owned_cell(mut self, owner: &str, x: u32, y: u32) -> Self {
        let n = self.index_of(owner);
        self.matrix.set_owner(x, y, n);
        self
    }

    pub fn with_loyalty(mut self, owner: &str, x: u32, y: u32, value: f32) -> Self {
        let n = self.index_of(owner);
        let i = self.matrix.nation_idx(x, y, n);
        self.matrix.loyalty[i] = value;
        self
    }

    pub fn with_troop_density(mut self, owner: &str, x: u32, y: u32, density: f32) -> Self {
        let n = self.index_of(owner);
        let i = self.matrix.nation_idx(x, y, n);
        self.matrix.troop_density[i] = density;
        self
    }

    pub fn with_city(mut self, owner: &str, x: u32, y: u32, name: &str, kind: CityType) -> Self {
        let n = self.index_of(owner);
        if let Some(record) = self.matrix.nations[n as usize].as_mut() {
            record.cities.push(City { x, y, name: name.to_string(), kind });
        }
        self
    }

    fn index_of(&self, owner: &str) -> NationIndex {
        self.matrix.registry.index_of(owner).expect("unknown test owner")
    }

    pub fn build(self) -> TerritoryMatrix {
        self.matrix
    }
}

pub fn default_structures() -> StructuresConfig {
    StructuresConfig::default()
}
