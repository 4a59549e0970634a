//! Satisfactory production tracker
//!
//! Tracks resource nodes and conversion facilities grouped into bases, and
//! computes per-item production and consumption balances with shortage
//! propagation.

pub mod catalog;
pub mod db;
pub mod error;
pub mod export;
pub mod graph;
pub mod import;
pub mod models;
pub mod parse;
pub mod planner;
pub mod report;
pub mod rounding;

use serde::Serialize;

use crate::models::Facility;

pub use catalog::{GameData, IdAllocator};
pub use error::{Result, TrackerError};
pub use graph::{ProductionGraph, ProductionRates};

/// Everything a tracker invocation loads and saves
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Session {
    pub catalog: GameData,
    pub ids: IdAllocator,
    pub graph: ProductionGraph,
}

impl Session {
    /// Add `count` facilities running a catalog recipe to a base. When a
    /// building is named, the recipe must be one that building runs.
    /// Returns the new facility ids.
    pub fn add_facilities(
        &mut self,
        base_id: u32,
        recipe: &str,
        building: Option<&str>,
        count: u32,
    ) -> Result<Vec<u32>> {
        let recipe = match building {
            Some(building) => self.catalog.recipe_for_building(recipe, building)?,
            None => self.catalog.require_recipe(recipe)?,
        };
        let base = self.graph.require_base_mut(base_id)?;

        let mut added = Vec::new();
        for _ in 0..count {
            let facility_id = self.ids.next_facility_id();
            base.add_facility(Facility::from_recipe(facility_id, recipe.building_type.as_str(), recipe));
            added.push(facility_id);
        }
        Ok(added)
    }

    /// Swap a facility onto another recipe of its own building type
    pub fn edit_facility_recipe(&mut self, base_id: u32, facility_id: u32, recipe: &str) -> Result<()> {
        let facility = self.graph.require_facility_mut(base_id, facility_id)?;
        let recipe = self.catalog.recipe_for_building(recipe, &facility.facility_type)?;
        facility.update_recipe(recipe);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Base, ItemRate};

    fn session() -> Session {
        let mut session = Session::default();
        session.catalog.add_recipe(
            "Iron Ingot",
            "Smelter",
            vec![ItemRate::new("Iron Ore", 30.0)],
            vec![ItemRate::new("Iron Ingot", 30.0)],
        );
        session.catalog.add_recipe(
            "Copper Ingot",
            "Smelter",
            vec![ItemRate::new("Copper Ore", 30.0)],
            vec![ItemRate::new("Copper Ingot", 30.0)],
        );
        session.catalog.add_recipe(
            "Plastic",
            "Refinery",
            vec![ItemRate::new("Crude Oil", 30.0)],
            vec![ItemRate::new("Plastic", 20.0)],
        );
        let base_id = session.ids.next_base_id();
        session.graph.add_base(Base::new(base_id, "Main Base"));
        session
    }

    #[test]
    fn add_facilities_uses_recipe_building() {
        let mut session = session();
        assert_eq!(session.add_facilities(1, "Iron Ingot", None, 3).unwrap(), [1, 2, 3]);
        assert_eq!(session.add_facilities(1, "Plastic", Some("Refinery"), 1).unwrap(), [4]);

        let base = session.graph.base(1).unwrap();
        assert_eq!(base.facilities[&2].facility_type, "Smelter");
        assert_eq!(base.facilities[&4].facility_type, "Refinery");
        assert_eq!(base.facilities[&4].input_items, [ItemRate::new("Crude Oil", 30.0)]);
    }

    #[test]
    fn add_facilities_rejects_wrong_building() {
        let mut session = session();
        assert!(matches!(
            session.add_facilities(1, "Iron Ingot", Some("Refinery"), 2),
            Err(TrackerError::RecipeBuildingMismatch { .. })
        ));
        assert!(session.graph.base(1).unwrap().facilities.is_empty());
        assert_eq!(session.ids.next_facility_id, 1);
    }

    #[test]
    fn edit_recipe_stays_within_building() {
        let mut session = session();
        session.add_facilities(1, "Iron Ingot", None, 1).unwrap();
        session.graph.find_facility_mut(1, 1).unwrap().set_clock_speed(150.0);

        assert!(matches!(
            session.edit_facility_recipe(1, 1, "Plastic"),
            Err(TrackerError::RecipeBuildingMismatch { .. })
        ));
        let facility = &session.graph.base(1).unwrap().facilities[&1];
        assert_eq!(facility.recipe, "Iron Ingot");
        assert_eq!(facility.clock_speed(), 150.0);

        session.edit_facility_recipe(1, 1, "Copper Ingot").unwrap();
        let facility = &session.graph.base(1).unwrap().facilities[&1];
        assert_eq!(facility.recipe, "Copper Ingot");
        assert_eq!(facility.output_items, [ItemRate::new("Copper Ingot", 30.0)]);
        assert_eq!(facility.clock_speed(), 100.0);
    }

    #[test]
    fn edit_recipe_reports_missing_facility() {
        let mut session = session();
        assert!(matches!(
            session.edit_facility_recipe(1, 7, "Copper Ingot"),
            Err(TrackerError::InvalidIdentifier { .. })
        ));
    }
}
