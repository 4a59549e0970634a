//! Catalog of resource, miner and building types, recipe templates, and the
//! identifier allocator handed to everything that creates entities.

use serde::Serialize;

use crate::error::{Result, TrackerError};
use crate::models::{BuildingType, ItemRate, MinerType, Recipe, ResourceType};

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GameData {
    pub resource_types: Vec<ResourceType>,
    pub miner_types: Vec<MinerType>,
    pub building_types: Vec<BuildingType>,
    pub recipes: Vec<Recipe>,
}

impl GameData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_resource_type(&mut self, name: impl Into<String>) {
        self.resource_types.push(ResourceType { name: name.into() });
    }

    pub fn add_miner_type(&mut self, name: impl Into<String>, base_rate: f64) {
        self.miner_types.push(MinerType {
            name: name.into(),
            base_rate,
        });
    }

    pub fn add_building_type(&mut self, name: impl Into<String>) {
        self.building_types.push(BuildingType { name: name.into() });
    }

    pub fn add_recipe(
        &mut self,
        name: impl Into<String>,
        building_type: impl Into<String>,
        inputs: Vec<ItemRate>,
        outputs: Vec<ItemRate>,
    ) {
        self.recipes.push(Recipe {
            name: name.into(),
            building_type: building_type.into(),
            inputs,
            outputs,
        });
    }

    pub fn delete_resource_type(&mut self, name: &str) {
        self.resource_types.retain(|r| r.name != name);
    }

    pub fn delete_miner_type(&mut self, name: &str) {
        self.miner_types.retain(|m| m.name != name);
    }

    pub fn delete_building_type(&mut self, name: &str) {
        self.building_types.retain(|b| b.name != name);
    }

    pub fn delete_recipe(&mut self, name: &str) {
        self.recipes.retain(|r| r.name != name);
    }

    /// First recipe with the given name
    pub fn recipe(&self, name: &str) -> Option<&Recipe> {
        self.recipes.iter().find(|r| r.name == name)
    }

    pub fn require_recipe(&self, name: &str) -> Result<&Recipe> {
        self.recipe(name)
            .ok_or_else(|| TrackerError::UnknownRecipe(name.to_string()))
    }

    pub fn miner(&self, name: &str) -> Option<&MinerType> {
        self.miner_types.iter().find(|m| m.name == name)
    }

    pub fn require_miner(&self, name: &str) -> Result<&MinerType> {
        self.miner(name)
            .ok_or_else(|| TrackerError::UnknownMiner(name.to_string()))
    }

    pub fn recipes_for_building<'a>(&'a self, building_type: &str) -> impl Iterator<Item = &'a Recipe> {
        self.recipes
            .iter()
            .filter(move |r| r.building_type == building_type)
    }

    /// Recipe with the given name among those `building_type` can run
    pub fn recipe_for_building(&self, name: &str, building_type: &str) -> Result<&Recipe> {
        if let Some(recipe) = self.recipes_for_building(building_type).find(|r| r.name == name) {
            return Ok(recipe);
        }
        match self.recipe(name) {
            Some(other) => Err(TrackerError::RecipeBuildingMismatch {
                recipe: name.to_string(),
                building: building_type.to_string(),
                expected: other.building_type.clone(),
            }),
            None => Err(TrackerError::UnknownRecipe(name.to_string())),
        }
    }
}

/// Monotonic identifier counters for bases, nodes and facilities
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct IdAllocator {
    pub next_base_id: u32,
    pub next_node_id: u32,
    pub next_facility_id: u32,
}

impl Default for IdAllocator {
    fn default() -> Self {
        Self {
            next_base_id: 1,
            next_node_id: 1,
            next_facility_id: 1,
        }
    }
}

impl IdAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_base_id(&mut self) -> u32 {
        let id = self.next_base_id;
        self.next_base_id += 1;
        id
    }

    pub fn next_node_id(&mut self) -> u32 {
        let id = self.next_node_id;
        self.next_node_id += 1;
        id
    }

    pub fn next_facility_id(&mut self) -> u32 {
        let id = self.next_facility_id;
        self.next_facility_id += 1;
        id
    }
}
