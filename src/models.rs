//! Data models for resource nodes, facilities, bases and catalog entries
//!
//! All rates are items per minute.

use std::fmt;
use std::str::FromStr;

use indexmap::IndexMap;
use serde::Serialize;

use crate::error::TrackerError;

pub const DEFAULT_CLOCK_SPEED: f64 = 100.0;
pub const MIN_CLOCK_SPEED: f64 = 0.001;
pub const MAX_CLOCK_SPEED: f64 = 250.0;

/// Clamp a clock speed percentage into the allowed range.
///
/// Out-of-range values are pulled to the nearest bound rather than rejected.
/// NaN ends up at the lower bound.
pub fn clamp_clock_speed(clock_speed: f64) -> f64 {
    clock_speed.max(MIN_CLOCK_SPEED).min(MAX_CLOCK_SPEED)
}

/// Purity tier of a resource node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Purity {
    Impure,
    Normal,
    Pure,
}

impl Purity {
    pub const ALL: [Purity; 3] = [Purity::Impure, Purity::Normal, Purity::Pure];

    /// Extraction multiplier applied to the miner's base rate
    pub fn multiplier(self) -> f64 {
        match self {
            Purity::Impure => 0.5,
            Purity::Normal => 1.0,
            Purity::Pure => 2.0,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Purity::Impure => "Impure",
            Purity::Normal => "Normal",
            Purity::Pure => "Pure",
        }
    }
}

impl fmt::Display for Purity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for Purity {
    type Err = TrackerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Purity::ALL
            .into_iter()
            .find(|p| p.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| TrackerError::UnknownPurity(s.to_string()))
    }
}

/// One weighted item entry of a facility or recipe
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ItemRate {
    pub item: String,
    pub rate: f64,
}

impl ItemRate {
    pub fn new(item: impl Into<String>, rate: f64) -> Self {
        Self {
            item: item.into(),
            rate,
        }
    }
}

impl fmt::Display for ItemRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} @ {:.2}/min", self.item, self.rate)
    }
}

/// A resource node with a miner attached
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResourceNode {
    pub node_id: u32,
    pub resource_type: String,
    pub purity: Purity,
    pub miner_type: String,
    pub miner_rate: f64, // Base extraction rate of the miner
    clock_speed: f64,
    output_rate: f64, // Cached, refreshed on every clock change
}

impl ResourceNode {
    pub fn new(
        node_id: u32,
        resource_type: impl Into<String>,
        purity: Purity,
        miner_type: impl Into<String>,
        miner_rate: f64,
    ) -> Self {
        let mut node = Self {
            node_id,
            resource_type: resource_type.into(),
            purity,
            miner_type: miner_type.into(),
            miner_rate,
            clock_speed: DEFAULT_CLOCK_SPEED,
            output_rate: 0.0,
        };
        node.output_rate = node.calculate_output_rate();
        node
    }

    pub fn calculate_output_rate(&self) -> f64 {
        self.purity.multiplier() * self.miner_rate * (self.clock_speed / 100.0)
    }

    pub fn set_clock_speed(&mut self, clock_speed: f64) {
        self.clock_speed = clamp_clock_speed(clock_speed);
        self.output_rate = self.calculate_output_rate();
    }

    pub fn clock_speed(&self) -> f64 {
        self.clock_speed
    }

    pub fn output_rate(&self) -> f64 {
        self.output_rate
    }
}

/// A production building running a recipe
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Facility {
    pub facility_id: u32,
    pub facility_type: String,
    pub recipe: String, // Recipe name only, the catalog owns the template
    pub input_items: Vec<ItemRate>,
    pub output_items: Vec<ItemRate>,
    clock_speed: f64,
    pub is_active: bool,
}

impl Facility {
    pub fn new(facility_id: u32, facility_type: impl Into<String>, recipe: impl Into<String>) -> Self {
        Self {
            facility_id,
            facility_type: facility_type.into(),
            recipe: recipe.into(),
            input_items: Vec::new(),
            output_items: Vec::new(),
            clock_speed: DEFAULT_CLOCK_SPEED,
            is_active: true,
        }
    }

    /// Build a facility whose items are copied from a recipe template
    pub fn from_recipe(facility_id: u32, facility_type: impl Into<String>, recipe: &Recipe) -> Self {
        let mut facility = Self::new(facility_id, facility_type, recipe.name.clone());
        for input in &recipe.inputs {
            facility.set_input_item(input.item.clone(), input.rate);
        }
        for output in &recipe.outputs {
            facility.set_output_item(output.item.clone(), output.rate);
        }
        facility
    }

    /// Append an input entry. Repeated items stay as separate entries.
    pub fn set_input_item(&mut self, item: impl Into<String>, rate: f64) {
        self.input_items.push(ItemRate::new(item, rate));
    }

    /// Append an output entry. Repeated items stay as separate entries.
    pub fn set_output_item(&mut self, item: impl Into<String>, rate: f64) {
        self.output_items.push(ItemRate::new(item, rate));
    }

    pub fn set_clock_speed(&mut self, clock_speed: f64) {
        self.clock_speed = clamp_clock_speed(clock_speed);
    }

    pub fn clock_speed(&self) -> f64 {
        self.clock_speed
    }

    pub fn toggle_active_state(&mut self) {
        self.is_active = !self.is_active;
    }

    /// Input and output rates scaled by clock speed, both empty when inactive
    pub fn get_adjusted_rates(&self) -> (Vec<ItemRate>, Vec<ItemRate>) {
        if !self.is_active {
            return (Vec::new(), Vec::new());
        }

        let factor = self.clock_speed / 100.0;
        let scale = |items: &[ItemRate]| {
            items
                .iter()
                .map(|i| ItemRate::new(i.item.clone(), i.rate * factor))
                .collect::<Vec<_>>()
        };
        (scale(&self.input_items), scale(&self.output_items))
    }

    /// Swap in a new recipe. Both item lists are replaced and the clock resets to 100%.
    pub fn update_recipe(&mut self, recipe: &Recipe) {
        self.recipe = recipe.name.clone();
        self.input_items = recipe.inputs.clone();
        self.output_items = recipe.outputs.clone();
        self.clock_speed = DEFAULT_CLOCK_SPEED;
    }

    /// Restore a facility exactly as it was saved
    pub(crate) fn restore(
        facility_id: u32,
        facility_type: String,
        recipe: String,
        input_items: Vec<ItemRate>,
        output_items: Vec<ItemRate>,
        clock_speed: f64,
        is_active: bool,
    ) -> Self {
        Self {
            facility_id,
            facility_type,
            recipe,
            input_items,
            output_items,
            clock_speed: clamp_clock_speed(clock_speed),
            is_active,
        }
    }
}

/// A named site that owns nodes and facilities
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Base {
    pub base_id: u32,
    pub name: String,
    pub nodes: IndexMap<u32, ResourceNode>,
    pub facilities: IndexMap<u32, Facility>,
    pub storage: IndexMap<String, f64>, // Bookkeeping only, not read by the balancer
}

impl Base {
    pub fn new(base_id: u32, name: impl Into<String>) -> Self {
        Self {
            base_id,
            name: name.into(),
            nodes: IndexMap::new(),
            facilities: IndexMap::new(),
            storage: IndexMap::new(),
        }
    }

    /// Insert a node, replacing any node with the same id
    pub fn add_node(&mut self, node: ResourceNode) {
        self.nodes.insert(node.node_id, node);
    }

    /// Insert a facility, replacing any facility with the same id
    pub fn add_facility(&mut self, facility: Facility) {
        self.facilities.insert(facility.facility_id, facility);
    }

    pub fn update_storage(&mut self, item: &str, quantity: f64) {
        *self.storage.entry(item.to_string()).or_insert(0.0) += quantity;
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResourceType {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MinerType {
    pub name: String,
    pub base_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BuildingType {
    pub name: String,
}

/// Recipe template from the catalog
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Recipe {
    pub name: String,
    pub building_type: String,
    pub inputs: Vec<ItemRate>,
    pub outputs: Vec<ItemRate>,
}
