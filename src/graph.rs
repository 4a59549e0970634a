//! Production graph: bases, unlinked nodes and the balancing passes
//!
//! Every per-resource total is rounded to two decimal places after each
//! addition, and all maps iterate in insertion order, so the traversal order
//! below is part of the result.

use indexmap::IndexMap;
use serde::Serialize;

use crate::error::{EntityKind, Result, TrackerError};
use crate::models::{Base, Facility, ResourceNode};
use crate::rounding::{accumulate, round_half_up};

/// Item name to rate per minute
pub type RateMap = IndexMap<String, f64>;

/// Limited item to the shortage resources that limited it
pub type LimitingFactors = IndexMap<String, Vec<String>>;

/// Result of the global aggregation
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductionRates {
    pub production: RateMap,
    pub consumption: RateMap,
    pub limiting_factors: LimitingFactors,
}

/// Result of a single-base aggregation. No shortage adjustment is applied.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BaseRates {
    pub production: RateMap,
    pub consumption: RateMap,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ProductionGraph {
    pub bases: IndexMap<u32, Base>,
    pub unlinked_nodes: IndexMap<u32, ResourceNode>,
}

fn add_rate(totals: &mut RateMap, item: &str, rate: f64) {
    let total = totals.entry(item.to_string()).or_insert(0.0);
    *total = accumulate(*total, rate);
}

impl ProductionGraph {
    pub fn new() -> Self {
        Self::default()
    }

    fn facilities(&self) -> impl Iterator<Item = &Facility> {
        self.bases.values().flat_map(|b| b.facilities.values())
    }

    /// Total production, consumption and limiting factors across every base
    /// and the unlinked pool.
    pub fn calculate_production_rates(&self) -> ProductionRates {
        let mut production = RateMap::new();
        let mut consumption = RateMap::new();

        let nodes = self
            .bases
            .values()
            .flat_map(|b| b.nodes.values())
            .chain(self.unlinked_nodes.values());
        for node in nodes {
            add_rate(&mut production, &node.resource_type, node.output_rate());
        }

        for facility in self.facilities() {
            let (inputs, outputs) = facility.get_adjusted_rates();
            for input in &inputs {
                add_rate(&mut consumption, &input.item, input.rate);
            }
            for output in &outputs {
                add_rate(&mut production, &output.item, output.rate);
            }
        }

        let limiting_factors = self.propagate_shortages(&consumption, &mut production);
        log::debug!(
            "aggregated {} produced and {} consumed resources, {} limited",
            production.len(),
            consumption.len(),
            limiting_factors.len()
        );

        ProductionRates {
            production,
            consumption,
            limiting_factors,
        }
    }

    /// One sweep over consumed resources in insertion order. A resource is
    /// short when its consumption exceeds its production at the moment it is
    /// visited; every facility consuming it has its outputs discounted by the
    /// supply ratio. Resources visited earlier are not revisited, even if a
    /// later discount makes them short.
    fn propagate_shortages(&self, consumption: &RateMap, production: &mut RateMap) -> LimitingFactors {
        let mut limiting_factors = LimitingFactors::new();

        for (item, &consumed) in consumption {
            let produced = production.get(item).copied().unwrap_or(0.0);
            if consumed <= 0.0 || consumed <= produced {
                continue;
            }

            let ratio = round_half_up(produced / consumed, 4);
            log::debug!("{item} is short: {produced}/{consumed} per minute, supply ratio {ratio}");
            limiting_factors.insert(item.clone(), Vec::new());

            for facility in self.facilities() {
                let (inputs, outputs) = facility.get_adjusted_rates();
                if !inputs.iter().any(|i| &i.item == item) {
                    continue;
                }

                for output in outputs {
                    let total = production.entry(output.item.clone()).or_insert(0.0);
                    *total = round_half_up(*total - output.rate * (1.0 - ratio), 2);
                    limiting_factors
                        .entry(output.item)
                        .or_default()
                        .push(item.clone());
                }
            }
        }

        limiting_factors
    }

    /// Resources whose consumption exceeds production, with the deficit
    pub fn identify_bottlenecks(&self) -> RateMap {
        let ProductionRates {
            production,
            consumption,
            ..
        } = self.calculate_production_rates();

        let items = production
            .keys()
            .chain(consumption.keys().filter(|k| !production.contains_key(*k)));

        let mut bottlenecks = RateMap::new();
        for item in items {
            let produced = production.get(item).copied().unwrap_or(0.0);
            let consumed = consumption.get(item).copied().unwrap_or(0.0);
            let deficit = round_half_up(consumed - produced, 2);
            if deficit > 0.0 {
                bottlenecks.insert(item.clone(), deficit);
            }
        }
        bottlenecks
    }

    /// Production and consumption of one base in isolation.
    ///
    /// Unlinked nodes and other bases are left out, and shortages are not
    /// propagated. An unknown base yields empty maps.
    pub fn calculate_production_rates_for_base(&self, base_id: u32) -> BaseRates {
        let mut rates = BaseRates::default();
        let Some(base) = self.bases.get(&base_id) else {
            return rates;
        };

        for node in base.nodes.values() {
            add_rate(&mut rates.production, &node.resource_type, node.output_rate());
        }

        for facility in base.facilities.values() {
            let (inputs, outputs) = facility.get_adjusted_rates();
            for input in &inputs {
                add_rate(&mut rates.consumption, &input.item, input.rate);
            }
            for output in &outputs {
                add_rate(&mut rates.production, &output.item, output.rate);
            }
        }

        rates
    }

    pub fn add_base(&mut self, base: Base) {
        self.bases.insert(base.base_id, base);
    }

    pub fn add_unlinked_node(&mut self, node: ResourceNode) {
        self.unlinked_nodes.insert(node.node_id, node);
    }

    pub fn remove_unlinked_node(&mut self, node_id: u32) -> Option<ResourceNode> {
        self.unlinked_nodes.shift_remove(&node_id)
    }

    /// Add a node to a base, or to the unlinked pool when the base is not
    /// given or does not exist. Returns the base the node landed in.
    pub fn add_node(&mut self, node: ResourceNode, base_id: Option<u32>) -> Option<u32> {
        match base_id.and_then(|id| self.bases.get_mut(&id)) {
            Some(base) => {
                let id = base.base_id;
                base.add_node(node);
                Some(id)
            }
            None => {
                if let Some(id) = base_id {
                    log::warn!("base {id} not found, adding node {} as unlinked", node.node_id);
                }
                self.add_unlinked_node(node);
                None
            }
        }
    }

    pub fn delete_base(&mut self, base_id: u32) {
        self.bases.shift_remove(&base_id);
    }

    /// Remove a node from the first base holding it, else from the unlinked pool
    pub fn delete_node(&mut self, node_id: u32) {
        for base in self.bases.values_mut() {
            if base.nodes.shift_remove(&node_id).is_some() {
                return;
            }
        }
        self.unlinked_nodes.shift_remove(&node_id);
    }

    pub fn delete_facility(&mut self, base_id: u32, facility_id: u32) {
        if let Some(base) = self.bases.get_mut(&base_id) {
            base.facilities.shift_remove(&facility_id);
        }
    }

    /// Move an unlinked node into a base
    pub fn link_node(&mut self, node_id: u32, base_id: u32) -> Result<()> {
        if !self.unlinked_nodes.contains_key(&node_id) {
            return Err(TrackerError::invalid(EntityKind::Node, node_id));
        }
        if !self.bases.contains_key(&base_id) {
            return Err(TrackerError::invalid(EntityKind::Base, base_id));
        }

        if let Some(node) = self.remove_unlinked_node(node_id) {
            self.add_node(node, Some(base_id));
        }
        Ok(())
    }

    pub fn base(&self, base_id: u32) -> Option<&Base> {
        self.bases.get(&base_id)
    }

    pub fn base_mut(&mut self, base_id: u32) -> Option<&mut Base> {
        self.bases.get_mut(&base_id)
    }

    pub fn require_base(&self, base_id: u32) -> Result<&Base> {
        self.base(base_id)
            .ok_or_else(|| TrackerError::invalid(EntityKind::Base, base_id))
    }

    pub fn require_base_mut(&mut self, base_id: u32) -> Result<&mut Base> {
        self.base_mut(base_id)
            .ok_or_else(|| TrackerError::invalid(EntityKind::Base, base_id))
    }

    /// Look a node up in every base, then in the unlinked pool
    pub fn find_node(&self, node_id: u32) -> Option<&ResourceNode> {
        self.bases
            .values()
            .find_map(|b| b.nodes.get(&node_id))
            .or_else(|| self.unlinked_nodes.get(&node_id))
    }

    pub fn find_node_mut(&mut self, node_id: u32) -> Option<&mut ResourceNode> {
        let ProductionGraph {
            bases,
            unlinked_nodes,
        } = self;
        bases
            .values_mut()
            .find_map(|b| b.nodes.get_mut(&node_id))
            .or_else(|| unlinked_nodes.get_mut(&node_id))
    }

    pub fn find_facility_mut(&mut self, base_id: u32, facility_id: u32) -> Option<&mut Facility> {
        self.bases
            .get_mut(&base_id)
            .and_then(|b| b.facilities.get_mut(&facility_id))
    }

    pub fn require_facility_mut(&mut self, base_id: u32, facility_id: u32) -> Result<&mut Facility> {
        let base = self.require_base_mut(base_id)?;
        base.facilities
            .get_mut(&facility_id)
            .ok_or_else(|| TrackerError::invalid(EntityKind::Facility, facility_id))
    }

    /// Every node with its owning base, unlinked pool first, then each base in order
    pub fn all_nodes(&self) -> impl Iterator<Item = (&ResourceNode, Option<&Base>)> {
        self.unlinked_nodes
            .values()
            .map(|n| (n, None))
            .chain(
                self.bases
                    .values()
                    .flat_map(|b| b.nodes.values().map(move |n| (n, Some(b)))),
            )
    }
}
