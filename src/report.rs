//! Text rendering of rates, bottlenecks, bases and facilities

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use indexmap::IndexMap;

use crate::graph::{BaseRates, ProductionRates, RateMap};
use crate::models::{Base, Facility, ResourceNode};
use crate::planner::Requirement;
use crate::rounding::round_half_up;

/// Global production table with limiting factors
pub struct ProductionReport<'a>(pub &'a ProductionRates);

impl fmt::Display for ProductionReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rates = self.0;
        if rates.production.is_empty() && rates.consumption.is_empty() {
            return writeln!(f, "No production or consumption data available.");
        }

        writeln!(f, "=== Production and Consumption Rates ===")?;
        let items: BTreeSet<&String> = rates.production.keys().chain(rates.consumption.keys()).collect();
        for item in items {
            writeln!(f)?;
            writeln!(f, "{}:", item)?;
            writeln!(f, "  Production:  {:.2}/min", rates.production.get(item).copied().unwrap_or(0.0))?;
            writeln!(f, "  Consumption: {:.2}/min", rates.consumption.get(item).copied().unwrap_or(0.0))?;
            if let Some(limits) = rates.limiting_factors.get(item) {
                writeln!(f, "  Limited by:  {}", limits.join(", "))?;
            }
        }
        Ok(())
    }
}

pub struct BottleneckReport<'a>(pub &'a RateMap);

impl fmt::Display for BottleneckReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return writeln!(f, "No bottlenecks identified.");
        }
        writeln!(f, "Bottlenecks:")?;
        for (item, deficit) in self.0 {
            writeln!(f, "  {}: {} per minute shortage", item, deficit)?;
        }
        Ok(())
    }
}

/// Per-base net production plus what the surplus could feed
pub struct NetProductionReport<'a> {
    pub base: &'a Base,
    pub rates: &'a BaseRates,
    pub net: &'a BTreeMap<String, f64>,
    pub possible: &'a IndexMap<String, u32>,
}

impl fmt::Display for NetProductionReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Net Production Rates for Base: {} ===", self.base.name)?;
        for (item, net) in self.net {
            let produced = self.rates.production.get(item).copied().unwrap_or(0.0);
            let consumed = self.rates.consumption.get(item).copied().unwrap_or(0.0);
            writeln!(
                f,
                "{:<20}: {:>8.2}/min (Production: {:>8.2}/min, Consumption: {:>8.2}/min)",
                item,
                net,
                round_half_up(produced, 2),
                round_half_up(consumed, 2)
            )?;
        }

        writeln!(f)?;
        writeln!(f, "Possible Recipes:")?;
        if self.possible.is_empty() {
            writeln!(f, "No recipes can be crafted with the current net production.")?;
        }
        for (name, crafts) in self.possible {
            writeln!(f, "{:<30}: {} times", name, crafts)?;
        }
        Ok(())
    }
}

/// Recipe inputs checked against a base's net production
pub struct RequirementReport<'a> {
    pub recipe: &'a str,
    pub rows: &'a [Requirement],
}

impl fmt::Display for RequirementReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Recipe: {}", self.recipe)?;
        writeln!(f, "Required items and their net production:")?;
        writeln!(
            f,
            "{:<24} {:>10} {:>10} {:>10}  {}",
            "Item", "Available", "Required", "Net", "Status"
        )?;
        for row in self.rows {
            let status = if row.is_sufficient() { "Sufficient" } else { "Insufficient" };
            writeln!(
                f,
                "{:<24} {:>10.2} {:>10.2} {:>10.2}  {}",
                row.item, row.available, row.required, row.net, status
            )?;
        }
        Ok(())
    }
}

#[derive(Debug, Default)]
struct FacilityTotals {
    count: usize,
    inputs: BTreeMap<String, f64>,
    outputs: BTreeMap<String, f64>,
}

/// Node and facility overview of one base
pub struct BaseSummary<'a>(pub &'a Base);

impl fmt::Display for BaseSummary<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let base = self.0;
        writeln!(f, "ID: {}, Name: {}", base.base_id, base.name)?;

        let mut nodes: BTreeMap<&str, (usize, f64)> = BTreeMap::new();
        for node in base.nodes.values() {
            let entry = nodes.entry(node.resource_type.as_str()).or_default();
            entry.0 += 1;
            entry.1 += node.output_rate();
        }
        writeln!(f, "  Nodes: {}", base.nodes.len())?;
        for (resource, (count, rate)) in &nodes {
            writeln!(f, "    {}: {} ({:.2}/min)", resource, count, rate)?;
        }

        // Nominal recipe rates, ignoring clock speed and active state
        let mut facilities: BTreeMap<&str, FacilityTotals> = BTreeMap::new();
        for facility in base.facilities.values() {
            let totals = facilities.entry(facility.facility_type.as_str()).or_default();
            totals.count += 1;
            for input in &facility.input_items {
                *totals.inputs.entry(input.item.clone()).or_default() += input.rate;
            }
            for output in &facility.output_items {
                *totals.outputs.entry(output.item.clone()).or_default() += output.rate;
            }
        }
        writeln!(f, "  Facilities: {}", base.facilities.len())?;
        for (kind, totals) in &facilities {
            writeln!(f, "    {}: {}", kind, totals.count)?;
            writeln!(f, "      Inputs:")?;
            for (item, rate) in &totals.inputs {
                writeln!(f, "        {}: {:.2}/min", item, rate)?;
            }
            writeln!(f, "      Outputs:")?;
            for (item, rate) in &totals.outputs {
                writeln!(f, "        {}: {:.2}/min", item, rate)?;
            }
        }

        if !base.storage.is_empty() {
            writeln!(f, "  Storage:")?;
            for (item, quantity) in &base.storage {
                writeln!(f, "    {}: {:.2}", item, quantity)?;
            }
        }
        Ok(())
    }
}

pub struct FacilityDetails<'a>(pub &'a Facility);

impl fmt::Display for FacilityDetails<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let facility = self.0;
        writeln!(f, "Facility: {}", facility.facility_id)?;
        writeln!(f, "Type: {}", facility.facility_type)?;
        writeln!(f, "Recipe: {}", facility.recipe)?;
        writeln!(f, "Clock Speed: {}%", facility.clock_speed())?;
        writeln!(f, "State: {}", if facility.is_active { "active" } else { "inactive" })?;

        let (inputs, outputs) = facility.get_adjusted_rates();
        writeln!(f, "Inputs:")?;
        for input in &inputs {
            writeln!(f, "  {}: {:.2} per minute", input.item, input.rate)?;
        }
        writeln!(f, "Outputs:")?;
        for output in &outputs {
            writeln!(f, "  {}: {:.2} per minute", output.item, output.rate)?;
        }
        Ok(())
    }
}

/// One-line-per-node table
pub fn format_nodes<'a>(nodes: impl IntoIterator<Item = (&'a ResourceNode, Option<&'a str>)>) -> String {
    let mut output = format!(
        "{:>4}  {:<20} {:<8} {:<16} {:>8} {:>10}  {}\n",
        "ID", "Resource", "Purity", "Miner", "Clock", "Output", "Base"
    );
    for (node, base) in nodes {
        output.push_str(&format!(
            "{:>4}  {:<20} {:<8} {:<16} {:>7.1}% {:>10.2}  {}\n",
            node.node_id,
            node.resource_type,
            node.purity,
            node.miner_type,
            node.clock_speed(),
            node.output_rate(),
            base.unwrap_or("(unlinked)")
        ));
    }
    output
}
