//! Multi-stage chains through the global and per-base aggregations.

use satisfactory_tracker::graph::ProductionGraph;
use satisfactory_tracker::models::{Base, Facility, Purity, ResourceNode};

fn assert_close(actual: Option<&f64>, expected: f64, item: &str) {
    let actual = actual.copied().unwrap_or(0.0);
    assert!(
        (actual - expected).abs() < 0.005,
        "{item}: expected {expected}, got {actual}"
    );
}

fn facility(id: u32, kind: &str, recipe: &str, inputs: &[(&str, f64)], outputs: &[(&str, f64)]) -> Facility {
    let mut f = Facility::new(id, kind, recipe);
    for (item, rate) in inputs {
        f.set_input_item(*item, *rate);
    }
    for (item, rate) in outputs {
        f.set_output_item(*item, *rate);
    }
    f
}

fn with_clock(mut f: Facility, clock_speed: f64) -> Facility {
    f.set_clock_speed(clock_speed);
    f
}

/// Copper and oil processing up to computers
fn computer_factory() -> ProductionGraph {
    let mut base = Base::new(1, "Main Base");
    base.add_node(ResourceNode::new(1, "Copper Ore", Purity::Normal, "Miner Mk.2", 120.0));
    base.add_node(ResourceNode::new(2, "Copper Ore", Purity::Normal, "Miner Mk.2", 120.0));
    base.add_node(ResourceNode::new(3, "Crude Oil", Purity::Normal, "Oil Extractor", 60.0));
    base.add_node(ResourceNode::new(4, "Crude Oil", Purity::Normal, "Oil Extractor", 120.0));
    base.add_node(ResourceNode::new(5, "Crude Oil", Purity::Normal, "Oil Extractor", 120.0));

    for id in 10..15 {
        base.add_facility(facility(id, "Smelter", "Copper Ingot", &[("Copper Ore", 30.0)], &[("Copper Ingot", 30.0)]));
    }

    let wire = |id| facility(id, "Constructor", "Wire", &[("Copper Ingot", 15.0)], &[("Wire", 30.0)]);
    base.add_facility(wire(15));
    base.add_facility(wire(16));
    base.add_facility(with_clock(wire(17), 66.666666));

    for id in 20..24 {
        base.add_facility(facility(id, "Constructor", "Copper Sheet", &[("Copper Ingot", 20.0)], &[("Copper Sheet", 10.0)]));
    }

    base.add_facility(with_clock(
        facility(24, "Constructor", "Cable", &[("Wire", 60.0)], &[("Cable", 30.0)]),
        133.3333333,
    ));

    let plastic = |id| {
        facility(
            id,
            "Refinery",
            "Plastic",
            &[("Crude Oil", 30.0)],
            &[("Plastic", 20.0), ("Heavy Oil Residue", 10.0)],
        )
    };
    base.add_facility(with_clock(plastic(25), 200.0));
    base.add_facility(with_clock(plastic(26), 150.0));
    base.add_facility(with_clock(plastic(27), 250.0));

    base.add_facility(with_clock(
        facility(
            28,
            "Assembler",
            "Circuit Board",
            &[("Copper Sheet", 15.0), ("Plastic", 30.0)],
            &[("Circuit Board", 7.5)],
        ),
        133.33333333,
    ));
    base.add_facility(facility(29, "Refinery", "Residual Fuel", &[("Heavy Oil Residue", 60.0)], &[("Fuel", 40.0)]));
    base.add_facility(facility(
        30,
        "Manufacturer",
        "Computer",
        &[("Circuit Board", 10.0), ("Cable", 20.0), ("Plastic", 40.0)],
        &[("Computer", 2.5)],
    ));

    let mut graph = ProductionGraph::new();
    graph.add_base(base);
    graph
}

#[test]
fn computer_factory_balances() {
    let graph = computer_factory();
    let rates = graph.calculate_production_rates();

    for (item, expected) in [
        ("Copper Ore", 240.0),
        ("Crude Oil", 300.0),
        ("Copper Ingot", 150.0),
        ("Wire", 80.0),
        ("Copper Sheet", 40.0),
        ("Cable", 40.0),
        ("Plastic", 120.0),
        ("Heavy Oil Residue", 60.0),
        ("Circuit Board", 10.0),
        ("Computer", 2.5),
        ("Fuel", 40.0),
    ] {
        assert_close(rates.production.get(item), expected, item);
    }

    for (item, expected) in [
        ("Copper Ore", 150.0),
        ("Crude Oil", 180.0),
        ("Copper Ingot", 120.0),
        ("Wire", 80.0),
        ("Copper Sheet", 20.0),
        ("Cable", 20.0),
        ("Plastic", 80.0),
        ("Heavy Oil Residue", 60.0),
        ("Circuit Board", 10.0),
    ] {
        assert_close(rates.consumption.get(item), expected, item);
    }

    assert!(rates.limiting_factors.is_empty());
    assert!(graph.identify_bottlenecks().is_empty());
}

#[test]
fn underclocked_manufacturer_consumes_less() {
    let mut graph = computer_factory();
    graph
        .find_facility_mut(1, 30)
        .unwrap()
        .set_clock_speed(50.0);

    let rates = graph.calculate_production_rates();
    assert_close(rates.consumption.get("Circuit Board"), 5.0, "Circuit Board");
    assert_close(rates.consumption.get("Cable"), 10.0, "Cable");
    assert_close(rates.consumption.get("Plastic"), 60.0, "Plastic");
    assert_close(rates.production.get("Computer"), 1.25, "Computer");

    for (item, consumed) in &rates.consumption {
        let produced = rates.production.get(item).copied().unwrap_or(0.0);
        assert!(produced >= *consumed, "{item}: {produced} < {consumed}");
    }
}

#[test]
fn base_rates_match_global_without_shortages() {
    let graph = computer_factory();
    let global = graph.calculate_production_rates();
    let base = graph.calculate_production_rates_for_base(1);

    assert_eq!(base.production, global.production);
    assert_eq!(base.consumption, global.consumption);
}

#[test]
fn shortage_only_propagates_forward_in_one_sweep() {
    // The plate constructor is registered before the smelter, so Iron Ingot
    // is checked before Iron Ore makes it short. Plates keep their full rate.
    let mut base = Base::new(1, "Iron Works");
    base.add_node(ResourceNode::new(1, "Iron Ore", Purity::Normal, "Miner Mk.1", 30.0));
    base.add_facility(facility(1, "Constructor", "Iron Plate", &[("Iron Ingot", 30.0)], &[("Iron Plate", 20.0)]));
    base.add_facility(facility(2, "Smelter", "Iron Ingot", &[("Iron Ore", 60.0)], &[("Iron Ingot", 30.0)]));

    let mut graph = ProductionGraph::new();
    graph.add_base(base);
    let rates = graph.calculate_production_rates();

    let production: Vec<_> = rates.production.iter().map(|(k, v)| (k.as_str(), *v)).collect();
    assert_eq!(production, [("Iron Ore", 30.0), ("Iron Plate", 20.0), ("Iron Ingot", 15.0)]);

    let limits: Vec<_> = rates.limiting_factors.keys().map(String::as_str).collect();
    assert_eq!(limits, ["Iron Ore", "Iron Ingot"]);
    assert_eq!(rates.limiting_factors["Iron Ingot"], ["Iron Ore"]);
    assert!(!rates.limiting_factors.contains_key("Iron Plate"));

    let bottlenecks = graph.identify_bottlenecks();
    assert_eq!(bottlenecks.get("Iron Ore"), Some(&30.0));
    assert_eq!(bottlenecks.get("Iron Ingot"), Some(&15.0));
    assert_eq!(bottlenecks.len(), 2);
}

#[test]
fn unlinked_nodes_count_globally_only() {
    let mut graph = ProductionGraph::new();
    let mut base = Base::new(1, "Coal Plant");
    base.add_node(ResourceNode::new(1, "Coal", Purity::Pure, "Miner Mk.1", 60.0));
    graph.add_base(base);
    graph.add_unlinked_node(ResourceNode::new(2, "Coal", Purity::Impure, "Miner Mk.2", 60.0));

    assert_eq!(graph.calculate_production_rates().production["Coal"], 150.0);
    assert_eq!(graph.calculate_production_rates_for_base(1).production["Coal"], 120.0);

    graph.link_node(2, 1).unwrap();
    assert_eq!(graph.calculate_production_rates_for_base(1).production["Coal"], 150.0);
}
