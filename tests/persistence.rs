//! Saving and reloading a tracker session through SQLite.

use rusqlite::Connection;

use satisfactory_tracker::models::{Base, Facility, Purity, ResourceNode};
use satisfactory_tracker::parse::parse_item_list;
use satisfactory_tracker::{Session, db, export};

fn open() -> Connection {
    let conn = Connection::open_in_memory().unwrap();
    db::init_schema(&conn).unwrap();
    conn
}

fn build_session() -> Session {
    let mut session = Session::default();
    let catalog = &mut session.catalog;
    catalog.add_resource_type("Iron Ore");
    catalog.add_resource_type("Copper Ore");
    catalog.add_miner_type("Miner Mk.1", 60.0);
    catalog.add_miner_type("Miner Mk.2", 120.0);
    catalog.add_building_type("Smelter");
    catalog.add_building_type("Constructor");
    catalog.add_recipe(
        "Iron Ingot",
        "Smelter",
        parse_item_list("Iron Ore=30").unwrap(),
        parse_item_list("Iron Ingot=30").unwrap(),
    );
    catalog.add_recipe(
        "Reinforced Iron Plate",
        "Assembler",
        parse_item_list("Iron Plate=30, Screw=60").unwrap(),
        parse_item_list("Reinforced Iron Plate=5").unwrap(),
    );

    let base_id = session.ids.next_base_id();
    session.graph.add_base(Base::new(base_id, "Northern Forest"));
    let miner_rate = session.catalog.require_miner("Miner Mk.2").unwrap().base_rate;
    let node = ResourceNode::new(session.ids.next_node_id(), "Iron Ore", Purity::Normal, "Miner Mk.2", miner_rate);
    session.graph.add_node(node, Some(base_id));

    let recipe = session.catalog.require_recipe("Iron Ingot").unwrap().clone();
    for _ in 0..3 {
        let facility = Facility::from_recipe(session.ids.next_facility_id(), "Smelter", &recipe);
        session.graph.require_base_mut(base_id).unwrap().add_facility(facility);
    }
    session.graph.find_facility_mut(base_id, 2).unwrap().set_clock_speed(250.0);
    session.graph.find_facility_mut(base_id, 3).unwrap().toggle_active_state();

    let mut spare = ResourceNode::new(session.ids.next_node_id(), "Copper Ore", Purity::Pure, "Miner Mk.1", 60.0);
    spare.set_clock_speed(0.0);
    session.graph.add_node(spare, None);
    session
}

#[test]
fn reloaded_session_computes_the_same_rates() {
    let conn = open();
    let session = build_session();
    db::save_session(&conn, &session).unwrap();

    let loaded = db::load_session(&conn).unwrap();
    assert_eq!(loaded, session);
    assert_eq!(
        loaded.graph.calculate_production_rates(),
        session.graph.calculate_production_rates()
    );

    let rates = loaded.graph.calculate_production_rates_for_base(1);
    assert_eq!(rates.consumption["Iron Ore"], 105.0);
    assert_eq!(rates.production["Iron Ingot"], 105.0);
}

#[test]
fn allocator_continues_after_reload() {
    let conn = open();
    db::save_session(&conn, &build_session()).unwrap();

    let mut loaded = db::load_session(&conn).unwrap();
    assert_eq!(loaded.ids.next_base_id(), 2);
    assert_eq!(loaded.ids.next_node_id(), 3);
    assert_eq!(loaded.ids.next_facility_id(), 4);
}

#[test]
fn clamped_clock_survives_reload() {
    let conn = open();
    db::save_session(&conn, &build_session()).unwrap();

    let loaded = db::load_session(&conn).unwrap();
    let spare = loaded.graph.unlinked_nodes.get(&2).unwrap();
    assert_eq!(spare.clock_speed(), 0.001);
    assert!((spare.output_rate() - 0.0012).abs() < 1e-12);
}

#[test]
fn export_matches_saved_session() {
    let conn = open();
    let session = build_session();
    db::save_session(&conn, &session).unwrap();

    let loaded = db::load_session(&conn).unwrap();
    assert_eq!(
        export::session_to_json(&loaded).unwrap(),
        export::session_to_json(&session).unwrap()
    );
}
