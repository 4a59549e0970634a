//! Database schema and session persistence

use indexmap::IndexMap;
use rusqlite::{Connection, params};

use crate::Session;
use crate::catalog::{GameData, IdAllocator};
use crate::error::{Result, TrackerError};
use crate::graph::ProductionGraph;
use crate::models::{Base, BuildingType, Facility, ItemRate, MinerType, Purity, Recipe, ResourceNode, ResourceType};

const INPUT: &str = "input";
const OUTPUT: &str = "output";

/// Initialize the database schema
pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        -- Catalog
        CREATE TABLE IF NOT EXISTS resource_types (
            position INTEGER PRIMARY KEY,
            name TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS miner_types (
            position INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            base_rate REAL NOT NULL
        );

        CREATE TABLE IF NOT EXISTS building_types (
            position INTEGER PRIMARY KEY,
            name TEXT NOT NULL
        );

        -- Recipe names are not unique, so recipes are keyed by position
        CREATE TABLE IF NOT EXISTS recipes (
            position INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            building_type TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS recipe_items (
            recipe_position INTEGER NOT NULL,
            direction TEXT NOT NULL CHECK (direction IN ('input', 'output')),
            position INTEGER NOT NULL,
            item TEXT NOT NULL,
            rate REAL NOT NULL,
            PRIMARY KEY (recipe_position, direction, position)
        );

        -- Identifier allocator state
        CREATE TABLE IF NOT EXISTS id_counters (
            name TEXT PRIMARY KEY,
            next_id INTEGER NOT NULL
        );

        -- Production graph
        CREATE TABLE IF NOT EXISTS bases (
            id INTEGER PRIMARY KEY,
            position INTEGER NOT NULL,
            name TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS base_storage (
            base_id INTEGER NOT NULL,
            position INTEGER NOT NULL,
            item TEXT NOT NULL,
            quantity REAL NOT NULL,
            PRIMARY KEY (base_id, item)
        );

        -- base_id NULL marks a node in the unlinked pool
        CREATE TABLE IF NOT EXISTS nodes (
            id INTEGER NOT NULL,
            base_id INTEGER,
            position INTEGER NOT NULL,
            resource_type TEXT NOT NULL,
            purity TEXT NOT NULL,
            miner_type TEXT NOT NULL,
            miner_rate REAL NOT NULL,
            clock_speed REAL NOT NULL
        );

        CREATE TABLE IF NOT EXISTS facilities (
            id INTEGER NOT NULL,
            base_id INTEGER NOT NULL,
            position INTEGER NOT NULL,
            facility_type TEXT NOT NULL,
            recipe TEXT NOT NULL,
            clock_speed REAL NOT NULL,
            is_active INTEGER NOT NULL,
            PRIMARY KEY (base_id, id)
        );

        CREATE TABLE IF NOT EXISTS facility_items (
            base_id INTEGER NOT NULL,
            facility_id INTEGER NOT NULL,
            direction TEXT NOT NULL CHECK (direction IN ('input', 'output')),
            position INTEGER NOT NULL,
            item TEXT NOT NULL,
            rate REAL NOT NULL,
            PRIMARY KEY (base_id, facility_id, direction, position)
        );

        CREATE INDEX IF NOT EXISTS idx_nodes_base ON nodes(base_id);
        CREATE INDEX IF NOT EXISTS idx_facility_items_facility ON facility_items(base_id, facility_id);
        "#,
    )?;
    Ok(())
}

/// Clear every saved row (before writing a fresh snapshot)
pub fn clear_session(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        DELETE FROM facility_items;
        DELETE FROM facilities;
        DELETE FROM nodes;
        DELETE FROM base_storage;
        DELETE FROM bases;
        DELETE FROM id_counters;
        DELETE FROM recipe_items;
        DELETE FROM recipes;
        DELETE FROM building_types;
        DELETE FROM miner_types;
        DELETE FROM resource_types;
        "#,
    )?;
    Ok(())
}

/// Replace the stored session with `session` in a single transaction
pub fn save_session(conn: &Connection, session: &Session) -> Result<()> {
    let tx = conn.unchecked_transaction()?;
    clear_session(&tx)?;
    save_catalog(&tx, &session.catalog)?;
    save_ids(&tx, &session.ids)?;
    save_graph(&tx, &session.graph)?;
    tx.commit()?;

    log::info!(
        "saved {} bases, {} unlinked nodes and {} recipes",
        session.graph.bases.len(),
        session.graph.unlinked_nodes.len(),
        session.catalog.recipes.len()
    );
    Ok(())
}

fn save_catalog(conn: &Connection, catalog: &GameData) -> Result<()> {
    for (position, resource) in catalog.resource_types.iter().enumerate() {
        conn.execute(
            "INSERT INTO resource_types (position, name) VALUES (?1, ?2)",
            params![position, resource.name],
        )?;
    }
    for (position, miner) in catalog.miner_types.iter().enumerate() {
        conn.execute(
            "INSERT INTO miner_types (position, name, base_rate) VALUES (?1, ?2, ?3)",
            params![position, miner.name, miner.base_rate],
        )?;
    }
    for (position, building) in catalog.building_types.iter().enumerate() {
        conn.execute(
            "INSERT INTO building_types (position, name) VALUES (?1, ?2)",
            params![position, building.name],
        )?;
    }
    for (position, recipe) in catalog.recipes.iter().enumerate() {
        conn.execute(
            "INSERT INTO recipes (position, name, building_type) VALUES (?1, ?2, ?3)",
            params![position, recipe.name, recipe.building_type],
        )?;
        for (direction, items) in [(INPUT, &recipe.inputs), (OUTPUT, &recipe.outputs)] {
            for (item_position, item) in items.iter().enumerate() {
                conn.execute(
                    "INSERT INTO recipe_items (recipe_position, direction, position, item, rate)
                     VALUES (?1, ?2, ?3, ?4, ?5)",
                    params![position, direction, item_position, item.item, item.rate],
                )?;
            }
        }
    }
    Ok(())
}

fn save_ids(conn: &Connection, ids: &IdAllocator) -> Result<()> {
    for (name, next_id) in [
        ("base", ids.next_base_id),
        ("node", ids.next_node_id),
        ("facility", ids.next_facility_id),
    ] {
        conn.execute(
            "INSERT INTO id_counters (name, next_id) VALUES (?1, ?2)",
            params![name, next_id],
        )?;
    }
    Ok(())
}

fn insert_node(conn: &Connection, node: &ResourceNode, base_id: Option<u32>, position: usize) -> Result<()> {
    conn.execute(
        "INSERT INTO nodes (id, base_id, position, resource_type, purity, miner_type, miner_rate, clock_speed)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            node.node_id,
            base_id,
            position,
            node.resource_type,
            node.purity.as_str(),
            node.miner_type,
            node.miner_rate,
            node.clock_speed(),
        ],
    )?;
    Ok(())
}

fn insert_facility(conn: &Connection, base_id: u32, facility: &Facility, position: usize) -> Result<()> {
    conn.execute(
        "INSERT INTO facilities (id, base_id, position, facility_type, recipe, clock_speed, is_active)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            facility.facility_id,
            base_id,
            position,
            facility.facility_type,
            facility.recipe,
            facility.clock_speed(),
            facility.is_active,
        ],
    )?;

    for (direction, items) in [(INPUT, &facility.input_items), (OUTPUT, &facility.output_items)] {
        for (item_position, item) in items.iter().enumerate() {
            conn.execute(
                "INSERT INTO facility_items (base_id, facility_id, direction, position, item, rate)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![base_id, facility.facility_id, direction, item_position, item.item, item.rate],
            )?;
        }
    }
    Ok(())
}

fn save_graph(conn: &Connection, graph: &ProductionGraph) -> Result<()> {
    for (position, base) in graph.bases.values().enumerate() {
        conn.execute(
            "INSERT INTO bases (id, position, name) VALUES (?1, ?2, ?3)",
            params![base.base_id, position, base.name],
        )?;
        for (item_position, (item, quantity)) in base.storage.iter().enumerate() {
            conn.execute(
                "INSERT INTO base_storage (base_id, position, item, quantity) VALUES (?1, ?2, ?3, ?4)",
                params![base.base_id, item_position, item, quantity],
            )?;
        }
        for (node_position, node) in base.nodes.values().enumerate() {
            insert_node(conn, node, Some(base.base_id), node_position)?;
        }
        for (facility_position, facility) in base.facilities.values().enumerate() {
            insert_facility(conn, base.base_id, facility, facility_position)?;
        }
    }

    for (position, node) in graph.unlinked_nodes.values().enumerate() {
        insert_node(conn, node, None, position)?;
    }
    Ok(())
}

/// Load the stored session. An empty database yields a fresh session.
pub fn load_session(conn: &Connection) -> Result<Session> {
    let session = Session {
        catalog: load_catalog(conn)?,
        ids: load_ids(conn)?,
        graph: load_graph(conn)?,
    };

    log::info!(
        "loaded {} bases, {} unlinked nodes and {} recipes",
        session.graph.bases.len(),
        session.graph.unlinked_nodes.len(),
        session.catalog.recipes.len()
    );
    Ok(session)
}

fn load_names(conn: &Connection, sql: &str) -> Result<Vec<String>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt.query_map([], |row| row.get(0))?;

    let mut results = Vec::new();
    for row in rows {
        results.push(row?);
    }
    Ok(results)
}

fn load_recipe_items(conn: &Connection, recipe_position: i64, direction: &str) -> Result<Vec<ItemRate>> {
    let mut stmt = conn.prepare(
        "SELECT item, rate FROM recipe_items
         WHERE recipe_position = ?1 AND direction = ?2
         ORDER BY position",
    )?;
    let rows = stmt.query_map(params![recipe_position, direction], |row| {
        Ok(ItemRate::new(row.get::<_, String>(0)?, row.get(1)?))
    })?;

    let mut results = Vec::new();
    for row in rows {
        results.push(row?);
    }
    Ok(results)
}

fn load_catalog(conn: &Connection) -> Result<GameData> {
    let mut catalog = GameData::new();

    catalog.resource_types = load_names(conn, "SELECT name FROM resource_types ORDER BY position")?
        .into_iter()
        .map(|name| ResourceType { name })
        .collect();
    catalog.building_types = load_names(conn, "SELECT name FROM building_types ORDER BY position")?
        .into_iter()
        .map(|name| BuildingType { name })
        .collect();

    let mut stmt = conn.prepare("SELECT name, base_rate FROM miner_types ORDER BY position")?;
    let rows = stmt.query_map([], |row| {
        Ok(MinerType {
            name: row.get(0)?,
            base_rate: row.get(1)?,
        })
    })?;
    for row in rows {
        catalog.miner_types.push(row?);
    }

    let mut stmt = conn.prepare("SELECT position, name, building_type FROM recipes ORDER BY position")?;
    let rows = stmt.query_map([], |row| {
        Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?, row.get::<_, String>(2)?))
    })?;
    for row in rows {
        let (position, name, building_type) = row?;
        catalog.recipes.push(Recipe {
            name,
            building_type,
            inputs: load_recipe_items(conn, position, INPUT)?,
            outputs: load_recipe_items(conn, position, OUTPUT)?,
        });
    }

    Ok(catalog)
}

fn load_ids(conn: &Connection) -> Result<IdAllocator> {
    let mut ids = IdAllocator::new();
    let mut stmt = conn.prepare("SELECT name, next_id FROM id_counters")?;
    let rows = stmt.query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, u32>(1)?)))?;

    for row in rows {
        match row? {
            (name, next_id) if name == "base" => ids.next_base_id = next_id,
            (name, next_id) if name == "node" => ids.next_node_id = next_id,
            (name, next_id) if name == "facility" => ids.next_facility_id = next_id,
            (name, _) => return Err(TrackerError::CorruptSave(format!("unknown id counter '{}'", name))),
        }
    }
    Ok(ids)
}

/// Raw node row, purity still unparsed
struct NodeRow {
    id: u32,
    base_id: Option<u32>,
    resource_type: String,
    purity: String,
    miner_type: String,
    miner_rate: f64,
    clock_speed: f64,
}

impl NodeRow {
    fn into_node(self) -> Result<ResourceNode> {
        let purity: Purity = self
            .purity
            .parse()
            .map_err(|_| TrackerError::CorruptSave(format!("node {} has purity '{}'", self.id, self.purity)))?;
        let mut node = ResourceNode::new(self.id, self.resource_type, purity, self.miner_type, self.miner_rate);
        node.set_clock_speed(self.clock_speed);
        Ok(node)
    }
}

fn load_facility_items(conn: &Connection, base_id: u32, facility_id: u32, direction: &str) -> Result<Vec<ItemRate>> {
    let mut stmt = conn.prepare(
        "SELECT item, rate FROM facility_items
         WHERE base_id = ?1 AND facility_id = ?2 AND direction = ?3
         ORDER BY position",
    )?;
    let rows = stmt.query_map(params![base_id, facility_id, direction], |row| {
        Ok(ItemRate::new(row.get::<_, String>(0)?, row.get(1)?))
    })?;

    let mut results = Vec::new();
    for row in rows {
        results.push(row?);
    }
    Ok(results)
}

fn load_graph(conn: &Connection) -> Result<ProductionGraph> {
    let mut graph = ProductionGraph::new();

    let mut stmt = conn.prepare("SELECT id, name FROM bases ORDER BY position")?;
    let rows = stmt.query_map([], |row| Ok(Base::new(row.get(0)?, row.get::<_, String>(1)?)))?;
    for row in rows {
        graph.add_base(row?);
    }

    let mut stmt = conn.prepare("SELECT base_id, item, quantity FROM base_storage ORDER BY base_id, position")?;
    let rows = stmt.query_map([], |row| {
        Ok((row.get::<_, u32>(0)?, row.get::<_, String>(1)?, row.get::<_, f64>(2)?))
    })?;
    for row in rows {
        let (base_id, item, quantity) = row?;
        let base = graph
            .base_mut(base_id)
            .ok_or_else(|| TrackerError::CorruptSave(format!("storage for missing base {}", base_id)))?;
        base.storage.insert(item, quantity);
    }

    let mut stmt = conn.prepare(
        "SELECT id, base_id, resource_type, purity, miner_type, miner_rate, clock_speed
         FROM nodes ORDER BY base_id IS NOT NULL, base_id, position",
    )?;
    let rows = stmt.query_map([], |row| {
        Ok(NodeRow {
            id: row.get(0)?,
            base_id: row.get(1)?,
            resource_type: row.get(2)?,
            purity: row.get(3)?,
            miner_type: row.get(4)?,
            miner_rate: row.get(5)?,
            clock_speed: row.get(6)?,
        })
    })?;
    for row in rows {
        let row = row?;
        match row.base_id {
            Some(base_id) => {
                let base = graph
                    .base_mut(base_id)
                    .ok_or_else(|| TrackerError::CorruptSave(format!("node {} in missing base {}", row.id, base_id)))?;
                base.add_node(row.into_node()?);
            }
            None => graph.add_unlinked_node(row.into_node()?),
        }
    }

    let mut stmt = conn.prepare(
        "SELECT id, base_id, facility_type, recipe, clock_speed, is_active
         FROM facilities ORDER BY base_id, position",
    )?;
    let rows = stmt.query_map([], |row| {
        Ok((
            row.get::<_, u32>(0)?,
            row.get::<_, u32>(1)?,
            row.get::<_, String>(2)?,
            row.get::<_, String>(3)?,
            row.get::<_, f64>(4)?,
            row.get::<_, bool>(5)?,
        ))
    })?;

    let mut facilities: IndexMap<(u32, u32), Facility> = IndexMap::new();
    for row in rows {
        let (id, base_id, facility_type, recipe, clock_speed, is_active) = row?;
        let facility = Facility::restore(
            id,
            facility_type,
            recipe,
            load_facility_items(conn, base_id, id, INPUT)?,
            load_facility_items(conn, base_id, id, OUTPUT)?,
            clock_speed,
            is_active,
        );
        facilities.insert((base_id, id), facility);
    }
    for ((base_id, id), facility) in facilities {
        let base = graph
            .base_mut(base_id)
            .ok_or_else(|| TrackerError::CorruptSave(format!("facility {} in missing base {}", id, base_id)))?;
        base.add_facility(facility);
    }

    Ok(graph)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();
        conn
    }

    fn sample_session() -> Session {
        let mut session = Session::default();
        session.catalog.add_resource_type("Iron Ore");
        session.catalog.add_miner_type("Miner Mk.1", 60.0);
        session.catalog.add_building_type("Smelter");
        session.catalog.add_recipe(
            "Iron Ingot",
            "Smelter",
            vec![ItemRate::new("Iron Ore", 30.0)],
            vec![ItemRate::new("Iron Ingot", 30.0)],
        );

        let base_id = session.ids.next_base_id();
        let mut base = Base::new(base_id, "Main Base");
        let mut node = ResourceNode::new(session.ids.next_node_id(), "Iron Ore", Purity::Pure, "Miner Mk.1", 60.0);
        node.set_clock_speed(150.0);
        base.add_node(node);

        let recipe = session.catalog.recipe("Iron Ingot").unwrap().clone();
        let mut facility = Facility::from_recipe(session.ids.next_facility_id(), "Smelter", &recipe);
        facility.set_clock_speed(0.0);
        facility.toggle_active_state();
        base.add_facility(facility);
        base.update_storage("Iron Plate", 200.0);
        session.graph.add_base(base);

        let unlinked = ResourceNode::new(session.ids.next_node_id(), "Coal", Purity::Impure, "Miner Mk.2", 120.0);
        session.graph.add_unlinked_node(unlinked);
        session
    }

    #[test]
    fn empty_database_loads_fresh_session() {
        let conn = open();
        assert_eq!(load_session(&conn).unwrap(), Session::default());
    }

    #[test]
    fn session_round_trip() {
        let conn = open();
        let session = sample_session();
        save_session(&conn, &session).unwrap();

        let loaded = load_session(&conn).unwrap();
        assert_eq!(loaded, session);
        assert_eq!(loaded.graph.find_node(1).unwrap().output_rate(), 180.0);
        assert_eq!(loaded.ids.next_node_id, 3);
    }

    #[test]
    fn saving_twice_replaces_previous_snapshot() {
        let conn = open();
        let mut session = sample_session();
        save_session(&conn, &session).unwrap();

        session.graph.delete_base(1);
        session.catalog.delete_recipe("Iron Ingot");
        save_session(&conn, &session).unwrap();

        let loaded = load_session(&conn).unwrap();
        assert!(loaded.graph.bases.is_empty());
        assert!(loaded.catalog.recipes.is_empty());
        assert_eq!(loaded.graph.unlinked_nodes.len(), 1);
    }

    #[test]
    fn insertion_order_survives() {
        let conn = open();
        let mut session = Session::default();
        for id in [5, 2, 9] {
            session.graph.add_base(Base::new(id, format!("Base {id}")));
        }
        for id in [30, 10, 20] {
            let mut f = Facility::new(id, "Constructor", "Wire");
            f.set_input_item("Copper Ingot", 15.0);
            f.set_output_item("Wire", 30.0);
            session.graph.base_mut(2).unwrap().add_facility(f);
        }
        save_session(&conn, &session).unwrap();

        let loaded = load_session(&conn).unwrap();
        let bases: Vec<_> = loaded.graph.bases.keys().copied().collect();
        assert_eq!(bases, [5, 2, 9]);
        let facilities: Vec<_> = loaded.graph.base(2).unwrap().facilities.keys().copied().collect();
        assert_eq!(facilities, [30, 10, 20]);
    }

    #[test]
    fn bad_purity_is_reported() {
        let conn = open();
        conn.execute(
            "INSERT INTO nodes (id, base_id, position, resource_type, purity, miner_type, miner_rate, clock_speed)
             VALUES (1, NULL, 0, 'Iron Ore', 'Shiny', 'Miner Mk.1', 60.0, 100.0)",
            [],
        )
        .unwrap();
        assert!(matches!(load_session(&conn), Err(TrackerError::CorruptSave(_))));
    }
}
