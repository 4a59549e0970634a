//! JSON debug export of a session

use std::fs;
use std::path::Path;

use crate::Session;
use crate::error::Result;

/// Pretty-printed JSON of the whole session, cached node output rates included
pub fn session_to_json(session: &Session) -> Result<String> {
    Ok(serde_json::to_string_pretty(session)?)
}

/// Write the JSON dump to `path`
pub fn export_session(session: &Session, path: &Path) -> Result<()> {
    fs::write(path, session_to_json(session)?)?;
    log::info!("exported session to {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Base, Purity, ResourceNode};

    #[test]
    fn dump_keeps_insertion_order_and_rates() {
        let mut session = Session::default();
        session.graph.add_base(Base::new(7, "Zeta"));
        session.graph.add_base(Base::new(3, "Alpha"));
        let mut node = ResourceNode::new(1, "Coal", Purity::Impure, "Miner Mk.2", 120.0);
        node.set_clock_speed(250.0);
        session.graph.add_unlinked_node(node);

        let json = session_to_json(&session).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert!(json.find("\"Zeta\"").unwrap() < json.find("\"Alpha\"").unwrap());
        assert_eq!(value["graph"]["bases"]["3"]["name"], "Alpha");
        assert_eq!(value["graph"]["unlinked_nodes"]["1"]["output_rate"], 150.0);
        assert_eq!(value["graph"]["unlinked_nodes"]["1"]["purity"], "Impure");
        assert_eq!(value["ids"]["next_base_id"], 1);
    }
}
