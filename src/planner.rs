//! Planning helpers built on a single base's net production

use std::collections::BTreeMap;

use indexmap::IndexMap;

use crate::graph::BaseRates;
use crate::models::Recipe;
use crate::rounding::round_half_up;

/// Production minus consumption per item, sorted by item name
pub fn net_production(rates: &BaseRates) -> BTreeMap<String, f64> {
    rates
        .production
        .keys()
        .chain(rates.consumption.keys())
        .map(|item| {
            let produced = rates.production.get(item).copied().unwrap_or(0.0);
            let consumed = rates.consumption.get(item).copied().unwrap_or(0.0);
            (item.clone(), round_half_up(produced - consumed, 2))
        })
        .collect()
}

/// How many whole copies of each recipe the surplus could feed.
///
/// Every input must have a positive surplus. Recipes that could not run even
/// once, and recipes without inputs, are left out.
pub fn possible_recipes(recipes: &[Recipe], net: &BTreeMap<String, f64>) -> IndexMap<String, u32> {
    let mut possible = IndexMap::new();

    for recipe in recipes {
        let mut max_crafts: Option<u32> = None;
        for input in recipe.inputs.iter().filter(|i| i.rate > 0.0) {
            let crafts = match net.get(&input.item) {
                Some(&available) if available > 0.0 => (available / input.rate).floor() as u32,
                _ => 0,
            };
            max_crafts = Some(max_crafts.map_or(crafts, |m| m.min(crafts)));
            if crafts == 0 {
                break;
            }
        }

        if let Some(count) = max_crafts.filter(|&c| c > 0) {
            possible.insert(recipe.name.clone(), count);
        }
    }

    possible
}

/// One input line of a recipe checked against a base's surplus
#[derive(Debug, Clone, PartialEq)]
pub struct Requirement {
    pub item: String,
    pub available: f64,
    pub required: f64,
    pub net: f64,
}

impl Requirement {
    pub fn is_sufficient(&self) -> bool {
        self.net >= 0.0
    }
}

/// Compare each recipe input with what the base has left over.
///
/// `net` is the output of [`net_production`], so availability is already
/// rounded to two decimal places.
pub fn recipe_requirements(recipe: &Recipe, net: &BTreeMap<String, f64>) -> Vec<Requirement> {
    recipe
        .inputs
        .iter()
        .map(|input| {
            let available = net.get(&input.item).copied().unwrap_or(0.0);
            Requirement {
                item: input.item.clone(),
                available,
                required: input.rate,
                net: available - input.rate,
            }
        })
        .collect()
}
