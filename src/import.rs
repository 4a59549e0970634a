//! Bulk catalog import from plain-text `.catalog` files
//!
//! Each non-blank line that does not start with `#` declares one entry:
//!
//! ```text
//! resource Iron Ore
//! miner Miner Mk.1 = 60
//! building Smelter
//! recipe Iron Ingot @ Smelter: Iron Ore=30 -> Iron Ingot=30
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use regex::Regex;
use walkdir::WalkDir;

use crate::catalog::GameData;
use crate::error::{Result, TrackerError};
use crate::models::ItemRate;
use crate::parse::parse_item_list;

/// One parsed catalog declaration
#[derive(Debug, Clone, PartialEq)]
pub enum CatalogEntry {
    Resource(String),
    Miner { name: String, base_rate: f64 },
    Building(String),
    Recipe {
        name: String,
        building_type: String,
        inputs: Vec<ItemRate>,
        outputs: Vec<ItemRate>,
    },
}

/// Find all *.catalog files under `dir`, sorted by path
pub fn find_catalog_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for entry in WalkDir::new(dir).follow_links(true).sort_by_file_name() {
        let entry = entry?;
        let path = entry.path();
        if entry.file_type().is_file() && path.extension().is_some_and(|ext| ext == "catalog") {
            files.push(path.to_path_buf());
        }
    }

    Ok(files)
}

struct LinePatterns {
    resource: Regex,
    miner: Regex,
    building: Regex,
    recipe: Regex,
}

impl LinePatterns {
    fn new() -> Result<Self> {
        Ok(Self {
            resource: Regex::new(r"^resource\s+(.+)$")?,
            miner: Regex::new(r"^miner\s+(.+?)\s*=\s*(\d+(?:\.\d*)?|\.\d+)$")?,
            building: Regex::new(r"^building\s+(.+)$")?,
            // Pattern: recipe Wire @ Constructor: Copper Ingot=15 -> Wire=30
            recipe: Regex::new(r"^recipe\s+(.+?)\s*@\s*(.+?)\s*:\s*(.*?)\s*->\s*(.*)$")?,
        })
    }

    /// `None` when the line matches no declaration
    fn parse(&self, line: &str) -> Option<CatalogEntry> {
        if let Some(cap) = self.recipe.captures(line) {
            return Some(CatalogEntry::Recipe {
                name: cap[1].to_string(),
                building_type: cap[2].to_string(),
                inputs: parse_item_list(&cap[3]).ok()?,
                outputs: parse_item_list(&cap[4]).ok()?,
            });
        }
        if let Some(cap) = self.miner.captures(line) {
            return Some(CatalogEntry::Miner {
                name: cap[1].to_string(),
                base_rate: cap[2].parse().ok()?,
            });
        }
        if let Some(cap) = self.resource.captures(line) {
            return Some(CatalogEntry::Resource(cap[1].to_string()));
        }
        self.building
            .captures(line)
            .map(|cap| CatalogEntry::Building(cap[1].to_string()))
    }
}

/// Parse catalog text into entries, reporting malformed lines with their position
pub fn parse_catalog(path: &Path, content: &str) -> Result<(Vec<CatalogEntry>, Vec<TrackerError>)> {
    let patterns = LinePatterns::new()?;
    let mut entries = Vec::new();
    let mut malformed = Vec::new();

    for (index, raw) in content.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        match patterns.parse(line) {
            Some(entry) => entries.push(entry),
            None => malformed.push(TrackerError::MalformedCatalogLine {
                path: path.to_path_buf(),
                line: index + 1,
                text: line.to_string(),
            }),
        }
    }

    Ok((entries, malformed))
}

fn apply(catalog: &mut GameData, entry: CatalogEntry, stats: &mut ImportStats) {
    match entry {
        CatalogEntry::Resource(name) => {
            catalog.add_resource_type(name);
            stats.resources += 1;
        }
        CatalogEntry::Miner { name, base_rate } => {
            catalog.add_miner_type(name, base_rate);
            stats.miners += 1;
        }
        CatalogEntry::Building(name) => {
            catalog.add_building_type(name);
            stats.buildings += 1;
        }
        CatalogEntry::Recipe {
            name,
            building_type,
            inputs,
            outputs,
        } => {
            catalog.add_recipe(name, building_type, inputs, outputs);
            stats.recipes += 1;
        }
    }
}

/// Import every catalog file under `dir` into `catalog`
pub fn import_catalog(catalog: &mut GameData, dir: &Path) -> Result<ImportStats> {
    let mut stats = ImportStats::default();

    log::info!("scanning {} for catalog files", dir.display());
    let files = find_catalog_files(dir)?;
    log::info!("found {} catalog files", files.len());

    for path in &files {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) => {
                log::warn!("cannot read {}: {}", path.display(), e);
                stats.errors += 1;
                continue;
            }
        };

        let (entries, malformed) = parse_catalog(path, &content)?;
        for problem in &malformed {
            log::warn!("{}", problem);
        }
        stats.skipped += malformed.len();

        log::debug!("{}: {} entries", path.display(), entries.len());
        for entry in entries {
            apply(catalog, entry, &mut stats);
        }
        stats.files += 1;
    }

    Ok(stats)
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ImportStats {
    pub files: usize,
    pub resources: usize,
    pub miners: usize,
    pub buildings: usize,
    pub recipes: usize,
    pub skipped: usize,
    pub errors: usize,
}

impl std::fmt::Display for ImportStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Imported {} resources, {} miners, {} buildings and {} recipes from {} files. Skipped: {}, Errors: {}",
            self.resources, self.miners, self.buildings, self.recipes, self.files, self.skipped, self.errors
        )
    }
}
