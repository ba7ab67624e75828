//! Scenario catalog: built-ins plus scenario files from disk.

use crate::error::{Result, UiScoutError};
use crate::scenario::schema::Scenario;
use std::path::Path;

/// Named scenarios in a stable order. Built-ins come first; loaded files
/// follow in file-name order.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    scenarios: Vec<Scenario>,
}

impl Catalog {
    pub fn builtin() -> Self {
        Self::from_scenarios(crate::scenarios::all())
    }

    pub fn from_scenarios(scenarios: Vec<Scenario>) -> Self {
        let mut catalog = Self::default();
        for scenario in scenarios {
            catalog.insert(scenario);
        }
        catalog
    }

    /// Add a scenario; one with the same name is replaced in place.
    pub fn insert(&mut self, scenario: Scenario) {
        match self.scenarios.iter_mut().find(|s| s.name == scenario.name) {
            Some(existing) => *existing = scenario,
            None => self.scenarios.push(scenario),
        }
    }

    /// Load every `*.json` scenario in `dir`. Invalid files are skipped
    /// with a warning. Returns how many were loaded.
    pub fn load_dir(&mut self, dir: &Path) -> Result<usize> {
        let mut paths: Vec<_> = std::fs::read_dir(dir)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| path.extension().and_then(|s| s.to_str()) == Some("json"))
            .collect();
        paths.sort();

        let mut loaded = 0;
        for path in paths {
            match load_one(&path) {
                Ok(scenario) => {
                    if self.get(&scenario.name).is_some() {
                        tracing::info!("Scenario {} overridden by {:?}", scenario.name, path);
                    }
                    self.insert(scenario);
                    loaded += 1;
                }
                Err(e) => {
                    tracing::warn!("Failed to load scenario from {:?}: {}", path, e);
                }
            }
        }
        Ok(loaded)
    }

    pub fn get(&self, name: &str) -> Option<&Scenario> {
        self.scenarios.iter().find(|s| s.name == name)
    }

    pub fn list(&self, tag: Option<&str>) -> Vec<&Scenario> {
        self.scenarios
            .iter()
            .filter(|s| tag.map_or(true, |t| s.has_tag(t)))
            .collect()
    }

    /// Scenarios to run: the named ones (all when `names` is empty),
    /// narrowed by `tag`.
    pub fn select(&self, names: &[String], tag: Option<&str>) -> Result<Vec<Scenario>> {
        let picked: Vec<&Scenario> = if names.is_empty() {
            self.scenarios.iter().collect()
        } else {
            names
                .iter()
                .map(|name| {
                    self.get(name)
                        .ok_or_else(|| UiScoutError::ScenarioNotFound(name.clone()))
                })
                .collect::<Result<_>>()?
        };

        Ok(picked
            .into_iter()
            .filter(|s| tag.map_or(true, |t| s.has_tag(t)))
            .cloned()
            .collect())
    }

    pub fn len(&self) -> usize {
        self.scenarios.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scenarios.is_empty()
    }
}

fn load_one(path: &Path) -> Result<Scenario> {
    let content = std::fs::read_to_string(path)?;
    let scenario: Scenario = serde_json::from_str(&content)?;
    scenario.validate()?;
    Ok(scenario)
}
