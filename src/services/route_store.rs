//! Named route persistence.
//!
//! Routes are kept as one pretty-printed JSON document per name in a
//! directory. Saving under an existing name overwrites it.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::types::{GeoPoint, PlanOptions, RoutePlan, Stop};

/// Everything needed to re-plan or re-display a route
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedRoute {
    pub name: String,
    pub saved_at: DateTime<Utc>,
    pub start: GeoPoint,
    pub start_time_minutes: i32,
    pub average_speed_kmh: f64,
    pub options: PlanOptions,
    pub stops: Vec<Stop>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plan: Option<RoutePlan>,
}

/// Storage for named routes
pub trait RouteStore {
    fn save(&self, route: &SavedRoute) -> Result<()>;

    fn load(&self, name: &str) -> Result<Option<SavedRoute>>;

    /// Stored route names, sorted
    fn list(&self) -> Result<Vec<String>>;

    /// Returns whether a route was removed
    fn delete(&self, name: &str) -> Result<bool>;
}

/// Safe file stem for a route name: lowercase ASCII alphanumerics and dashes.
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    for c in name.trim().chars().flat_map(char::to_lowercase) {
        if c.is_ascii_alphanumeric() {
            slug.push(c);
        } else if !slug.ends_with('-') && !slug.is_empty() {
            slug.push('-');
        }
    }
    while slug.ends_with('-') {
        slug.pop();
    }
    slug
}

/// JSON files under a directory
pub struct JsonRouteStore {
    dir: PathBuf,
}

impl JsonRouteStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, name: &str) -> Result<PathBuf> {
        let slug = slugify(name);
        if slug.is_empty() {
            anyhow::bail!("Route name '{}' has no usable characters", name);
        }
        Ok(self.dir.join(format!("{}.json", slug)))
    }

    fn read(path: &Path) -> Result<SavedRoute> {
        let raw = fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
        serde_json::from_str(&raw).with_context(|| format!("Failed to parse {}", path.display()))
    }
}

impl RouteStore for JsonRouteStore {
    fn save(&self, route: &SavedRoute) -> Result<()> {
        let path = self.path_for(&route.name)?;
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("Failed to create routes directory {}", self.dir.display()))?;

        let json = serde_json::to_string_pretty(route).context("Failed to serialize route")?;

        // Write-then-rename so a crash never leaves half a file behind
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, json).with_context(|| format!("Failed to write {}", tmp.display()))?;
        fs::rename(&tmp, &path).with_context(|| format!("Failed to move route into {}", path.display()))?;

        info!("Saved route '{}' to {}", route.name, path.display());
        Ok(())
    }

    fn load(&self, name: &str) -> Result<Option<SavedRoute>> {
        let path = self.path_for(name)?;
        if !path.exists() {
            return Ok(None);
        }
        Self::read(&path).map(Some)
    }

    fn list(&self) -> Result<Vec<String>> {
        if !self.dir.exists() {
            return Ok(vec![]);
        }

        let mut names = Vec::new();
        let entries = fs::read_dir(&self.dir)
            .with_context(|| format!("Failed to list {}", self.dir.display()))?;
        for entry in entries {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            match Self::read(&path) {
                Ok(route) => names.push(route.name),
                Err(e) => tracing::warn!("Skipping unreadable route file: {:#}", e),
            }
        }
        names.sort();
        Ok(names)
    }

    fn delete(&self, name: &str) -> Result<bool> {
        let path = self.path_for(name)?;
        if !path.exists() {
            return Ok(false);
        }
        fs::remove_file(&path).with_context(|| format!("Failed to delete {}", path.display()))?;
        info!("Deleted route '{}'", name);
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::planner::plan_route;

    fn sample(name: &str) -> SavedRoute {
        let start = GeoPoint::new(40.4168, -3.7038);
        let stops = vec![Stop::new("Calle Mayor 1", 10).with_location(GeoPoint::new(40.4153, -3.7074))];
        let options = PlanOptions::default();
        let plan = plan_route(&stops, start, 480, 40.0, &options).unwrap();
        SavedRoute {
            name: name.to_string(),
            saved_at: Utc::now(),
            start,
            start_time_minutes: 480,
            average_speed_kmh: 40.0,
            options,
            stops,
            plan: Some(plan),
        }
    }

    #[test]
    fn slugify_produces_safe_names() {
        assert_eq!(slugify("Monday Round"), "monday-round");
        assert_eq!(slugify("  ../etc/passwd "), "etc-passwd");
        assert_eq!(slugify("Ruta nº 5!"), "ruta-n-5");
        assert_eq!(slugify("!!!"), "");
    }

    #[test]
    fn save_then_load_returns_same_route() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonRouteStore::new(dir.path());
        let route = sample("Monday Round");

        store.save(&route).unwrap();
        let loaded = store.load("monday round").unwrap().unwrap();

        assert_eq!(loaded, route);
    }

    #[test]
    fn list_is_sorted_and_delete_removes() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonRouteStore::new(dir.path());

        assert!(store.list().unwrap().is_empty());

        store.save(&sample("Tuesday")).unwrap();
        store.save(&sample("Monday")).unwrap();
        assert_eq!(store.list().unwrap(), vec!["Monday".to_string(), "Tuesday".to_string()]);

        assert!(store.delete("Monday").unwrap());
        assert!(!store.delete("Monday").unwrap());
        assert!(store.load("Monday").unwrap().is_none());
        assert_eq!(store.list().unwrap(), vec!["Tuesday".to_string()]);
    }

    #[test]
    fn missing_directory_lists_nothing_and_save_creates_it() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonRouteStore::new(dir.path().join("routes"));

        assert!(store.list().unwrap().is_empty());
        store.save(&sample("Friday")).unwrap();
        assert_eq!(store.list().unwrap(), vec!["Friday".to_string()]);
    }

    #[test]
    fn unusable_name_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonRouteStore::new(dir.path());

        assert!(store.save(&sample("???")).is_err());
    }
}
