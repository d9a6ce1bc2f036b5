//! User filter settings
//!
//! Persisted as `settings.json`: which collections (drives) and
//! sub-collections (setlists) are enabled, plus a few display preferences.
//! The file is always written in full.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use crate::error::Result;

/// Separator runs that differ between remote renames: `: `, ` - `, ` – `, ` — `
static SEPARATOR_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:: | - | – | — )+").expect("valid separator pattern"));

static WHITESPACE_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("valid whitespace pattern"));

/// Comparison key for sub-collection names
///
/// `"Guitar Hero III: Legends of Rock"` and `"Guitar Hero III - Legends of
/// Rock"` map to the same key.
pub fn normalize_setlist_name(name: &str) -> String {
    let collapsed = SEPARATOR_RUN.replace_all(name, " ");
    let collapsed = WHITESPACE_RUN.replace_all(&collapsed, " ");
    collapsed.trim().to_lowercase()
}

/// What the delta column shows
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayMode {
    Size,
    Files,
    Charts,
}

impl DisplayMode {
    const ALL: [DisplayMode; 3] = [DisplayMode::Size, DisplayMode::Files, DisplayMode::Charts];

    pub fn as_str(self) -> &'static str {
        match self {
            DisplayMode::Size => "size",
            DisplayMode::Files => "files",
            DisplayMode::Charts => "charts",
        }
    }

    /// Unknown values fall back to `Size`
    pub fn parse(value: &str) -> Self {
        Self::ALL
            .into_iter()
            .find(|m| m.as_str() == value)
            .unwrap_or(DisplayMode::Size)
    }

    pub fn next(self) -> Self {
        match self {
            DisplayMode::Size => DisplayMode::Files,
            DisplayMode::Files => DisplayMode::Charts,
            DisplayMode::Charts => DisplayMode::Size,
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_delta_mode() -> String {
    DisplayMode::Size.as_str().to_string()
}

/// Enable/disable toggles and preferences
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterSettings {
    #[serde(skip)]
    path: PathBuf,

    /// Collection id -> enabled
    #[serde(default, rename = "drive_toggles")]
    collection_toggles: BTreeMap<String, bool>,

    /// Collection id -> sub-collection name -> enabled
    #[serde(default, rename = "subfolder_toggles")]
    sub_collection_toggles: BTreeMap<String, BTreeMap<String, bool>>,

    #[serde(default)]
    group_expanded: BTreeMap<String, bool>,

    /// Delete video files from extracted charts
    #[serde(default = "default_true")]
    pub delete_videos: bool,

    /// Whether the user was asked to sign in
    #[serde(default)]
    pub oauth_prompted: bool,

    #[serde(default = "default_delta_mode")]
    delta_mode: String,

    /// Fresh install: untouched collections start disabled
    #[serde(default, rename = "use_default_drives")]
    is_new: bool,
}

impl FilterSettings {
    /// Settings for a fresh install that will be saved to `path`
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            collection_toggles: BTreeMap::new(),
            sub_collection_toggles: BTreeMap::new(),
            group_expanded: BTreeMap::new(),
            delete_videos: true,
            oauth_prompted: false,
            delta_mode: default_delta_mode(),
            is_new: true,
        }
    }

    /// Load settings; a missing or malformed file counts as a fresh install
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();

        if !path.exists() {
            log::debug!("No settings at {}, treating as new install", path.display());
            return Self::new(path);
        }

        let parsed = fs::read_to_string(&path)
            .map_err(crate::Error::from)
            .and_then(|content| serde_json::from_str::<Self>(&content).map_err(crate::Error::from));

        match parsed {
            Ok(mut settings) => {
                settings.path = path;
                settings
            }
            Err(e) => {
                log::warn!("Ignoring unreadable settings {}: {}", path.display(), e);
                Self::new(path)
            }
        }
    }

    /// Write the whole settings file
    pub fn save(&self) -> Result<()> {
        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir)?;
        }
        let content = serde_json::to_string_pretty(self)?;
        fs::write(&self.path, content)?;
        log::debug!("Saved settings to {}", self.path.display());
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_new_install(&self) -> bool {
        self.is_new
    }

    // ========================================================================
    // Collections
    // ========================================================================

    /// Explicit toggle, else disabled on a new install, else enabled
    pub fn is_collection_enabled(&self, collection_id: &str) -> bool {
        if let Some(enabled) = self.collection_toggles.get(collection_id) {
            return *enabled;
        }
        !self.is_new
    }

    pub fn set_collection_enabled(&mut self, collection_id: &str, enabled: bool) {
        self.collection_toggles
            .insert(collection_id.to_string(), enabled);
    }

    /// Flip a collection; returns the new state
    pub fn toggle_collection(&mut self, collection_id: &str) -> bool {
        let enabled = !self.is_collection_enabled(collection_id);
        self.set_collection_enabled(collection_id, enabled);
        enabled
    }

    // ========================================================================
    // Sub-collections
    // ========================================================================

    /// Enabled unless explicitly turned off
    pub fn is_sub_collection_enabled(&self, collection_id: &str, name: &str) -> bool {
        self.sub_collection_toggles
            .get(collection_id)
            .and_then(|toggles| toggles.get(name))
            .copied()
            .unwrap_or(true)
    }

    pub fn set_sub_collection_enabled(&mut self, collection_id: &str, name: &str, enabled: bool) {
        self.sub_collection_toggles
            .entry(collection_id.to_string())
            .or_default()
            .insert(name.to_string(), enabled);
    }

    /// Flip a sub-collection; returns the new state
    pub fn toggle_sub_collection(&mut self, collection_id: &str, name: &str) -> bool {
        let enabled = !self.is_sub_collection_enabled(collection_id, name);
        self.set_sub_collection_enabled(collection_id, name, enabled);
        enabled
    }

    pub fn disabled_sub_collections(&self, collection_id: &str) -> HashSet<String> {
        self.sub_collection_toggles
            .get(collection_id)
            .map(|toggles| {
                toggles
                    .iter()
                    .filter(|(_, enabled)| !**enabled)
                    .map(|(name, _)| name.clone())
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn sub_collection_toggles(&self, collection_id: &str) -> Option<&BTreeMap<String, bool>> {
        self.sub_collection_toggles.get(collection_id)
    }

    pub fn enable_all(&mut self, collection_id: &str, names: &[String]) {
        for name in names {
            self.set_sub_collection_enabled(collection_id, name, true);
        }
    }

    pub fn disable_all(&mut self, collection_id: &str, names: &[String]) {
        for name in names {
            self.set_sub_collection_enabled(collection_id, name, false);
        }
    }

    /// Carry toggles over remote renames
    ///
    /// Stored names are matched to `discovered` names through
    /// [`normalize_setlist_name`]. A match carries its enabled state to the new
    /// spelling; stored names with no match are dropped; discovered names with
    /// no history get no entry. If two stored names normalize the same, the
    /// enabled one wins. That bias is a product decision: never silently
    /// disable something the user turned on under an older spelling.
    ///
    /// Returns whether the stored toggles changed. An empty `discovered` list
    /// is treated as a failed listing and changes nothing.
    pub fn sync_subfolder_names<S: AsRef<str>>(
        &mut self,
        collection_id: &str,
        discovered: &[S],
    ) -> bool {
        if discovered.is_empty() {
            return false;
        }
        let Some(old) = self.sub_collection_toggles.get(collection_id) else {
            return false;
        };

        let mut by_key: HashMap<String, bool> = HashMap::new();
        for (name, enabled) in old {
            let slot = by_key.entry(normalize_setlist_name(name)).or_insert(*enabled);
            *slot |= *enabled;
        }

        let migrated: BTreeMap<String, bool> = discovered
            .iter()
            .filter_map(|name| {
                let name = name.as_ref();
                by_key
                    .get(&normalize_setlist_name(name))
                    .map(|enabled| (name.to_string(), *enabled))
            })
            .collect();

        if migrated == *old {
            return false;
        }

        log::info!(
            "Migrated sub-collection toggles for {}: {} -> {} entries",
            collection_id,
            old.len(),
            migrated.len()
        );
        self.sub_collection_toggles
            .insert(collection_id.to_string(), migrated);
        true
    }

    // ========================================================================
    // Display preferences
    // ========================================================================

    /// Groups default to expanded
    pub fn is_group_expanded(&self, group: &str) -> bool {
        self.group_expanded.get(group).copied().unwrap_or(true)
    }

    pub fn toggle_group_expanded(&mut self, group: &str) -> bool {
        let expanded = !self.is_group_expanded(group);
        self.group_expanded.insert(group.to_string(), expanded);
        expanded
    }

    pub fn display_mode(&self) -> DisplayMode {
        DisplayMode::parse(&self.delta_mode)
    }

    pub fn cycle_display_mode(&mut self) -> DisplayMode {
        let next = self.display_mode().next();
        self.delta_mode = next.as_str().to_string();
        next
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn toggles(items: &[(&str, bool)]) -> BTreeMap<String, bool> {
        items.iter().map(|(n, e)| (n.to_string(), *e)).collect()
    }

    #[test]
    fn test_normalize_setlist_name() {
        let colon = normalize_setlist_name("Guitar Hero III: Legends of Rock");
        let hyphen = normalize_setlist_name("Guitar Hero III - Legends of Rock");
        let en_dash = normalize_setlist_name("Guitar Hero III – Legends of Rock");
        let em_dash = normalize_setlist_name("Guitar Hero III — Legends of Rock");
        assert_eq!(colon, "guitar hero iii legends of rock");
        assert_eq!(colon, hyphen);
        assert_eq!(colon, en_dash);
        assert_eq!(colon, em_dash);
        assert_eq!(normalize_setlist_name("  Rock   Band  "), "rock band");
        // Hyphens inside words are not separators
        assert_eq!(normalize_setlist_name("Re-Recorded"), "re-recorded");
    }

    #[test]
    fn test_collection_enabled_new_install() {
        let mut settings = FilterSettings::new("/unused/settings.json");
        assert!(settings.is_new_install());
        assert!(!settings.is_collection_enabled("drive"));

        settings.set_collection_enabled("drive", true);
        assert!(settings.is_collection_enabled("drive"));
        assert!(!settings.toggle_collection("drive"));
        assert!(!settings.is_collection_enabled("drive"));
    }

    #[test]
    fn test_collection_enabled_existing_install() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("settings.json");
        fs::write(&path, r#"{"drive_toggles": {"off": false}}"#).unwrap();

        let settings = FilterSettings::load(&path);
        assert!(!settings.is_new_install());
        assert!(settings.is_collection_enabled("untouched"));
        assert!(!settings.is_collection_enabled("off"));
    }

    #[test]
    fn test_malformed_settings_are_new_install() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("settings.json");
        fs::write(&path, "{").unwrap();

        let settings = FilterSettings::load(&path);
        assert!(settings.is_new_install());
        assert!(settings.delete_videos);
        assert!(!settings.is_collection_enabled("any"));
    }

    #[test]
    fn test_sub_collection_defaults_enabled() {
        let mut settings = FilterSettings::new("/unused/settings.json");
        assert!(settings.is_sub_collection_enabled("drive", "Set"));
        assert!(!settings.toggle_sub_collection("drive", "Set"));
        assert!(!settings.is_sub_collection_enabled("drive", "Set"));
        assert_eq!(
            settings.disabled_sub_collections("drive"),
            HashSet::from(["Set".to_string()])
        );

        settings.enable_all("drive", &["Set".to_string(), "Other".to_string()]);
        assert!(settings.disabled_sub_collections("drive").is_empty());
        settings.disable_all("drive", &["Other".to_string()]);
        assert!(!settings.is_sub_collection_enabled("drive", "Other"));
    }

    #[test]
    fn test_save_writes_full_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join(".dm-sync").join("settings.json");

        let mut settings = FilterSettings::load(&path);
        settings.set_collection_enabled("drive", true);
        settings.set_sub_collection_enabled("drive", "Set", false);
        settings.oauth_prompted = true;
        settings.cycle_display_mode();
        settings.save().unwrap();

        let raw: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(raw["use_default_drives"], true);
        assert_eq!(raw["delta_mode"], "files");
        assert_eq!(raw["subfolder_toggles"]["drive"]["Set"], false);

        let loaded = FilterSettings::load(&path);
        assert!(loaded.is_new_install());
        assert!(loaded.is_collection_enabled("drive"));
        assert!(!loaded.is_collection_enabled("other"));
        assert!(!loaded.is_sub_collection_enabled("drive", "Set"));
        assert!(loaded.oauth_prompted);
        assert_eq!(loaded.display_mode(), DisplayMode::Files);
    }

    #[test]
    fn test_display_mode_cycle_and_parse() {
        assert_eq!(DisplayMode::parse("charts"), DisplayMode::Charts);
        assert_eq!(DisplayMode::parse("bogus"), DisplayMode::Size);

        let mut settings = FilterSettings::new("/unused/settings.json");
        assert_eq!(settings.cycle_display_mode(), DisplayMode::Files);
        assert_eq!(settings.cycle_display_mode(), DisplayMode::Charts);
        assert_eq!(settings.cycle_display_mode(), DisplayMode::Size);
    }

    #[test]
    fn test_group_expanded() {
        let mut settings = FilterSettings::new("/unused/settings.json");
        assert!(settings.is_group_expanded("Official"));
        assert!(!settings.toggle_group_expanded("Official"));
        assert!(!settings.is_group_expanded("Official"));
    }

    #[test]
    fn test_rename_carries_toggle() {
        let mut settings = FilterSettings::new("/unused/settings.json");
        settings.set_sub_collection_enabled("drive", "Rock Band: Track Pack", false);

        let changed = settings.sync_subfolder_names("drive", &["Rock Band - Track Pack"]);
        assert!(changed);
        assert_eq!(
            settings.sub_collection_toggles("drive"),
            Some(&toggles(&[("Rock Band - Track Pack", false)]))
        );
    }

    #[test]
    fn test_rename_drops_orphans_and_ignores_new_names() {
        let mut settings = FilterSettings::new("/unused/settings.json");
        settings.set_sub_collection_enabled("drive", "Kept", false);
        settings.set_sub_collection_enabled("drive", "Removed Upstream", false);

        let changed = settings.sync_subfolder_names("drive", &["Kept", "Brand New"]);
        assert!(changed);
        assert_eq!(
            settings.sub_collection_toggles("drive"),
            Some(&toggles(&[("Kept", false)]))
        );
        assert!(settings.is_sub_collection_enabled("drive", "Brand New"));
    }

    #[test]
    fn test_rename_prefers_enabled_on_collision() {
        let mut settings = FilterSettings::new("/unused/settings.json");
        settings.set_sub_collection_enabled("drive", "GH3: Legends", false);
        settings.set_sub_collection_enabled("drive", "GH3 - Legends", true);

        assert!(settings.sync_subfolder_names("drive", &["GH3 – Legends"]));
        assert!(settings.is_sub_collection_enabled("drive", "GH3 – Legends"));
    }

    #[test]
    fn test_rename_noop_cases() {
        let mut settings = FilterSettings::new("/unused/settings.json");
        settings.set_sub_collection_enabled("drive", "Same", false);

        assert!(!settings.sync_subfolder_names("drive", &["Same"]));
        assert!(!settings.sync_subfolder_names("drive", &[] as &[&str]));
        assert!(!settings.sync_subfolder_names("unknown", &["Same"]));
        assert!(!settings.is_sub_collection_enabled("drive", "Same"));
    }
}
