use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::error::{PipelineError, Result};
use crate::sitemap::ChangeFreq;

const ENV_PREFIX: &str = "SITEGEN";
pub const DEFAULT_CONFIG_FILE: &str = "sitegen.toml";

/// A content category such as `items` or `enemies`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Category(String);

impl Category {
    pub fn new(name: &str) -> Option<Self> {
        let valid = !name.is_empty()
            && name
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '_');
        valid.then(|| Self(name.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// `items` -> `item`, `enemies` -> `enemy`.
    pub fn singular(&self) -> String {
        let name = self.0.as_str();
        if let Some(stem) = name.strip_suffix("ies") {
            format!("{}y", stem)
        } else if let Some(stem) = name.strip_suffix('s') {
            stem.to_string()
        } else {
            name.to_string()
        }
    }

    /// Directory name of the generated page tree for this category.
    pub fn pages_dir_name(&self) -> String {
        format!("{}-auto", self.0)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PathSettings {
    pub sources: PathBuf,
    pub data_dir: PathBuf,
    pub pages_dir: PathBuf,
    pub sitemap: PathBuf,
    pub urls: PathBuf,
}

impl Default for PathSettings {
    fn default() -> Self {
        Self {
            sources: PathBuf::from("scripts/sources.json"),
            data_dir: PathBuf::from("data"),
            pages_dir: PathBuf::from("pages"),
            sitemap: PathBuf::from("sitemap.xml"),
            urls: PathBuf::from("urls.txt"),
        }
    }
}

/// One hand-maintained sitemap entry.
#[derive(Debug, Clone, Deserialize)]
pub struct CuratedPage {
    pub path: String,
    pub priority: f32,
    pub changefreq: ChangeFreq,
}

impl CuratedPage {
    fn new(path: &str, priority: f32, changefreq: ChangeFreq) -> Self {
        Self {
            path: path.to_string(),
            priority,
            changefreq,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub base_url: String,
    pub site_name: String,
    pub user_agent: String,
    pub fetch_timeout_secs: u64,
    pub categories: Vec<String>,
    pub pages_url_path: String,
    pub paths: PathSettings,
    pub curated: Vec<CuratedPage>,
}

impl Default for Settings {
    fn default() -> Self {
        use ChangeFreq::*;
        Self {
            base_url: "https://dungeonraid.online".to_string(),
            site_name: "Dungeon Raid".to_string(),
            user_agent: "DungeonRaidBot/1.0".to_string(),
            fetch_timeout_secs: 20,
            categories: vec!["items".to_string(), "enemies".to_string()],
            pages_url_path: "/pages".to_string(),
            paths: PathSettings::default(),
            curated: vec![
                CuratedPage::new("/", 1.0, Weekly),
                CuratedPage::new("/pages/guide/beginners.html", 0.8, Monthly),
                CuratedPage::new("/pages/tactics/combos.html", 0.7, Monthly),
                CuratedPage::new("/pages/support/chromebook.html", 0.6, Monthly),
                CuratedPage::new("/pages/updates/changelog.html", 0.5, Monthly),
                CuratedPage::new("/pages/items/", 0.6, Monthly),
                CuratedPage::new("/pages/items/sword-of-ember.html", 0.5, Monthly),
                CuratedPage::new("/pages/items/arcane-talisman.html", 0.5, Monthly),
                CuratedPage::new("/pages/enemies/", 0.6, Monthly),
                CuratedPage::new("/pages/enemies/goblin-king.html", 0.5, Monthly),
                CuratedPage::new("/pages/legal/privacy.html", 0.3, Yearly),
            ],
        }
    }
}

impl Settings {
    /// Layer the settings file and `SITEGEN_*` env vars over the defaults.
    ///
    /// A missing file is only an error when `required` is set, i.e. when the
    /// user named it explicitly.
    pub fn load(file: &Path, required: bool) -> Result<Self> {
        Self::load_with_env(file, required, None)
    }

    fn load_with_env(
        file: &Path,
        required: bool,
        vars: Option<config::Map<String, String>>,
    ) -> Result<Self> {
        let settings: Settings = config::Config::builder()
            .add_source(config::File::from(file).required(required))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("categories")
                    .source(vars),
            )
            .build()
            .and_then(|c| c.try_deserialize())
            .map_err(|e| PipelineError::configuration(file, e))?;
        settings.validate(file)?;
        Ok(settings)
    }

    fn validate(&self, file: &Path) -> Result<()> {
        if self.base_url.is_empty() {
            return Err(PipelineError::configuration(file, "base_url is empty"));
        }
        for name in &self.categories {
            if Category::new(name).is_none() {
                return Err(PipelineError::configuration(
                    file,
                    format!("invalid category name {:?}", name),
                ));
            }
        }
        for page in &self.curated {
            if !(0.0..=1.0).contains(&page.priority) {
                return Err(PipelineError::configuration(
                    file,
                    format!("priority {} of {} is outside [0, 1]", page.priority, page.path),
                ));
            }
        }
        Ok(())
    }

    pub fn categories(&self) -> Vec<Category> {
        self.categories.iter().filter_map(|c| Category::new(c)).collect()
    }

    /// Pick one configured category, or all of them.
    pub fn select_categories(&self, only: Option<&str>) -> anyhow::Result<Vec<Category>> {
        let all = self.categories();
        match only {
            None => Ok(all),
            Some(name) => all
                .into_iter()
                .find(|c| c.as_str() == name)
                .map(|c| vec![c])
                .ok_or_else(|| anyhow::anyhow!("unknown category {:?}", name)),
        }
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }

    pub fn resolve_paths(&self, root: &Path) -> RootPaths {
        let join = |p: &Path| root.join(p);
        RootPaths {
            sources: join(&self.paths.sources),
            data_dir: join(&self.paths.data_dir),
            pages_dir: join(&self.paths.pages_dir),
            sitemap: join(&self.paths.sitemap),
            urls: join(&self.paths.urls),
        }
    }
}

/// Absolute locations of every pipeline artifact, handed to each stage.
#[derive(Debug, Clone)]
pub struct RootPaths {
    pub sources: PathBuf,
    pub data_dir: PathBuf,
    pub pages_dir: PathBuf,
    pub sitemap: PathBuf,
    pub urls: PathBuf,
}

impl RootPaths {
    #[cfg(test)]
    pub fn under(root: &Path) -> Self {
        Settings::default().resolve_paths(root)
    }

    pub fn category_pages(&self, category: &Category) -> PathBuf {
        self.pages_dir.join(category.pages_dir_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_names() {
        assert!(Category::new("items").is_some());
        assert!(Category::new("boss-fights").is_some());
        assert!(Category::new("").is_none());
        assert!(Category::new("../etc").is_none());
        assert!(Category::new("Items").is_none());
    }

    #[test]
    fn singular_labels() {
        let singular = |n: &str| Category::new(n).unwrap().singular();
        assert_eq!(singular("items"), "item");
        assert_eq!(singular("enemies"), "enemy");
        assert_eq!(singular("loot"), "loot");
    }

    #[test]
    fn missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings::load(&dir.path().join(DEFAULT_CONFIG_FILE), false).unwrap();
        assert_eq!(settings.fetch_timeout(), Duration::from_secs(20));
        assert_eq!(settings.categories().len(), 2);
        assert_eq!(settings.curated.len(), 11);
    }

    #[test]
    fn file_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join(DEFAULT_CONFIG_FILE);
        std::fs::write(
            &file,
            r#"
base_url = "https://example.org"
categories = ["items", "quests"]

[paths]
data_dir = "store"

[[curated]]
path = "/"
priority = 1.0
changefreq = "daily"
"#,
        )
        .unwrap();

        let settings = Settings::load(&file, true).unwrap();
        assert_eq!(settings.base_url, "https://example.org");
        assert_eq!(settings.categories()[1].as_str(), "quests");
        assert_eq!(settings.curated.len(), 1);
        assert_eq!(settings.curated[0].changefreq, ChangeFreq::Daily);

        let paths = settings.resolve_paths(dir.path());
        assert_eq!(paths.data_dir, dir.path().join("store"));
        assert_eq!(paths.pages_dir, dir.path().join("pages"));
    }

    #[test]
    fn rejects_out_of_range_priority() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join(DEFAULT_CONFIG_FILE);
        std::fs::write(
            &file,
            "[[curated]]\npath = \"/\"\npriority = 1.5\nchangefreq = \"weekly\"\n",
        )
        .unwrap();
        assert!(matches!(
            Settings::load(&file, true),
            Err(PipelineError::Configuration { .. })
        ));
    }

    #[test]
    fn select_unknown_category_fails() {
        let settings = Settings::default();
        assert_eq!(settings.select_categories(Some("enemies")).unwrap().len(), 1);
        assert!(settings.select_categories(Some("spells")).is_err());
    }

    #[test]
    fn explicit_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("custom.toml");
        assert!(matches!(
            Settings::load(&file, true),
            Err(PipelineError::Configuration { .. })
        ));
        assert!(Settings::load(&file, false).is_ok());
    }

    fn env(vars: &[(&str, &str)]) -> config::Map<String, String> {
        vars.iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn env_overrides_scalar_nested_and_list_keys() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join(DEFAULT_CONFIG_FILE);
        let vars = env(&[
            ("SITEGEN_FETCH_TIMEOUT_SECS", "5"),
            ("SITEGEN_PATHS__DATA_DIR", "store"),
            ("SITEGEN_CATEGORIES", "items,quests"),
            ("SITEGEN_BASE_URL", "https://staging.example"),
        ]);

        let settings = Settings::load_with_env(&file, false, Some(vars)).unwrap();
        assert_eq!(settings.fetch_timeout(), Duration::from_secs(5));
        assert_eq!(settings.base_url, "https://staging.example");
        assert_eq!(settings.categories, vec!["items", "quests"]);

        let paths = settings.resolve_paths(dir.path());
        assert_eq!(paths.data_dir, dir.path().join("store"));
        assert_eq!(paths.pages_dir, dir.path().join("pages"));
    }

    #[test]
    fn env_single_category_is_a_list() {
        let dir = tempfile::tempdir().unwrap();
        let vars = env(&[("SITEGEN_CATEGORIES", "enemies")]);
        let settings =
            Settings::load_with_env(&dir.path().join(DEFAULT_CONFIG_FILE), false, Some(vars))
                .unwrap();
        assert_eq!(settings.categories, vec!["enemies"]);
    }

    #[test]
    fn env_overrides_file() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join(DEFAULT_CONFIG_FILE);
        std::fs::write(&file, "categories = [\"items\"]\nfetch_timeout_secs = 30\n").unwrap();
        let vars = env(&[("SITEGEN_CATEGORIES", "loot,enemies")]);

        let settings = Settings::load_with_env(&file, true, Some(vars)).unwrap();
        assert_eq!(settings.categories, vec!["loot", "enemies"]);
        assert_eq!(settings.fetch_timeout(), Duration::from_secs(30));
    }
}
