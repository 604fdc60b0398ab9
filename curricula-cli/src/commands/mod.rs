//! CLI command implementations

pub mod catalog;
pub mod plan;
pub mod requirement;
pub mod share;

use std::path::Path;

use anyhow::Context as _;
use curricula_core::{Config, PlanVersionManager};
use curricula_db::{Database, SqliteStore};
use serde::de::DeserializeOwned;
use serde::Serialize;

pub use catalog::CatalogArgs;
pub use plan::PlanArgs;
pub use requirement::RequirementArgs;
pub use share::ShareArgs;

/// State shared by every command
pub struct Context {
    pub config: Config,
    pub json: bool,
}

impl Context {
    pub async fn database(&self) -> anyhow::Result<Database> {
        Database::connect(&self.config.database)
            .await
            .with_context(|| {
                format!(
                    "Failed to open database at {}",
                    self.config.database.path.display()
                )
            })
    }

    pub async fn plans(&self) -> anyhow::Result<PlanVersionManager<SqliteStore>> {
        let db = self.database().await?;
        Ok(PlanVersionManager::new(
            db.store(),
            self.config.validation.clone(),
        ))
    }

    /// Print `value` as JSON in `--json` mode, otherwise run `text`
    pub fn emit<T: Serialize>(&self, value: &T, text: impl FnOnce(&T)) -> anyhow::Result<()> {
        if self.json {
            println!("{}", serde_json::to_string_pretty(value)?);
        } else {
            text(value);
        }
        Ok(())
    }
}

/// Read a JSON or TOML document, chosen by file extension
pub fn read_document<T: DeserializeOwned>(path: &Path) -> anyhow::Result<T> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    let is_json = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

    if is_json {
        serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse {} as JSON", path.display()))
    } else {
        toml::from_str(&contents)
            .with_context(|| format!("Failed to parse {} as TOML", path.display()))
    }
}
