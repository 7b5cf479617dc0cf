// config.rs — Project configuration from .quest/config.toml.
//
// ```toml
// [evaluator]
// tolerance_minutes = 15
//
// [weeks]
// anchor = "iso_week"            # or "start_weekday"
// enforce_partial_weeks = false
//
// [overrides]
// move_collision = "reject"      # or "replace"
// ```
//
// Every section and field is optional.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use quest_schedule::{OverrideOptions, WeekBoundaryConfig};
use quest_verify::EvaluatorConfig;

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct QuestConfig {
    #[serde(default)]
    pub evaluator: EvaluatorConfig,

    #[serde(default)]
    pub weeks: WeekBoundaryConfig,

    #[serde(default)]
    pub overrides: OverrideOptions,
}

impl QuestConfig {
    /// `<project_root>/.quest/config.toml`
    pub fn path_for(project_root: &Path) -> PathBuf {
        project_root.join(".quest").join("config.toml")
    }

    pub fn for_project(project_root: &Path) -> Self {
        Self::load_or_default(&Self::path_for(project_root))
    }

    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Load the config, falling back to defaults when the file is missing or
    /// unreadable.
    pub fn load_or_default(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }
        match Self::load(path) {
            Ok(config) => {
                tracing::debug!(path = %path.display(), "loaded config");
                config
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "ignoring invalid config");
                Self::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quest_schedule::{MoveCollision, WeekAnchor};
    use tempfile::TempDir;

    fn write_config(dir: &TempDir, content: &str) -> PathBuf {
        let path = QuestConfig::path_for(dir.path());
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = TempDir::new().unwrap();
        let config = QuestConfig::for_project(dir.path());
        assert_eq!(config, QuestConfig::default());
        assert_eq!(config.evaluator.tolerance_minutes, 15);
        assert_eq!(config.overrides.move_collision, MoveCollision::Reject);
    }

    #[test]
    fn full_file_is_parsed() {
        let dir = TempDir::new().unwrap();
        write_config(
            &dir,
            r#"
[evaluator]
tolerance_minutes = 5

[weeks]
anchor = "iso_week"
enforce_partial_weeks = true

[overrides]
move_collision = "replace"
"#,
        );
        let config = QuestConfig::for_project(dir.path());
        assert_eq!(config.evaluator.tolerance_minutes, 5);
        assert_eq!(config.weeks.anchor, WeekAnchor::IsoWeek);
        assert!(config.weeks.enforce_partial_weeks);
        assert_eq!(config.overrides.move_collision, MoveCollision::Replace);
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let dir = TempDir::new().unwrap();
        write_config(&dir, "[weeks]\nenforce_partial_weeks = true\n");
        let config = QuestConfig::for_project(dir.path());
        assert!(config.weeks.enforce_partial_weeks);
        assert_eq!(config.weeks.anchor, WeekAnchor::StartWeekday);
        assert_eq!(config.evaluator.tolerance_minutes, 15);
    }

    #[test]
    fn invalid_file_falls_back_to_defaults() {
        let dir = TempDir::new().unwrap();
        let path = write_config(&dir, "[overrides]\nmove_collision = \"merge\"\n");
        assert!(QuestConfig::load(&path).is_err());
        assert_eq!(QuestConfig::load_or_default(&path), QuestConfig::default());
    }
}
