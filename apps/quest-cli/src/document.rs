// document.rs — Reading input documents and printing results.
//
// Goal, edit, completion and evidence files may be JSON or YAML; the format
// follows the extension (`.yaml`/`.yml` → YAML, anything else → JSON).

use std::fs;
use std::path::Path;

use anyhow::Context;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use quest_spec::{validate, GoalSpecification};

pub fn read_document(path: &Path) -> anyhow::Result<Value> {
    let content =
        fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    let is_yaml = matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("yaml") | Some("yml")
    );
    let value = if is_yaml {
        serde_yaml::from_str(&content)
            .with_context(|| format!("{} is not valid YAML", path.display()))?
    } else {
        serde_json::from_str(&content)
            .with_context(|| format!("{} is not valid JSON", path.display()))?
    };
    Ok(value)
}

pub fn read_as<T: DeserializeOwned>(path: &Path) -> anyhow::Result<T> {
    let value = read_document(path)?;
    serde_json::from_value(value)
        .with_context(|| format!("{} does not have the expected shape", path.display()))
}

/// Read and strictly validate a goal specification.
pub fn read_spec(path: &Path) -> anyhow::Result<GoalSpecification> {
    let raw = read_document(path)?;
    validate(&raw).with_context(|| format!("{} is not a valid goal specification", path.display()))
}

pub fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
