// expand.rs — `quest expand`: preview a schedule goal's occurrences.
//
// Without `--edits` this prints the stored preview. With `--edits` the edits
// are recorded on an in-memory copy (same checks as a persisted write) and
// the resulting preview and version are printed; the input file is not
// modified.

use std::path::Path;

use serde_json::json;

use quest_schedule::{preview_occurrences, record_overrides};
use quest_spec::Override;

use crate::config::QuestConfig;
use crate::document::{print_json, read_as, read_spec};

pub fn execute(file: &Path, edits: Option<&Path>, config: &QuestConfig) -> anyhow::Result<()> {
    let mut spec = read_spec(file)?;

    let occurrences = match edits {
        Some(path) => {
            let edits: Vec<Override> = read_as(path)?;
            let version = spec.version;
            record_overrides(&mut spec, &edits, version, &config.overrides)?
        }
        None => preview_occurrences(&spec, &config.overrides)?,
    };

    print_json(&json!({
        "title": spec.title,
        "version": spec.version,
        "confirmed": spec.confirmed,
        "overrides": spec.schedule().map(|s| s.overrides.clone()).unwrap_or_default(),
        "occurrences": occurrences,
    }))
}
