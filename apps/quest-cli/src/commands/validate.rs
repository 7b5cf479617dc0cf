// validate.rs — `quest validate`: strict or repairing validation.

use std::path::Path;

use serde_json::json;

use quest_spec::{validate, validate_with_recovery};

use crate::document::{print_json, read_document};

pub fn execute(file: &Path, repair: bool) -> anyhow::Result<()> {
    let raw = read_document(file)?;

    if repair {
        let outcome = validate_with_recovery(&raw);
        for warning in &outcome.warnings {
            tracing::info!(repair = %warning.repair, path = %warning.path, "{}", warning.message);
        }
        print_json(&outcome)?;
        if !outcome.is_valid() {
            anyhow::bail!(
                "{} has {} problem(s) after repair",
                file.display(),
                outcome.errors.len()
            );
        }
        return Ok(());
    }

    match validate(&raw) {
        Ok(spec) => print_json(&json!({ "valid": true, "specification": spec })),
        Err(errors) => {
            print_json(&json!({ "valid": false, "errors": errors.issues }))?;
            anyhow::bail!("{}", errors)
        }
    }
}
