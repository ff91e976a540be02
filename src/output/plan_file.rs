//! Plan file output.
//!
//! Writes the resource graph as JSON so an external engine can apply it.

use crate::engine::Plan;
use colored::Colorize;
use std::error::Error;
use std::path::Path;

/// Default plan file name for today, e.g. `plan_2024-05-01.json`.
pub fn plan_file_name() -> String {
    format!("plan_{}.json", chrono::Utc::now().format("%Y-%m-%d"))
}

/// Write `plan` as pretty JSON into `dir` and return the written path.
pub fn write_plan(plan: &Plan, dir: &str) -> Result<String, Box<dyn Error>> {
    if !Path::new(dir).is_dir() {
        return Err(format!("Plan output directory does not exist: {dir}").into());
    }
    let path = Path::new(dir).join(plan_file_name());
    let path = path.to_string_lossy().to_string();

    let json = plan.to_json()?;
    log::warn!("Writing plan with {} resources to: {path}", plan.len());
    std::fs::write(&path, json).map_err(|e| format!("Error writing plan file {path}: {e}"))?;
    Ok(path)
}

/// Print exports, resolving values that are known before apply.
pub fn print_exports(plan: &Plan) {
    for (name, value) in &plan.exports {
        match plan.resolve(value) {
            Some(resolved) => println!("{:>24} = {resolved}", name.bold()),
            None => println!("{:>24} = {} (known after apply)", name.bold(), value),
        }
    }
}
