use crate::output::{command_rows, print_json, print_table, COMMAND_HEADERS};
use anyhow::{bail, Context, Result};
use armplan_core::config::Config;
use armplan_core::sequence::CommandSequence;
use std::path::Path;

pub fn run(config: &Config, file: &Path, json: bool) -> Result<()> {
    let raw = std::fs::read_to_string(file)
        .with_context(|| format!("failed to read {}", file.display()))?;
    let value: serde_json::Value = serde_json::from_str(&raw)
        .with_context(|| format!("{} is not valid JSON", file.display()))?;
    let sequence = CommandSequence::from_json(value)
        .with_context(|| format!("{} is not a command sequence", file.display()))?;

    let validation = sequence.validate_sequence(&config.workspace);
    let estimate = sequence.estimate_total_time();

    if json {
        print_json(&serde_json::json!({
            "valid": validation.valid,
            "errors": validation.errors,
            "command_count": sequence.len(),
            "estimated_duration": estimate,
            "status": sequence.status,
        }))?;
    } else {
        print_table(COMMAND_HEADERS, command_rows(&sequence.commands));
        println!();
        println!("{} commands, estimated {estimate:.1}s", sequence.len());
        for err in &validation.errors {
            println!("! {err}");
        }
    }

    if !validation.valid {
        bail!(
            "sequence is invalid ({} error{})",
            validation.errors.len(),
            if validation.errors.len() == 1 { "" } else { "s" }
        );
    }
    Ok(())
}
