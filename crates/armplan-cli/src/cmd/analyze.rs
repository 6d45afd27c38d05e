use crate::output::{command_rows, print_json, print_table, COMMAND_HEADERS};
use anyhow::Result;
use armplan_core::analyzer::{TaskAnalysis, TaskAnalyzer};
use armplan_core::config::Config;
use rand::rngs::StdRng;
use rand::SeedableRng;

pub fn run(config: &Config, description: &str, seed: Option<u64>, json: bool) -> Result<()> {
    let analyzer = TaskAnalyzer::new();
    let result = match seed {
        Some(seed) => {
            let mut rng = StdRng::seed_from_u64(seed);
            analyzer.analyze(&mut rng, description, &config.workspace)
        }
        None => analyzer.analyze(&mut rand::thread_rng(), description, &config.workspace),
    };
    tracing::debug!(
        commands = result.sequence.len(),
        task_type = %result.task_type,
        "analysis complete"
    );

    if json {
        return print_json(&response(&result));
    }

    println!("Task type:  {}", result.task_type);
    println!("Objects:    {}", result.objects.join(", "));
    println!("Confidence: {:.0}%", result.confidence * 100.0);
    println!("Estimate:   {}s", result.execution_time_estimate);
    println!();
    println!("{}", result.analysis);
    println!();
    print_table(COMMAND_HEADERS, command_rows(&result.sequence.commands));

    if !result.validation.valid {
        println!();
        for err in &result.validation.errors {
            println!("! {err}");
        }
    }
    Ok(())
}

/// Same field names as the HTTP analyze response, minus request-scoped ids.
fn response(result: &TaskAnalysis) -> serde_json::Value {
    let commands: Vec<_> = result
        .sequence
        .commands
        .iter()
        .map(|c| c.to_record())
        .collect();
    serde_json::json!({
        "analysis": result.analysis,
        "objects_detected": result.objects,
        "confidence": result.confidence,
        "task_type": result.task_type,
        "commands": commands,
        "execution_time_estimate": result.execution_time_estimate,
        "validation": result.validation,
    })
}
