use serde::Serialize;

pub fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    println!("{}", json);
    Ok(())
}

pub fn print_table(headers: &[&str], rows: Vec<Vec<String>>) {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.len()).collect();
    for row in &rows {
        for (i, cell) in row.iter().enumerate() {
            if i < widths.len() {
                widths[i] = widths[i].max(cell.chars().count());
            }
        }
    }

    let header_row: Vec<String> = headers
        .iter()
        .enumerate()
        .map(|(i, h)| format!("{:width$}", h, width = widths[i]))
        .collect();
    println!("{}", header_row.join("  ").trim_end());

    let sep: Vec<String> = widths.iter().map(|&w| "-".repeat(w)).collect();
    println!("{}", sep.join("  "));

    for row in &rows {
        let cells: Vec<String> = row
            .iter()
            .enumerate()
            .map(|(i, cell)| {
                let w = widths.get(i).copied().unwrap_or(0);
                format!("{:width$}", cell, width = w)
            })
            .collect();
        println!("{}", cells.join("  ").trim_end());
    }
}

/// One table row per command: index, action, target, parameters, description.
pub fn command_rows(commands: &[armplan_core::command::RobotCommand]) -> Vec<Vec<String>> {
    commands
        .iter()
        .enumerate()
        .map(|(i, cmd)| {
            let target = cmd
                .position()
                .map(|p| format!("({}, {}, {})", p.x, p.y, p.z))
                .unwrap_or_default();
            let mut params = Vec::new();
            if let Some(speed) = cmd.kind.speed() {
                params.push(format!("speed {speed}"));
            }
            if let Some(force) = cmd.kind.force() {
                params.push(format!("force {force}"));
            }
            if let Some(duration) = cmd.kind.duration() {
                params.push(format!("{duration}s"));
            }
            vec![
                (i + 1).to_string(),
                cmd.action().to_string(),
                target,
                params.join(", "),
                cmd.description.clone(),
            ]
        })
        .collect()
}

pub const COMMAND_HEADERS: &[&str] = &["#", "ACTION", "TARGET", "PARAMS", "DESCRIPTION"];
