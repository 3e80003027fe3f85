// sentinel/src/commands/rules.rs
//
// USE CASE: List the project's quality rules and check that they parse.

use anyhow::Context;
use comfy_table::{Cell, Color};
use std::path::PathBuf;

use sentinel_core::domain::quality::Rule;
use sentinel_core::infrastructure::config::{ProjectConfig, load_project_config, load_rule_records};

use super::render::new_table;

pub fn execute(project_dir: PathBuf) -> anyhow::Result<()> {
    let config = load_project_config(&project_dir).with_context(|| {
        format!(
            "Failed to load project configuration from {:?}",
            project_dir
        )
    })?;
    let rules_path = ProjectConfig::resolve(&project_dir, &config.rules_path);
    let loaded = load_rule_records(&rules_path)
        .with_context(|| format!("Failed to load rules from {:?}", rules_path))?;
    let records = loaded.records;

    let mut table = new_table();
    table.set_header(vec![
        "ID", "Table", "Column", "Type", "Threshold", "Severity", "Active", "Check",
    ]);

    let mut invalid = 0;
    for record in &records {
        let check = match Rule::try_from(record) {
            Ok(_) => Cell::new("ok").fg(Color::Green),
            Err(e) => {
                invalid += 1;
                Cell::new(e.to_string()).fg(Color::Red)
            }
        };
        table.add_row(vec![
            Cell::new(record.rule_id),
            Cell::new(&record.table_name),
            Cell::new(&record.column_name),
            Cell::new(&record.rule_type),
            Cell::new(record.threshold),
            Cell::new(&record.severity),
            Cell::new(if record.is_active { "yes" } else { "no" }),
            check,
        ]);
    }

    println!("{table}");
    for reason in &loaded.rejected {
        eprintln!("   ❌ {}", reason);
    }
    eprintln!(
        "📋 {} rules loaded, {} invalid",
        records.len(),
        invalid + loaded.rejected.len()
    );
    Ok(())
}
