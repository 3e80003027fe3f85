// sentinel/src/commands/run.rs
//
// USE CASE: Evaluate every configured entity of a project.

use anyhow::{Context, bail};
use std::path::PathBuf;
use std::sync::Arc;

use sentinel_core::application::{EntityJob, QualityOrchestrator, QualityReport, Stage, run_entities};
use sentinel_core::infrastructure::RuleStore;
use sentinel_core::infrastructure::adapters::{DuckDbWarehouse, MemorySink};
use sentinel_core::infrastructure::config::{ProjectConfig, load_project_config};
use sentinel_core::ports::{PersistenceSink, SnapshotProvider};

use super::render;
use crate::cli::OutputFormat;

/// Returns `false` when any entity recorded a stage failure.
pub async fn execute(
    project_dir: PathBuf,
    entity: Option<String>,
    format: OutputFormat,
    dry_run: bool,
) -> anyhow::Result<bool> {
    let start = std::time::Instant::now();

    eprintln!("⚙️  Loading configuration...");
    let config = load_project_config(&project_dir).with_context(|| {
        format!(
            "Failed to load project configuration from {:?}",
            project_dir
        )
    })?;
    eprintln!("   Project: {} (v{})", config.name, config.version);

    let entities: Vec<_> = match &entity {
        Some(name) => vec![
            config
                .entity(name)
                .cloned()
                .with_context(|| format!("Unknown entity '{}'", name))?,
        ],
        None => config.entities.clone(),
    };
    if entities.is_empty() {
        bail!("No entity configured in project '{}'", config.name);
    }

    let db_path = ProjectConfig::resolve(&project_dir, &config.database);
    let db_path = db_path.to_string_lossy();
    let warehouse = Arc::new(
        DuckDbWarehouse::new(&db_path)
            .with_context(|| format!("Failed to initialize DuckDB at {}", db_path))?,
    );

    for source in &config.sources {
        let path = ProjectConfig::resolve(&project_dir, &source.path);
        if path.exists() {
            warehouse
                .register_csv(&source.name, &path.to_string_lossy())
                .with_context(|| format!("Failed to register source '{}'", source.name))?;
        } else {
            eprintln!("   ⚠️  Warning: Source file not found at {:?}", path);
        }
    }

    let sink: Arc<dyn PersistenceSink> = if dry_run {
        eprintln!("   Dry run: results are not persisted");
        Arc::new(MemorySink::new())
    } else {
        warehouse
            .ensure_result_tables()
            .context("Failed to create result tables")?;
        warehouse.clone()
    };

    let rules_path = ProjectConfig::resolve(&project_dir, &config.rules_path);
    let (rule_store, rejected) = RuleStore::from_path(&rules_path)
        .with_context(|| format!("Failed to load rules from {:?}", rules_path))?;
    for reason in &rejected {
        eprintln!("   ⚠️  Rule skipped: {}", reason);
    }
    let orchestrator = QualityOrchestrator::new(Arc::new(rule_store), sink);

    // Snapshot acquisition failures are reported per entity, not fatal.
    let mut jobs: Vec<EntityJob> = Vec::new();
    let mut slots: Vec<Option<QualityReport>> = Vec::new();
    for entity in entities {
        match warehouse.fetch_snapshot(&entity.table).await {
            Ok(snapshot) => {
                jobs.push((entity, snapshot));
                slots.push(None);
            }
            Err(e) => {
                let mut report = QualityReport::new(&entity.name, &entity.table);
                report.fail(Stage::Snapshot, e.to_string());
                slots.push(Some(report));
            }
        }
    }

    eprintln!("🔎 Evaluating {} entities...", jobs.len());
    let mut evaluated = run_entities(&orchestrator, jobs).await.into_iter();
    let reports: Vec<QualityReport> = slots
        .into_iter()
        .filter_map(|slot| slot.or_else(|| evaluated.next()))
        .collect();

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&reports)?),
        OutputFormat::Table => render::print_reports(&reports),
    }
    render::print_diagnostics(&reports);

    let success = reports.iter().all(QualityReport::is_success);
    if success {
        eprintln!("\n✨ SUCCESS! Quality run finished in {:.2?}", start.elapsed());
    } else {
        let failed = reports.iter().filter(|r| !r.is_success()).count();
        eprintln!("\n❌ FAILURE. {} entities had failing stages.", failed);
    }
    Ok(success)
}
