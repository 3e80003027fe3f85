// sentinel-core/src/application/batch.rs

use std::collections::HashMap;
use tokio::task::JoinSet;
use tracing::{info, instrument};

use crate::application::orchestrator::{QualityOrchestrator, QualityReport, Stage};
use crate::domain::entity::EntityConfig;
use crate::domain::snapshot::Snapshot;

/// One entity and the snapshot it is evaluated on.
pub type EntityJob = (EntityConfig, Snapshot);

/// Runs every job on its own task and returns one report per job, in input order.
///
/// A task that panics yields a report with an `internal` stage failure; the
/// other entities are unaffected. This relies on panics unwinding, so no
/// profile of the workspace may set `panic = "abort"`.
#[instrument(skip_all, fields(jobs = jobs.len()))]
pub async fn run_entities(orchestrator: &QualityOrchestrator, jobs: Vec<EntityJob>) -> Vec<QualityReport> {
    let mut set = JoinSet::new();
    let mut positions = HashMap::new();
    let mut placeholders = Vec::with_capacity(jobs.len());

    for (idx, (entity, snapshot)) in jobs.into_iter().enumerate() {
        placeholders.push(QualityReport::new(&entity.name, &entity.table));
        let orchestrator = orchestrator.clone();
        let handle = set.spawn(async move { orchestrator.run(&entity, snapshot).await });
        positions.insert(handle.id(), idx);
    }

    let mut slots: Vec<Option<QualityReport>> = placeholders.iter().map(|_| None).collect();
    while let Some(joined) = set.join_next_with_id().await {
        match joined {
            Ok((id, report)) => {
                if let Some(&idx) = positions.get(&id) {
                    slots[idx] = Some(report);
                }
            }
            Err(e) => {
                let Some(&idx) = positions.get(&e.id()) else {
                    continue;
                };
                placeholders[idx].fail(Stage::Internal, format!("entity task failed: {}", e));
            }
        }
    }

    let reports: Vec<QualityReport> = slots
        .into_iter()
        .zip(placeholders)
        .map(|(done, placeholder)| done.unwrap_or(placeholder))
        .collect();
    info!(
        failed = reports.iter().filter(|r| !r.is_success()).count(),
        "Batch finished"
    );
    reports
}
