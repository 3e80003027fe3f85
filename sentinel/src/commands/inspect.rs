// sentinel/src/commands/inspect.rs
//
// USE CASE: Inspect a DuckDB table (schema + sample rows).

use comfy_table::Cell;
use std::path::Path;

use sentinel_core::infrastructure::adapters::DuckDbWarehouse;

use super::render::new_table;

pub fn execute(db_path: String, table: String, limit: usize) -> anyhow::Result<()> {
    if !Path::new(&db_path).exists() {
        anyhow::bail!(
            "❌ Database not found at: {}\n👉 Have you run 'sentinel run'?",
            db_path
        );
    }

    let warehouse = DuckDbWarehouse::new(&db_path)?;
    let columns = warehouse.table_columns(&table)?;
    if columns.is_empty() {
        anyhow::bail!("❌ Table '{}' not found in {}", table, db_path);
    }
    let total = warehouse.count_rows(&table)?;
    let sample = warehouse.read_table(&table, Some(limit))?;

    println!("\n🔍 Inspecting Table: '{}' ({} rows)", table, total);

    let mut schema = new_table();
    schema.set_header(vec!["Column", "Type"]);
    for (name, data_type) in &columns {
        schema.add_row(vec![name, data_type]);
    }
    println!("{schema}");

    let mut rows = new_table();
    rows.set_header(sample.columns().to_vec());
    for row in sample.rows() {
        rows.add_row(row.iter().map(|v| Cell::new(v.to_string())).collect::<Vec<_>>());
    }
    println!("   --- Rows (Limit {}) ---\n{rows}", limit);

    Ok(())
}
