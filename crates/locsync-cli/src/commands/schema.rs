use std::path::Path;

use color_eyre::eyre::Result;
use schemars::schema_for;

use locsync_domain::{LocaleDiffReport, SyncSummary};

pub fn run(out_dir: &Path) -> Result<()> {
    std::fs::create_dir_all(out_dir)?;
    write_schema(out_dir, "sync_summary", &schema_for!(SyncSummary))?;
    write_schema(out_dir, "locale_diff_report", &schema_for!(LocaleDiffReport))?;
    println!("✔ schemas written to {}", out_dir.display());
    Ok(())
}

fn write_schema(out_dir: &Path, name: &str, schema: &schemars::schema::RootSchema) -> Result<()> {
    let path = out_dir.join(format!("{name}.schema.json"));
    std::fs::write(&path, serde_json::to_vec_pretty(schema)?)?;
    Ok(())
}
