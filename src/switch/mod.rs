use std::process::Command;

use camino::Utf8PathBuf;
use color_eyre::eyre::{Context, Result};
use log::info;
use rayon::iter::{IntoParallelIterator, ParallelIterator};

use crate::exec::run_checked;
use crate::resources::ResourceRegistry;
use crate::units::ComparisonRow;

/// Immutable per-run configuration handed to every worker.
#[derive(Debug)]
pub struct SwitchConfig {
    pub table: Utf8PathBuf,
    pub out_dir: Utf8PathBuf,
    pub resources: ResourceRegistry,
}

/// Estimate the switch error for every row of the comparison table in
/// parallel. Each row yields independent vcftools outputs under the output
/// directory; there is nothing to merge.
pub fn run(config: SwitchConfig) -> Result<()> {
    let rows = ComparisonRow::load_table(&config.table)?;

    std::fs::create_dir_all(&config.out_dir)
        .wrap_err_with(|| format!("Failed to create output directory: {}", config.out_dir))?;

    info!("Estimating switch error for {} comparisons", rows.len());
    rows.into_par_iter()
        .try_for_each(|row| estimate_switch_error(&row, &config))
}

fn estimate_switch_error(row: &ComparisonRow, config: &SwitchConfig) -> Result<()> {
    info!("Comparing phased files for sample {}", row.sample);

    let mut cmd = Command::new(config.resources.get("vcftools")?);
    cmd.arg("--gzvcf")
        .arg(&row.first_vcf)
        .arg("--gzdiff")
        .arg(&row.second_vcf)
        .arg("--diff-switch-error")
        .arg("--out")
        .arg(config.out_dir.join(&row.sample));

    run_checked(
        &mut cmd,
        &format!("Switch-error estimate for sample {}", row.sample),
    )
}
