use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::process::Command;
use std::time::{Duration, Instant};

use camino::Utf8PathBuf;
use color_eyre::eyre::{bail, eyre, Context, Result};
use glob::glob;
use log::info;

use crate::exec::run_checked;
use crate::resources::ResourceRegistry;

/// How a phasing run reassembles its per-chromosome pieces.
#[derive(Debug)]
pub struct MergePlan<'a> {
    /// Glob matching the per-chromosome phased outputs.
    pub output_pattern: &'a str,
    /// Glob matching the per-chromosome logs.
    pub log_pattern: &'a str,
    /// Final outputs are named `{prefix}.phased.vcf.gz` and `{prefix}.log`.
    pub prefix: &'a str,
    /// Whether each per-chromosome output has a `.csi` sidecar to remove.
    pub index_sidecars: bool,
}

/// Glob a per-unit pattern and sort lexicographically by name. Chromosome
/// order falls out of the chr{1..22} naming; no other unit set is supported.
pub fn collect_sorted(pattern: &str) -> Result<Vec<Utf8PathBuf>> {
    let mut files = Vec::new();
    for entry in glob(pattern)? {
        let path = Utf8PathBuf::from_path_buf(entry?)
            .map_err(|p| eyre!("Non UTF-8 path: {}", p.display()))?;
        files.push(path);
    }
    files.sort();
    Ok(files)
}

/// Concatenate the sorted per-chromosome outputs into the final compressed
/// variant file, writing its index alongside.
pub fn concat_outputs(
    resources: &ResourceRegistry,
    threads: usize,
    outputs: &[Utf8PathBuf],
    merged: &str,
) -> Result<()> {
    let mut cmd = Command::new(resources.get("bcftools")?);
    cmd.arg("concat")
        .arg("--write-index")
        .arg("--threads")
        .arg(threads.to_string())
        .arg("-Oz")
        .arg("-o")
        .arg(merged)
        .args(outputs);
    run_checked(&mut cmd, "Concatenate phased files")
}

/// Concatenate the per-chromosome logs into one file, in filename order.
pub fn concat_logs(logs: &[Utf8PathBuf], merged_log: &str) -> Result<()> {
    let mut out = File::create(merged_log)
        .wrap_err_with(|| format!("Failed to create merged log: {}", merged_log))?;
    for log in logs {
        let mut input =
            File::open(log).wrap_err_with(|| format!("Failed to open log: {}", log))?;
        io::copy(&mut input, &mut out)?;
    }
    Ok(())
}

/// Append the wall-clock line the pipeline ends its merged log with.
pub fn append_elapsed(merged_log: &str, elapsed: Duration) -> Result<()> {
    let mut out = OpenOptions::new()
        .create(true)
        .append(true)
        .open(merged_log)?;
    writeln!(out, "\nTime spent: {}", format_elapsed(elapsed))?;
    Ok(())
}

/// HH:MM:SS wall-clock formatting.
pub fn format_elapsed(elapsed: Duration) -> String {
    let secs = elapsed.as_secs();
    format!("{:02}:{:02}:{:02}", secs / 3600, (secs % 3600) / 60, secs % 60)
}

/// Merge per-chromosome outputs and logs, remove the intermediates and append
/// the elapsed time. A concat failure is fatal and leaves the intermediates
/// in place.
pub fn run(
    plan: &MergePlan,
    resources: &ResourceRegistry,
    threads: usize,
    started: Instant,
) -> Result<()> {
    let outputs = collect_sorted(plan.output_pattern)?;
    if outputs.is_empty() {
        bail!("No phased files matching '{}' to merge", plan.output_pattern);
    }

    let merged = format!("{}.phased.vcf.gz", plan.prefix);
    concat_outputs(resources, threads, &outputs, &merged)?;

    let logs = collect_sorted(plan.log_pattern)?;
    let merged_log = format!("{}.log", plan.prefix);
    concat_logs(&logs, &merged_log)?;

    for output in &outputs {
        fs::remove_file(output)?;
        if plan.index_sidecars {
            fs::remove_file(format!("{}.csi", output))?;
        }
    }
    for log in &logs {
        fs::remove_file(log)?;
    }

    append_elapsed(&merged_log, started.elapsed())?;
    info!("Wrote {} and {}", merged, merged_log);
    Ok(())
}
