use std::fs::File;
use std::io::Write;
use std::path::Path;
use std::process::Command;
use std::str::FromStr;
use std::time::Instant;

use camino::Utf8PathBuf;
use color_eyre::eyre::{bail, eyre, Context, Result};
use log::info;
use rayon::iter::{IntoParallelIterator, ParallelIterator};

use crate::exec::{check_file, run_captured, run_checked};
use crate::merge::{self, MergePlan};
use crate::resources::ResourceRegistry;
use crate::units::autosomes;

/// Which external binary phases the autosomes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhasingTool {
    Shapeit,
    Eagle,
    Beagle,
}

impl FromStr for PhasingTool {
    type Err = color_eyre::Report;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "shapeit" => Ok(Self::Shapeit),
            "eagle" => Ok(Self::Eagle),
            "beagle" => Ok(Self::Beagle),
            other => Err(eyre!("Unknown tool: {}", other)),
        }
    }
}

/// Immutable per-run configuration handed to every worker.
#[derive(Debug)]
pub struct PhaseConfig {
    /// The vcf.gz being phased. For shapeit and eagle this is the working
    /// directory copy once staging has run.
    pub input_vcf: Utf8PathBuf,
    pub resources: ResourceRegistry,
    pub threads: usize,
}

/// Phase all autosomes of the input in parallel, then merge the per-chromosome
/// outputs into `{prefix}.phased.vcf.gz` plus a merged `{prefix}.log`.
pub fn run(tool: PhasingTool, config: PhaseConfig) -> Result<()> {
    let started = Instant::now();
    check_file(&config.input_vcf)?;

    // Beagle reads the input in place; shapeit and eagle work on a local copy.
    let config = match tool {
        PhasingTool::Shapeit | PhasingTool::Eagle => stage_input(config)?,
        PhasingTool::Beagle => config,
    };

    autosomes()
        .into_par_iter()
        .try_for_each(|chrom| phase_chromosome(tool, chrom, &config))?;

    let name = config
        .input_vcf
        .file_name()
        .ok_or_else(|| eyre!("Input path has no file name: {}", config.input_vcf))?;
    let prefix = name.strip_suffix(".vcf.gz").unwrap_or(name);

    let plan = match tool {
        PhasingTool::Shapeit | PhasingTool::Eagle => MergePlan {
            output_pattern: "*.phased.bcf",
            log_pattern: "chr*.log",
            prefix,
            index_sidecars: false,
        },
        PhasingTool::Beagle => MergePlan {
            output_pattern: "*.phased.vcf.gz",
            log_pattern: "chr*.phased.log",
            prefix,
            index_sidecars: true,
        },
    };
    merge::run(&plan, &config.resources, config.threads, started)
}

/// Copy the input into the working directory (skipped when already present)
/// and index the copy. Returns the configuration rewritten to point at it.
fn stage_input(config: PhaseConfig) -> Result<PhaseConfig> {
    let local: Utf8PathBuf = config
        .input_vcf
        .file_name()
        .ok_or_else(|| eyre!("Input path has no file name: {}", config.input_vcf))?
        .into();

    if !local.is_file() {
        info!("Copying {} into the working directory", config.input_vcf);
        std::fs::copy(&config.input_vcf, &local)
            .wrap_err_with(|| format!("Failed to copy {}", config.input_vcf))?;
    }
    check_file(&local)?;
    index_vcf(local.as_str(), &config.resources, config.threads)?;

    Ok(PhaseConfig {
        input_vcf: local,
        ..config
    })
}

/// Index a compressed variant file with bcftools, skipping files that already
/// have a `.csi` sidecar.
fn index_vcf(path: &str, resources: &ResourceRegistry, threads: usize) -> Result<()> {
    if Path::new(&format!("{}.csi", path)).is_file() {
        return Ok(());
    }
    let mut cmd = Command::new(resources.get("bcftools")?);
    cmd.arg("index")
        .arg("--threads")
        .arg(threads.to_string())
        .arg(path);
    run_checked(&mut cmd, &format!("Index {}", path))
}

fn phase_chromosome(tool: PhasingTool, chrom: u8, config: &PhaseConfig) -> Result<()> {
    info!("Phasing chromosome {}", chrom);
    match tool {
        PhasingTool::Shapeit => phase_shapeit(chrom, config),
        PhasingTool::Eagle => phase_eagle(chrom, config),
        PhasingTool::Beagle => phase_beagle(chrom, config),
    }
}

/// Phase one chromosome with SHAPEIT. The tool writes its own log file.
fn phase_shapeit(chrom: u8, config: &PhaseConfig) -> Result<()> {
    let res = &config.resources;
    let map_file = format!(
        "{}/plink.chr{}.GRCh38.map.shapeit.txt",
        res.get("map38")?,
        chrom
    );
    let ref_file = format!("{}/chr{}.vcf.gz", res.get("ref1kg38")?, chrom);
    let phased_file = format!("chr{}.phased.bcf", chrom);

    let mut cmd = Command::new(res.get("shapeit")?);
    cmd.arg("--input")
        .arg(&config.input_vcf)
        .arg("--region")
        .arg(format!("chr{}", chrom))
        .arg("--reference")
        .arg(ref_file)
        .arg("--map")
        .arg(map_file)
        .arg("--thread")
        .arg(config.threads.to_string())
        .arg("--output")
        .arg(&phased_file)
        .arg("--log")
        .arg(format!("chr{}.log", chrom));

    run_checked(&mut cmd, &format!("Phase chromosome {} (shapeit)", chrom))?;
    check_file(&phased_file)
}

/// Phase one chromosome with Eagle. Eagle writes to stdout/stderr, so both
/// streams are captured into the per-chromosome log before the exit status is
/// checked.
fn phase_eagle(chrom: u8, config: &PhaseConfig) -> Result<()> {
    let res = &config.resources;
    let eagle_dir = res.get("eagle")?;
    let prefix = format!("chr{}", chrom);
    let ref_file = format!("{}/{}.vcf.gz", res.get("ref1kg38")?, prefix);
    let map_file = format!("{}/tables/genetic_map_hg38_withX.txt.gz", eagle_dir);

    let mut cmd = Command::new(format!("{}/eagle", eagle_dir));
    cmd.arg(format!("--vcfRef={}", ref_file))
        .arg(format!("--geneticMapFile={}", map_file))
        .arg(format!("--chrom={}", chrom))
        .arg("--vcfOutFormat=u")
        .arg(format!("--outPrefix={}.phased", prefix))
        .arg(format!("--vcfTarget={}", config.input_vcf));

    let what = format!("Phase chromosome {} (eagle)", chrom);
    let output = run_captured(&mut cmd, &what)?;

    let log_file = format!("{}.log", prefix);
    let mut log = File::create(&log_file)
        .wrap_err_with(|| format!("Failed to create log: {}", log_file))?;
    log.write_all(&output.stdout)?;
    log.write_all(b"\n")?;
    log.write_all(&output.stderr)?;

    if !output.status.success() {
        bail!("{} failed: {}", what, output.status);
    }
    check_file(format!("{}.phased.bcf", prefix))
}

/// Phase one chromosome with Beagle, then index its output. Beagle writes its
/// own `chr{N}.phased.log`.
fn phase_beagle(chrom: u8, config: &PhaseConfig) -> Result<()> {
    let res = &config.resources;
    let ref_file = format!("{}/chr{}.vcf.gz", res.get("ref1kg38")?, chrom);
    let map_file = format!("{}/chr{}.map", res.get("plink_map")?, chrom);

    let mut cmd = Command::new(res.get_or("java", "java"));
    cmd.arg("-jar")
        .arg(res.get("beagle")?)
        .arg(format!("gt={}", config.input_vcf))
        .arg(format!("ref={}", ref_file))
        .arg(format!("map={}", map_file))
        .arg(format!("chrom=chr{}", chrom))
        .arg(format!("out=chr{}.phased", chrom))
        .arg("impute=false")
        .arg("nthreads=1");

    run_checked(&mut cmd, &format!("Phase chromosome {} (beagle)", chrom))?;

    let phased_file = format!("chr{}.phased.vcf.gz", chrom);
    check_file(&phased_file)?;
    index_vcf(&phased_file, &config.resources, config.threads)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tool_from_str() {
        assert_eq!("shapeit".parse::<PhasingTool>().unwrap(), PhasingTool::Shapeit);
        assert_eq!("eagle".parse::<PhasingTool>().unwrap(), PhasingTool::Eagle);
        assert_eq!("beagle".parse::<PhasingTool>().unwrap(), PhasingTool::Beagle);
    }

    #[test]
    fn test_unknown_tool_is_error() {
        let err = "bogus".parse::<PhasingTool>().unwrap_err();
        assert!(err.to_string().contains("bogus"));
    }
}
