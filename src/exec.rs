use std::path::Path;
use std::process::{Command, Output};

use color_eyre::eyre::{bail, Context, Result};
use log::debug;

/// Run an external command, inheriting stdio, and fail on a non-zero exit.
pub fn run_checked(cmd: &mut Command, what: &str) -> Result<()> {
    debug!("Running: {:?}", cmd);
    let status = cmd
        .status()
        .wrap_err_with(|| format!("{}: failed to spawn {:?}", what, cmd.get_program()))?;
    if !status.success() {
        bail!("{} failed: {}", what, status);
    }
    Ok(())
}

/// Run an external command with stdout/stderr captured. The caller decides
/// what to do with the streams and the exit status (eagle's output goes to a
/// per-chromosome log before the status is checked).
pub fn run_captured(cmd: &mut Command, what: &str) -> Result<Output> {
    debug!("Running: {:?}", cmd);
    cmd.output()
        .wrap_err_with(|| format!("{}: failed to spawn {:?}", what, cmd.get_program()))
}

/// Fail when an expected file is absent.
pub fn check_file(path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    if !path.is_file() {
        bail!("{} doesn't exist", path.display());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_checked_success() {
        let mut cmd = Command::new("true");
        assert!(run_checked(&mut cmd, "true").is_ok());
    }

    #[test]
    fn test_run_checked_nonzero_exit() {
        let mut cmd = Command::new("false");
        let err = run_checked(&mut cmd, "Phase chromosome 5 (shapeit)").unwrap_err();
        assert!(err.to_string().contains("chromosome 5"));
    }

    #[test]
    fn test_run_checked_missing_binary() {
        let mut cmd = Command::new("/no/such/binary");
        assert!(run_checked(&mut cmd, "missing").is_err());
    }

    #[test]
    fn test_run_captured() {
        let mut cmd = Command::new("echo");
        cmd.arg("hello");
        let output = run_captured(&mut cmd, "echo").unwrap();
        assert!(output.status.success());
        assert_eq!(output.stdout, b"hello\n");
    }

    #[test]
    fn test_check_file() {
        let file = tempfile::NamedTempFile::new().unwrap();
        assert!(check_file(file.path()).is_ok());
        assert!(check_file("/no/such/file.vcf.gz").is_err());
    }
}
