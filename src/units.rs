use std::path::Path;

use color_eyre::eyre::{bail, Context, Result};

/// The autosomes phased by the pipeline, in ascending order. Sex chromosomes
/// and mitochondrial DNA are out of scope.
pub fn autosomes() -> Vec<u8> {
    (1..=22).collect()
}

/// One row of the switch-error comparison table: two phased vcf.gz files for
/// the same individual plus the sample id used to name the output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComparisonRow {
    pub first_vcf: String,
    pub second_vcf: String,
    pub sample: String,
}

impl ComparisonRow {
    /// Parse a whitespace-delimited table, one comparison per line. Empty
    /// lines are skipped; a line without exactly three fields is rejected.
    pub fn load_table(path: impl AsRef<Path>) -> Result<Vec<Self>> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .wrap_err_with(|| format!("Failed to read comparison table: {}", path.display()))?;

        let mut rows = Vec::new();
        for (line_num, line) in content.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            let fields: Vec<&str> = line.split_whitespace().collect();
            if fields.len() != 3 {
                bail!(
                    "Invalid line {} in comparison table '{}': expected 3 fields, got {}",
                    line_num + 1,
                    path.display(),
                    fields.len()
                );
            }

            rows.push(Self {
                first_vcf: fields[0].to_string(),
                second_vcf: fields[1].to_string(),
                sample: fields[2].to_string(),
            });
        }

        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_autosomes() {
        let chroms = autosomes();
        assert_eq!(chroms.len(), 22);
        assert_eq!(chroms.first(), Some(&1));
        assert_eq!(chroms.last(), Some(&22));
        assert!(chroms.windows(2).all(|w| w[0] + 1 == w[1]));
    }

    #[test]
    fn test_load_table() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "a1.vcf.gz a2.vcf.gz HG001").unwrap();
        writeln!(file).unwrap();
        writeln!(file, "b1.vcf.gz b2.vcf.gz HG002").unwrap();

        let rows = ComparisonRow::load_table(file.path()).unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(
            rows[0],
            ComparisonRow {
                first_vcf: "a1.vcf.gz".to_string(),
                second_vcf: "a2.vcf.gz".to_string(),
                sample: "HG001".to_string(),
            }
        );
        assert_eq!(rows[1].sample, "HG002");
    }

    #[test]
    fn test_malformed_row_names_line() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "a1.vcf.gz a2.vcf.gz HG001").unwrap();
        writeln!(file, "b1.vcf.gz HG002").unwrap();

        let err = ComparisonRow::load_table(file.path()).unwrap_err();

        assert!(err.to_string().contains("line 2"));
    }
}
