use std::path::Path;

use color_eyre::eyre::{eyre, Context, Result};
use fnv::FnvHashMap;
use serde::Deserialize;

/// One `name,path` row of the resource file.
#[derive(Debug, Deserialize)]
struct ResourceRecord {
    name: String,
    path: String,
}

/// Locations of external tools and reference data, loaded once per run and
/// handed to every worker by shared reference.
#[derive(Debug, Clone)]
pub struct ResourceRegistry {
    paths: FnvHashMap<String, String>,
}

impl ResourceRegistry {
    /// Read a headerless `name,path` csv file. Later rows win on duplicate names.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .from_path(path)
            .wrap_err_with(|| format!("Failed to open resource file: {}", path.display()))?;

        let mut paths = FnvHashMap::default();
        for result in reader.deserialize() {
            let record: ResourceRecord = result
                .wrap_err_with(|| format!("Bad record in resource file: {}", path.display()))?;
            paths.insert(record.name, record.path);
        }

        Ok(Self { paths })
    }

    /// Look up a tool or reference path by name. Missing names only fail here,
    /// at command-construction time.
    pub fn get(&self, name: &str) -> Result<&str> {
        self.paths
            .get(name)
            .map(String::as_str)
            .ok_or_else(|| eyre!("Resource '{}' missing from resource file", name))
    }

    /// Look up an optional resource, falling back to a default. Used for the
    /// java runtime, which is normally taken from PATH.
    pub fn get_or<'a>(&'a self, name: &str, default: &'a str) -> &'a str {
        self.paths.get(name).map(String::as_str).unwrap_or(default)
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_load_resources() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "bcftools,/opt/bcftools/bcftools").unwrap();
        writeln!(file, "shapeit,/opt/shapeit5/phase_common").unwrap();
        writeln!(file, "ref1kg38,/data/1kg38").unwrap();

        let res = ResourceRegistry::from_file(file.path()).unwrap();

        assert_eq!(res.len(), 3);
        assert_eq!(res.get("bcftools").unwrap(), "/opt/bcftools/bcftools");
        assert_eq!(res.get("ref1kg38").unwrap(), "/data/1kg38");
    }

    #[test]
    fn test_duplicate_keys_last_wins() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "bcftools,/old/bcftools").unwrap();
        writeln!(file, "bcftools,/new/bcftools").unwrap();

        let res = ResourceRegistry::from_file(file.path()).unwrap();

        assert_eq!(res.len(), 1);
        assert_eq!(res.get("bcftools").unwrap(), "/new/bcftools");
    }

    #[test]
    fn test_missing_key_is_error() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "bcftools,/opt/bcftools/bcftools").unwrap();

        let res = ResourceRegistry::from_file(file.path()).unwrap();
        let err = res.get("eagle").unwrap_err();

        assert!(err.to_string().contains("eagle"));
    }

    #[test]
    fn test_get_or_falls_back() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "beagle,/opt/beagle/beagle.jar").unwrap();

        let res = ResourceRegistry::from_file(file.path()).unwrap();

        assert_eq!(res.get_or("java", "java"), "java");
        assert_eq!(res.get_or("beagle", "none"), "/opt/beagle/beagle.jar");
    }

    #[test]
    fn test_unreadable_file_is_error() {
        assert!(ResourceRegistry::from_file("/no/such/res.csv").is_err());
    }
}
