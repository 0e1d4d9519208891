use std::fs;
use std::path::{Path, PathBuf};

use indexmap::IndexSet;
use serde::Deserialize;
use thiserror::Error;

use crate::config::SourceOptions;
use crate::license::LicenseRecord;

mod demo;

pub use demo::demo_licenses;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("reading licenses file {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("parsing {} as TOML", path.display())]
    Toml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("parsing {} as JSON", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("parsing {} as YAML", path.display())]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("unsupported licenses file {} (expected .toml, .json or .yaml)", .0.display())]
    UnsupportedFormat(PathBuf),
    #[error("duplicate license id '{0}'")]
    DuplicateId(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogOrigin {
    Demo,
    File(PathBuf),
}

impl CatalogOrigin {
    pub fn describe(&self) -> String {
        match self {
            CatalogOrigin::Demo => "demo data".to_string(),
            CatalogOrigin::File(path) => path.display().to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct LicenseCatalog {
    ids: IndexSet<String>,
    records: Vec<LicenseRecord>,
    origin: CatalogOrigin,
}

impl LicenseCatalog {
    pub fn from_records(
        records: Vec<LicenseRecord>,
        origin: CatalogOrigin,
    ) -> Result<Self, CatalogError> {
        let mut ids = IndexSet::with_capacity(records.len());
        for record in &records {
            if !ids.insert(record.id.clone()) {
                return Err(CatalogError::DuplicateId(record.id.clone()));
            }
            if record.expiry().is_none() {
                tracing::warn!(
                    id = %record.id,
                    expiry = %record.expiry_date,
                    "unparseable expiry date; status will be unknown"
                );
            }
        }
        Ok(Self {
            ids,
            records,
            origin,
        })
    }

    pub fn demo() -> Self {
        let records = demo_licenses();
        let ids = records.iter().map(|record| record.id.clone()).collect();
        Self {
            ids,
            records,
            origin: CatalogOrigin::Demo,
        }
    }

    pub fn records(&self) -> &[LicenseRecord] {
        &self.records
    }

    pub fn get(&self, id: &str) -> Option<&LicenseRecord> {
        self.ids
            .get_index_of(id)
            .and_then(|idx| self.records.get(idx))
    }

    pub fn origin(&self) -> &CatalogOrigin {
        &self.origin
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[derive(Debug, Default, Deserialize)]
struct LicenseDocument {
    #[serde(default)]
    licenses: Vec<LicenseRecord>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum JsonDocument {
    Bare(Vec<LicenseRecord>),
    Wrapped(LicenseDocument),
}

pub fn load(source: &SourceOptions) -> Result<LicenseCatalog, CatalogError> {
    match &source.path {
        Some(path) => load_file(path),
        None => {
            tracing::info!("no licenses file configured, using demo data");
            Ok(LicenseCatalog::demo())
        }
    }
}

pub fn load_file(path: &Path) -> Result<LicenseCatalog, CatalogError> {
    let raw = fs::read_to_string(path).map_err(|source| CatalogError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let records = parse_licenses(&raw, path)?;
    tracing::info!(path = %path.display(), count = records.len(), "loaded licenses file");
    LicenseCatalog::from_records(records, CatalogOrigin::File(path.to_path_buf()))
}

fn parse_licenses(raw: &str, path: &Path) -> Result<Vec<LicenseRecord>, CatalogError> {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);
    match extension.as_deref() {
        Some("toml" | "json" | "yaml" | "yml") if raw.trim().is_empty() => Ok(Vec::new()),
        Some("toml") => toml::from_str::<LicenseDocument>(raw)
            .map(|doc| doc.licenses)
            .map_err(|source| CatalogError::Toml {
                path: path.to_path_buf(),
                source,
            }),
        Some("json") => serde_json::from_str::<JsonDocument>(raw)
            .map(|doc| match doc {
                JsonDocument::Bare(records) => records,
                JsonDocument::Wrapped(doc) => doc.licenses,
            })
            .map_err(|source| CatalogError::Json {
                path: path.to_path_buf(),
                source,
            }),
        Some("yaml" | "yml") => serde_yaml::from_str::<LicenseDocument>(raw)
            .map(|doc| doc.licenses)
            .map_err(|source| CatalogError::Yaml {
                path: path.to_path_buf(),
                source,
            }),
        _ => Err(CatalogError::UnsupportedFormat(path.to_path_buf())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use tempfile::TempDir;

    fn write(dir: &TempDir, name: &str, contents: &str) -> anyhow::Result<PathBuf> {
        let path = dir.path().join(name);
        fs::write(&path, contents)?;
        Ok(path)
    }

    #[test]
    fn demo_catalog_has_four_unique_records() {
        let catalog = load(&SourceOptions::default()).expect("demo catalog");
        assert_eq!(catalog.len(), 4);
        assert_eq!(catalog.origin(), &CatalogOrigin::Demo);
        assert_eq!(
            catalog.get("3").map(|r| r.product_name.as_str()),
            Some("Slack Pro")
        );
        assert!(catalog.get("99").is_none());
    }

    #[test]
    fn loads_toml_license_tables() -> anyhow::Result<()> {
        let dir = TempDir::new()?;
        let path = write(
            &dir,
            "licenses.toml",
            r#"
[[licenses]]
id = "a"
productName = "Sublime Text"
vendor = "Sublime HQ"
licenseKey = "ABCD-EFGH-1234"
expiryDate = "2026-01-01"
department = "Engineering"

[[licenses]]
id = "b"
productName = "1Password Teams"
vendor = "AgileBits"
licenseKey = "ZZZZ-9999"
expiryDate = "2025-07-31"
category = ""
"#,
        )?;
        let catalog = load(&SourceOptions {
            path: Some(path.clone()),
        })?;
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.origin(), &CatalogOrigin::File(path));
        let b = catalog.get("b").expect("record b");
        assert_eq!(b.vendor, "AgileBits");
        assert_eq!(b.category, None);
        Ok(())
    }

    #[test]
    fn loads_bare_and_wrapped_json() -> anyhow::Result<()> {
        let dir = TempDir::new()?;
        let entry = r#"{"id":"x","productName":"Notion","vendor":"Notion Labs","licenseKey":"N-1","expiryDate":"2025-02-02"}"#;
        let bare = write(&dir, "bare.json", &format!("[{entry}]"))?;
        let wrapped = write(&dir, "wrapped.JSON", &format!(r#"{{"licenses":[{entry}]}}"#))?;
        for path in [bare, wrapped] {
            let catalog = load_file(&path)?;
            assert_eq!(catalog.len(), 1, "{}", path.display());
            assert_eq!(catalog.records()[0].product_name, "Notion");
        }
        Ok(())
    }

    #[test]
    fn loads_yaml_inventory_with_numeric_ids() -> anyhow::Result<()> {
        let dir = TempDir::new()?;
        let path = write(
            &dir,
            "licenses.yaml",
            r#"licenses:
  - id: "3"
    productName: Slack Pro
    vendor: Slack Technologies
    licenseKey: XXXXX-XXXXX-XXXXX-11111
    expiryDate: 2024-06-30
    notes: Team communication platform
    department: IT
  - id: 4
    productName: JetBrains IntelliJ IDEA
    vendor: JetBrains
    licenseKey: XXXXX-XXXXX-XXXXX-22222
    expiryDate: "2025-03-15"
"#,
        )?;
        let catalog = load_file(&path)?;
        assert_eq!(catalog.len(), 2);
        let slack = catalog.get("3").expect("slack");
        assert_eq!(slack.expiry_date, "2024-06-30");
        assert_eq!(slack.department.as_deref(), Some("IT"));
        assert_eq!(
            catalog.get("4").map(|r| r.vendor.as_str()),
            Some("JetBrains")
        );
        Ok(())
    }

    #[test]
    fn empty_file_is_an_empty_catalog() -> anyhow::Result<()> {
        let dir = TempDir::new()?;
        let path = write(&dir, "licenses.json", "  \n")?;
        let catalog = load_file(&path)?;
        assert!(catalog.is_empty());
        Ok(())
    }

    #[test]
    fn rejects_duplicate_ids() -> anyhow::Result<()> {
        let dir = TempDir::new()?;
        let entry = r#"{"id":"dup","productName":"A","vendor":"B","licenseKey":"K","expiryDate":"2025-01-01"}"#;
        let path = write(&dir, "dups.json", &format!("[{entry},{entry}]"))?;
        assert_matches!(load_file(&path), Err(CatalogError::DuplicateId(id)) if id == "dup");
        Ok(())
    }

    #[test]
    fn reports_format_and_io_problems() -> anyhow::Result<()> {
        let dir = TempDir::new()?;
        let csv = write(&dir, "licenses.csv", "id,productName")?;
        assert_matches!(load_file(&csv), Err(CatalogError::UnsupportedFormat(_)));

        let bad_yaml = write(&dir, "broken.yml", "licenses:\n  - id: [unclosed")?;
        assert_matches!(load_file(&bad_yaml), Err(CatalogError::Yaml { .. }));

        let broken = write(&dir, "broken.toml", "[[licenses]]\nid = 3")?;
        assert_matches!(load_file(&broken), Err(CatalogError::Toml { .. }));

        let missing = dir.path().join("missing.toml");
        assert_matches!(load_file(&missing), Err(CatalogError::Io { .. }));
        Ok(())
    }

    #[test]
    fn keeps_records_with_malformed_dates() -> anyhow::Result<()> {
        let dir = TempDir::new()?;
        let entry = r#"{"id":"m","productName":"A","vendor":"B","licenseKey":"K","expiryDate":"31.12.2025"}"#;
        let path = write(&dir, "odd.json", &format!("[{entry}]"))?;
        let catalog = load_file(&path)?;
        assert_eq!(catalog.len(), 1);
        assert!(catalog.records()[0].expiry().is_none());
        Ok(())
    }
}
