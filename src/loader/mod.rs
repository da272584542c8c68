//! Data loading.
//!
//! A data source is either a spreadsheet workbook with one sheet per table
//! or a directory holding one CSV file per table. [`DatasetLoader`] reads
//! the four tables into an immutable [`Dataset`] and keeps it cached per
//! source until the source changes on disk.

pub mod csv_dir;
pub mod schema;
pub mod table;
pub mod workbook;

pub use csv_dir::CsvDirectory;
pub use workbook::WorkbookSource;

use crate::error::LoadError;
use crate::models::Dataset;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;
use table::RawTable;
use tracing::{debug, info, warn};

/// Something that can hand out named tables.
pub trait TableSource {
    /// Read a table by name, failing if it does not exist.
    fn read_table(&mut self, name: &str) -> Result<RawTable, LoadError>;
}

/// Names of the four tables inside a source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableNames {
    pub participation: String,
    pub program_retention: String,
    pub college_retention: String,
    pub yoy_retention: String,
}

impl Default for TableNames {
    fn default() -> Self {
        Self {
            participation: "Program-Year Participation".to_string(),
            program_retention: "Program Retention".to_string(),
            college_retention: "College Retention".to_string(),
            yoy_retention: "YoY Program Retention".to_string(),
        }
    }
}

impl From<&crate::config::SourceConfig> for TableNames {
    fn from(config: &crate::config::SourceConfig) -> Self {
        Self {
            participation: config.participation_table.clone(),
            program_retention: config.program_retention_table.clone(),
            college_retention: config.college_retention_table.clone(),
            yoy_retention: config.yoy_retention_table.clone(),
        }
    }
}

/// Open the source at `path`, choosing the reader from its shape.
pub fn open_source(path: &Path) -> Result<Box<dyn TableSource>, LoadError> {
    if !path.exists() {
        return Err(LoadError::NotFound {
            path: path.to_path_buf(),
        });
    }

    if path.is_dir() {
        Ok(Box::new(CsvDirectory::new(path)))
    } else if WorkbookSource::handles(path) {
        Ok(Box::new(WorkbookSource::open(path)?))
    } else {
        Err(LoadError::UnsupportedSource {
            path: path.to_path_buf(),
        })
    }
}

/// Read and type all four tables from a source.
pub fn read_dataset(
    source: &mut dyn TableSource,
    names: &TableNames,
    label: &str,
) -> Result<Dataset, LoadError> {
    let participation = schema::parse_participation(&source.read_table(&names.participation)?)?;
    let program_retention =
        schema::parse_program_retention(&source.read_table(&names.program_retention)?)?;
    let college_retention =
        schema::parse_college_retention(&source.read_table(&names.college_retention)?)?;
    let yoy_retention = schema::parse_yoy_retention(&source.read_table(&names.yoy_retention)?)?;

    let mut malformed = participation.malformed;
    malformed.extend(program_retention.malformed);
    malformed.extend(college_retention.malformed);
    malformed.extend(yoy_retention.malformed);

    info!(
        "Loaded {} participation, {} program, {} college and {} YoY rows from {}",
        participation.rows.len(),
        program_retention.rows.len(),
        college_retention.rows.len(),
        yoy_retention.rows.len(),
        label
    );
    if !malformed.is_empty() {
        warn!("Skipped {} malformed rows in {}", malformed.len(), label);
    }

    Ok(Dataset {
        source: label.to_string(),
        participation: participation.rows,
        program_retention: program_retention.rows,
        college_retention: college_retention.rows,
        yoy_retention: yoy_retention.rows,
        malformed,
    })
}

struct CachedDataset {
    modified: Option<SystemTime>,
    dataset: Arc<Dataset>,
}

/// Loads datasets and memoizes them per source path.
pub struct DatasetLoader {
    names: TableNames,
    cache: HashMap<PathBuf, CachedDataset>,
}

impl DatasetLoader {
    /// Create a loader looking for the given table names.
    pub fn new(names: TableNames) -> Self {
        Self {
            names,
            cache: HashMap::new(),
        }
    }

    /// Load the dataset at `path`.
    ///
    /// Repeated calls for the same source return the cached snapshot unless
    /// the source's modification time has changed since it was read.
    pub fn load(&mut self, path: &Path) -> Result<Arc<Dataset>, LoadError> {
        let key = std::fs::canonicalize(path).map_err(|source| {
            if source.kind() == std::io::ErrorKind::NotFound {
                LoadError::NotFound {
                    path: path.to_path_buf(),
                }
            } else {
                LoadError::Io {
                    path: path.to_path_buf(),
                    source,
                }
            }
        })?;
        let modified = modified_time(&key);

        if let Some(cached) = self.cache.get(&key) {
            if cached.modified == modified {
                debug!(
                    "Using cached dataset for {} ({} sources cached)",
                    key.display(),
                    self.cached_sources()
                );
                return Ok(Arc::clone(&cached.dataset));
            }
            info!("Source changed, reloading {}", key.display());
        }

        let mut source = open_source(&key)?;
        let dataset = Arc::new(read_dataset(
            source.as_mut(),
            &self.names,
            &path.display().to_string(),
        )?);

        self.cache.insert(
            key,
            CachedDataset {
                modified,
                dataset: Arc::clone(&dataset),
            },
        );

        Ok(dataset)
    }

    /// Number of cached sources.
    pub fn cached_sources(&self) -> usize {
        self.cache.len()
    }
}

impl Default for DatasetLoader {
    fn default() -> Self {
        Self::new(TableNames::default())
    }
}

/// Latest modification time of a source; for directories, of any file in it.
fn modified_time(path: &Path) -> Option<SystemTime> {
    let own = std::fs::metadata(path).and_then(|m| m.modified()).ok();
    if !path.is_dir() {
        return own;
    }

    let entries = std::fs::read_dir(path).ok()?;
    entries
        .flatten()
        .filter_map(|entry| entry.metadata().and_then(|m| m.modified()).ok())
        .chain(own)
        .max()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tempfile::TempDir;

    fn write_tables(dir: &Path) {
        std::fs::write(
            dir.join("Program-Year Participation.csv"),
            "College,Program,Year,Participated\n\
             X,A,2019,1\nX,A,2020,1\nX,A,2021,1\n\
             X,B,2019,1\nX,B,2020,0\nX,B,2021,0\n",
        )
        .unwrap();
        std::fs::write(
            dir.join("Program Retention.csv"),
            "College,Program,retention_rate,longest_streak,first_year,last_year\n\
             X,A,1.0,3,2019,2021\nX,B,0.0,1,2019,2019\n",
        )
        .unwrap();
        std::fs::write(
            dir.join("College Retention.csv"),
            "College,retention_rate\nX,1.0\n",
        )
        .unwrap();
        std::fs::write(
            dir.join("YoY Program Retention.csv"),
            "from_year,retention_rate\n2019,0.5\n2020,1.0\n",
        )
        .unwrap();
    }

    #[test]
    fn test_load_csv_directory() {
        let dir = TempDir::new().unwrap();
        write_tables(dir.path());

        let mut loader = DatasetLoader::default();
        let dataset = loader.load(dir.path()).unwrap();

        assert_eq!(dataset.participation.len(), 6);
        assert_eq!(dataset.program_retention.len(), 2);
        assert_eq!(dataset.college_retention.len(), 1);
        assert_eq!(dataset.yoy_retention.len(), 2);
        assert!(dataset.malformed.is_empty());
    }

    #[test]
    fn test_load_is_memoized() {
        let dir = TempDir::new().unwrap();
        write_tables(dir.path());

        let mut loader = DatasetLoader::default();
        let first = loader.load(dir.path()).unwrap();
        let second = loader.load(dir.path()).unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(loader.cached_sources(), 1);
    }

    #[test]
    fn test_changed_source_is_reloaded() {
        let dir = TempDir::new().unwrap();
        write_tables(dir.path());

        let mut loader = DatasetLoader::default();
        let first = loader.load(dir.path()).unwrap();

        let path = dir.path().join("Program-Year Participation.csv");
        std::fs::write(&path, "College,Program,Year,Participated\nX,A,2019,1\n").unwrap();
        let file = std::fs::File::options().write(true).open(&path).unwrap();
        file.set_modified(SystemTime::now() + Duration::from_secs(60)).unwrap();

        let second = loader.load(dir.path()).unwrap();

        assert!(!Arc::ptr_eq(&first, &second));
        assert_eq!(first.participation.len(), 6);
        assert_eq!(second.participation.len(), 1);
        assert_eq!(loader.cached_sources(), 1);
    }

    #[test]
    fn test_load_fixture_directory() {
        let fixtures = Path::new(env!("CARGO_MANIFEST_DIR")).join("fixtures/retention");

        let mut loader = DatasetLoader::default();
        let dataset = loader.load(&fixtures).unwrap();

        assert!(!dataset.participation.is_empty());
        assert!(!dataset.program_retention.is_empty());
        assert_eq!(dataset.malformed.len(), 1);
    }

    #[test]
    fn test_missing_source() {
        let mut loader = DatasetLoader::default();
        let err = loader.load(Path::new("/nonexistent/3MT.xlsx")).unwrap_err();
        assert!(matches!(err, LoadError::NotFound { .. }));
    }

    #[test]
    fn test_unsupported_source() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("notes.txt");
        std::fs::write(&path, "hello").unwrap();

        let mut loader = DatasetLoader::default();
        assert!(matches!(
            loader.load(&path),
            Err(LoadError::UnsupportedSource { .. })
        ));
    }

    #[test]
    fn test_missing_table_is_fatal() {
        let dir = TempDir::new().unwrap();
        write_tables(dir.path());
        std::fs::remove_file(dir.path().join("College Retention.csv")).unwrap();

        let mut loader = DatasetLoader::default();
        let err = loader.load(dir.path()).unwrap_err();
        assert!(matches!(err, LoadError::MissingTable { ref table, .. } if table == "College Retention"));
    }

    #[test]
    fn test_custom_table_names() {
        let dir = TempDir::new().unwrap();
        write_tables(dir.path());
        std::fs::rename(
            dir.path().join("YoY Program Retention.csv"),
            dir.path().join("yoy.csv"),
        )
        .unwrap();

        let names = TableNames {
            yoy_retention: "yoy".to_string(),
            ..TableNames::default()
        };
        let mut loader = DatasetLoader::new(names);
        let dataset = loader.load(dir.path()).unwrap();
        assert_eq!(dataset.yoy_retention.len(), 2);
    }
}
