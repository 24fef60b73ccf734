//! Process-lifetime cache of parsed boundary data.

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, OnceLock, PoisonError};

use flate2::read::GzDecoder;
use tracing::{info, warn};

use super::boundary::{parse_boundaries, CountryBoundary};
use super::error::BoundaryError;

/// Environment variable naming the data file behind [`BoundaryStore::global`]
pub const DATA_ENV_VAR: &str = "COUNTRYPIP_DATA";

/// Data file used by the global store when [`DATA_ENV_VAR`] is unset
pub const DEFAULT_DATA_FILE: &str = "polygons.properties";

static GLOBAL_STORE: OnceLock<Arc<BoundaryStore>> = OnceLock::new();

#[derive(Debug)]
enum Source {
    File(PathBuf),
    Preloaded,
}

/// Ordered boundary fragments, parsed on first access and kept for the
/// lifetime of the store.
///
/// The first [`data`](Self::data) call loads the file while holding an init
/// lock, so concurrent first callers trigger a single read. Once loaded the
/// list is immutable and reads take no lock. A failed load is not cached:
/// the next call tries again.
#[derive(Debug)]
pub struct BoundaryStore {
    source: Source,
    data: OnceLock<Vec<CountryBoundary>>,
    init: Mutex<()>,
}

impl BoundaryStore {
    /// Store backed by a data file, loaded lazily
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            source: Source::File(path.into()),
            data: OnceLock::new(),
            init: Mutex::new(()),
        }
    }

    /// Store over an already-built boundary list
    pub fn from_boundaries(boundaries: Vec<CountryBoundary>) -> Self {
        let data = OnceLock::new();
        let _ = data.set(boundaries);
        Self {
            source: Source::Preloaded,
            data,
            init: Mutex::new(()),
        }
    }

    /// The process-wide store, reading `$COUNTRYPIP_DATA` or
    /// `polygons.properties` from the working directory.
    pub fn global() -> Arc<BoundaryStore> {
        let store = GLOBAL_STORE.get_or_init(|| {
            let path = std::env::var_os(DATA_ENV_VAR)
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_FILE));
            Arc::new(BoundaryStore::new(path))
        });
        Arc::clone(store)
    }

    /// Data file path, if this store reads one
    pub fn path(&self) -> Option<&Path> {
        match &self.source {
            Source::File(path) => Some(path),
            Source::Preloaded => None,
        }
    }

    /// Read and parse the backing file, bypassing the cache.
    pub fn load(&self) -> Result<Vec<CountryBoundary>, BoundaryError> {
        match &self.source {
            Source::File(path) => load_boundaries(path),
            Source::Preloaded => Ok(self.data.get().cloned().unwrap_or_default()),
        }
    }

    /// The cached boundary list, loading it on first call.
    pub fn data(&self) -> Result<&[CountryBoundary], BoundaryError> {
        if let Some(data) = self.data.get() {
            return Ok(data.as_slice());
        }

        let _guard = self.init.lock().unwrap_or_else(PoisonError::into_inner);

        // Another caller may have finished loading while we waited
        if let Some(data) = self.data.get() {
            return Ok(data.as_slice());
        }

        match self.load() {
            Ok(boundaries) => Ok(self.data.get_or_init(|| boundaries).as_slice()),
            Err(e) => {
                warn!("Boundary data load failed, will retry on next access: {}", e);
                Err(e)
            }
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.data.get().is_some()
    }

    /// Number of cached fragments, or `None` before the first successful load
    pub fn len(&self) -> Option<usize> {
        self.data.get().map(Vec::len)
    }
}

/// Load boundary fragments from a data file. Files ending in `.gz` are
/// decompressed on the fly.
pub fn load_boundaries(path: &Path) -> Result<Vec<CountryBoundary>, BoundaryError> {
    info!("Loading boundary data from {}", path.display());

    let file = File::open(path).map_err(|source| BoundaryError::FileAccess {
        path: path.to_path_buf(),
        source,
    })?;
    let reader: Box<dyn Read> = if path.extension().map_or(false, |e| e == "gz") {
        Box::new(GzDecoder::new(file))
    } else {
        Box::new(file)
    };

    let boundaries = read_boundaries(reader, path)?;

    info!("Loaded {} boundary fragments", boundaries.len());
    Ok(boundaries)
}

/// Parse boundary fragments from any byte stream. `path` is only used to
/// label read errors.
///
/// Bytes that are not valid UTF-8 are a `Parse` error on the line holding
/// them; only failures of the stream itself are `FileAccess`.
pub fn read_boundaries<R: Read>(
    mut reader: R,
    path: &Path,
) -> Result<Vec<CountryBoundary>, BoundaryError> {
    let mut bytes = Vec::new();
    reader
        .read_to_end(&mut bytes)
        .map_err(|source| BoundaryError::FileAccess {
            path: path.to_path_buf(),
            source,
        })?;

    let text = String::from_utf8(bytes).map_err(|e| {
        let valid = &e.as_bytes()[..e.utf8_error().valid_up_to()];
        let line = valid.iter().filter(|&&b| b == b'\n').count() + 1;
        BoundaryError::parse(line, "invalid UTF-8")
    })?;

    parse_boundaries(&text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::Write;
    use tempfile::TempDir;

    const SAMPLE: &str = "AA=POLYGON ((0 0,0 1,1 1,1 0))\n\
                          XX=MULTIPOLYGON ((0 0,0 1,1 1,1 0)),((5 5,5 6,6 6,6 5))\n";

    fn write_file(dir: &TempDir, name: &str, contents: &str) -> PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_load_preserves_file_order() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "polygons.properties", SAMPLE);

        let boundaries = load_boundaries(&path).unwrap();
        let codes: Vec<&str> = boundaries.iter().map(|b| b.country_code.as_str()).collect();
        assert_eq!(codes, vec!["AA", "XX", "XX"]);
    }

    #[test]
    fn test_load_gzipped_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("polygons.properties.gz");
        let mut encoder = GzEncoder::new(File::create(&path).unwrap(), Compression::default());
        encoder.write_all(SAMPLE.as_bytes()).unwrap();
        encoder.finish().unwrap();

        assert_eq!(load_boundaries(&path).unwrap().len(), 3);
    }

    #[test]
    fn test_missing_file_is_file_access_error() {
        let dir = TempDir::new().unwrap();
        let store = BoundaryStore::new(dir.path().join("missing.properties"));

        assert!(matches!(store.data(), Err(BoundaryError::FileAccess { .. })));
        assert!(!store.is_loaded());
    }

    #[test]
    fn test_malformed_file_returns_no_partial_data() {
        let dir = TempDir::new().unwrap();
        let path = write_file(
            &dir,
            "polygons.properties",
            "AA=POLYGON ((0 0,0 1,1 1,1 0))\nBB POLYGON ((0 0,0 1,1 1))\n",
        );
        let store = BoundaryStore::new(path);

        assert!(matches!(store.data(), Err(BoundaryError::Parse { line: 2, .. })));
        assert!(store.len().is_none());
    }

    #[test]
    fn test_invalid_utf8_is_parse_error() {
        let mut bytes = b"AA=POLYGON ((0 0,0 1,1 1,1 0))\nBB=POLYGON ((0 0,".to_vec();
        bytes.extend_from_slice(&[0xff, 0xfe]);
        bytes.extend_from_slice(b" 1,1 1))\n");

        match read_boundaries(bytes.as_slice(), Path::new("polygons.properties")) {
            Err(BoundaryError::Parse { line, .. }) => assert_eq!(line, 2),
            other => panic!("expected parse error, got {:?}", other),
        }
    }

    #[test]
    fn test_failed_load_is_retried() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("polygons.properties");
        let store = BoundaryStore::new(&path);

        assert!(store.data().is_err());
        std::fs::write(&path, SAMPLE).unwrap();
        assert_eq!(store.data().unwrap().len(), 3);
    }

    #[test]
    fn test_data_is_cached_after_first_load() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "polygons.properties", SAMPLE);
        let store = BoundaryStore::new(&path);

        let first = store.data().unwrap().as_ptr();
        std::fs::remove_file(&path).unwrap();
        let second = store.data().unwrap().as_ptr();

        assert_eq!(first, second);
        assert_eq!(store.len(), Some(3));
    }

    #[test]
    fn test_concurrent_first_access_loads_once() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "polygons.properties", SAMPLE);
        let store = Arc::new(BoundaryStore::new(path));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let store = Arc::clone(&store);
                std::thread::spawn(move || store.data().unwrap().as_ptr() as usize)
            })
            .collect();

        let ptrs: Vec<usize> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert!(ptrs.windows(2).all(|w| w[0] == w[1]));
    }

    #[test]
    fn test_preloaded_store() {
        let store = BoundaryStore::from_boundaries(vec![CountryBoundary::new(
            "AA",
            vec![geo_types::Coord { x: 0.0, y: 0.0 }],
        )]);

        assert!(store.is_loaded());
        assert!(store.path().is_none());
        assert_eq!(store.data().unwrap().len(), 1);
        assert_eq!(store.load().unwrap().len(), 1);
    }
}
