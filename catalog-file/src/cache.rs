use catalog_core::{
    ingest::IngestError,
    models::{FilePreview, LoadReport, LoadSource},
    ports::{Decoded, RecordCodec, SnapshotObserver},
};
use parking_lot::{Mutex, RwLock};
use std::{
    fs,
    io::{self, Read, Write},
    path::{Path, PathBuf},
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
};
use thiserror::Error;
use tracing::{Level, event};

/// Errors raised by a [`ViewCache`].
///
/// Any of these leaves the cache holding whatever it held before.
#[derive(Debug, Error)]
pub enum CacheError {
    /// A reload was requested but the backing file does not exist
    #[error("file not found: {}", .0.display())]
    NotFound(PathBuf),

    /// The backing file could not be read or written
    #[error("i/o error on {}: {source}", path.display())]
    Io {
        /// The file being accessed
        path: PathBuf,
        /// The underlying error
        #[source]
        source: io::Error,
    },

    /// The backing file is not JSON
    #[error("JSON parse error: {0}")]
    Parse(#[source] serde_json::Error),

    /// The backing file is JSON, but not in a recognized shape
    #[error(transparent)]
    Ingest(#[from] IngestError),

    /// The collection could not be encoded for writing
    #[error("JSON encode error: {0}")]
    Encode(#[source] serde_json::Error),
}

/// A published collection together with how it was obtained.
#[derive(Debug)]
pub struct Snapshot<T> {
    /// The records, shared with every other reader of this snapshot
    pub records: Arc<[T]>,
    /// Diagnostics for the load that produced the records
    pub report: LoadReport,
}

impl<T> Clone for Snapshot<T> {
    fn clone(&self) -> Self {
        Self {
            records: self.records.clone(),
            report: self.report,
        }
    }
}

type DefaultProducer<T> = Box<dyn Fn() -> Vec<T> + Send + Sync>;

/// A collection backed by a single JSON file and held in memory.
///
/// The cache starts out empty and is populated by the first reader. Writers
/// (population, [`ViewCache::reload`] and [`ViewCache::store`]) take turns
/// behind a single guard, so the file is only ever read or written by one of
/// them at a time; a cold cache hit by many threads at once reads the file
/// exactly once. Readers of an already published snapshot never wait on the
/// file.
///
/// Every time a collection is published, the registered
/// [`SnapshotObserver`]s are told about it before the writer guard is
/// released.
pub struct ViewCache<T> {
    path: PathBuf,
    default: DefaultProducer<T>,
    codec: Box<dyn RecordCodec<T>>,
    observers: Vec<Arc<dyn SnapshotObserver<T>>>,
    state: RwLock<Option<Snapshot<T>>>,
    writer: Mutex<()>,
    file_reads: AtomicUsize,
}

impl<T: Send + Sync + 'static> ViewCache<T> {
    /// Create an unpopulated cache for the file at `path`.
    ///
    /// Until [`ViewCache::with_default`] says otherwise, a missing file
    /// populates the cache with an empty collection.
    pub fn new(path: impl Into<PathBuf>, codec: impl RecordCodec<T> + 'static) -> Self {
        Self {
            path: path.into(),
            default: Box::new(Vec::new),
            codec: Box::new(codec),
            observers: Vec::new(),
            state: RwLock::new(None),
            writer: Mutex::new(()),
            file_reads: AtomicUsize::new(0),
        }
    }

    /// Set the producer of the initial collection used when the file is missing
    pub fn with_default(mut self, default: impl Fn() -> Vec<T> + Send + Sync + 'static) -> Self {
        self.default = Box::new(default);
        self
    }

    /// Register something to be kept in step with the published collection
    pub fn with_observer(mut self, observer: Arc<dyn SnapshotObserver<T>>) -> Self {
        self.observers.push(observer);
        self
    }

    /// The backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether a collection has been published yet
    pub fn is_populated(&self) -> bool {
        self.state.read().is_some()
    }

    /// How many times the backing file has been read
    pub fn file_reads(&self) -> usize {
        self.file_reads.load(Ordering::Relaxed)
    }

    /// Get the collection, populating the cache first if necessary.
    pub fn get_all(&self) -> Result<Arc<[T]>, CacheError> {
        Ok(self.snapshot()?.records)
    }

    /// Get the collection and its load report, populating the cache first if
    /// necessary.
    ///
    /// A failed population publishes nothing, and the next call tries again.
    pub fn snapshot(&self) -> Result<Snapshot<T>, CacheError> {
        if let Some(snapshot) = self.state.read().as_ref() {
            return Ok(snapshot.clone());
        }

        let _writer = self.writer.lock();
        // somebody else may have populated while we waited for the guard
        if let Some(snapshot) = self.state.read().as_ref() {
            return Ok(snapshot.clone());
        }

        let snapshot = if self.path.exists() {
            let Decoded { records, rejected } = self.read_file()?;
            let report = LoadReport::now(LoadSource::File, records.len(), rejected);
            Snapshot {
                records: records.into(),
                report,
            }
        } else {
            event!(
                Level::INFO,
                path = %self.path.display(),
                "file missing, using default collection"
            );
            let records = (self.default)();
            let report = LoadReport::now(LoadSource::Default, records.len(), 0);
            Snapshot {
                records: records.into(),
                report,
            }
        };

        self.publish(snapshot.clone());
        Ok(snapshot)
    }

    /// Re-read the backing file and replace the collection.
    ///
    /// The new collection is decoded in full before anything is published;
    /// if the file is missing or unusable, the held collection is kept.
    pub fn reload(&self) -> Result<LoadReport, CacheError> {
        let _writer = self.writer.lock();
        if !self.path.exists() {
            return Err(CacheError::NotFound(self.path.clone()));
        }

        let Decoded { records, rejected } = self.read_file()?;
        let report = LoadReport::now(LoadSource::File, records.len(), rejected);
        self.publish(Snapshot {
            records: records.into(),
            report,
        });
        event!(
            Level::INFO,
            path = %self.path.display(),
            accepted = report.accepted,
            rejected = report.rejected,
            "reloaded"
        );
        Ok(report)
    }

    /// Write `records` to the backing file and publish them.
    ///
    /// The document is written to a sibling temporary file which is then
    /// renamed over the backing file. If any step fails, neither the file
    /// nor the held collection changes.
    pub fn store(&self, records: Vec<T>) -> Result<LoadReport, CacheError> {
        let _writer = self.writer.lock();
        self.write_file(&records)?;

        let report = LoadReport::now(LoadSource::Store, records.len(), 0);
        self.publish(Snapshot {
            records: records.into(),
            report,
        });
        Ok(report)
    }

    /// Apply `update` to a copy of the current collection and store the result.
    ///
    /// The whole read-modify-write happens behind the writer guard, so
    /// concurrent updates never lose each other's changes. `update` may veto
    /// the write by returning an error, which is handed back untouched.
    pub fn update<R, E>(
        &self,
        update: impl FnOnce(&mut Vec<T>) -> Result<R, E>,
    ) -> Result<Result<R, E>, CacheError>
    where
        T: Clone,
    {
        // populate outside the guard; the guard is not reentrant
        let _ = self.snapshot()?;

        let _writer = self.writer.lock();
        let mut records = match self.state.read().as_ref() {
            Some(snapshot) => snapshot.records.to_vec(),
            None => Vec::new(),
        };
        let outcome = match update(&mut records) {
            Ok(outcome) => outcome,
            Err(err) => return Ok(Err(err)),
        };

        self.write_file(&records)?;
        let report = LoadReport::now(LoadSource::Store, records.len(), 0);
        self.publish(Snapshot {
            records: records.into(),
            report,
        });
        Ok(Ok(outcome))
    }

    /// Peek at the first `max_bytes` bytes of the backing file.
    pub fn preview(&self, max_bytes: usize) -> Result<FilePreview, CacheError> {
        let io_error = |source| CacheError::Io {
            path: self.path.clone(),
            source,
        };
        let file = match fs::File::open(&self.path) {
            Ok(file) => file,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                return Err(CacheError::NotFound(self.path.clone()));
            }
            Err(err) => return Err(io_error(err)),
        };
        let size = file.metadata().map_err(io_error)?.len();

        let mut head = Vec::with_capacity(max_bytes.min(size as usize));
        file.take(max_bytes as u64)
            .read_to_end(&mut head)
            .map_err(io_error)?;

        Ok(FilePreview {
            path: self.path.display().to_string(),
            head: String::from_utf8_lossy(&head).into_owned(),
            size,
        })
    }

    fn read_file(&self) -> Result<Decoded<T>, CacheError> {
        self.file_reads.fetch_add(1, Ordering::Relaxed);
        let text = fs::read_to_string(&self.path).map_err(|source| CacheError::Io {
            path: self.path.clone(),
            source,
        })?;
        let document = serde_json::from_str(&text).map_err(CacheError::Parse)?;
        Ok(self.codec.decode(document)?)
    }

    fn write_file(&self, records: &[T]) -> Result<(), CacheError> {
        let document = self.codec.encode(records).map_err(CacheError::Encode)?;
        let bytes = serde_json::to_vec_pretty(&document).map_err(CacheError::Encode)?;

        let mut temp = self.path.clone().into_os_string();
        temp.push(".tmp");
        let temp = PathBuf::from(temp);

        let io_error = |path: &Path| {
            let path = path.to_path_buf();
            move |source| CacheError::Io { path, source }
        };
        if let Some(parent) = self.path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(io_error(parent))?;
        }

        let written = fs::File::create(&temp).and_then(|mut file| {
            file.write_all(&bytes)?;
            file.sync_all()
        });
        if let Err(source) = written {
            let _ = fs::remove_file(&temp);
            return Err(CacheError::Io { path: temp, source });
        }
        fs::rename(&temp, &self.path).map_err(io_error(&self.path))
    }

    fn publish(&self, snapshot: Snapshot<T>) {
        let records = snapshot.records.clone();
        *self.state.write() = Some(snapshot);
        for observer in &self.observers {
            observer.replaced(&records);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use catalog_core::{
        hierarchy::CategoryIndex,
        ingest::{CategoryCodec, ProductCodec},
        models::{Category, Product},
    };
    use rstest::*;
    use serde_json::json;
    use std::sync::Barrier;
    use tempfile::TempDir;

    #[fixture]
    fn dir() -> TempDir {
        tempfile::tempdir().unwrap()
    }

    fn write(path: &Path, document: serde_json::Value) {
        fs::write(path, document.to_string()).unwrap();
    }

    fn product(title: &str) -> serde_json::Value {
        json!({ "title": title, "currency": "USD", "category_id": 1 })
    }

    #[rstest]
    fn test_cold_cache_reads_once(dir: TempDir) {
        let path = dir.path().join("products.json");
        write(&path, json!({ "data": [product("A"), product("B")] }));
        let cache = Arc::new(ViewCache::<Product>::new(&path, ProductCodec::default()));

        let threads = 16;
        let barrier = Arc::new(Barrier::new(threads));
        let handles: Vec<_> = (0..threads)
            .map(|_| {
                let cache = cache.clone();
                let barrier = barrier.clone();
                std::thread::spawn(move || {
                    barrier.wait();
                    cache.get_all().unwrap().len()
                })
            })
            .collect();

        for handle in handles {
            assert_eq!(handle.join().unwrap(), 2);
        }
        assert_eq!(cache.file_reads(), 1);
    }

    #[rstest]
    fn test_missing_file_uses_default(dir: TempDir) {
        let cache = ViewCache::<Category>::new(dir.path().join("none.json"), CategoryCodec)
            .with_default(|| vec![Category::new(1, "Everything", None)]);

        assert!(!cache.is_populated());
        let snapshot = cache.snapshot().unwrap();
        assert_eq!(snapshot.records.len(), 1);
        assert_eq!(snapshot.report.source, LoadSource::Default);
        assert_eq!(cache.file_reads(), 0);
        assert!(cache.is_populated());

        assert!(matches!(cache.reload(), Err(CacheError::NotFound(_))));
        assert_eq!(cache.get_all().unwrap().len(), 1);
    }

    #[rstest]
    fn test_failed_reload_keeps_collection(dir: TempDir) {
        let path = dir.path().join("products.json");
        write(&path, json!([product("A"), product("")]));
        let cache = ViewCache::<Product>::new(&path, ProductCodec::default());

        let report = cache.snapshot().unwrap().report;
        assert_eq!((report.accepted, report.rejected), (1, 1));

        fs::write(&path, "{ truncated").unwrap();
        assert!(matches!(cache.reload(), Err(CacheError::Parse(_))));
        write(&path, json!({ "products": [] }));
        assert!(matches!(
            cache.reload(),
            Err(CacheError::Ingest(IngestError::UnsupportedSchema))
        ));
        fs::remove_file(&path).unwrap();
        assert!(matches!(cache.reload(), Err(CacheError::NotFound(_))));

        let snapshot = cache.snapshot().unwrap();
        assert_eq!(snapshot.records[0].title, "A");
        assert_eq!(snapshot.report, report);
    }

    #[rstest]
    fn test_reload_replaces_collection(dir: TempDir) {
        let path = dir.path().join("products.json");
        write(&path, json!([product("A")]));
        let cache = ViewCache::<Product>::new(&path, ProductCodec::default());
        let before = cache.get_all().unwrap();

        write(&path, json!([product("B"), product("C")]));
        // nothing changes until asked
        assert_eq!(cache.get_all().unwrap().len(), 1);

        let report = cache.reload().unwrap();
        assert_eq!(report.accepted, 2);
        let titles: Vec<_> = cache
            .get_all()
            .unwrap()
            .iter()
            .map(|p| p.title.clone())
            .collect();
        assert_eq!(titles, vec!["B", "C"]);
        // earlier readers keep their own snapshot
        assert_eq!(before[0].title, "A");
    }

    #[rstest]
    fn test_observer_follows_reload(dir: TempDir) {
        let path = dir.path().join("categories.json");
        write(
            &path,
            json!([{ "id": 1, "name": "Home" }, { "id": 2, "name": "Lamps", "parent_id": 1 }]),
        );
        let index = Arc::new(CategoryIndex::<Category>::default());
        let cache = ViewCache::new(&path, CategoryCodec).with_observer(index.clone());

        cache.get_all().unwrap();
        assert_eq!(index.leaves(0, 10).len(), 1);
        assert_eq!(index.top_level().len(), 1);

        write(
            &path,
            json!([
                { "id": 1, "name": "Home" },
                { "id": 3, "name": "Garden" },
                { "id": 4, "name": "Tools", "parent_id": 3 },
            ]),
        );
        cache.reload().unwrap();
        let leaves: Vec<_> = index.leaves(0, 10).into_iter().map(|c| c.id).collect();
        assert_eq!(leaves, vec![1, 4]);
        assert_eq!(index.top_level().len(), 2);
    }

    #[rstest]
    fn test_store_then_reload(dir: TempDir) {
        let path = dir.path().join("nested/categories.json");
        let cache = ViewCache::<Category>::new(&path, CategoryCodec);

        let report = cache
            .store(vec![Category::new(1, "Home", None), Category::new(2, "Lamps", Some(1))])
            .unwrap();
        assert_eq!(report.source, LoadSource::Store);
        assert!(!path.with_extension("json.tmp").exists());

        let report = cache.reload().unwrap();
        assert_eq!(report.accepted, 2);
        assert_eq!(cache.get_all().unwrap()[1].parent_id, Some(1));
    }

    #[rstest]
    fn test_update(dir: TempDir) {
        let path = dir.path().join("categories.json");
        let cache = ViewCache::<Category>::new(&path, CategoryCodec);

        let stored = cache
            .update(|records| {
                records.push(Category::new(1, "Home", None));
                Ok::<_, ()>(records.len())
            })
            .unwrap();
        assert_eq!(stored, Ok(1));

        let vetoed = cache
            .update(|records| {
                records.clear();
                Err::<(), _>("no")
            })
            .unwrap();
        assert_eq!(vetoed, Err("no"));
        assert_eq!(cache.get_all().unwrap().len(), 1);
        assert_eq!(cache.reload().unwrap().accepted, 1);
    }

    #[rstest]
    fn test_preview(dir: TempDir) {
        let path = dir.path().join("products.json");
        let cache = ViewCache::<Product>::new(&path, ProductCodec::default());
        assert!(matches!(cache.preview(4), Err(CacheError::NotFound(_))));

        fs::write(&path, "[{\"title\":\"A\"}]").unwrap();
        let preview = cache.preview(4).unwrap();
        assert_eq!(preview.head, "[{\"t");
        assert_eq!(preview.size, 15);
        assert_eq!(cache.preview(400).unwrap().head, "[{\"title\":\"A\"}]");
    }
}
