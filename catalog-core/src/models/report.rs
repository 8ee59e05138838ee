use serde::{Deserialize, Serialize};

/// Where the records of a cache snapshot came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
#[serde(rename_all = "snake_case")]
pub enum LoadSource {
    /// The backing file was read and decoded
    File,
    /// The backing file did not exist and the default producer was used
    Default,
    /// The records were written to the backing file by the process itself
    Store,
}

/// Diagnostics retained for the most recent population of a cache.
///
/// Individual records that fail ingestion are skipped rather than aborting
/// the load; `rejected` keeps count of them.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
pub struct LoadReport {
    /// Where the snapshot came from
    pub source: LoadSource,
    /// The number of records held by the snapshot
    pub accepted: usize,
    /// The number of items that were skipped
    pub rejected: usize,
    /// When the snapshot was published, in seconds since the unix epoch
    pub loaded_at: u64,
}

impl LoadReport {
    /// Build a report stamped with the current time
    pub fn now(source: LoadSource, accepted: usize, rejected: usize) -> Self {
        let loaded_at = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|elapsed| elapsed.as_secs())
            .unwrap_or_default();
        Self {
            source,
            accepted,
            rejected,
            loaded_at,
        }
    }
}

/// The first bytes of a backing file, for diagnosing what an upstream
/// producer actually wrote.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
pub struct FilePreview {
    /// The resolved path of the file
    pub path: String,
    /// The leading bytes, decoded lossily as UTF-8
    pub head: String,
    /// The total size of the file in bytes
    pub size: u64,
}
