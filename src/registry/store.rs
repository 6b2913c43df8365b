// src/registry/store.rs
use super::endpoint::Registry;
use crate::config::StoreConfig;
use async_trait::async_trait;
use serde::Serialize;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, info};

const MAX_SYMLINK_HOPS: usize = 40;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Registry I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Registry file {} is not valid: {source}", .path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to encode registry: {0}")]
    Encode(#[source] serde_json::Error),
}

/// Durable, ordered collection of endpoints.
#[async_trait]
pub trait RegistryStore: Send + Sync {
    /// Load the registry. A missing or empty store yields an empty registry.
    async fn load(&self) -> Result<Registry, StoreError>;

    /// Replace the persisted registry with `registry`.
    async fn save(&self, registry: &Registry) -> Result<(), StoreError>;

    /// Append `(name, url)` and persist. Returns the new registry.
    async fn add(&self, name: &str, url: &str) -> Result<Registry, StoreError> {
        let registry = self.load().await?.with_added(name, url);
        self.save(&registry).await?;
        Ok(registry)
    }

    /// Drop every entry called `name` and persist. Returns how many were removed.
    async fn remove(&self, name: &str) -> Result<usize, StoreError> {
        let before = self.load().await?;
        let after = before.without(name);
        let removed = before.len() - after.len();
        if removed > 0 {
            self.save(&after).await?;
        }
        Ok(removed)
    }
}

/// Registry kept in a pretty-printed JSON file.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    config: StoreConfig,
}

impl JsonFileStore {
    pub fn new(config: StoreConfig) -> Self {
        Self { config }
    }

    pub fn path(&self) -> &Path {
        &self.config.path
    }

    fn io_error(&self, source: std::io::Error) -> StoreError {
        StoreError::Io {
            path: self.config.path.clone(),
            source,
        }
    }

    async fn create_empty(&self) -> Result<(), StoreError> {
        if let Some(parent) = self.path().parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| self.io_error(e))?;
        }
        // Never truncate: another process may have created and filled it meanwhile.
        tokio::fs::OpenOptions::new()
            .write(true)
            .create(true)
            .open(self.path())
            .await
            .map_err(|e| self.io_error(e))?;
        info!("Created empty registry at {}", self.path().display());
        Ok(())
    }

    /// Registry path with symlinks followed. Saves replace this file, so a
    /// linked registry keeps its link.
    async fn resolve_target(&self) -> Result<PathBuf, StoreError> {
        let mut target = self.path().to_path_buf();
        for _ in 0..MAX_SYMLINK_HOPS {
            match tokio::fs::symlink_metadata(&target).await {
                Ok(meta) if meta.file_type().is_symlink() => {
                    let link = tokio::fs::read_link(&target)
                        .await
                        .map_err(|e| self.io_error(e))?;
                    target = match target.parent() {
                        Some(parent) if link.is_relative() => parent.join(link),
                        _ => link,
                    };
                }
                Ok(_) => return Ok(target),
                Err(e) if e.kind() == ErrorKind::NotFound => return Ok(target),
                Err(e) => return Err(self.io_error(e)),
            }
        }
        Err(self.io_error(std::io::Error::new(
            ErrorKind::Other,
            "too many levels of symbolic links",
        )))
    }
}

// Writes `contents` to a uniquely named sibling of `target`, then renames it
// into place.
fn write_atomically(target: &Path, contents: &[u8]) -> std::io::Result<()> {
    let dir = match target.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut temp = NamedTempFile::new_in(dir)?;
    if let Ok(meta) = std::fs::metadata(target) {
        temp.as_file().set_permissions(meta.permissions())?;
    }
    temp.write_all(contents)?;
    temp.as_file().sync_all()?;
    temp.persist(target).map_err(|e| e.error)?;
    Ok(())
}

#[async_trait]
impl RegistryStore for JsonFileStore {
    async fn load(&self) -> Result<Registry, StoreError> {
        let contents = match tokio::fs::read_to_string(self.path()).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                self.create_empty().await?;
                return Ok(Registry::default());
            }
            Err(e) => return Err(self.io_error(e)),
        };

        if contents.trim().is_empty() {
            return Ok(Registry::default());
        }

        let registry: Registry =
            serde_json::from_str(&contents).map_err(|source| StoreError::Decode {
                path: self.config.path.clone(),
                source,
            })?;
        debug!(
            "Loaded {} endpoint(s) from {}",
            registry.len(),
            self.path().display()
        );
        Ok(registry)
    }

    async fn save(&self, registry: &Registry) -> Result<(), StoreError> {
        let mut buffer = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut serializer = serde_json::Serializer::with_formatter(&mut buffer, formatter);
        registry
            .serialize(&mut serializer)
            .map_err(StoreError::Encode)?;

        // Write aside and rename so a failed write never truncates the registry.
        let target = self.resolve_target().await?;
        tokio::task::spawn_blocking(move || write_atomically(&target, &buffer))
            .await
            .map_err(|e| self.io_error(std::io::Error::new(ErrorKind::Other, e)))?
            .map_err(|e| self.io_error(e))?;

        debug!(
            "Saved {} endpoint(s) to {}",
            registry.len(),
            self.path().display()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::Endpoint;
    use tempfile::TempDir;

    fn store_in(dir: &TempDir) -> JsonFileStore {
        JsonFileStore::new(StoreConfig {
            path: dir.path().join("servers.json"),
        })
    }

    #[tokio::test]
    async fn missing_file_is_created_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);

        let registry = store.load().await.unwrap();
        assert!(registry.is_empty());
        assert!(store.path().exists());
        // loading again is idempotent
        assert!(store.load().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn missing_parent_directories_are_created() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(StoreConfig {
            path: dir.path().join("nested/deeper/servers.json"),
        });

        assert!(store.load().await.unwrap().is_empty());
        assert!(store.path().exists());
    }

    #[tokio::test]
    async fn whitespace_file_is_empty_registry() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        std::fs::write(store.path(), "  \n").unwrap();

        assert!(store.load().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn round_trip_keeps_order_and_values() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        let registry = Registry::new(vec![
            Endpoint::new("web", "https://web.example/"),
            Endpoint::new("api", "http://api.example/health"),
            Endpoint::new("db", "http://db.example:8080/"),
        ]);

        store.save(&registry).await.unwrap();
        assert_eq!(store.load().await.unwrap(), registry);
    }

    #[tokio::test]
    async fn round_trip_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);

        store.save(&Registry::default()).await.unwrap();
        assert_eq!(store.load().await.unwrap(), Registry::default());
    }

    #[tokio::test]
    async fn saved_document_is_indented_json() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        store
            .save(&Registry::new(vec![Endpoint::new("api", "http://api.example/")]))
            .await
            .unwrap();

        let contents = std::fs::read_to_string(store.path()).unwrap();
        assert!(contents.starts_with("{\n    \"Servers\": ["));
        assert!(contents.contains("\"Name\": \"api\""));
        assert!(contents.contains("\"URL\": \"http://api.example/\""));
        // no temp files left behind
        let entries = std::fs::read_dir(dir.path()).unwrap().count();
        assert_eq!(entries, 1);
    }

    #[tokio::test]
    async fn add_then_load_ends_with_new_entry() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        store.add("api", "http://api.example/").await.unwrap();
        store.add("db", "http://db.example/").await.unwrap();

        let registry = store.load().await.unwrap();
        assert_eq!(registry.len(), 2);
        assert_eq!(
            registry.endpoints().last(),
            Some(&Endpoint::new("db", "http://db.example/"))
        );
    }

    #[tokio::test]
    async fn remove_persists_and_ignores_unknown_names() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        store.add("api", "http://api.example/").await.unwrap();
        store.add("db", "http://db.example/").await.unwrap();

        assert_eq!(store.remove("nope").await.unwrap(), 0);
        assert_eq!(store.load().await.unwrap().len(), 2);

        assert_eq!(store.remove("api").await.unwrap(), 1);
        let registry = store.load().await.unwrap();
        assert_eq!(registry.endpoints(), &[Endpoint::new("db", "http://db.example/")]);
    }

    #[tokio::test]
    async fn malformed_file_is_decode_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        std::fs::write(store.path(), "{ not json").unwrap();

        let err = store.load().await.unwrap_err();
        assert!(matches!(err, StoreError::Decode { .. }));
        // a failed load leaves the file as it was
        assert_eq!(std::fs::read_to_string(store.path()).unwrap(), "{ not json");
    }

    #[tokio::test]
    async fn unreadable_path_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        // a directory where the file should be
        let store = JsonFileStore::new(StoreConfig {
            path: dir.path().to_path_buf(),
        });

        let err = store.load().await.unwrap_err();
        assert!(matches!(err, StoreError::Io { .. }));
    }

    #[tokio::test]
    async fn create_empty_keeps_existing_contents() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        std::fs::write(store.path(), r#"{"Servers":[{"Name":"api","URL":"http://api.example/"}]}"#)
            .unwrap();

        store.create_empty().await.unwrap();
        assert_eq!(store.load().await.unwrap().len(), 1);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn save_through_symlink_updates_the_linked_file() {
        let dir = tempfile::tempdir().unwrap();
        let real = dir.path().join("dotfiles_servers.json");
        std::fs::write(&real, "").unwrap();
        let link = dir.path().join("servers.json");
        std::os::unix::fs::symlink(&real, &link).unwrap();
        let store = JsonFileStore::new(StoreConfig { path: link.clone() });

        store.add("api", "http://api.example/").await.unwrap();

        assert!(std::fs::symlink_metadata(&link).unwrap().file_type().is_symlink());
        let contents = std::fs::read_to_string(&real).unwrap();
        assert!(contents.contains("\"Name\": \"api\""));
        assert_eq!(store.load().await.unwrap().len(), 1);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn save_keeps_file_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        std::fs::write(store.path(), "").unwrap();
        std::fs::set_permissions(store.path(), std::fs::Permissions::from_mode(0o644)).unwrap();

        store.add("api", "http://api.example/").await.unwrap();

        let mode = std::fs::metadata(store.path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o644);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn save_through_relative_dangling_symlink_creates_target() {
        let dir = tempfile::tempdir().unwrap();
        let link = dir.path().join("servers.json");
        std::os::unix::fs::symlink("real.json", &link).unwrap();
        let store = JsonFileStore::new(StoreConfig { path: link.clone() });

        store
            .save(&Registry::new(vec![Endpoint::new("db", "http://db.example/")]))
            .await
            .unwrap();

        assert!(std::fs::symlink_metadata(&link).unwrap().file_type().is_symlink());
        assert!(dir.path().join("real.json").is_file());
        assert_eq!(store.load().await.unwrap().len(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_saves_all_succeed() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);

        for round in 0..5 {
            let mut tasks = Vec::new();
            for writer in 0..4 {
                let store = store.clone();
                let registry = Registry::new(
                    (0..2000)
                        .map(|i| {
                            Endpoint::new(
                                format!("w{}-r{}-{}", writer, round, i),
                                format!("http://host{}.example/", i),
                            )
                        })
                        .collect(),
                );
                tasks.push(tokio::spawn(async move { store.save(&registry).await }));
            }
            for task in tasks {
                task.await.unwrap().unwrap();
            }
            // whichever writer won, the file is one whole registry
            assert_eq!(store.load().await.unwrap().len(), 2000);
        }

        let entries = std::fs::read_dir(dir.path()).unwrap().count();
        assert_eq!(entries, 1);
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        fn endpoints() -> impl Strategy<Value = Vec<Endpoint>> {
            prop::collection::vec(
                (".*", ".*").prop_map(|(name, url)| Endpoint::new(name, url)),
                0..12,
            )
        }

        proptest! {
            #![proptest_config(ProptestConfig::with_cases(64))]

            #[test]
            fn load_after_save_returns_the_same_registry(servers in endpoints()) {
                let runtime = tokio::runtime::Runtime::new().unwrap();
                let dir = tempfile::tempdir().unwrap();
                let store = store_in(&dir);
                let registry = Registry::new(servers);

                let loaded = runtime.block_on(async {
                    store.save(&registry).await.unwrap();
                    store.load().await.unwrap()
                });
                prop_assert_eq!(loaded, registry);
            }
        }
    }
}
