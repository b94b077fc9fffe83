use std::path::{Path, PathBuf};

use redb::{
    Database,
    ReadableDatabase,
    ReadableTable,
    ReadableTableMetadata,
    TableDefinition,
};

use crate::{
    document::{DocumentKey, IndexedDocument},
    error::{Error, Result},
};

pub const CATALOG_FILE: &str = "catalog.redb";

/// Directory override read by [`CatalogDb::open_default`].
pub const DATA_DIR_ENV: &str = "PROMPTDEX_DATA_DIR";

const REPOSITORIES: TableDefinition<&str, &str> =
    TableDefinition::new("repositories");
const DOCUMENTS: TableDefinition<&str, &[u8]> =
    TableDefinition::new("documents");
const SETTINGS: TableDefinition<&str, &str> = TableDefinition::new("settings");

/// Supplies the corpus a search runs over.
pub trait CorpusProvider {
    /// Documents of the given source groups, or of every group when `None`.
    fn corpus(
        &self,
        groups: Option<&[String]>,
    ) -> Result<Vec<IndexedDocument>>;

    /// Names of all known source groups.
    fn source_groups(&self) -> Result<Vec<String>>;
}

/// Persistent catalog: registered repositories, their indexed templates,
/// and user settings.
pub struct CatalogDb {
    db: Database,
    path: PathBuf,
}

/// Where the catalog file lives.
///
/// `explicit` (the `--data-dir` flag) wins over `env_dir`, which wins over
/// the XDG data home. An empty `env_dir` counts as unset. The directory is
/// created when missing.
pub fn catalog_path(
    explicit: Option<&Path>,
    env_dir: Option<PathBuf>,
) -> Result<PathBuf> {
    let dir = match (explicit, env_dir) {
        (Some(path), _) => path.to_path_buf(),
        (None, Some(dir)) if !dir.as_os_str().is_empty() => dir,
        _ => xdg::BaseDirectories::with_prefix("promptdex")
            .get_data_home()
            .ok_or_else(|| {
                Error::Config(
                    "could not determine XDG data home directory".into(),
                )
            })?,
    };

    std::fs::create_dir_all(&dir).map_err(|_| Error::DataDir(dir.clone()))?;
    Ok(dir.join(CATALOG_FILE))
}

impl CatalogDb {
    /// Open the catalog at its configured location, see [`catalog_path`].
    pub fn open_default(explicit: Option<&Path>) -> Result<Self> {
        let env_dir = std::env::var_os(DATA_DIR_ENV).map(PathBuf::from);
        Self::open(&catalog_path(explicit, env_dir)?)
    }

    pub fn open(path: &Path) -> Result<Self> {
        let db = Database::create(path)?;

        // Ensure all tables exist by opening them in a write transaction.
        let txn = db.begin_write()?;
        txn.open_table(REPOSITORIES)?;
        txn.open_table(DOCUMENTS)?;
        txn.open_table(SETTINGS)?;
        txn.commit()?;

        Ok(Self {
            db,
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    // -- Repositories --

    pub fn set_repository(&self, name: &str, location: &str) -> Result<()> {
        let txn = self.db.begin_write()?;
        {
            let mut table = txn.open_table(REPOSITORIES)?;
            table.insert(name, location)?;
        }
        txn.commit()?;
        Ok(())
    }

    pub fn get_repository(&self, name: &str) -> Result<Option<String>> {
        let txn = self.db.begin_read()?;
        let table = txn.open_table(REPOSITORIES)?;
        Ok(table.get(name)?.map(|v| v.value().to_string()))
    }

    /// Remove a repository together with all of its documents.
    pub fn remove_repository(&self, name: &str) -> Result<bool> {
        let txn = self.db.begin_write()?;
        let removed = {
            let mut repos = txn.open_table(REPOSITORIES)?;
            let removed = repos.remove(name)?.is_some();
            let mut docs = txn.open_table(DOCUMENTS)?;
            remove_group(&mut docs, name)?;
            removed
        };
        txn.commit()?;
        Ok(removed)
    }

    pub fn list_repositories(&self) -> Result<Vec<(String, String)>> {
        let txn = self.db.begin_read()?;
        let table = txn.open_table(REPOSITORIES)?;
        let mut result = Vec::new();
        for entry in table.iter()? {
            let (k, v) = entry?;
            result.push((k.value().to_string(), v.value().to_string()));
        }
        Ok(result)
    }

    // -- Documents --

    /// Replace every document of `group` in a single transaction.
    pub fn replace_documents(
        &self,
        group: &str,
        docs: &[IndexedDocument],
    ) -> Result<usize> {
        let mut encoded = Vec::with_capacity(docs.len());
        for doc in docs {
            let key = DocumentKey::new(group, &doc.id);
            encoded.push((key, serde_json::to_vec(doc)?));
        }

        let txn = self.db.begin_write()?;
        {
            let mut table = txn.open_table(DOCUMENTS)?;
            remove_group(&mut table, group)?;
            for (key, bytes) in &encoded {
                table.insert(key.storage_key().as_str(), bytes.as_slice())?;
            }
        }
        txn.commit()?;
        Ok(encoded.len())
    }

    pub fn get_document(
        &self,
        key: &DocumentKey,
    ) -> Result<Option<IndexedDocument>> {
        let txn = self.db.begin_read()?;
        let table = txn.open_table(DOCUMENTS)?;
        let Some(bytes) = table.get(key.storage_key().as_str())? else {
            return Ok(None);
        };
        Ok(Some(serde_json::from_slice(bytes.value())?))
    }

    /// All documents, ordered by source group then id. Rows that fail to
    /// decode are skipped.
    pub fn list_documents(&self) -> Result<Vec<IndexedDocument>> {
        let txn = self.db.begin_read()?;
        let table = txn.open_table(DOCUMENTS)?;
        let mut result = Vec::new();
        decode_rows(table.iter()?, None, &mut result)?;
        Ok(result)
    }

    /// Documents of the given groups in key order. Only the rows of those
    /// groups are read.
    pub fn list_group_documents(
        &self,
        groups: &[String],
    ) -> Result<Vec<IndexedDocument>> {
        let mut groups: Vec<&str> = groups.iter().map(String::as_str).collect();
        groups.sort_unstable();
        groups.dedup();

        let txn = self.db.begin_read()?;
        let table = txn.open_table(DOCUMENTS)?;
        let mut result = Vec::new();
        for group in groups {
            let prefix = DocumentKey::group_prefix(group);
            let rows = table.range(prefix.as_str()..)?;
            decode_rows(rows, Some(&prefix), &mut result)?;
        }
        Ok(result)
    }

    pub fn document_count(&self) -> Result<u64> {
        let txn = self.db.begin_read()?;
        let table = txn.open_table(DOCUMENTS)?;
        Ok(table.len()?)
    }

    // -- Settings --

    pub fn set_setting(&self, key: &str, value: &str) -> Result<()> {
        let txn = self.db.begin_write()?;
        {
            let mut table = txn.open_table(SETTINGS)?;
            table.insert(key, value)?;
        }
        txn.commit()?;
        Ok(())
    }

    pub fn get_setting(&self, key: &str) -> Result<Option<String>> {
        let txn = self.db.begin_read()?;
        let table = txn.open_table(SETTINGS)?;
        Ok(table.get(key)?.map(|v| v.value().to_string()))
    }

    /// Get a setting, returning the default if not set.
    pub fn get_setting_or(&self, key: &str, default: &str) -> Result<String> {
        Ok(self
            .get_setting(key)?
            .unwrap_or_else(|| default.to_string()))
    }

    pub fn remove_setting(&self, key: &str) -> Result<bool> {
        let txn = self.db.begin_write()?;
        let removed = {
            let mut table = txn.open_table(SETTINGS)?;
            table.remove(key)?.is_some()
        };
        txn.commit()?;
        Ok(removed)
    }
}

/// Decode document rows until one falls outside `prefix`. Rows that fail
/// to decode are logged and skipped.
fn decode_rows(
    rows: redb::Range<'_, &'static str, &'static [u8]>,
    prefix: Option<&str>,
    out: &mut Vec<IndexedDocument>,
) -> Result<()> {
    for entry in rows {
        let (k, v) = entry?;
        let raw = k.value();
        if prefix.is_some_and(|p| !raw.starts_with(p)) {
            break;
        }
        match serde_json::from_slice::<IndexedDocument>(v.value()) {
            Ok(doc) => out.push(doc),
            Err(e) => {
                let key = DocumentKey::from_storage_key(raw)
                    .map_or_else(|| raw.to_string(), |key| key.to_string());
                tracing::warn!(
                    key = %key,
                    error = %e,
                    "skipping unreadable catalog row"
                );
            }
        }
    }
    Ok(())
}

fn remove_group(
    table: &mut redb::Table<'_, &'static str, &'static [u8]>,
    group: &str,
) -> Result<()> {
    let prefix = DocumentKey::group_prefix(group);
    let stale: Vec<String> = table
        .range(prefix.as_str()..)?
        .map(|entry| entry.map(|(k, _)| k.value().to_string()))
        .take_while(|key| {
            key.as_ref().map_or(true, |k| k.starts_with(&prefix))
        })
        .collect::<std::result::Result<_, _>>()?;
    for key in &stale {
        table.remove(key.as_str())?;
    }
    Ok(())
}

impl CorpusProvider for CatalogDb {
    fn corpus(
        &self,
        groups: Option<&[String]>,
    ) -> Result<Vec<IndexedDocument>> {
        match groups {
            None => self.list_documents(),
            Some(groups) => self.list_group_documents(groups),
        }
    }

    fn source_groups(&self) -> Result<Vec<String>> {
        Ok(self
            .list_repositories()?
            .into_iter()
            .map(|(name, _)| name)
            .collect())
    }
}

impl std::fmt::Debug for CatalogDb {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CatalogDb")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}
