use std::{
    collections::HashMap,
    path::{Path, PathBuf},
};

use rayon::prelude::*;

use crate::{
    catalog_db::CatalogDb,
    document::IndexedDocument,
    error::{Error, Result},
};

/// Read JSON catalog files, each an array of templates.
///
/// Files are parsed in parallel; the returned documents keep file order
/// and, within a file, array order.
pub fn load_catalog_files(paths: &[PathBuf]) -> Result<Vec<IndexedDocument>> {
    let parsed: Vec<Result<Vec<IndexedDocument>>> =
        paths.par_iter().map(|path| load_catalog_file(path)).collect();

    let mut docs = Vec::new();
    for batch in parsed {
        docs.extend(batch?);
    }
    Ok(docs)
}

fn load_catalog_file(path: &Path) -> Result<Vec<IndexedDocument>> {
    let content = std::fs::read_to_string(path)?;
    serde_json::from_str(&content).map_err(|e| {
        Error::Config(format!("{}: {e}", path.display()))
    })
}

/// Replace the templates of repository `group` with `docs`.
///
/// Every document is stamped with `group` as its source group. When an id
/// repeats, the last occurrence wins.
pub fn import_documents(
    catalog: &CatalogDb,
    group: &str,
    docs: Vec<IndexedDocument>,
) -> Result<usize> {
    if catalog.get_repository(group)?.is_none() {
        return Err(Error::NotFound {
            kind: "repository",
            name: group.to_string(),
        });
    }

    let mut position: HashMap<String, usize> = HashMap::new();
    let mut unique: Vec<IndexedDocument> = Vec::with_capacity(docs.len());
    for mut doc in docs {
        doc.source_group = group.to_string();
        match position.get(&doc.id) {
            Some(&idx) => {
                tracing::warn!(
                    repo = group,
                    id = %doc.id,
                    "duplicate template id, keeping the last one"
                );
                unique[idx] = doc;
            }
            None => {
                position.insert(doc.id.clone(), unique.len());
                unique.push(doc);
            }
        }
    }

    let count = catalog.replace_documents(group, &unique)?;
    tracing::info!(repo = group, count, "imported templates");
    Ok(count)
}
