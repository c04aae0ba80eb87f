use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use drive_core::FileQuery;

use crate::error::{EngineError, PreconditionError};
use crate::session::FolderHandle;
use crate::store::RemoteStore;
use crate::view::Prompt;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    parent: Option<String>,
    name: String,
}

impl CacheKey {
    fn new(parent: Option<&str>, name: &str) -> Self {
        Self {
            parent: parent.map(str::to_string),
            name: name.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub folder: FolderHandle,
    pub created: bool,
}

/// Maps folder names to remote ids, creating a folder only when the
/// lookup finds none.
///
/// List-then-create is not atomic against other clients or against a
/// concurrent call for the same name from this process; the later create
/// simply wins in the cache.
pub struct FolderResolver {
    store: Arc<dyn RemoteStore>,
    prompt: Arc<dyn Prompt>,
    confirm_create: bool,
    cache: Mutex<HashMap<CacheKey, FolderHandle>>,
}

impl FolderResolver {
    pub fn new(store: Arc<dyn RemoteStore>, prompt: Arc<dyn Prompt>, confirm_create: bool) -> Self {
        Self {
            store,
            prompt,
            confirm_create,
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// Resolves the well-known root scope. Never asks for confirmation.
    pub async fn resolve_root(&self, name: &str) -> Result<FolderHandle, EngineError> {
        let resolution = self.resolve_in(name, None, false).await?;
        // Without a confirmation step the create path always yields a folder.
        resolution
            .map(|r| r.folder)
            .ok_or_else(|| PreconditionError::NoActiveScope.into())
    }

    /// Resolves `name` under `parent_scope`. `Ok(None)` means the user
    /// declined to create a missing folder.
    pub async fn resolve(
        &self,
        name: &str,
        parent_scope: &str,
    ) -> Result<Option<Resolution>, EngineError> {
        self.resolve_in(name, Some(parent_scope), self.confirm_create)
            .await
    }

    pub fn cached(&self, name: &str, parent_scope: Option<&str>) -> Option<FolderHandle> {
        self.lock()
            .get(&CacheKey::new(parent_scope, name.trim()))
            .cloned()
    }

    /// Re-keys a folder this engine renamed.
    pub fn record_rename(&self, parent_scope: &str, folder_id: &str, new_name: &str) {
        let mut cache = self.lock();
        cache.retain(|_, handle| handle.id != folder_id);
        cache.insert(
            CacheKey::new(Some(parent_scope), new_name),
            FolderHandle::new(new_name, folder_id),
        );
    }

    /// Drops a folder this engine deleted.
    pub fn evict(&self, folder_id: &str) {
        self.lock().retain(|_, handle| handle.id != folder_id);
    }

    pub fn forget_all(&self) {
        self.lock().clear();
    }

    async fn resolve_in(
        &self,
        name: &str,
        parent: Option<&str>,
        confirm: bool,
    ) -> Result<Option<Resolution>, EngineError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(PreconditionError::EmptyName.into());
        }
        let key = CacheKey::new(parent, name);
        if let Some(folder) = self.lock().get(&key).cloned() {
            tracing::debug!(name, id = %folder.id, "folder resolved from cache");
            return Ok(Some(Resolution {
                folder,
                created: false,
            }));
        }

        let mut query = FileQuery::folders().named(name);
        if let Some(parent) = parent {
            query = query.in_parent(parent);
        }
        let existing = self.store.list(&query).await?;

        let resolution = match existing.into_iter().next() {
            Some(entry) => {
                tracing::debug!(name, id = %entry.id, "found existing folder");
                Resolution {
                    folder: FolderHandle::new(name, entry.id),
                    created: false,
                }
            }
            None => {
                if confirm
                    && !self.prompt.confirm(&format!(
                        "Folder for SKU \"{name}\" does not exist. Create it?"
                    ))
                {
                    tracing::info!(name, "folder creation declined");
                    return Ok(None);
                }
                let id = self.store.create_folder(name, parent).await?;
                tracing::info!(name, %id, parent = parent.unwrap_or("-"), "created folder");
                Resolution {
                    folder: FolderHandle::new(name, id),
                    created: true,
                }
            }
        };

        self.lock().insert(key, resolution.folder.clone());
        Ok(Some(resolution))
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<CacheKey, FolderHandle>> {
        self.cache.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
