//! Session orchestration and view refresh.
//!
//! No view state is trusted unless freshly fetched: every mutation is followed
//! by a full re-listing of the affected views, and a snapshot is published only
//! after all of its remote reads succeeded.

use std::path::Path;
use std::sync::Arc;

use drive_core::{FileQuery, OrderBy};

use crate::config::EngineConfig;
use crate::error::{EngineError, PreconditionError};
use crate::naming;
use crate::resolver::FolderResolver;
use crate::session::{FolderHandle, SessionContext};
use crate::store::RemoteStore;
use crate::view::{FolderContentsView, FolderListView, FolderSummary, Presenter, Prompt};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhotoPayload {
    pub bytes: Vec<u8>,
    pub mime_type: String,
}

impl PhotoPayload {
    pub fn new(bytes: Vec<u8>, mime_type: impl Into<String>) -> Self {
        Self {
            bytes,
            mime_type: mime_type.into(),
        }
    }

    pub fn jpeg(bytes: Vec<u8>) -> Self {
        Self::new(bytes, "image/jpeg")
    }

    pub async fn from_path(path: &Path) -> std::io::Result<Self> {
        let bytes = tokio::fs::read(path).await?;
        Ok(Self::new(bytes, mime_type_for(path)))
    }
}

pub fn mime_type_for(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    match extension.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "heic" => "image/heic",
        "heif" => "image/heif",
        "tif" | "tiff" => "image/tiff",
        _ => "application/octet-stream",
    }
}

fn photos_of(folder_id: &str) -> FileQuery {
    FileQuery::children_of(folder_id)
        .only_images()
        .ordered_by(OrderBy::Name)
}

pub struct ViewSynchronizer {
    store: Arc<dyn RemoteStore>,
    presenter: Arc<dyn Presenter>,
    prompt: Arc<dyn Prompt>,
    resolver: FolderResolver,
    config: EngineConfig,
    session: Option<SessionContext>,
    folder_list: Option<FolderListView>,
    folder_contents: Option<FolderContentsView>,
}

impl ViewSynchronizer {
    pub fn new(
        store: Arc<dyn RemoteStore>,
        presenter: Arc<dyn Presenter>,
        prompt: Arc<dyn Prompt>,
        config: EngineConfig,
    ) -> Self {
        let resolver = FolderResolver::new(store.clone(), prompt.clone(), config.confirm_create);
        Self {
            store,
            presenter,
            prompt,
            resolver,
            config,
            session: None,
            folder_list: None,
            folder_contents: None,
        }
    }

    pub fn session(&self) -> Option<&SessionContext> {
        self.session.as_ref()
    }

    pub fn resolver(&self) -> &FolderResolver {
        &self.resolver
    }

    /// Last folder list that was fully fetched and published.
    pub fn folder_list(&self) -> Option<&FolderListView> {
        self.folder_list.as_ref()
    }

    /// Last folder contents that were fully fetched and published.
    pub fn folder_contents(&self) -> Option<&FolderContentsView> {
        self.folder_contents.as_ref()
    }

    /// Opens a session: resolves the root scope and publishes the folder list.
    pub async fn start(&mut self) -> Result<(), EngineError> {
        let scope = self
            .resolver
            .resolve_root(&self.config.root_folder_name)
            .await?;
        tracing::info!(root = %scope.name, id = %scope.id, "session started");
        self.session = Some(SessionContext::new(scope));
        self.refresh_folder_list().await?;
        Ok(())
    }

    pub fn logout(&mut self) {
        self.session = None;
        self.folder_list = None;
        self.folder_contents = None;
        self.resolver.forget_all();
        tracing::info!("session cleared");
    }

    /// Resolves `name` to a folder under the root scope and opens it.
    /// `Ok(None)` when the user declined to create it; no folder is open then.
    pub async fn open_folder(&mut self, name: &str) -> Result<Option<FolderHandle>, EngineError> {
        let scope_id = self.active_session()?.scope_id().to_string();
        let Some(resolution) = self.resolver.resolve(name, &scope_id).await? else {
            self.session_mut()?.leave();
            self.folder_contents = None;
            return Ok(None);
        };
        let folder = resolution.folder;
        self.session_mut()?.enter(folder.clone());
        if resolution.created {
            self.after_create(&folder.id).await?;
        } else {
            self.refresh_open_folder(&folder.id).await?;
        }
        Ok(Some(folder))
    }

    /// Opens a folder picked from the published list, without resolution.
    pub async fn select_folder(&mut self, folder: FolderHandle) -> Result<(), EngineError> {
        let folder_id = folder.id.clone();
        self.session_mut()?.enter(folder);
        self.refresh_open_folder(&folder_id).await
    }

    pub async fn back(&mut self) -> Result<(), EngineError> {
        self.session_mut()?.leave();
        self.folder_contents = None;
        self.refresh_folder_list().await?;
        Ok(())
    }

    /// Uploads one photo into the open folder under the next sequential name.
    pub async fn capture(&mut self, payload: PhotoPayload) -> Result<String, EngineError> {
        let folder = self.open_folder_handle()?;
        let name = self.upload_one(&folder, payload).await?;
        self.after_upload(&folder.id).await?;
        Ok(name)
    }

    /// Uploads photos one after another, then refreshes once.
    pub async fn upload_batch(
        &mut self,
        payloads: Vec<PhotoPayload>,
    ) -> Result<Vec<String>, EngineError> {
        let folder = self.open_folder_handle()?;
        let mut names = Vec::with_capacity(payloads.len());
        for payload in payloads {
            match self.upload_one(&folder, payload).await {
                Ok(name) => names.push(name),
                Err(err) => {
                    if !names.is_empty() {
                        if let Err(refresh_err) = self.after_upload(&folder.id).await {
                            tracing::warn!(error = %refresh_err, "refresh after partial batch failed");
                        }
                    }
                    return Err(err);
                }
            }
        }
        self.after_upload(&folder.id).await?;
        Ok(names)
    }

    /// Deletes a photo of the open folder. Ids of anything else, including
    /// photos of other folders and folders themselves, are refused.
    pub async fn delete_photo(&mut self, entry_id: &str) -> Result<(), EngineError> {
        let folder = self.open_folder_handle()?;
        let photos = self.store.list(&photos_of(&folder.id)).await?;
        if !photos.iter().any(|photo| photo.id == entry_id) {
            return Err(PreconditionError::NotInFolder(entry_id.to_string()).into());
        }
        self.store.delete(entry_id).await?;
        tracing::info!(entry_id, folder = %folder.name, "deleted photo");
        self.after_delete(entry_id, &folder.id).await
    }

    /// Asks for a new name for the open folder and applies it.
    pub async fn rename_current_folder(&mut self) -> Result<Option<FolderHandle>, EngineError> {
        let folder = self.open_folder_handle()?;
        let Some(answer) = self
            .prompt
            .prompt_text("Rename folder", &folder.name)
        else {
            return Ok(None);
        };
        self.rename_folder(&folder, &answer).await
    }

    pub async fn rename_folder(
        &mut self,
        folder: &FolderHandle,
        new_name: &str,
    ) -> Result<Option<FolderHandle>, EngineError> {
        let scope_id = self.active_session()?.scope_id().to_string();
        let new_name = new_name.trim();
        if new_name.is_empty() {
            return Err(PreconditionError::EmptyName.into());
        }
        if new_name == folder.name {
            return Ok(None);
        }
        let siblings = self
            .store
            .list(&FileQuery::folders().named(new_name).in_parent(scope_id.as_str()))
            .await?;
        if siblings.iter().any(|sibling| sibling.id != folder.id) {
            return Err(PreconditionError::NameTaken(new_name.to_string()).into());
        }
        self.store.rename(&folder.id, new_name).await?;
        tracing::info!(from = %folder.name, to = new_name, id = %folder.id, "renamed folder");
        self.resolver.record_rename(&scope_id, &folder.id, new_name);
        let session = self.session_mut()?;
        if session.current_folder_id() == Some(folder.id.as_str()) {
            session.rename_current(new_name);
        }
        if let Err(err) = self.rebase_photos(&folder.id, &folder.name, new_name).await {
            if let Err(refresh_err) = self.refresh_views(&folder.id).await {
                tracing::warn!(error = %refresh_err, "refresh after partial photo rename failed");
            }
            return Err(err);
        }
        self.refresh_views(&folder.id).await?;
        Ok(Some(FolderHandle::new(new_name, folder.id.clone())))
    }

    /// Moves the folder's sequential photo names onto its new name so the
    /// namer keeps counting from the existing photos.
    async fn rebase_photos(
        &self,
        folder_id: &str,
        old_base: &str,
        new_base: &str,
    ) -> Result<(), EngineError> {
        let separator = self.config.separator;
        for photo in self.store.list(&photos_of(folder_id)).await? {
            let Some(renamed) = naming::rebased_name(&photo.name, old_base, new_base, separator)
            else {
                continue;
            };
            self.store.rename(&photo.id, &renamed).await?;
            tracing::debug!(from = %photo.name, to = %renamed, "renamed photo");
        }
        Ok(())
    }

    /// Deletes the open folder with its photos after confirmation.
    /// Returns `false` when the user declined.
    pub async fn delete_current_folder(&mut self) -> Result<bool, EngineError> {
        let folder = self.open_folder_handle()?;
        let question = format!("Delete folder \"{}\" and all of its photos?", folder.name);
        if !self.prompt.confirm(&question) {
            return Ok(false);
        }
        self.delete_folder(&folder).await?;
        Ok(true)
    }

    pub async fn delete_folder(&mut self, folder: &FolderHandle) -> Result<(), EngineError> {
        self.active_session()?;
        self.store.delete(&folder.id).await?;
        tracing::info!(name = %folder.name, id = %folder.id, "deleted folder");
        self.resolver.evict(&folder.id);
        let session = self.session_mut()?;
        if session.current_folder_id() == Some(folder.id.as_str()) {
            session.leave();
            self.folder_contents = None;
        }
        self.after_folder_mutation().await
    }

    pub async fn after_create(&mut self, folder_id: &str) -> Result<(), EngineError> {
        self.refresh_views(folder_id).await
    }

    pub async fn after_upload(&mut self, folder_id: &str) -> Result<(), EngineError> {
        self.refresh_views(folder_id).await
    }

    pub async fn after_delete(&mut self, entry_id: &str, folder_id: &str) -> Result<(), EngineError> {
        self.refresh_views(folder_id).await?;
        if self
            .folder_contents
            .as_ref()
            .is_some_and(|view| view.folder.id == folder_id && view.contains(entry_id))
        {
            tracing::warn!(entry_id, folder_id, "deleted entry is still listed by the store");
        }
        Ok(())
    }

    pub async fn after_folder_mutation(&mut self) -> Result<(), EngineError> {
        self.refresh_folder_list().await?;
        Ok(())
    }

    /// Re-lists the root scope, with per-folder photo counts and the newest
    /// thumbnail, and publishes the result.
    pub async fn refresh_folder_list(&mut self) -> Result<&FolderListView, EngineError> {
        let view = self.fetch_folder_list().await?;
        self.presenter.render_folder_list(&view);
        Ok(self.folder_list.insert(view))
    }

    /// Fetches the open folder's contents (when it is `folder_id`) and the
    /// folder list, then publishes both. Nothing is published unless every
    /// read succeeded.
    async fn refresh_views(&mut self, folder_id: &str) -> Result<(), EngineError> {
        let contents = self.fetch_open_folder(folder_id).await?;
        let list = self.fetch_folder_list().await?;
        if let Some(contents) = contents {
            self.presenter.render_folder_contents(&contents);
            self.folder_contents = Some(contents);
        }
        self.presenter.render_folder_list(&list);
        self.folder_list = Some(list);
        Ok(())
    }

    async fn refresh_open_folder(&mut self, folder_id: &str) -> Result<(), EngineError> {
        if let Some(view) = self.fetch_open_folder(folder_id).await? {
            self.presenter.render_folder_contents(&view);
            self.folder_contents = Some(view);
        }
        Ok(())
    }

    async fn fetch_folder_list(&self) -> Result<FolderListView, EngineError> {
        let scope_id = self.active_session()?.scope_id().to_string();
        let folders = self
            .store
            .list(
                &FileQuery::folders()
                    .in_parent(scope_id.as_str())
                    .ordered_by(OrderBy::Name),
            )
            .await?;

        let mut summaries = Vec::with_capacity(folders.len());
        for folder in folders {
            let images = FileQuery::children_of(folder.id.as_str()).only_images();
            let photo_count = self.store.list(&images).await?.len();
            let latest_thumbnail = if photo_count == 0 {
                None
            } else {
                self.store
                    .list(&images.ordered_by(OrderBy::CreatedTimeDesc).limit(1))
                    .await?
                    .into_iter()
                    .next()
                    .and_then(|entry| entry.thumbnail_url)
            };
            summaries.push(FolderSummary {
                folder: FolderHandle::new(folder.name, folder.id),
                photo_count,
                latest_thumbnail,
            });
        }

        let view = FolderListView { folders: summaries };
        tracing::debug!(folders = view.folders.len(), "folder list fetched");
        Ok(view)
    }

    /// Lists the open folder when it is `folder_id`; other folders have no
    /// contents view.
    async fn fetch_open_folder(
        &self,
        folder_id: &str,
    ) -> Result<Option<FolderContentsView>, EngineError> {
        let Some(folder) = self
            .active_session()?
            .current_folder()
            .filter(|f| f.id == folder_id)
            .cloned()
        else {
            return Ok(None);
        };
        let photos = self.store.list(&photos_of(&folder.id)).await?;
        let view = FolderContentsView { folder, photos };
        tracing::debug!(folder = %view.folder.name, photos = view.photos.len(), "folder contents fetched");
        Ok(Some(view))
    }

    async fn upload_one(
        &self,
        folder: &FolderHandle,
        payload: PhotoPayload,
    ) -> Result<String, EngineError> {
        let name = naming::next_name(
            self.store.as_ref(),
            &folder.id,
            &folder.name,
            self.config.separator,
        )
        .await?;
        let id = self
            .store
            .upload(&folder.id, &name, &payload.mime_type, payload.bytes)
            .await?;
        tracing::info!(%name, %id, folder = %folder.name, "uploaded photo");
        Ok(name)
    }

    fn active_session(&self) -> Result<&SessionContext, EngineError> {
        self.session
            .as_ref()
            .ok_or_else(|| PreconditionError::NoActiveScope.into())
    }

    fn session_mut(&mut self) -> Result<&mut SessionContext, EngineError> {
        self.session
            .as_mut()
            .ok_or_else(|| PreconditionError::NoActiveScope.into())
    }

    fn open_folder_handle(&self) -> Result<FolderHandle, EngineError> {
        self.active_session()?
            .current_folder()
            .cloned()
            .ok_or_else(|| PreconditionError::NoActiveFolder.into())
    }
}

#[cfg(test)]
#[path = "sync_tests.rs"]
mod tests;
