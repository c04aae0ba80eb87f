use std::collections::BTreeSet;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use drive_core::{
    DriveError, EntryKind, FOLDER_MIME_TYPE, FileQuery, OrderBy, RemoteEntry, StatusCode,
};
use time::{Duration, OffsetDateTime};

use crate::store::RemoteStore;
use crate::view::{FolderContentsView, FolderListView, Presenter, Prompt};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CallCounts {
    pub lists: usize,
    pub creates: usize,
    pub deletes: usize,
    pub renames: usize,
    pub uploads: usize,
}

#[derive(Default)]
struct Inner {
    entries: Vec<RemoteEntry>,
    next_id: u64,
    calls: CallCounts,
    fail_list_in: Option<usize>,
    fail_next_upload: bool,
}

impl Inner {
    fn insert(&mut self, name: &str, mime_type: &str, parent: Option<&str>) -> String {
        self.next_id += 1;
        let id = format!("id-{}", self.next_id);
        let kind = EntryKind::from_mime_type(mime_type);
        self.entries.push(RemoteEntry {
            id: id.clone(),
            name: name.to_string(),
            parent_ids: parent.map(str::to_string).into_iter().collect(),
            kind,
            mime_type: mime_type.to_string(),
            created_at: OffsetDateTime::UNIX_EPOCH + Duration::seconds(self.next_id as i64),
            thumbnail_url: (kind == EntryKind::Photo).then(|| format!("https://thumbs.test/{id}")),
        });
        id
    }
}

/// In-process stand-in for the remote store with call accounting.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seed_folder(&self, name: &str, parent: Option<&str>) -> String {
        self.inner
            .lock()
            .unwrap()
            .insert(name, FOLDER_MIME_TYPE, parent)
    }

    pub fn seed_photo(&self, parent: &str, name: &str) -> String {
        self.seed_file(parent, name, "image/jpeg")
    }

    pub fn seed_file(&self, parent: &str, name: &str, mime_type: &str) -> String {
        self.inner
            .lock()
            .unwrap()
            .insert(name, mime_type, Some(parent))
    }

    pub fn calls(&self) -> CallCounts {
        self.inner.lock().unwrap().calls
    }

    pub fn names_in(&self, parent: &str) -> Vec<String> {
        self.inner
            .lock()
            .unwrap()
            .entries
            .iter()
            .filter(|e| e.parent_ids.contains(parent))
            .map(|e| e.name.clone())
            .collect()
    }

    pub fn name_of(&self, id: &str) -> Option<String> {
        self.inner
            .lock()
            .unwrap()
            .entries
            .iter()
            .find(|e| e.id == id)
            .map(|e| e.name.clone())
    }

    pub fn parents_of(&self, id: &str) -> Vec<String> {
        self.inner
            .lock()
            .unwrap()
            .entries
            .iter()
            .find(|e| e.id == id)
            .map(|e| e.parent_ids.iter().cloned().collect())
            .unwrap_or_default()
    }

    pub fn fail_next_list(&self) {
        self.fail_list_after(0);
    }

    /// Lets `successful` list calls through, then fails the next one.
    pub fn fail_list_after(&self, successful: usize) {
        self.inner.lock().unwrap().fail_list_in = Some(successful);
    }

    pub fn fail_next_upload(&self) {
        self.inner.lock().unwrap().fail_next_upload = true;
    }
}

fn server_error() -> DriveError {
    DriveError::Api {
        status: StatusCode::INTERNAL_SERVER_ERROR,
        body: "backend error".to_string(),
    }
}

fn not_found(id: &str) -> DriveError {
    DriveError::Api {
        status: StatusCode::NOT_FOUND,
        body: format!("file not found: {id}"),
    }
}

#[async_trait]
impl RemoteStore for MemoryStore {
    async fn list(&self, query: &FileQuery) -> Result<Vec<RemoteEntry>, DriveError> {
        let mut inner = self.inner.lock().unwrap();
        inner.calls.lists += 1;
        match inner.fail_list_in {
            Some(0) => {
                inner.fail_list_in = None;
                return Err(server_error());
            }
            Some(remaining) => inner.fail_list_in = Some(remaining - 1),
            None => {}
        }
        let mut found: Vec<RemoteEntry> = inner
            .entries
            .iter()
            .filter(|e| {
                let parents: Vec<&str> = e.parent_ids.iter().map(String::as_str).collect();
                query.matches(&e.name, &e.mime_type, &parents)
            })
            .cloned()
            .collect();
        match query.order_by {
            Some(OrderBy::CreatedTimeDesc) => found.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
            Some(OrderBy::Name) => found.sort_by(|a, b| a.name.cmp(&b.name)),
            None => {}
        }
        if let Some(limit) = query.limit {
            found.truncate(limit as usize);
        }
        Ok(found)
    }

    async fn create_folder(&self, name: &str, parent: Option<&str>) -> Result<String, DriveError> {
        let mut inner = self.inner.lock().unwrap();
        inner.calls.creates += 1;
        Ok(inner.insert(name, FOLDER_MIME_TYPE, parent))
    }

    async fn delete(&self, id: &str) -> Result<(), DriveError> {
        let mut inner = self.inner.lock().unwrap();
        inner.calls.deletes += 1;
        if !inner.entries.iter().any(|e| e.id == id) {
            return Err(not_found(id));
        }
        let mut doomed = BTreeSet::from([id.to_string()]);
        loop {
            let before = doomed.len();
            for entry in &inner.entries {
                if entry.parent_ids.iter().any(|p| doomed.contains(p)) {
                    doomed.insert(entry.id.clone());
                }
            }
            if doomed.len() == before {
                break;
            }
        }
        inner.entries.retain(|e| !doomed.contains(&e.id));
        Ok(())
    }

    async fn rename(&self, id: &str, name: &str) -> Result<(), DriveError> {
        let mut inner = self.inner.lock().unwrap();
        inner.calls.renames += 1;
        let entry = inner
            .entries
            .iter_mut()
            .find(|e| e.id == id)
            .ok_or_else(|| not_found(id))?;
        entry.name = name.to_string();
        Ok(())
    }

    async fn upload(
        &self,
        parent: &str,
        name: &str,
        mime_type: &str,
        _bytes: Vec<u8>,
    ) -> Result<String, DriveError> {
        let mut inner = self.inner.lock().unwrap();
        inner.calls.uploads += 1;
        if std::mem::take(&mut inner.fail_next_upload) {
            return Err(server_error());
        }
        Ok(inner.insert(name, mime_type, Some(parent)))
    }
}

#[derive(Default)]
struct PromptState {
    confirm_answer: bool,
    text_answer: Option<String>,
    confirmations: usize,
    text_requests: usize,
}

#[derive(Clone, Default)]
pub struct ScriptedPrompt {
    state: Arc<Mutex<PromptState>>,
}

impl ScriptedPrompt {
    pub fn accepting() -> Self {
        let prompt = Self::default();
        prompt.state.lock().unwrap().confirm_answer = true;
        prompt
    }

    pub fn declining() -> Self {
        Self::default()
    }

    pub fn answer_text(self, text: Option<&str>) -> Self {
        self.state.lock().unwrap().text_answer = text.map(str::to_string);
        self
    }

    pub fn confirmations(&self) -> usize {
        self.state.lock().unwrap().confirmations
    }

    pub fn text_requests(&self) -> usize {
        self.state.lock().unwrap().text_requests
    }
}

impl Prompt for ScriptedPrompt {
    fn confirm(&self, _message: &str) -> bool {
        let mut state = self.state.lock().unwrap();
        state.confirmations += 1;
        state.confirm_answer
    }

    fn prompt_text(&self, _message: &str, _default: &str) -> Option<String> {
        let mut state = self.state.lock().unwrap();
        state.text_requests += 1;
        state.text_answer.clone()
    }
}

#[derive(Clone, Default)]
pub struct RecordingPresenter {
    lists: Arc<Mutex<Vec<FolderListView>>>,
    contents: Arc<Mutex<Vec<FolderContentsView>>>,
}

impl RecordingPresenter {
    pub fn list_renders(&self) -> usize {
        self.lists.lock().unwrap().len()
    }

    pub fn content_renders(&self) -> usize {
        self.contents.lock().unwrap().len()
    }

    pub fn last_list(&self) -> Option<FolderListView> {
        self.lists.lock().unwrap().last().cloned()
    }

    pub fn last_contents(&self) -> Option<FolderContentsView> {
        self.contents.lock().unwrap().last().cloned()
    }
}

impl Presenter for RecordingPresenter {
    fn render_folder_list(&self, view: &FolderListView) {
        self.lists.lock().unwrap().push(view.clone());
    }

    fn render_folder_contents(&self, view: &FolderContentsView) {
        self.contents.lock().unwrap().push(view.clone());
    }
}
