use drive_core::{RemoteEntry, view_url};

use crate::session::FolderHandle;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FolderSummary {
    pub folder: FolderHandle,
    pub photo_count: usize,
    pub latest_thumbnail: Option<String>,
}

impl FolderSummary {
    pub fn label(&self) -> String {
        format!("{} ({})", self.folder.name, photo_count_text(self.photo_count))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FolderListView {
    pub folders: Vec<FolderSummary>,
}

impl FolderListView {
    pub fn find(&self, folder_id: &str) -> Option<&FolderSummary> {
        self.folders.iter().find(|s| s.folder.id == folder_id)
    }

    pub fn find_by_name(&self, name: &str) -> Option<&FolderSummary> {
        self.folders.iter().find(|s| s.folder.name == name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FolderContentsView {
    pub folder: FolderHandle,
    pub photos: Vec<RemoteEntry>,
}

impl FolderContentsView {
    pub fn count_label(&self) -> String {
        format!("{} in this folder", photo_count_text(self.photos.len()))
    }

    pub fn contains(&self, entry_id: &str) -> bool {
        self.photos.iter().any(|p| p.id == entry_id)
    }

    pub fn view_urls(&self) -> impl Iterator<Item = (&str, String)> {
        self.photos.iter().map(|p| (p.name.as_str(), view_url(&p.id)))
    }
}

pub fn photo_count_text(count: usize) -> String {
    if count == 1 {
        "1 photo".to_string()
    } else {
        format!("{count} photos")
    }
}

/// Receives freshly fetched snapshots. Never called with partial data.
pub trait Presenter: Send + Sync {
    fn render_folder_list(&self, view: &FolderListView);

    fn render_folder_contents(&self, view: &FolderContentsView);
}

/// Blocking user interaction injected into the engine.
pub trait Prompt: Send + Sync {
    fn confirm(&self, message: &str) -> bool;

    fn prompt_text(&self, message: &str, default: &str) -> Option<String>;
}
