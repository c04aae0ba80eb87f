mod client;
mod query;

pub use client::{
    ApiErrorClass, DriveClient, DriveError, FileList, RemoteEntry, view_url,
};
pub use reqwest::StatusCode;
pub use query::{EntryKind, FOLDER_MIME_TYPE, FileQuery, OrderBy};
