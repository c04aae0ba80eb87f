use async_trait::async_trait;
use drive_core::{DriveClient, DriveError, FileQuery, RemoteEntry};

/// Operations the engine needs from the remote hierarchical store.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    async fn list(&self, query: &FileQuery) -> Result<Vec<RemoteEntry>, DriveError>;

    async fn create_folder(&self, name: &str, parent: Option<&str>) -> Result<String, DriveError>;

    async fn delete(&self, id: &str) -> Result<(), DriveError>;

    async fn rename(&self, id: &str, name: &str) -> Result<(), DriveError>;

    async fn upload(
        &self,
        parent: &str,
        name: &str,
        mime_type: &str,
        bytes: Vec<u8>,
    ) -> Result<String, DriveError>;
}

#[async_trait]
impl RemoteStore for DriveClient {
    async fn list(&self, query: &FileQuery) -> Result<Vec<RemoteEntry>, DriveError> {
        self.list_all(query).await
    }

    async fn create_folder(&self, name: &str, parent: Option<&str>) -> Result<String, DriveError> {
        DriveClient::create_folder(self, name, parent).await
    }

    async fn delete(&self, id: &str) -> Result<(), DriveError> {
        self.delete_file(id).await
    }

    async fn rename(&self, id: &str, name: &str) -> Result<(), DriveError> {
        self.rename_file(id, name).await
    }

    async fn upload(
        &self,
        parent: &str,
        name: &str,
        mime_type: &str,
        bytes: Vec<u8>,
    ) -> Result<String, DriveError> {
        self.upload_file(parent, name, mime_type, bytes).await
    }
}
