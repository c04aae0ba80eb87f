/// A remote folder the engine has resolved or navigated to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FolderHandle {
    pub name: String,
    pub id: String,
}

impl FolderHandle {
    pub fn new(name: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            id: id.into(),
        }
    }
}

/// Per-login state: the root scope and the folder currently open.
///
/// Created by a successful sign-in and dropped on logout; nothing here
/// outlives the process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionContext {
    scope: FolderHandle,
    current_folder: Option<FolderHandle>,
}

impl SessionContext {
    pub fn new(scope: FolderHandle) -> Self {
        Self {
            scope,
            current_folder: None,
        }
    }

    pub fn scope(&self) -> &FolderHandle {
        &self.scope
    }

    pub fn scope_id(&self) -> &str {
        &self.scope.id
    }

    pub fn current_folder(&self) -> Option<&FolderHandle> {
        self.current_folder.as_ref()
    }

    pub fn current_folder_id(&self) -> Option<&str> {
        self.current_folder.as_ref().map(|f| f.id.as_str())
    }

    pub fn current_folder_name(&self) -> Option<&str> {
        self.current_folder.as_ref().map(|f| f.name.as_str())
    }

    pub fn enter(&mut self, folder: FolderHandle) {
        self.current_folder = Some(folder);
    }

    pub fn leave(&mut self) -> Option<FolderHandle> {
        self.current_folder.take()
    }

    pub fn rename_current(&mut self, name: &str) {
        if let Some(folder) = self.current_folder.as_mut() {
            folder.name = name.to_string();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_without_open_folder() {
        let session = SessionContext::new(FolderHandle::new("Root", "r1"));
        assert_eq!(session.scope_id(), "r1");
        assert!(session.current_folder().is_none());
    }

    #[test]
    fn navigation_updates_current_folder() {
        let mut session = SessionContext::new(FolderHandle::new("Root", "r1"));
        session.enter(FolderHandle::new("SKU-1", "f1"));
        assert_eq!(session.current_folder_id(), Some("f1"));

        session.rename_current("SKU-2");
        assert_eq!(session.current_folder_name(), Some("SKU-2"));

        let left = session.leave().unwrap();
        assert_eq!(left.id, "f1");
        assert!(session.current_folder_id().is_none());
    }
}
