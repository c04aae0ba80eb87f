pub const FOLDER_MIME_TYPE: &str = "application/vnd.google-apps.folder";

const IMAGE_MIME_PREFIX: &str = "image/";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    Folder,
    Photo,
    Other,
}

impl EntryKind {
    pub fn from_mime_type(mime_type: &str) -> Self {
        if mime_type == FOLDER_MIME_TYPE {
            EntryKind::Folder
        } else if mime_type.starts_with(IMAGE_MIME_PREFIX) {
            EntryKind::Photo
        } else {
            EntryKind::Other
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderBy {
    CreatedTimeDesc,
    Name,
}

impl OrderBy {
    pub fn as_param(self) -> &'static str {
        match self {
            OrderBy::CreatedTimeDesc => "createdTime desc",
            OrderBy::Name => "name",
        }
    }
}

/// Structured list predicate. Trashed entries are always excluded.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileQuery {
    pub parent: Option<String>,
    pub folders_only: bool,
    pub name: Option<String>,
    pub mime_prefix: Option<String>,
    pub order_by: Option<OrderBy>,
    pub limit: Option<u32>,
}

impl FileQuery {
    pub fn children_of(parent: impl Into<String>) -> Self {
        Self {
            parent: Some(parent.into()),
            ..Self::default()
        }
    }

    pub fn folders() -> Self {
        Self {
            folders_only: true,
            ..Self::default()
        }
    }

    pub fn in_parent(mut self, parent: impl Into<String>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn only_images(mut self) -> Self {
        self.mime_prefix = Some(IMAGE_MIME_PREFIX.to_string());
        self
    }

    pub fn ordered_by(mut self, order_by: OrderBy) -> Self {
        self.order_by = Some(order_by);
        self
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit.max(1));
        self
    }

    pub fn to_query_string(&self) -> String {
        let mut clauses = Vec::new();
        if let Some(parent) = &self.parent {
            clauses.push(format!("'{}' in parents", escape_literal(parent)));
        }
        if self.folders_only {
            clauses.push(format!("mimeType='{FOLDER_MIME_TYPE}'"));
        }
        if let Some(name) = &self.name {
            clauses.push(format!("name='{}'", escape_literal(name)));
        }
        if let Some(prefix) = &self.mime_prefix {
            clauses.push(format!("mimeType contains '{}'", escape_literal(prefix)));
        }
        clauses.push("trashed=false".to_string());
        clauses.join(" and ")
    }

    /// Evaluates the predicate against already-fetched metadata, the way
    /// Drive would for `q`. Lets in-memory stores stand in for the API.
    pub fn matches(&self, name: &str, mime_type: &str, parent_ids: &[&str]) -> bool {
        if let Some(parent) = &self.parent {
            if !parent_ids.contains(&parent.as_str()) {
                return false;
            }
        }
        if self.folders_only && mime_type != FOLDER_MIME_TYPE {
            return false;
        }
        if let Some(expected) = &self.name {
            if name != expected {
                return false;
            }
        }
        if let Some(prefix) = &self.mime_prefix {
            if !mime_type.contains(prefix.as_str()) {
                return false;
            }
        }
        true
    }
}

fn escape_literal(value: &str) -> String {
    value.replace('\\', "\\\\").replace('\'', "\\'")
}
