use crate::error::PreconditionError;
use crate::naming::NameSeparator;

const DEFAULT_ROOT_FOLDER: &str = "Amazon Product Photos";
const DEFAULT_PAGE_SIZE: u64 = 100;
const DEFAULT_CONFIRM_CREATE: bool = true;

pub const TOKEN_ENV: &str = "SKUPHOTOS_TOKEN";
pub const API_BASE_ENV: &str = "SKUPHOTOS_API_BASE";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    pub root_folder_name: String,
    pub separator: NameSeparator,
    pub confirm_create: bool,
    pub page_size: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            root_folder_name: DEFAULT_ROOT_FOLDER.to_string(),
            separator: NameSeparator::None,
            confirm_create: DEFAULT_CONFIRM_CREATE,
            page_size: DEFAULT_PAGE_SIZE as u32,
        }
    }
}

impl EngineConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let root_folder_name = lookup("SKUPHOTOS_ROOT_FOLDER")
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .unwrap_or_else(|| DEFAULT_ROOT_FOLDER.to_string());
        let separator = lookup("SKUPHOTOS_NAME_SEPARATOR")
            .and_then(|value| NameSeparator::parse(&value))
            .unwrap_or(NameSeparator::None);
        let confirm_create = read_bool(
            lookup("SKUPHOTOS_CONFIRM_CREATE"),
            DEFAULT_CONFIRM_CREATE,
        );
        let page_size = read_u64(lookup("SKUPHOTOS_PAGE_SIZE"), DEFAULT_PAGE_SIZE)
            .min(u64::from(u32::MAX)) as u32;

        Self {
            root_folder_name,
            separator,
            confirm_create,
            page_size,
        }
    }
}

pub fn bearer_token_from_env() -> Result<String, PreconditionError> {
    std::env::var(TOKEN_ENV)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .ok_or(PreconditionError::MissingCredential)
}

pub fn api_base_from_env() -> Option<String> {
    std::env::var(API_BASE_ENV)
        .ok()
        .filter(|value| !value.trim().is_empty())
}

fn read_u64(value: Option<String>, default: u64) -> u64 {
    value
        .and_then(|value| value.trim().parse::<u64>().ok())
        .filter(|value| *value > 0)
        .unwrap_or(default)
}

fn read_bool(value: Option<String>, default: bool) -> bool {
    value
        .map(|value| {
            matches!(
                value.trim().to_ascii_lowercase().as_str(),
                "1" | "true" | "yes" | "on"
            )
        })
        .unwrap_or(default)
}
