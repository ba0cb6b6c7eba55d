//! Data models and structures
//!
//! Defines the persisted link-hub document, the render-time lookups the
//! landing page applies to it, and the environment-derived configuration.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const DEFAULT_LOGO: &str = "/uploads/logo.png";
pub const DEFAULT_BUTTON_COLOR: &str = "#dbb958";
pub const DEFAULT_SOCIAL_COLOR: &str = "#333";

/// The single configuration document behind the landing page.
///
/// Field order here is the key order of the persisted JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigDocument {
    pub logo: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub affiliate_button: Option<AffiliateButton>,
    pub main_buttons: Vec<MainButton>,
    pub socials: Vec<Social>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AffiliateButton {
    pub label: String,
    pub url: String,
    pub enabled: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MainButton {
    pub id: String,
    pub label: String,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Social {
    pub id: String,
    pub url: String,
    pub active: bool,
}

impl ConfigDocument {
    /// Parse persisted bytes, rejecting anything that is not a JSON object
    /// with the required fields.
    pub fn from_json(bytes: &[u8]) -> Result<Self> {
        let value: serde_json::Value = serde_json::from_slice(bytes)
            .map_err(|e| Error::MalformedDocument(format!("invalid JSON: {}", e)))?;

        if !value.is_object() {
            return Err(Error::MalformedDocument(
                "document root is not a JSON object".to_string(),
            ));
        }

        serde_json::from_value(value)
            .map_err(|e| Error::MalformedDocument(format!("schema mismatch: {}", e)))
    }

    /// Indented JSON with a trailing newline, so commits diff cleanly.
    pub fn to_pretty_json(&self) -> Result<Vec<u8>> {
        let mut json = serde_json::to_vec_pretty(self)
            .map_err(|e| Error::Generic(format!("Failed to serialize document: {}", e)))?;
        json.push(b'\n');
        Ok(json)
    }
}

impl Default for ConfigDocument {
    fn default() -> Self {
        let button = |id: &str, label: &str| MainButton {
            id: id.to_string(),
            label: label.to_string(),
            url: "#".to_string(),
            color: Some(DEFAULT_BUTTON_COLOR.to_string()),
        };
        let social = |id: &str| Social {
            id: id.to_string(),
            url: "#".to_string(),
            active: true,
        };

        Self {
            logo: DEFAULT_LOGO.to_string(),
            affiliate_button: None,
            main_buttons: vec![
                button("telegram", "Telegram"),
                button("line", "LINE"),
                button("messenger", "Messenger"),
                button("viber", "Viber"),
            ],
            socials: vec![
                social("facebook"),
                social("youtube"),
                social("tiktok"),
                social("telegram"),
            ],
        }
    }
}

impl AffiliateButton {
    /// What the editor inserts when the promo button is first switched on.
    pub fn placeholder() -> Self {
        Self {
            label: "Promo Button".to_string(),
            url: "#".to_string(),
            enabled: true,
        }
    }
}

/// Social networks the landing page has an icon for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SocialKind {
    Facebook,
    Youtube,
    Tiktok,
    Telegram,
    Other,
}

impl SocialKind {
    pub fn from_id(id: &str) -> Self {
        match id {
            "facebook" => SocialKind::Facebook,
            "youtube" => SocialKind::Youtube,
            "tiktok" => SocialKind::Tiktok,
            "telegram" => SocialKind::Telegram,
            _ => SocialKind::Other,
        }
    }

    pub fn color(self) -> &'static str {
        match self {
            SocialKind::Facebook => "#1877F2",
            SocialKind::Youtube => "#FF0000",
            SocialKind::Tiktok => "#000000",
            SocialKind::Telegram => "#2AABEE",
            SocialKind::Other => DEFAULT_SOCIAL_COLOR,
        }
    }
}

impl Social {
    pub fn kind(&self) -> SocialKind {
        SocialKind::from_id(&self.id)
    }
}

/// Messenger icon shown next to a main button label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonIcon {
    Telegram,
    Line,
    Messenger,
    Viber,
}

impl MainButton {
    /// First icon whose name appears in the id or label, case-insensitively.
    pub fn icon(&self) -> Option<ButtonIcon> {
        let id = self.id.to_lowercase();
        let label = self.label.to_lowercase();
        let mentions = |needle: &str| id.contains(needle) || label.contains(needle);

        if mentions("telegram") {
            Some(ButtonIcon::Telegram)
        } else if mentions("line") {
            Some(ButtonIcon::Line)
        } else if mentions("messenger") {
            Some(ButtonIcon::Messenger)
        } else if mentions("viber") {
            Some(ButtonIcon::Viber)
        } else {
            None
        }
    }

    pub fn display_color(&self) -> &str {
        self.color.as_deref().unwrap_or(DEFAULT_BUTTON_COLOR)
    }
}

// Configuration
pub const DEFAULT_REPO_OWNER: &str = "bigwin959";
pub const DEFAULT_REPO_NAME: &str = "lugyiminn_landing";
pub const DEFAULT_BRANCH: &str = "main";
pub const DEFAULT_DOCUMENT_PATH: &str = "src/data.json";
pub const DEFAULT_UPLOAD_PREFIX: &str = "public/uploads";
pub const DEFAULT_API_URL: &str = "https://api.github.com";
pub const DEFAULT_RAW_URL: &str = "https://raw.githubusercontent.com";
pub const DEFAULT_PUBLIC_UPLOAD_PREFIX: &str = "/uploads";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    Local,
    Remote,
}

/// Coordinates of the hosted repository holding the document and assets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoSettings {
    pub owner: String,
    pub name: String,
    pub branch: String,
    pub document_path: String,
    pub upload_prefix: String,
    pub api_url: String,
    pub raw_url: String,
}

impl Default for RepoSettings {
    fn default() -> Self {
        Self {
            owner: DEFAULT_REPO_OWNER.to_string(),
            name: DEFAULT_REPO_NAME.to_string(),
            branch: DEFAULT_BRANCH.to_string(),
            document_path: DEFAULT_DOCUMENT_PATH.to_string(),
            upload_prefix: DEFAULT_UPLOAD_PREFIX.to_string(),
            api_url: DEFAULT_API_URL.to_string(),
            raw_url: DEFAULT_RAW_URL.to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub github_token: Option<String>,
    pub backend: StorageBackend,
    pub data_file: PathBuf,
    pub upload_dir: PathBuf,
    pub repo: RepoSettings,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from any key/value source; empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let github_token = get("GITHUB_TOKEN");

        let backend = match get("STORAGE_BACKEND").as_deref() {
            Some("local") => StorageBackend::Local,
            Some("remote") => StorageBackend::Remote,
            Some(other) => {
                return Err(Error::Configuration(format!(
                    "STORAGE_BACKEND must be 'local' or 'remote', got '{}'",
                    other
                )))
            }
            None if github_token.is_some() => StorageBackend::Remote,
            None => StorageBackend::Local,
        };

        let defaults = RepoSettings::default();
        let repo = RepoSettings {
            api_url: get("GITHUB_API_URL").unwrap_or(defaults.api_url),
            raw_url: get("GITHUB_RAW_URL").unwrap_or(defaults.raw_url),
            ..defaults
        };

        Ok(Self {
            github_token,
            backend,
            data_file: get("DATA_FILE")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_DOCUMENT_PATH)),
            upload_dir: get("UPLOAD_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_UPLOAD_PREFIX)),
            repo,
        })
    }
}
