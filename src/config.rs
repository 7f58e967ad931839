use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, ensure};
use serde::Deserialize;

use crate::filter::InitialFilters;
use crate::item::{RawItem, lenient_items};

pub const DEFAULT_LIMIT: usize = 10;
pub const DEFAULT_GALLERY_ID: &str = "default";

/// Role of the person looking at the viewer. Anything unrecognized is a viewer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Role {
    Admin,
    #[default]
    #[serde(other)]
    Viewer,
}

impl Role {
    pub fn is_privileged(self) -> bool {
        self == Role::Admin
    }
}

/// What pressing the add control does.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddHandler {
    /// Let the user pick a local file and add it inline.
    FilePicker,
    /// Hand the request to the owner, which follows this link.
    Link(String),
}

/// Construction options for a viewer instance.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct ViewerOptions {
    /// Attach point; construction fails without one.
    pub mount: Option<String>,
    #[serde(deserialize_with = "lenient_items")]
    pub items: Vec<RawItem>,
    pub initial_filters: InitialFilters,
    pub start_index: isize,
    pub enable_search: bool,
    pub enable_filters: bool,
    /// Delegates adding to the owner, which follows this link.
    pub add_link: Option<String>,
    /// Whether the owner handles deletions; shows remove affordances to admins.
    pub delete_items: bool,
    pub gallery_id: String,
    pub current_user_role: Role,
    /// Maximum item count; `0` falls back to [`DEFAULT_LIMIT`].
    pub limit: usize,
}

impl Default for ViewerOptions {
    fn default() -> Self {
        Self {
            mount: None,
            items: Vec::new(),
            initial_filters: InitialFilters::default(),
            start_index: 0,
            enable_search: true,
            enable_filters: true,
            add_link: None,
            delete_items: false,
            gallery_id: DEFAULT_GALLERY_ID.to_string(),
            current_user_role: Role::Viewer,
            limit: DEFAULT_LIMIT,
        }
    }
}

impl ViewerOptions {
    pub fn with_mount(mount: impl Into<String>) -> Self {
        Self {
            mount: Some(mount.into()),
            ..Self::default()
        }
    }

    pub fn add_handler(&self) -> AddHandler {
        match &self.add_link {
            Some(link) => AddHandler::Link(link.clone()),
            None => AddHandler::FilePicker,
        }
    }

    pub fn effective_limit(&self) -> usize {
        effective_limit(self.limit)
    }
}

pub(crate) fn effective_limit(limit: usize) -> usize {
    if limit == 0 { DEFAULT_LIMIT } else { limit }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct BackendConfig {
    /// Site root; the endpoint becomes `<api-base>/api/galleries/<gallery-id>/items/`.
    pub api_base: Option<String>,
    /// Explicit items endpoint, overriding `api-base`.
    pub items_endpoint: Option<String>,
    pub csrf_token: Option<String>,
    #[serde(with = "humantime_serde")]
    pub timeout: Duration,
    /// Item to show after every successful load.
    pub select_id: Option<String>,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            api_base: None,
            items_endpoint: None,
            csrf_token: None,
            timeout: Duration::from_secs(10),
            select_id: None,
        }
    }
}

impl BackendConfig {
    pub fn endpoint(&self, gallery_id: &str) -> Option<String> {
        if let Some(endpoint) = &self.items_endpoint {
            return Some(endpoint.clone());
        }
        self.api_base.as_ref().map(|base| {
            format!(
                "{}/api/galleries/{gallery_id}/items/",
                base.trim_end_matches('/')
            )
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct PreloadConfig {
    pub enabled: bool,
    pub max_in_flight: usize,
    pub queue_depth: usize,
    /// Base directory for item sources that are plain paths.
    pub asset_root: PathBuf,
}

impl Default for PreloadConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_in_flight: 4,
            queue_depth: 16,
            asset_root: PathBuf::from("."),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct LightboxConfig {
    /// Element that opened the lightbox; focus returns here on close.
    pub trigger: Option<String>,
    pub auto_open: bool,
}

impl Default for LightboxConfig {
    fn default() -> Self {
        Self {
            trigger: None,
            auto_open: true,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct Configuration {
    pub viewer: ViewerOptions,
    pub backend: Option<BackendConfig>,
    pub preload: PreloadConfig,
    pub lightbox: LightboxConfig,
}

impl Configuration {
    pub fn from_yaml_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        Self::from_yaml_str(&text)
    }

    pub fn from_yaml_str(text: &str) -> Result<Self> {
        serde_yaml::from_str(text).context("parsing YAML configuration")
    }

    pub fn validated(self) -> Result<Self> {
        self.validate()?;
        Ok(self)
    }

    /// Checks shared by both viewers. The modal needs no mount point.
    pub fn validate(&self) -> Result<()> {
        ensure!(
            self.preload.max_in_flight > 0,
            "preload.max-in-flight must be positive"
        );
        ensure!(
            self.preload.queue_depth > 0,
            "preload.queue-depth must be positive"
        );
        if let Some(backend) = &self.backend {
            ensure!(
                backend.endpoint(&self.viewer.gallery_id).is_some(),
                "backend requires api-base or items-endpoint"
            );
            ensure!(
                !backend.timeout.is_zero(),
                "backend.timeout must be greater than zero"
            );
        }
        Ok(())
    }

    /// [`Configuration::validate`] plus the inline gallery's mount point.
    pub fn validate_gallery(&self) -> Result<()> {
        ensure!(
            self.viewer.mount.as_deref().is_some_and(|m| !m.is_empty()),
            "viewer.mount must name an attach point"
        );
        self.validate()
    }

    /// Items endpoint for the configured gallery, when a backend is configured.
    pub fn items_endpoint(&self) -> Option<String> {
        self.backend
            .as_ref()
            .and_then(|backend| backend.endpoint(&self.viewer.gallery_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_parsing_defaults_unknown_to_viewer() {
        let role: Role = serde_yaml::from_str("admin").unwrap();
        assert!(role.is_privileged());
        let role: Role = serde_yaml::from_str("editor").unwrap();
        assert_eq!(role, Role::Viewer);
    }

    #[test]
    fn zero_limit_means_default() {
        let options = ViewerOptions {
            limit: 0,
            ..ViewerOptions::default()
        };
        assert_eq!(options.effective_limit(), DEFAULT_LIMIT);
    }

    #[test]
    fn derives_endpoint_from_api_base() {
        let backend = BackendConfig {
            api_base: Some("http://localhost:8000/".into()),
            ..BackendConfig::default()
        };
        assert_eq!(
            backend.endpoint("prints").as_deref(),
            Some("http://localhost:8000/api/galleries/prints/items/")
        );
    }
}
