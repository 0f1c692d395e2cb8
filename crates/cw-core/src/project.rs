//! Room project files (RON on disk)

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::constants::PROJECT_VERSION;
use crate::scene::Scene;
use crate::settings::Settings;

/// On-disk layout, borrowed on the way out
#[derive(Serialize)]
struct ProjectFileRef<'a> {
    version: u32,
    name: &'a str,
    settings: &'a Settings,
    scene: &'a Scene,
}

/// On-disk layout, owned on the way in. Files written before settings
/// existed fall back to the defaults.
#[derive(Deserialize)]
struct ProjectFile {
    version: u32,
    name: String,
    #[serde(default)]
    settings: Settings,
    scene: Scene,
}

/// A room model together with the settings it was drawn with
#[derive(Debug, Clone)]
pub struct Project {
    pub version: u32,
    pub name: String,
    pub settings: Settings,
    /// Walls, products and everything attached to them
    pub scene: Scene,
}

impl Serialize for Project {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        ProjectFileRef {
            version: self.version,
            name: &self.name,
            settings: &self.settings,
            scene: &self.scene,
        }
        .serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Project {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let file = ProjectFile::deserialize(deserializer)?;
        Ok(Self {
            version: file.version,
            name: file.name,
            settings: file.settings,
            scene: file.scene,
        })
    }
}

impl Default for Project {
    fn default() -> Self {
        Self::new("New Room")
    }
}

impl Project {
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_settings(name, Settings::default())
    }

    pub fn with_settings(name: impl Into<String>, settings: Settings) -> Self {
        Self {
            version: PROJECT_VERSION,
            name: name.into(),
            settings,
            scene: Scene::new(),
        }
    }

    /// Write the project as pretty RON
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ProjectError> {
        let path = path.as_ref();
        std::fs::write(path, self.to_bytes()?).map_err(|e| ProjectError::Io(e.to_string()))?;
        info!(
            "Saved room '{}' ({} objects) to {}",
            self.name,
            self.scene.len(),
            path.display()
        );
        Ok(())
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, ProjectError> {
        ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
            .map(String::into_bytes)
            .map_err(|e| ProjectError::Serialize(e.to_string()))
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ProjectError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| ProjectError::Io(e.to_string()))?;
        let project = Self::parse(&text)?;
        info!(
            "Loaded room '{}' ({} walls) from {}",
            project.name,
            project.scene.walls().len(),
            path.display()
        );
        Ok(project)
    }

    pub fn load_from_bytes(data: &[u8]) -> Result<Self, ProjectError> {
        let text =
            std::str::from_utf8(data).map_err(|e| ProjectError::Deserialize(e.to_string()))?;
        Self::parse(text)
    }

    fn parse(text: &str) -> Result<Self, ProjectError> {
        let project: Project =
            ron::from_str(text).map_err(|e| ProjectError::Deserialize(e.to_string()))?;
        if project.version > PROJECT_VERSION {
            return Err(ProjectError::UnsupportedVersion(project.version));
        }
        Ok(project)
    }
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum ProjectError {
    #[error("IO error: {0}")]
    Io(String),
    #[error("could not encode project: {0}")]
    Serialize(String),
    #[error("could not read project: {0}")]
    Deserialize(String),
    #[error("project format {0} is newer than this build supports")]
    UnsupportedVersion(u32),
}
