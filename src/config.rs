use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Name of the per-project directory holding config and worktrees
pub const PROJECT_DIR_NAME: &str = ".czarina";

const CONFIG_FILE_NAME: &str = "config.json";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Config not found: {}", .0.display())]
    Missing(PathBuf),
    #[error("Failed to read config {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid config {}: {source}", path.display())]
    Invalid {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// A configured worker
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerSpec {
    pub id: String,
}

#[derive(Debug, Clone, Deserialize)]
struct ProjectSection {
    name: String,
    slug: String,
    repository: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
struct ConfigFile {
    project: ProjectSection,
    #[serde(default)]
    workers: Vec<WorkerSpec>,
}

/// Static description of the monitored project, loaded once at startup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectDescriptor {
    /// Human-readable project name
    pub name: String,
    /// Slug used to match tmux session names
    pub slug: String,
    /// Root of the shared repository
    pub repository_root: PathBuf,
    /// Workers in configured order
    pub workers: Vec<WorkerSpec>,
}

impl ProjectDescriptor {
    #[cfg(test)]
    pub fn new(
        name: impl Into<String>,
        slug: impl Into<String>,
        repository_root: impl Into<PathBuf>,
        worker_ids: &[&str],
    ) -> Self {
        Self {
            name: name.into(),
            slug: slug.into(),
            repository_root: repository_root.into(),
            workers: worker_ids
                .iter()
                .map(|id| WorkerSpec { id: id.to_string() })
                .collect(),
        }
    }

    /// Load `config.json` from a `.czarina` directory
    pub fn load(project_dir: &Path) -> Result<Self, ConfigError> {
        let path = project_dir.join(CONFIG_FILE_NAME);
        if !path.exists() {
            return Err(ConfigError::Missing(path));
        }

        let raw = std::fs::read_to_string(&path).map_err(|source| ConfigError::Read {
            path: path.clone(),
            source,
        })?;
        Self::from_json(&raw).map_err(|source| ConfigError::Invalid { path, source })
    }

    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        let file: ConfigFile = serde_json::from_str(raw)?;
        Ok(Self {
            name: file.project.name,
            slug: file.project.slug,
            repository_root: file.project.repository,
            workers: file.workers,
        })
    }

    /// Directory holding one git worktree per worker
    pub fn worktrees_root(&self) -> PathBuf {
        self.repository_root
            .join(PROJECT_DIR_NAME)
            .join("worktrees")
    }

    pub fn worktree_path(&self, worker_id: &str) -> PathBuf {
        self.worktrees_root().join(worker_id)
    }

    /// 1-based position of a worker in the configuration
    pub fn position_of(&self, worker_id: &str) -> Option<usize> {
        self.workers
            .iter()
            .position(|w| w.id == worker_id)
            .map(|i| i + 1)
    }

    /// Name of the daemon's tmux session
    pub fn daemon_session(&self) -> String {
        format!("{}-daemon", self.slug)
    }
}

/// Walk up from `start` looking for a `.czarina` directory
pub fn find_project_dir(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .map(|dir| dir.join(PROJECT_DIR_NAME))
        .find(|candidate| candidate.is_dir())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "project": {"name": "Demo", "slug": "demo", "repository": "/srv/demo", "extra": 1},
        "workers": [{"id": "backend", "agent": "aider"}, {"id": "frontend"}]
    }"#;

    #[test]
    fn test_parse_config() {
        let descriptor = ProjectDescriptor::from_json(SAMPLE).unwrap();
        assert_eq!(descriptor.name, "Demo");
        assert_eq!(descriptor.slug, "demo");
        assert_eq!(descriptor.repository_root, PathBuf::from("/srv/demo"));
        assert_eq!(descriptor.workers.len(), 2);
        assert_eq!(descriptor.workers[1].id, "frontend");
        assert_eq!(descriptor.position_of("frontend"), Some(2));
        assert_eq!(descriptor.position_of("nobody"), None);
        assert_eq!(descriptor.daemon_session(), "demo-daemon");
        assert_eq!(
            descriptor.worktree_path("backend"),
            PathBuf::from("/srv/demo/.czarina/worktrees/backend")
        );
    }

    #[test]
    fn test_load_missing_config_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = ProjectDescriptor::load(dir.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Missing(_)));
    }

    #[test]
    fn test_load_invalid_config_is_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("config.json"), "{ not json").unwrap();
        let err = ProjectDescriptor::load(dir.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { .. }));
    }

    #[test]
    fn test_load_and_find_project_dir() {
        let root = tempfile::tempdir().unwrap();
        let project_dir = root.path().join(PROJECT_DIR_NAME);
        std::fs::create_dir(&project_dir).unwrap();
        std::fs::write(project_dir.join("config.json"), SAMPLE).unwrap();
        let nested = root.path().join("src").join("deep");
        std::fs::create_dir_all(&nested).unwrap();

        let found = find_project_dir(&nested).unwrap();
        assert_eq!(found, project_dir);

        let descriptor = ProjectDescriptor::load(&found).unwrap();
        assert_eq!(descriptor.workers[0].id, "backend");
    }
}
