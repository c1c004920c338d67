//! Configuration management for the CLI

use anyhow::{Context, Result};
use kfin_lib::{ClusterContext, Settings};
use kube::config::{KubeConfigOptions, Kubeconfig};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

const CONFIG_FILE_NAME: &str = "config.yaml";

/// Pick the configuration file to load
///
/// An explicit path always wins; otherwise `./config.yaml` and then
/// `~/.config/kfin/config.yaml` are used when they exist.
pub fn config_path(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }

    let local = PathBuf::from(CONFIG_FILE_NAME);
    if local.is_file() {
        return Some(local);
    }

    dirs_next::home_dir()
        .map(|home| home.join(".config").join("kfin").join(CONFIG_FILE_NAME))
        .filter(|path| path.is_file())
}

/// Load settings, falling back to defaults for anything missing or invalid
pub fn load_settings(explicit: Option<&Path>) -> Settings {
    let path = config_path(explicit);
    match &path {
        Some(path) if !path.is_file() => {
            warn!(path = %path.display(), "Config file not found, using defaults");
        }
        Some(path) => debug!(path = %path.display(), "Loading config"),
        None => debug!("No config file found, using defaults"),
    }
    Settings::load(path.as_deref())
}

/// Which cluster to talk to
#[derive(Debug, Clone, Default)]
pub struct KubeTarget {
    pub kubeconfig: Option<String>,
    pub context: Option<String>,
}

impl KubeTarget {
    pub fn new(kubeconfig: Option<String>, context: Option<String>) -> Self {
        Self {
            kubeconfig: kubeconfig.filter(|p| !p.trim().is_empty()),
            context: context.filter(|c| !c.trim().is_empty()),
        }
    }

    /// Read the kubeconfig file
    ///
    /// A `KUBECONFIG`-style list of several files is left to kube's own
    /// loader, which merges them.
    pub fn read_kubeconfig(&self) -> Result<Kubeconfig> {
        match self.kubeconfig.as_deref() {
            Some(path) if !is_path_list(path) => Kubeconfig::read_from(path)
                .with_context(|| format!("Failed to read kubeconfig {}", path)),
            _ => Kubeconfig::read().context("Failed to read kubeconfig"),
        }
    }

    pub fn options(&self) -> KubeConfigOptions {
        KubeConfigOptions {
            context: self.context.clone(),
            cluster: None,
            user: None,
        }
    }

    /// Context and cluster names for display; "unknown" when unavailable
    pub fn cluster_context(&self) -> ClusterContext {
        match self.read_kubeconfig() {
            Ok(kubeconfig) => context_details(&kubeconfig, self.context.as_deref()),
            Err(e) => {
                debug!(error = %format!("{:#}", e), "Kubeconfig unavailable for context details");
                ClusterContext::default()
            }
        }
    }
}

fn is_path_list(path: &str) -> bool {
    let separator = if cfg!(windows) { ';' } else { ':' };
    // Windows drive letters contain ':' but never ';'
    path.contains(separator)
}

/// Resolve the context in use and the cluster it points at
pub fn context_details(kubeconfig: &Kubeconfig, context_override: Option<&str>) -> ClusterContext {
    let context_name = context_override
        .map(str::to_string)
        .or_else(|| kubeconfig.current_context.clone())
        .filter(|name| !name.is_empty());

    let Some(context_name) = context_name else {
        return ClusterContext::default();
    };

    let cluster_name = kubeconfig
        .contexts
        .iter()
        .find(|named| named.name == context_name)
        .and_then(|named| named.context.as_ref())
        .map(|ctx| ctx.cluster.clone())
        .filter(|cluster| !cluster.is_empty())
        .unwrap_or_else(|| "unknown".to_string());

    ClusterContext {
        context_name,
        cluster_name,
    }
}
