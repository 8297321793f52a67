//! Per-node directory layout
//!
//! Node data and node config both live under the session's run directory,
//! one `node_bios` / `node_NN` directory per node.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::session::Session;
use sysio_harness_common::{NodeId, Result};

/// Directory name for a node, e.g. `node_bios` or `node_03`
pub fn node_extension_to_name(node: impl Into<NodeId>) -> String {
    node.into().dir_name()
}

/// Which parts of a node's data directory to delete
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RemoveNodeData {
    pub state: bool,
    pub blocks: bool,
    pub state_history: bool,
}

impl Default for RemoveNodeData {
    fn default() -> Self {
        Self {
            state: true,
            blocks: true,
            state_history: true,
        }
    }
}

fn node_dir(root: &Path, node: NodeId, relative: Option<&str>, trailing_slash: bool) -> PathBuf {
    let mut path = root.join(node.dir_name());
    if let Some(relative) = relative {
        path.push(relative);
    }
    if trailing_slash {
        path.push("");
    }
    path
}

impl Session {
    /// Root of all node data directories for this run
    pub fn data_dir(&self) -> &Path {
        self.run_dir()
    }

    /// Root of all node config directories for this run
    pub fn config_dir(&self) -> &Path {
        self.run_dir()
    }

    /// Data directory of `node`, optionally a sub-directory of it
    pub fn node_data_dir(
        &self,
        node: impl Into<NodeId>,
        relative: Option<&str>,
        trailing_slash: bool,
    ) -> PathBuf {
        node_dir(self.data_dir(), node.into(), relative, trailing_slash)
    }

    /// Config directory of `node`, optionally a sub-directory of it
    pub fn node_config_dir(
        &self,
        node: impl Into<NodeId>,
        relative: Option<&str>,
        trailing_slash: bool,
    ) -> PathBuf {
        node_dir(self.config_dir(), node.into(), relative, trailing_slash)
    }

    /// Delete chain state of `node`. A missing state-history directory is
    /// not an error; missing state or blocks directories are.
    pub fn rm_node_data_dir(&self, node: impl Into<NodeId>, remove: RemoveNodeData) -> Result<()> {
        let node = node.into();
        if remove.state {
            let dir = self.node_data_dir(node, Some("state"), false);
            debug!("removing {}", dir.display());
            fs::remove_dir_all(dir)?;
        }
        if remove.blocks {
            let dir = self.node_data_dir(node, Some("blocks"), false);
            debug!("removing {}", dir.display());
            fs::remove_dir_all(dir)?;
        }
        if remove.state_history {
            let dir = self.node_data_dir(node, Some("state-history"), false);
            match fs::remove_dir_all(&dir) {
                Ok(()) => debug!("removed {}", dir.display()),
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => debug!("ignoring failure to remove {}: {}", dir.display(), e),
            }
        }
        Ok(())
    }
}
