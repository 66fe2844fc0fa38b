use anyhow::{Context, Result, anyhow, bail};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};

use super::{AgentCommand, EnbId, Node, NodeModel};

/// Persisted simulator state.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct SimState {
    pub plmn_id: u32,
    #[serde(default)]
    pub nodes: BTreeMap<EnbId, Node>,
}

/// Node model backed by a JSON state file. Every mutation rewrites the file.
pub struct FileNodeModel {
    path: PathBuf,
    state: SimState,
}

impl FileNodeModel {
    /// Open the state file at `path`, starting from an empty simulation with
    /// `plmn_id` if it does not exist yet.
    pub fn open(path: &Path, plmn_id: u32) -> Result<Self> {
        let state = load_state(path, plmn_id)?;
        tracing::debug!("Nodes: {} nodes loaded", state.nodes.len());
        Ok(Self {
            path: path.to_path_buf(),
            state,
        })
    }

    fn save(&self) -> Result<()> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let mut tmp = tempfile::NamedTempFile::new_in(dir)
            .with_context(|| format!("Nodes: Failed to create temp file in {:?}", dir))?;
        serde_json::to_writer_pretty(&mut tmp, &self.state)
            .context("Nodes: Failed to serialize state")?;
        tmp.write_all(b"\n")?;
        tmp.persist(&self.path)
            .with_context(|| format!("Nodes: Failed to write state file {:?}", self.path))?;
        Ok(())
    }

    fn node_mut(&mut self, enb_id: EnbId) -> Result<&mut Node> {
        self.state
            .nodes
            .get_mut(&enb_id)
            .ok_or_else(|| anyhow!("Nodes: Node {} not found", enb_id))
    }
}

fn load_state(path: &Path, plmn_id: u32) -> Result<SimState> {
    if !path.exists() {
        tracing::info!("Nodes: No state at {:?}, starting empty", path);
        return Ok(SimState {
            plmn_id,
            nodes: BTreeMap::new(),
        });
    }
    let file = std::fs::File::open(path)
        .with_context(|| format!("Nodes: Failed to open state file {:?}", path))?;
    serde_json::from_reader(std::io::BufReader::new(file))
        .with_context(|| format!("Nodes: Failed to parse state file {:?}", path))
}

impl NodeModel for FileNodeModel {
    fn refresh(&mut self) -> Result<()> {
        self.state = load_state(&self.path, self.state.plmn_id)?;
        Ok(())
    }

    fn plmn_id(&self) -> Result<u32> {
        Ok(self.state.plmn_id)
    }

    fn create_node(&mut self, node: Node) -> Result<()> {
        if self.state.nodes.contains_key(&node.enb_id) {
            bail!("Nodes: Node {} already exists", node.enb_id);
        }
        tracing::info!("Nodes: Creating node {}", node.enb_id);
        self.state.nodes.insert(node.enb_id, node);
        self.save()
    }

    fn get_node(&self, enb_id: EnbId) -> Result<Node> {
        self.state
            .nodes
            .get(&enb_id)
            .cloned()
            .ok_or_else(|| anyhow!("Nodes: Node {} not found", enb_id))
    }

    fn update_node(&mut self, node: Node) -> Result<()> {
        let enb_id = node.enb_id;
        *self.node_mut(enb_id)? = node;
        tracing::info!("Nodes: Updated node {}", enb_id);
        self.save()
    }

    fn delete_node(&mut self, enb_id: EnbId) -> Result<()> {
        if self.state.nodes.remove(&enb_id).is_none() {
            bail!("Nodes: Node {} not found", enb_id);
        }
        tracing::info!("Nodes: Deleted node {}", enb_id);
        self.save()
    }

    fn list_nodes(&self) -> Result<Vec<Node>> {
        Ok(self.state.nodes.values().cloned().collect())
    }

    fn agent_control(&mut self, enb_id: EnbId, command: AgentCommand) -> Result<Node> {
        let node = self.node_mut(enb_id)?;
        node.status = command.resulting_status();
        let node = node.clone();
        tracing::info!("Nodes: Agent {} on node {}", command.as_str(), enb_id);
        self.save()?;
        Ok(node)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ransim::NodeStatus;

    fn open_temp() -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        (dir, path)
    }

    #[test]
    fn test_fresh_state_uses_default_plmn() {
        let (_dir, path) = open_temp();
        let model = FileNodeModel::open(&path, 314628).unwrap();
        assert_eq!(model.plmn_id().unwrap(), 314628);
        assert!(model.list_nodes().unwrap().is_empty());
        assert!(!path.exists());
    }

    #[test]
    fn test_create_persists() {
        let (_dir, path) = open_temp();
        let mut model = FileNodeModel::open(&path, 1).unwrap();
        let mut node = Node::new(5153);
        node.service_models = vec!["kpm".into()];
        model.create_node(node.clone()).unwrap();

        let reopened = FileNodeModel::open(&path, 99).unwrap();
        assert_eq!(reopened.plmn_id().unwrap(), 1);
        assert_eq!(reopened.get_node(5153).unwrap(), node);
    }

    #[test]
    fn test_create_duplicate_fails() {
        let (_dir, path) = open_temp();
        let mut model = FileNodeModel::open(&path, 1).unwrap();
        model.create_node(Node::new(1)).unwrap();
        assert!(model.create_node(Node::new(1)).is_err());
    }

    #[test]
    fn test_missing_node_errors() {
        let (_dir, path) = open_temp();
        let mut model = FileNodeModel::open(&path, 1).unwrap();
        assert!(model.get_node(7).is_err());
        assert!(model.update_node(Node::new(7)).is_err());
        assert!(model.delete_node(7).is_err());
        assert!(model.agent_control(7, AgentCommand::Start).is_err());
    }

    #[test]
    fn test_refresh_sees_other_writers() {
        let (_dir, path) = open_temp();
        let mut reader = FileNodeModel::open(&path, 1).unwrap();
        let mut writer = FileNodeModel::open(&path, 1).unwrap();
        writer.create_node(Node::new(42)).unwrap();

        assert!(reader.list_nodes().unwrap().is_empty());
        reader.refresh().unwrap();
        assert_eq!(reader.get_node(42).unwrap(), Node::new(42));
    }

    #[test]
    fn test_agent_control_and_delete() {
        let (_dir, path) = open_temp();
        let mut model = FileNodeModel::open(&path, 1).unwrap();
        model.create_node(Node::new(2)).unwrap();
        model.create_node(Node::new(1)).unwrap();

        let node = model.agent_control(2, AgentCommand::Start).unwrap();
        assert_eq!(node.status, NodeStatus::Running);
        let node = model.agent_control(2, AgentCommand::Stop).unwrap();
        assert_eq!(node.status, NodeStatus::Stopped);

        let ids: Vec<_> = model.list_nodes().unwrap().iter().map(|n| n.enb_id).collect();
        assert_eq!(ids, vec![1, 2]);

        model.delete_node(1).unwrap();
        let reopened = FileNodeModel::open(&path, 1).unwrap();
        assert_eq!(reopened.list_nodes().unwrap().len(), 1);
        assert_eq!(reopened.get_node(2).unwrap().status, NodeStatus::Stopped);
    }
}
