//! Simulated E2 node model.

mod model;

use anyhow::Result;
use clap::Args;
use serde::{Deserialize, Serialize};
use std::fmt;

pub use model::FileNodeModel;

pub type EnbId = u64;
pub type Ecgi = u64;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeStatus {
    #[default]
    Idle,
    Running,
    Stopped,
}

impl fmt::Display for NodeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            NodeStatus::Idle => "idle",
            NodeStatus::Running => "running",
            NodeStatus::Stopped => "stopped",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    pub enb_id: EnbId,
    #[serde(default)]
    pub status: NodeStatus,
    #[serde(default)]
    pub service_models: Vec<String>,
    #[serde(default)]
    pub controllers: Vec<String>,
    #[serde(default)]
    pub cell_ecgis: Vec<Ecgi>,
}

impl Node {
    pub fn new(enb_id: EnbId) -> Self {
        Self {
            enb_id,
            ..Self::default()
        }
    }
}

/// Commands understood by a node's E2 agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgentCommand {
    Start,
    Stop,
}

impl AgentCommand {
    pub fn as_str(self) -> &'static str {
        match self {
            AgentCommand::Start => "start",
            AgentCommand::Stop => "stop",
        }
    }

    /// Status a node is left in after the command runs.
    pub fn resulting_status(self) -> NodeStatus {
        match self {
            AgentCommand::Start => NodeStatus::Running,
            AgentCommand::Stop => NodeStatus::Stopped,
        }
    }
}

/// Node operations exposed by the RAN simulator.
pub trait NodeModel {
    /// Reload state changed by other processes.
    fn refresh(&mut self) -> Result<()>;
    fn plmn_id(&self) -> Result<u32>;
    fn create_node(&mut self, node: Node) -> Result<()>;
    fn get_node(&self, enb_id: EnbId) -> Result<Node>;
    fn update_node(&mut self, node: Node) -> Result<()>;
    fn delete_node(&mut self, enb_id: EnbId) -> Result<()>;
    fn list_nodes(&self) -> Result<Vec<Node>>;
    fn agent_control(&mut self, enb_id: EnbId, command: AgentCommand) -> Result<Node>;
}

/// Node fields settable from the command line.
#[derive(Args, Debug, Clone, Default)]
pub struct NodeOptions {
    /// Cell ECGIs
    #[arg(long, value_delimiter = ',')]
    pub cells: Option<Vec<Ecgi>>,

    /// Supported service models
    #[arg(long, value_delimiter = ',')]
    pub service_models: Option<Vec<String>>,

    /// E2T controllers
    #[arg(long, value_delimiter = ',')]
    pub controllers: Option<Vec<String>>,
}

impl NodeOptions {
    /// Copy options onto `node`. When updating, fields whose flag was not
    /// given keep their current value; otherwise they are reset to empty.
    pub fn apply(&self, mut node: Node, update: bool) -> Node {
        if let Some(cells) = &self.cells {
            node.cell_ecgis = cells.clone();
        } else if !update {
            node.cell_ecgis.clear();
        }

        if let Some(models) = &self.service_models {
            node.service_models = models.clone();
        } else if !update {
            node.service_models.clear();
        }

        if let Some(controllers) = &self.controllers {
            node.controllers = controllers.clone();
        } else if !update {
            node.controllers.clear();
        }
        node
    }
}
