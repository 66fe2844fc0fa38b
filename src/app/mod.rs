use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::io::Write;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use crate::config::{ConfigOverrides, RuntimeConfig};
use crate::filters::{CompileOptions, Filters, compile_filters};
use crate::ransim::{AgentCommand, EnbId, FileNodeModel, Node, NodeModel, NodeOptions};
use crate::topo::{self, ObjectType, TopoStore};
use crate::utils::{cat_ecgis, cat_strings};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Configuration file (YAML); defaults to ./ranctl.yaml if present
    #[arg(long, global = true, env = "RANCTL_CONFIG")]
    pub config: Option<PathBuf>,

    /// Simulator state file
    #[arg(long, global = true)]
    pub state: Option<PathBuf>,

    /// Topology file (YAML or JSON)
    #[arg(long, global = true)]
    pub topo: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    pub fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            state_file: self.state.clone(),
            topo_file: self.topo.clone(),
            strict_filters: false,
        }
    }
}

#[derive(Subcommand)]
pub enum Command {
    /// Get the PLMNID, E2 nodes or a single node
    Get {
        #[command(subcommand)]
        resource: GetResource,
    },
    /// Create an E2 node
    Create {
        #[command(subcommand)]
        resource: NodeResource,
    },
    /// Update an E2 node
    Update {
        #[command(subcommand)]
        resource: NodeResource,
    },
    /// Delete an E2 node
    Delete {
        #[command(subcommand)]
        resource: NodeIdResource,
    },
    /// Start E2 node agent
    Start { enb_id: EnbId },
    /// Stop E2 node agent
    Stop { enb_id: EnbId },
    /// Query the topology store
    Topo {
        #[command(subcommand)]
        command: TopoCommand,
    },
}

#[derive(Subcommand)]
pub enum GetResource {
    /// Get the PLMNID
    Plmnid,
    /// Get all E2 nodes
    Nodes {
        /// Disables output headers
        #[arg(long)]
        no_headers: bool,

        /// Watch node changes
        #[arg(short, long)]
        watch: bool,

        /// Poll interval for --watch, in milliseconds
        #[arg(long, default_value_t = 1000)]
        interval_ms: u64,
    },
    /// Get an E2 node
    Node { enb_id: EnbId },
}

#[derive(Subcommand)]
pub enum NodeResource {
    Node {
        enb_id: EnbId,
        #[command(flatten)]
        options: NodeOptions,
    },
}

#[derive(Subcommand)]
pub enum NodeIdResource {
    Node { enb_id: EnbId },
}

#[derive(Subcommand)]
pub enum TopoCommand {
    /// List topology objects matching the filters
    Get {
        #[arg(value_enum)]
        target: TopoTarget,

        #[command(flatten)]
        query: QueryArgs,

        /// Disables output headers
        #[arg(long)]
        no_headers: bool,
    },
    /// Print the compiled filters for a query
    Filters {
        #[command(flatten)]
        query: QueryArgs,

        /// Object type the query targets (default: any)
        #[arg(long = "type", value_enum)]
        object_type: Option<ObjectType>,

        #[arg(long, value_enum, default_value = "json")]
        format: DumpFormat,
    },
}

#[derive(Args, Debug, Clone, Default)]
pub struct QueryArgs {
    /// Label query, e.g. "role=leaf, zone!=west, rack in (3,4,5)"
    #[arg(long, default_value = "")]
    pub label: String,

    /// Kind query (only used for kinds and relations)
    #[arg(long, default_value = "")]
    pub kind: String,

    /// Fail on unrecognized filter clauses
    #[arg(long)]
    pub strict: bool,
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum, Debug)]
pub enum TopoTarget {
    Entities,
    Relations,
    Kinds,
    Objects,
}

impl TopoTarget {
    pub fn object_type(self) -> ObjectType {
        match self {
            TopoTarget::Entities => ObjectType::Entity,
            TopoTarget::Relations => ObjectType::Relation,
            TopoTarget::Kinds => ObjectType::Kind,
            TopoTarget::Objects => ObjectType::Unspecified,
        }
    }
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum, Debug)]
pub enum DumpFormat {
    Json,
    Yaml,
}

pub fn run(command: Command, config: &RuntimeConfig, out: &mut impl Write) -> Result<()> {
    match command {
        Command::Topo { command } => run_topo(command, config, out),
        command => {
            let mut model = FileNodeModel::open(&config.state_file, config.plmn_id)?;
            run_node_command(command, &mut model, out)
        }
    }
}

pub fn run_node_command(
    command: Command,
    model: &mut impl NodeModel,
    out: &mut impl Write,
) -> Result<()> {
    match command {
        Command::Get { resource } => match resource {
            GetResource::Plmnid => {
                writeln!(out, "{}", model.plmn_id()?)?;
            }
            GetResource::Nodes {
                no_headers,
                watch,
                interval_ms,
            } => {
                if !no_headers {
                    writeln!(
                        out,
                        "{:<16} {:<8} {:<16} {:<20} {}",
                        "EnbID", "Status", "Service Models", "E2T Controllers", "Cell ECGIs"
                    )?;
                }
                if watch {
                    let interval = Duration::from_millis(interval_ms);
                    watch_nodes(model, interval, None, out)?;
                } else {
                    for node in model.list_nodes()? {
                        output_node_row(out, &node)?;
                    }
                }
            }
            GetResource::Node { enb_id } => {
                let node = model.get_node(enb_id)?;
                output_node(out, &node)?;
            }
        },
        Command::Create {
            resource: NodeResource::Node { enb_id, options },
        } => {
            let node = options.apply(Node::new(enb_id), false);
            model.create_node(node)?;
            writeln!(out, "Node {} created", enb_id)?;
        }
        Command::Update {
            resource: NodeResource::Node { enb_id, options },
        } => {
            // Prime with the current node so only the given flags change
            let current = model.get_node(enb_id)?;
            model.update_node(options.apply(current, true))?;
            writeln!(out, "Node {} updated", enb_id)?;
        }
        Command::Delete {
            resource: NodeIdResource::Node { enb_id },
        } => {
            model.delete_node(enb_id)?;
            writeln!(out, "Node {} deleted", enb_id)?;
        }
        Command::Start { enb_id } => run_control(model, enb_id, AgentCommand::Start, out)?,
        Command::Stop { enb_id } => run_control(model, enb_id, AgentCommand::Stop, out)?,
        Command::Topo { .. } => anyhow::bail!("CLI: Topology commands do not use the node model"),
    }
    Ok(())
}

fn output_node_row(out: &mut impl Write, node: &Node) -> Result<()> {
    writeln!(
        out,
        "{:<16} {:<8} {:<16} {:<20} {}",
        node.enb_id,
        node.status,
        cat_strings(&node.service_models),
        cat_strings(&node.controllers),
        cat_ecgis(&node.cell_ecgis)
    )?;
    Ok(())
}

/// Nodes in `current` that are new or differ from `seen`.
pub fn changed_nodes<'a>(seen: &BTreeMap<EnbId, Node>, current: &'a [Node]) -> Vec<&'a Node> {
    current
        .iter()
        .filter(|node| seen.get(&node.enb_id) != Some(*node))
        .collect()
}

/// Print every node, then each node again whenever it changes. Polls the
/// model every `interval`; runs until an error, or for `max_polls` polls.
pub fn watch_nodes(
    model: &mut impl NodeModel,
    interval: Duration,
    max_polls: Option<usize>,
    out: &mut impl Write,
) -> Result<()> {
    let mut seen = BTreeMap::new();
    let mut polls = 0;
    loop {
        model.refresh()?;
        let current = model.list_nodes()?;
        for node in changed_nodes(&seen, &current) {
            output_node_row(out, node)?;
        }
        out.flush()?;

        seen = current.into_iter().map(|n| (n.enb_id, n)).collect();

        polls += 1;
        if max_polls.is_some_and(|max| polls >= max) {
            return Ok(());
        }
        std::thread::sleep(interval);
    }
}

fn run_control(
    model: &mut impl NodeModel,
    enb_id: EnbId,
    command: AgentCommand,
    out: &mut impl Write,
) -> Result<()> {
    let node = model.agent_control(enb_id, command)?;
    output_node(out, &node)
}

fn output_node(out: &mut impl Write, node: &Node) -> Result<()> {
    writeln!(
        out,
        "EnbID: {:<16}\nStatus: {}\nService Models: {}\nControllers: {}\nCell ECGIs: {}",
        node.enb_id,
        node.status,
        cat_strings(&node.service_models),
        cat_strings(&node.controllers),
        cat_ecgis(&node.cell_ecgis)
    )?;
    Ok(())
}

pub fn compile_query(
    object_type: ObjectType,
    query: &QueryArgs,
    config: &RuntimeConfig,
) -> Result<Filters> {
    let options = CompileOptions {
        strict: query.strict || config.strict_filters,
    };
    compile_filters(object_type, &query.label, &query.kind, options)
        .context("CLI: Invalid filter query")
}

pub fn run_topo(command: TopoCommand, config: &RuntimeConfig, out: &mut impl Write) -> Result<()> {
    match command {
        TopoCommand::Get {
            target,
            query,
            no_headers,
        } => {
            let object_type = target.object_type();
            let filters = compile_query(object_type, &query, config)?;
            let store = TopoStore::load(&config.topo_file)?;
            write_objects(&store, object_type, &filters, no_headers, out)
        }
        TopoCommand::Filters {
            query,
            object_type,
            format,
        } => {
            let filters = compile_query(object_type.unwrap_or_default(), &query, config)?;
            match format {
                DumpFormat::Json => {
                    serde_json::to_writer_pretty(&mut *out, &filters)
                        .context("CLI: Failed to serialize filters")?;
                    writeln!(out)?;
                }
                DumpFormat::Yaml => {
                    serde_yaml::to_writer(&mut *out, &filters)
                        .context("CLI: Failed to serialize filters")?;
                }
            }
            Ok(())
        }
    }
}

pub fn write_objects(
    store: &TopoStore,
    object_type: ObjectType,
    filters: &Filters,
    no_headers: bool,
    out: &mut impl Write,
) -> Result<()> {
    if !no_headers {
        writeln!(out, "{}", topo::header(object_type))?;
    }
    let objects = store.query(object_type, filters);
    tracing::info!("Topo: {} {} objects matched", objects.len(), object_type);
    for obj in objects {
        writeln!(out, "{}", topo::format_row(object_type, obj))?;
    }
    Ok(())
}
