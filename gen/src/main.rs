//! CLI front end: loads the registry, resolves and gates it, runs the
//! planner, and writes one JSON plan file per group plus a manifest.
//! The concrete C text templates are an external collaborator (spec.md
//! Non-goals) — this binary's job ends at handing a templating layer a
//! set of plain data records.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;
use tracing::info;
use tracing_subscriber::EnvFilter;

use venus_protocol_model::config::Variant;
use venus_protocol_model::{gate, Registry, VenusConfig};
use venus_protocol_planner::{assign_opcodes, build_groups, build_guard, is_serializable_type};

/// Drives the Venus wire protocol registry model and planner.
#[derive(Parser, Debug)]
#[command(name = "venus-protocol-gen", version)]
struct Args {
    /// Primary registry XML (vk.xml).
    #[arg(long)]
    registry: PathBuf,

    /// Private registry extension XMLs, applied in order after `registry`.
    #[arg(long = "private-xml")]
    private_xmls: Vec<PathBuf>,

    /// Directory the per-group plan files and manifest are written to.
    #[arg(long)]
    outdir: PathBuf,

    /// Optional banner text prepended to the manifest's `generated_by` field.
    #[arg(long)]
    banner: Option<PathBuf>,

    /// Emit the renderer-side variant; absent selects the driver side.
    #[arg(long)]
    renderer: bool,

    /// Optional TOML file overriding the default enabled-extension set.
    #[arg(long)]
    config: Option<PathBuf>,

    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Serialize)]
struct GroupPlan {
    group: String,
    command_names: Vec<String>,
    struct_names: Vec<String>,
    opcodes: Vec<(String, i64)>,
    guards: Vec<(String, String)>,
}

#[derive(Serialize)]
struct Manifest {
    wire_format_version: u32,
    variant: &'static str,
    groups: Vec<String>,
    banner: Option<String>,
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);

    let mut config = match &args.config {
        Some(path) => load_config(path)?,
        None => VenusConfig::default(),
    };
    config.variant = if args.renderer { Variant::Renderer } else { Variant::Driver };

    let registry_xml = fs::read_to_string(&args.registry)
        .with_context(|| format!("reading registry XML {:?}", args.registry))?;
    let private_xml_bodies = args
        .private_xmls
        .iter()
        .map(|p| fs::read_to_string(p).with_context(|| format!("reading private XML {p:?}")))
        .collect::<Result<Vec<_>>>()?;
    let private_xml_refs: Vec<&str> = private_xml_bodies.iter().map(String::as_str).collect();

    info!(registry = ?args.registry, private = private_xml_refs.len(), "loading registry");
    let reg = Registry::parse(&registry_xml, &private_xml_refs)
        .context("parsing and resolving the registry")?;

    let in_scope = gate::in_scope_types(&reg, &config);
    gate::filter_p_next(&reg, &in_scope);

    let in_scope_commands: Vec<_> = in_scope
        .iter()
        .filter(|ty| ty.category() == Some(venus_protocol_model::Category::Command))
        .cloned()
        .collect();

    let groups = build_groups(&in_scope_commands, &config);
    let opcode_table = assign_opcodes(&reg, &in_scope_commands).context("assigning command opcodes")?;

    fs::create_dir_all(&args.outdir).with_context(|| format!("creating {:?}", args.outdir))?;

    let variant_name = if args.renderer { "renderer" } else { "driver" };
    let mut group_names = Vec::new();

    for group in &groups {
        if group.commands.is_empty() && group.structs.is_empty() {
            continue;
        }

        let command_names: Vec<String> = group.commands.iter().map(|c| c.name()).collect();
        let struct_names: Vec<String> = group.structs.iter().filter(|t| is_serializable_type(t, &config)).map(|t| t.name()).collect();
        let opcodes: Vec<(String, i64)> = command_names
            .iter()
            .filter_map(|name| opcode_table.get(name).map(|id| (name.clone(), *id)))
            .collect();
        let guards: Vec<(String, String)> = group
            .structs
            .iter()
            .chain(group.commands.iter())
            .filter_map(|ty| build_guard(ty, &reg, &config).map(|g| (ty.name(), g)))
            .collect();

        let plan = GroupPlan {
            group: group.name.clone(),
            command_names,
            struct_names,
            opcodes,
            guards,
        };

        let path = args.outdir.join(format!("vn_protocol_{variant_name}_{}.json", group.name));
        let body = serde_json::to_string_pretty(&plan)?;
        fs::write(&path, body).with_context(|| format!("writing {path:?}"))?;
        group_names.push(group.name.clone());
    }

    let banner = args
        .banner
        .as_ref()
        .map(|p| fs::read_to_string(p).with_context(|| format!("reading banner {p:?}")))
        .transpose()?;

    let manifest = Manifest {
        wire_format_version: config.wire_format_version,
        variant: variant_name,
        groups: group_names,
        banner,
    };
    let manifest_path = args.outdir.join(format!("vn_protocol_{variant_name}.json"));
    fs::write(&manifest_path, serde_json::to_string_pretty(&manifest)?)
        .with_context(|| format!("writing {manifest_path:?}"))?;

    info!(path = ?manifest_path, "wrote manifest");
    Ok(())
}

fn load_config(path: &PathBuf) -> Result<VenusConfig> {
    let body = fs::read_to_string(path).with_context(|| format!("reading config {path:?}"))?;
    toml::from_str(&body).with_context(|| format!("parsing config {path:?} as TOML"))
}

fn init_tracing(verbosity: u8) {
    let level = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}
