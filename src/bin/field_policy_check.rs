//! Field Policy Check - Evaluate a field policy file from the command line
//!
//! Usage:
//!   cargo run --bin field_policy_check --features cli -- \
//!     --config config/field_policy.yaml --viewer-id 7 --owner-id 7 --status pending \
//!     --field verification_documents --field internal_moderation_notes
//!   cargo run --bin field_policy_check --features cli -- \
//!     --viewer-id 9 --role admin --owner-id 7 --record proposal.json --format json

use anyhow::{bail, Context, Result};
use clap::Parser;
use field_policy::{
    redact, FieldAuthorizer, PolicyFingerprint, PolicyTable, Resource, Viewer, CONFIG_PATH_ENV,
    DEFAULT_CONFIG_PATH,
};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "field_policy_check")]
#[command(about = "Check which record fields a viewer may see")]
struct Cli {
    /// Policy file
    #[arg(long, env = CONFIG_PATH_ENV, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Viewer id (omit for an anonymous viewer)
    #[arg(long)]
    viewer_id: Option<String>,

    /// Viewer role (repeatable)
    #[arg(long = "role")]
    roles: Vec<String>,

    /// Record owner id
    #[arg(long)]
    owner_id: Option<String>,

    /// Record id
    #[arg(long)]
    resource_id: Option<String>,

    /// Record kind (e.g. project_proposal)
    #[arg(long)]
    kind: Option<String>,

    /// Record status
    #[arg(long)]
    status: Option<String>,

    /// Relation binding as name=viewer_id (repeatable)
    #[arg(long = "relation", value_parser = parse_relation)]
    relations: Vec<(String, String)>,

    /// Field to check (repeatable)
    #[arg(short, long = "field")]
    fields: Vec<String>,

    /// JSON object to redact
    #[arg(short, long)]
    record: Option<PathBuf>,

    /// Output format: text, json
    #[arg(long, default_value = "text")]
    format: String,
}

fn parse_relation(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((name, id)) if !name.is_empty() && !id.is_empty() => {
            Ok((name.to_string(), id.to_string()))
        }
        _ => Err(format!("expected name=id, got '{s}'")),
    }
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "field_policy=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let table = PolicyTable::from_file(&cli.config)
        .with_context(|| format!("loading {}", cli.config.display()))?;
    let fingerprint = PolicyFingerprint::compute(&table);
    tracing::info!(rules = table.len(), fingerprint = fingerprint.short(), "Policy ready");

    let authorizer = FieldAuthorizer::new(table);

    let viewer = cli
        .viewer_id
        .as_ref()
        .map(|id| Viewer::with_roles(id.clone(), cli.roles.iter().cloned()));
    if viewer.is_none() && !cli.roles.is_empty() {
        bail!("--role requires --viewer-id");
    }

    let mut resource = Resource {
        id: cli.resource_id.clone(),
        kind: cli.kind.clone(),
        owner_id: cli.owner_id.clone(),
        status: cli.status.clone(),
        ..Default::default()
    };
    for (name, id) in &cli.relations {
        resource = resource.with_relation(name.clone(), id.clone());
    }

    match (&cli.record, cli.fields.is_empty()) {
        (Some(path), true) => {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("reading {}", path.display()))?;
            let record = match serde_json::from_str(&content)? {
                serde_json::Value::Object(map) => map,
                _ => bail!("{} must contain a JSON object", path.display()),
            };
            let redacted = redact(&authorizer, viewer.as_ref(), &resource, record);
            println!("{}", serde_json::to_string_pretty(&redacted)?);
        }
        (None, false) => {
            let mut decisions = Vec::with_capacity(cli.fields.len());
            for field in &cli.fields {
                let decision = authorizer.check(viewer.as_ref(), &resource, field)?;
                decisions.push((field.as_str(), decision));
            }

            match cli.format.as_str() {
                "json" => {
                    let mut out = serde_json::Map::new();
                    for (field, d) in &decisions {
                        out.insert(field.to_string(), serde_json::to_value(d)?);
                    }
                    println!("{}", serde_json::to_string_pretty(&out)?);
                }
                _ => {
                    for (field, d) in &decisions {
                        if d.allowed {
                            println!("{field:<32} ALLOW  ({})", d.grant.description());
                        } else {
                            let reason = d.reason.map(|r| r.to_string()).unwrap_or_default();
                            println!("{field:<32} DENY   ({reason})");
                        }
                    }
                }
            }
        }
        (Some(_), false) => bail!("cannot specify both --record and --field"),
        (None, true) => bail!("must specify either --record or at least one --field"),
    }

    Ok(())
}
