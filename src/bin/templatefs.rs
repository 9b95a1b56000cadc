//!
//! templatefs CLI binary
//! ---------------------
//! Operator tool over a snapshot-backed entry store. Every command targets one scope
//! (template id + version id) and prints JSON in the wire format.

use std::env;
use std::fs;
use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use serde_json::json;

use templatefs::storage::SnapshotEntryStore;
use templatefs::tree::{self, wire, EffectiveConfig, EntryKind, GlobalTreeConfig, Scope};
use templatefs::TreeError;

fn print_usage(program: &str) {
    eprintln!(
        "Usage:\n  {program} --root <dir> --template <id> --version <id> [--config <file.json>] <command> [args]\n\nCommands:\n  ls [path]                   print the tree, or the subtree at path\n  get <path>                  print one entry (content base64)\n  mkdir <path>                create a directory entry\n  put <path> <host-file>      create a file entry from a host file\n  mv <old> <new>              rename/move an entry (directories cascade by default)\n  edit <path> <host-file>     replace a file's content\n  rm <path> --yes             delete an entry and everything below it\n  import <dir>                load a host directory into an empty scope\n  materialize <dir>           write the scope onto a host directory\n\nEnvironment:\n  TEMPLATEFS_DELETE_POLICY, TEMPLATEFS_RENAME_POLICY (cascade|reject_non_empty)\n  TEMPLATEFS_MATERIALIZE_PARENTS, TEMPLATEFS_MAX_PATH_LEN, TEMPLATEFS_MAX_CONTENT_BYTES\n  RUST_LOG                    tracing filter, e.g. templatefs=debug"
    );
}

struct Invocation {
    root: PathBuf,
    scope: Scope,
    config: Option<PathBuf>,
    command: Vec<String>,
    yes: bool,
}

fn parse_id(flag: &str, v: Option<&String>) -> Result<u64> {
    let v = v.ok_or_else(|| anyhow!("{} requires a value", flag))?;
    v.parse::<u64>().with_context(|| format!("{} expects an unsigned integer, got '{}'", flag, v))
}

fn parse_args(args: &[String]) -> Result<Invocation> {
    let mut root: Option<PathBuf> = None;
    let mut template: Option<u64> = None;
    let mut version: Option<u64> = None;
    let mut config: Option<PathBuf> = None;
    let mut yes = false;
    let mut command: Vec<String> = Vec::new();
    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--root" => { root = Some(PathBuf::from(args.get(i + 1).ok_or_else(|| anyhow!("--root requires a value"))?)); i += 2; }
            "--template" => { template = Some(parse_id("--template", args.get(i + 1))?); i += 2; }
            "--version" => { version = Some(parse_id("--version", args.get(i + 1))?); i += 2; }
            "--config" => { config = Some(PathBuf::from(args.get(i + 1).ok_or_else(|| anyhow!("--config requires a value"))?)); i += 2; }
            "--yes" | "-y" => { yes = true; i += 1; }
            other => { command.push(other.to_string()); i += 1; }
        }
    }
    Ok(Invocation {
        root: root.ok_or_else(|| anyhow!("--root is required"))?,
        scope: Scope::new(template.ok_or_else(|| anyhow!("--template is required"))?, version.ok_or_else(|| anyhow!("--version is required"))?),
        config,
        command,
        yes,
    })
}

fn arg<'a>(cmd: &'a [String], idx: usize, what: &str) -> Result<&'a str> {
    cmd.get(idx).map(|s| s.as_str()).ok_or_else(|| anyhow!("{} requires <{}>", cmd[0], what))
}

fn run(inv: Invocation) -> Result<serde_json::Value> {
    let global = match &inv.config {
        Some(p) => GlobalTreeConfig::load_or_default(p)?,
        None => GlobalTreeConfig::from_env()?,
    };
    let cfg = EffectiveConfig::from_layers(&global, None);
    let store = SnapshotEntryStore::new(&inv.root).map_err(TreeError::from)?;
    let scope = inv.scope;
    let cmd = &inv.command;
    let name = cmd.first().map(|s| s.as_str()).ok_or_else(|| anyhow!("missing command"))?;

    let out = match name {
        "ls" => {
            let forest = tree::list_tree(&store, &scope)?;
            match cmd.get(1) {
                None => serde_json::to_value(wire::forest_view(&forest))?,
                Some(p) => {
                    let p = tree::validate_path(p)?;
                    let node = forest.iter().find_map(|n| n.find(&p)).ok_or_else(|| TreeError::not_found(p.clone()))?;
                    serde_json::to_value(wire::TreeNodeView::from(node))?
                }
            }
        }
        "get" => serde_json::to_value(wire::EntryView::from(&tree::get_entry(&store, &scope, arg(cmd, 1, "path")?)?))?,
        "mkdir" => {
            let e = tree::create_entry(&store, &scope, arg(cmd, 1, "path")?, EntryKind::Dir, Vec::new(), &cfg)?;
            serde_json::to_value(wire::EntryView::from(&e))?
        }
        "put" => {
            let host = arg(cmd, 2, "host-file")?;
            let bytes = fs::read(host).with_context(|| format!("reading {}", host))?;
            let e = tree::create_entry(&store, &scope, arg(cmd, 1, "path")?, EntryKind::File, bytes, &cfg)?;
            serde_json::to_value(wire::EntryView::from(&e))?
        }
        "mv" => {
            let e = tree::rename_entry(&store, &scope, arg(cmd, 1, "old")?, arg(cmd, 2, "new")?, None, &cfg)?;
            serde_json::to_value(wire::EntryView::from(&e))?
        }
        "edit" => {
            let host = arg(cmd, 2, "host-file")?;
            let bytes = fs::read(host).with_context(|| format!("reading {}", host))?;
            let e = tree::update_entry_content(&store, &scope, arg(cmd, 1, "path")?, bytes, None, &cfg)?;
            serde_json::to_value(wire::EntryView::from(&e))?
        }
        "rm" => {
            let path = arg(cmd, 1, "path")?;
            if !inv.yes {
                return Err(anyhow!("refusing to delete '{}' without --yes (deletion is permanent)", path));
            }
            json!({ "removed": tree::delete_entry(&store, &scope, path, &cfg)? })
        }
        "import" => serde_json::to_value(tree::import_dir(&store, &scope, &PathBuf::from(arg(cmd, 1, "dir")?), &cfg)?)?,
        "materialize" => serde_json::to_value(tree::materialize(&store, &scope, &PathBuf::from(arg(cmd, 1, "dir")?))?)?,
        other => return Err(anyhow!("unknown command '{}'", other)),
    };
    Ok(out)
}

fn main() -> Result<()> {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .try_init();

    let mut args: Vec<String> = env::args().collect();
    let program = args.remove(0);
    if args.is_empty() || args.iter().any(|a| a == "-h" || a == "--help") {
        print_usage(&program);
        return Ok(());
    }
    let inv = match parse_args(&args) {
        Ok(inv) => inv,
        Err(e) => { eprintln!("{}", e); print_usage(&program); std::process::exit(2); }
    };

    match run(inv) {
        Ok(v) => {
            println!("{}", serde_json::to_string_pretty(&v)?);
            Ok(())
        }
        Err(e) => {
            if let Some(te) = e.downcast_ref::<TreeError>() {
                let body = json!({ "error": te.code_str(), "status": te.http_status(), "message": te.to_string() });
                eprintln!("{}", serde_json::to_string_pretty(&body)?);
                std::process::exit(1);
            }
            Err(e)
        }
    }
}
