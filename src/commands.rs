// script_runner/src/commands.rs

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

use crate::{
    add::{AddOutcome, AddRequest, Adder},
    config::Settings,
    conflict::LinePrompt,
    error::RegistryError,
    interpreter::{InterpreterResolver, VenvPolicy},
    launcher, logging,
    registry::Registry,
    script_entry::ScriptType,
    util,
};

/// Script Runner - register scripts under short aliases and run them with
/// the right interpreter (virtualenv-aware for python).
#[derive(Parser, Debug)]
#[command(name = "script_runner", version)]
pub struct Cli {
    /// Directory holding scripts.json and config.json
    /// (default: $SCRIPT_RUNNER_HOME or ~/.config/script_runner).
    #[arg(long, global = true, value_name = "DIR")]
    pub config_dir: Option<PathBuf>,

    /// More log output on stderr (-v info, -vv debug). RUST_LOG overrides.
    #[arg(long, short = 'v', global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Add a script, or every runnable script in a directory
    Add {
        path: PathBuf,

        /// Alias for the script (default: file name without extension)
        #[arg(long, short = 'a')]
        alias: Option<String>,

        /// Interpreter to use instead of the detected one
        #[arg(long, short = 'i', value_name = "PATH")]
        interpreter: Option<PathBuf>,

        /// Script type instead of detecting it
        #[arg(long = "type", short = 't', value_parser = parse_script_type)]
        script_type: Option<ScriptType>,

        /// Replace a clashing alias and never ask
        #[arg(long, short = 'f')]
        force: bool,

        /// Directory levels to climb looking for a virtualenv (0 = unbounded)
        #[arg(long, short = 'd', value_name = "N")]
        venv_depth: Option<usize>,

        /// Virtualenv root to use for python scripts
        #[arg(long, value_name = "DIR", conflicts_with = "no_venv")]
        venv: Option<PathBuf>,

        /// Do not look for a virtualenv
        #[arg(long, short = 'n')]
        no_venv: bool,
    },

    /// Run a registered script, passing the remaining arguments through
    Run {
        /// Alias (or registered path) of the script
        alias: String,

        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },

    /// List registered scripts
    List {
        /// Print the raw registry JSON
        #[arg(long)]
        json: bool,
    },

    /// Remove an alias, or every alias of a script path / directory
    #[command(visible_alias = "delete")]
    Remove { name: String },

    /// Remove entries whose script no longer exists
    Prune,
}

/// Parse arguments, run the command, return the process exit code.
pub fn run_cli() -> Result<i32> {
    let cli = Cli::parse();
    logging::init(cli.verbose);
    let settings = Settings::load(cli.config_dir.as_deref())?;
    dispatch(cli.command, &settings)
}

pub fn dispatch(command: Command, settings: &Settings) -> Result<i32> {
    match command {
        Command::Add { path, alias, interpreter, script_type, force, venv_depth, venv, no_venv } => {
            let policy = match (venv, no_venv) {
                (_, true) => VenvPolicy::Disabled,
                (Some(root), _) => VenvPolicy::Explicit(
                    root.canonicalize()
                        .with_context(|| format!("virtualenv not found: {}", root.display()))?,
                ),
                (None, false) => VenvPolicy::Search {
                    max_depth: venv_depth.unwrap_or(settings.venv_depth),
                },
            };
            let resolver = InterpreterResolver::new(policy, settings.default_shell.clone());
            let req = AddRequest { path, alias, interpreter, script_type, force };
            add(settings, &resolver, &req)
        }
        Command::Run { alias, args } => run(settings, &alias, &args),
        Command::List { json } => list(settings, json),
        Command::Remove { name } => remove(settings, &name),
        Command::Prune => prune(settings),
    }
}

fn open_registry(settings: &Settings) -> Result<Registry> {
    Registry::open(&settings.registry_file)
        .with_context(|| format!("loading registry {}", settings.registry_file.display()))
}

fn add(settings: &Settings, resolver: &InterpreterResolver, req: &AddRequest) -> Result<i32> {
    let mut registry = open_registry(settings)?;
    let mut prompt = LinePrompt::stdio();
    let mut adder = Adder::new(&mut registry, resolver, &mut prompt);

    if req.path.is_dir() {
        let summary = adder.add_directory(&req.path, req, |script, res| match res {
            Ok(AddOutcome::Added(e)) => println!("added    {} -> {}", e.alias, script.display()),
            Ok(AddOutcome::Skipped) => println!("skipped  {}", script.display()),
            Ok(AddOutcome::Cancelled) => println!("cancelled at {}", script.display()),
            Err(e) => println!("failed   {}: {e}", script.display()),
        })?;
        println!(
            "{} added, {} skipped, {} failed{}",
            summary.added,
            summary.skipped,
            summary.failed,
            if summary.cancelled { " (cancelled)" } else { "" }
        );
        return Ok(if summary.cancelled || summary.failed > 0 { 1 } else { 0 });
    }

    match adder.add(req)? {
        AddOutcome::Added(e) => {
            println!(
                "Added \"{}\": {} [{}, {}]",
                e.alias,
                e.path.display(),
                e.script_type,
                e.interpreter.display()
            );
            Ok(0)
        }
        AddOutcome::Skipped => {
            println!("Skipped {}", req.path.display());
            Ok(0)
        }
        AddOutcome::Cancelled => {
            println!("Cancelled; registry unchanged.");
            Ok(1)
        }
    }
}

fn run(settings: &Settings, alias: &str, args: &[String]) -> Result<i32> {
    let registry = open_registry(settings)?;
    let entry = registry.find(alias)?;
    Ok(launcher::launch(entry, args)?)
}

fn list(settings: &Settings, json: bool) -> Result<i32> {
    let registry = open_registry(settings)?;
    if json {
        println!("{}", serde_json::to_string_pretty(registry.entries())?);
        return Ok(0);
    }
    if registry.is_empty() {
        println!("No scripts registered. Use `script_runner add <path>`.");
        return Ok(0);
    }

    let mut rows = vec![vec![
        "ALIAS".to_string(),
        "TYPE".to_string(),
        "PATH".to_string(),
        "INTERPRETER".to_string(),
    ]];
    for e in registry.entries() {
        rows.push(vec![
            e.alias.clone(),
            e.script_type.to_string(),
            e.path.display().to_string(),
            e.interpreter.display().to_string(),
        ]);
    }
    print!("{}", util::render_table(&rows));
    Ok(0)
}

fn remove(settings: &Settings, name: &str) -> Result<i32> {
    let mut registry = open_registry(settings)?;

    let removed = match registry.remove_alias(name) {
        Ok(e) => vec![e],
        Err(RegistryError::AliasNotFound(_)) if Path::new(name).exists() => registry.remove_path(Path::new(name))?,
        Err(e) => return Err(e.into()),
    };
    registry.persist()?;

    for e in &removed {
        println!("removed {} ({})", e.alias, e.path.display());
    }
    Ok(0)
}

fn prune(settings: &Settings) -> Result<i32> {
    let mut registry = open_registry(settings)?;
    let pruned = registry.prune();
    if pruned.is_empty() {
        println!("Nothing to prune.");
        return Ok(0);
    }
    registry.persist()?;
    for e in &pruned {
        println!("pruned {} ({})", e.alias, e.path.display());
    }
    Ok(0)
}

fn parse_script_type(s: &str) -> Result<ScriptType, String> {
    ScriptType::from_str_ic(s).ok_or_else(|| format!("unknown script type \"{s}\" (expected python or shell)"))
}
