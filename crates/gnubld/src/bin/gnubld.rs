use std::path::PathBuf;

use anyhow::{Context, bail};
use clap::{Args, Parser, Subcommand, ValueEnum};
use gnubld::GnuBuildResult;
use gnubld::cc;
use gnubld::defaults::{KeyTransforms, NameFilter};
use gnubld::env::BuildEnv;
use gnubld::gnu_dirs;
use gnubld::options::Options;
use gnubld::progs;
use gnubld::variables::Variables;
use gvars::{Environment, GVarDecls, Targets};
use gvars_util::split::split_list_args;
use indexmap::IndexMap;
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

/// Inspect GNU build variables as set by the environment, `NAME=value` variables and
/// `--name=value` options
#[derive(Parser)]
#[command(version)]
struct Opts {
    /// Tables to declare (all of them when not given)
    #[arg(long = "domain", value_enum)]
    domains: Vec<Domain>,

    /// Declare only these GVars (comma separated, may be repeated)
    #[arg(long)]
    only: Vec<String>,

    /// Read `NAME = "value"` assignments from this file before the command line
    #[arg(long)]
    vars_file: Option<PathBuf>,

    #[command(subcommand)]
    subcmd: SubCommand,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Domain {
    Dirs,
    Progs,
    Cc,
}

#[derive(Subcommand)]
enum SubCommand {
    Show(Show),
    HelpVars(HelpVars),
    HelpOptions(HelpOptions),
    Save(Save),
}

/// Show construction variables after applying ARGS
#[derive(Args)]
struct Show {
    /// `NAME=value` variables and `--name=value` options
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    args: Vec<String>,
}

/// Describe the command-line variables
#[derive(Args)]
struct HelpVars {
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    args: Vec<String>,
}

/// Describe the command-line options
#[derive(Args)]
struct HelpOptions {}

/// Save the command-line variables that differ from their defaults
#[derive(Args)]
struct Save {
    file: PathBuf,

    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    args: Vec<String>,
}

fn declare(opts: &Opts) -> GnuBuildResult<GVarDecls> {
    let filter = match opts.only.is_empty() {
        true => NameFilter::All,
        false => NameFilter::only(split_list_args(&opts.only, ",")),
    };
    let transforms = KeyTransforms::default();
    let domains = match opts.domains.is_empty() {
        true => vec![Domain::Dirs, Domain::Progs, Domain::Cc],
        false => opts.domains.clone(),
    };

    let mut decls = GVarDecls::new();
    for domain in domains {
        let declared = match domain {
            Domain::Dirs => gnu_dirs::declare_gvars(&filter, &transforms),
            Domain::Progs => progs::declare_gvars(&filter, &transforms),
            Domain::Cc => cc::declare_gvars(&IndexMap::new(), &filter, &transforms),
        }
        .with_context(|| format!("failed to declare {domain:?} variables"))?;
        decls.update(
            declared
                .iter()
                .map(|(name, decl)| (name.to_string(), decl.clone())),
        )?;
    }
    debug!(count = decls.len(), "declared GVars");
    Ok(decls)
}

fn run() -> GnuBuildResult<()> {
    let opts = Opts::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_target(false)
        .without_time()
        .init();

    let decls = declare(&opts)?;

    let mut env = BuildEnv::new();
    let mut variables = Variables::new();
    if let Some(path) = &opts.vars_file {
        variables = variables.with_file(path);
    }
    let mut options = Options::new();
    let committed = decls.commit(
        Targets::new()
            .env(&mut env)
            .variables(&mut variables)
            .options(&mut options),
    )?;
    let gvars = committed.gvars();

    let args = match &opts.subcmd {
        SubCommand::Show(show) => show.args.as_slice(),
        SubCommand::HelpVars(help) => help.args.as_slice(),
        SubCommand::HelpOptions(_) => &[],
        SubCommand::Save(save) => save.args.as_slice(),
    };
    let rest = variables.collect_args(args);
    for unknown in variables.unknown_variables() {
        warn!(variable = unknown, "unknown variable");
    }
    let rest = options.parse(rest.as_slice())?;
    if !rest.is_empty() {
        bail!("unexpected arguments: {}", rest.join(" "));
    }

    gvars.update_environment(&mut env, Some(&variables), Some(&options), None)?;

    match opts.subcmd {
        SubCommand::Show(_) => {
            for name in gvars.keys() {
                let Ok(key) = gvars.env_key(name) else {
                    continue;
                };
                match env.get(key)?.filter(|value| !value.is_none()) {
                    Some(value) => {
                        println!("{key} = {value}");
                        println!("    {}", env.subst(&format!("${{{key}}}"))?);
                    }
                    None => println!("{key} is not set"),
                }
            }
        }
        SubCommand::HelpVars(_) => {
            print!("{}", gvars.generate_variables_help_text(&variables, &env)?);
        }
        SubCommand::HelpOptions(_) => {
            print!("{}", options.format_help());
        }
        SubCommand::Save(save) => {
            gvars
                .save_variables(&variables, &save.file, &env)
                .with_context(|| format!("failed to save variables to {}", save.file.display()))?;
        }
    }

    Ok(())
}

fn main() {
    if let Err(e) = run() {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
