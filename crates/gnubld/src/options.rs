use anyhow::{anyhow, bail};
use clap::builder::PossibleValuesParser;
use clap::parser::ValueSource;
use clap::{Arg, ArgAction, ArgMatches, Command, value_parser};
use gvars::{CallbackInvocation, GVarResult, OptAction, OptKind, OptParams, OptionRegistry, Value};
use indexmap::IndexMap;
use itertools::Itertools;
use tracing::{debug, trace};

use crate::GnuBuildResult;

const POSITIONAL: &str = "args";

/// Command-line `--name=value` options with `optparse` semantics. Parsing and help are done by a
/// `clap` command built from the registered options; actions are applied afterwards, in
/// command-line order.
#[derive(Debug, Default)]
pub struct Options {
    options: Vec<RegisteredOption>,
    values: IndexMap<String, Value>,
}

#[derive(Debug)]
struct RegisteredOption {
    /// The first option string, used as the clap argument id.
    id: String,
    names: Vec<String>,
    params: OptParams,
}

/// One appearance of an option on the command line.
struct Occurrence {
    index: usize,
    option: usize,
    values: Vec<Value>,
}

fn takes_value(params: &OptParams) -> bool {
    match params.action() {
        OptAction::Callback => params.kind.is_some() || params.nargs.is_some(),
        action => action.takes_value(),
    }
}

fn arg_action(params: &OptParams) -> ArgAction {
    match params.action() {
        OptAction::Store => ArgAction::Set,
        OptAction::Append => ArgAction::Append,
        OptAction::StoreTrue | OptAction::StoreConst => ArgAction::SetTrue,
        OptAction::StoreFalse => ArgAction::SetFalse,
        OptAction::Count => ArgAction::Count,
        OptAction::Callback if takes_value(params) => ArgAction::Append,
        OptAction::Callback => ArgAction::Count,
    }
}

impl RegisteredOption {
    fn display_name(&self) -> &str {
        self.names
            .iter()
            .find(|name| name.starts_with("--"))
            .unwrap_or(&self.id)
    }

    fn arg(&self) -> Arg {
        let params = &self.params;
        let mut arg = Arg::new(self.id.clone()).action(arg_action(params));

        let (longs, shorts): (Vec<&String>, Vec<&String>) =
            self.names.iter().partition(|name| name.starts_with("--"));
        for (n, long) in longs.iter().enumerate() {
            let long = long.trim_start_matches("--").to_string();
            arg = match n {
                0 => arg.long(long),
                _ => arg.visible_alias(long),
            };
        }
        for (n, short) in shorts.iter().filter_map(|s| s.chars().nth(1)).enumerate() {
            arg = match n {
                0 => arg.short(short),
                _ => arg.visible_short_alias(short),
            };
        }

        if let Some(help) = &params.help {
            let default = params
                .default
                .as_ref()
                .map(Value::render)
                .unwrap_or_else(|| "none".to_string());
            arg = arg.help(help.replace("%default", &default));
        }

        if takes_value(params) {
            let metavar = params
                .metavar
                .clone()
                .unwrap_or_else(|| params.dest.to_uppercase());
            arg = arg
                .num_args(params.nargs())
                .value_name(metavar)
                .allow_hyphen_values(true);
            arg = match params.kind() {
                OptKind::String => arg.value_parser(value_parser!(String)),
                OptKind::Int => arg.value_parser(value_parser!(i64)),
                OptKind::Choice => arg.value_parser(PossibleValuesParser::new(
                    params.choices.clone().unwrap_or_default(),
                )),
            };
        }
        arg
    }

    /// The values given at each occurrence, typed by the option's kind.
    fn occurrences(&self, matches: &ArgMatches) -> GnuBuildResult<Vec<Vec<Value>>> {
        let id = self.id.as_str();
        let occurrences: Option<Vec<Vec<Value>>> = match self.params.kind() {
            OptKind::Int => matches
                .try_get_occurrences::<i64>(id)?
                .map(|occ| occ.map(|vals| vals.map(|n| Value::Int(*n)).collect()).collect()),
            OptKind::String | OptKind::Choice => matches
                .try_get_occurrences::<String>(id)?
                .map(|occ| occ.map(|vals| vals.map(Value::from).collect()).collect()),
        };
        Ok(occurrences.unwrap_or_default())
    }
}

fn take_action(
    params: &OptParams,
    opt: &str,
    given: Vec<Value>,
    values: &mut IndexMap<String, Value>,
) -> GnuBuildResult<()> {
    let value = match given.len() {
        0 => None,
        1 => given.first().cloned(),
        _ => Some(Value::List(given.iter().map(Value::render).collect())),
    };
    trace!(opt, dest = %params.dest, value = ?value, "option");

    let dest = params.dest.clone();
    match params.action() {
        OptAction::Store => {
            if let Some(value) = value {
                values.insert(dest, value);
            }
        }
        OptAction::StoreConst => {
            if let Some(value) = &params.const_value {
                values.insert(dest, value.clone());
            }
        }
        OptAction::StoreTrue => {
            values.insert(dest, Value::Bool(true));
        }
        OptAction::StoreFalse => {
            values.insert(dest, Value::Bool(false));
        }
        OptAction::Append => {
            let items = value.map(|v| match v {
                Value::List(items) => items,
                other => vec![other.render()],
            });
            let start = match &params.default {
                Some(Value::List(items)) => items.clone(),
                _ => vec![],
            };
            let entry = values.entry(dest).or_insert(Value::List(start));
            if let Value::List(list) = entry {
                list.extend(items.into_iter().flatten());
            }
        }
        OptAction::Count => {
            let count = match values.get(&dest).or(params.default.as_ref()) {
                Some(Value::Int(n)) => *n,
                _ => 0,
            };
            values.insert(dest, Value::Int(count + 1));
        }
        OptAction::Callback => {
            let callback = params
                .callback
                .as_ref()
                .ok_or_else(|| anyhow!("{opt} has no callback"))?;
            let joined = (!given.is_empty()).then(|| given.iter().map(Value::render).join(" "));
            let mut invocation = CallbackInvocation {
                opt_str: opt,
                value: joined.as_deref(),
                dest: &params.dest,
                args: &params.callback_args,
                kwargs: &params.callback_kwargs,
                values,
            };
            callback.call(&mut invocation)?;
        }
    }
    Ok(())
}

impl Options {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parsed values, keyed by destination. Options absent from the command line are absent here.
    pub fn values(&self) -> &IndexMap<String, Value> {
        &self.values
    }

    pub fn dests(&self) -> impl Iterator<Item = &str> {
        self.options.iter().map(|option| option.params.dest.as_str())
    }

    fn command(&self) -> Command {
        Command::new("options")
            .no_binary_name(true)
            .disable_help_flag(true)
            .disable_version_flag(true)
            .infer_long_args(true)
            .args_override_self(true)
            .help_template("Options:\n{options}")
            .arg(
                Arg::new(POSITIONAL)
                    .num_args(1..)
                    .action(ArgAction::Append)
                    .value_parser(value_parser!(String))
                    .hide(true),
            )
            .args(self.options.iter().map(RegisteredOption::arg))
    }

    fn occurrences(&self, matches: &ArgMatches) -> GnuBuildResult<Vec<Occurrence>> {
        let mut ret = vec![];
        for (option, registered) in self.options.iter().enumerate() {
            let id = registered.id.as_str();
            if matches.value_source(id) != Some(ValueSource::CommandLine) {
                continue;
            }
            let indices = matches
                .indices_of(id)
                .map(|indices| indices.collect_vec())
                .unwrap_or_default();
            let first = indices.first().copied().unwrap_or_default();

            match arg_action(&registered.params) {
                ArgAction::Count => {
                    let times = matches.get_count(id);
                    ret.extend((0..times).map(|_| Occurrence {
                        index: first,
                        option,
                        values: vec![],
                    }));
                }
                ArgAction::SetTrue | ArgAction::SetFalse => ret.push(Occurrence {
                    index: first,
                    option,
                    values: vec![],
                }),
                _ => {
                    let mut at = 0;
                    for values in registered.occurrences(matches)? {
                        let len = values.len();
                        ret.push(Occurrence {
                            index: indices.get(at).copied().unwrap_or(first),
                            option,
                            values,
                        });
                        at += len;
                    }
                }
            }
        }
        ret.sort_by_key(|occurrence| occurrence.index);
        Ok(ret)
    }

    /// Parse `args`, storing option values. Returns the positional arguments, in order; everything
    /// after a `--` is positional.
    pub fn parse<S: AsRef<str>>(&mut self, args: &[S]) -> GnuBuildResult<Vec<String>> {
        self.values.clear();
        let args: Vec<&str> = args.iter().map(|arg| arg.as_ref()).collect();

        // An empty long name would prefix-match every long option.
        if args
            .iter()
            .take_while(|arg| **arg != "--")
            .any(|arg| arg.starts_with("--="))
        {
            bail!("no such option: --");
        }

        let matches = self.command().try_get_matches_from(args)?;
        for occurrence in self.occurrences(&matches)? {
            let registered = &self.options[occurrence.option];
            take_action(
                &registered.params,
                registered.display_name(),
                occurrence.values,
                &mut self.values,
            )?;
        }

        let rest = matches
            .get_many::<String>(POSITIONAL)
            .map(|values| values.cloned().collect_vec())
            .unwrap_or_default();
        debug!(options = self.values.len(), positional = rest.len(), "parsed command line");
        Ok(rest)
    }

    /// `optparse`-style help. `%default` in a help string is replaced with the option's default.
    pub fn format_help(&self) -> String {
        self.command().render_help().to_string()
    }
}

impl OptionRegistry for Options {
    fn add_option(&mut self, names: &[String], params: &OptParams) -> GVarResult<()> {
        let Some(id) = names.first() else {
            return Err(anyhow!("option {} has no option strings", params.dest).into());
        };
        let conflicts = names
            .iter()
            .filter(|name| self.options.iter().any(|o| o.names.contains(*name)))
            .collect_vec();
        if !conflicts.is_empty() {
            return Err(anyhow!("conflicting option string(s): {}", conflicts.iter().join(", ")).into());
        }

        self.options.push(RegisteredOption {
            id: id.clone(),
            names: names.to_vec(),
            params: params.clone(),
        });
        Ok(())
    }

    fn get_option(&self, dest: &str) -> Option<Value> {
        self.values.get(dest).cloned().or_else(|| {
            self.options
                .iter()
                .find(|option| option.params.dest == dest)
                .and_then(|option| option.params.default.clone())
        })
    }
}
