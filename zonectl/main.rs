// Command line zone tool.
// zonectl [+flags] {command} [args]
use log::info;
use std::env;
use std::fs;
use std::process;
use std::str::FromStr;
use std::sync::Arc;
use strum_macros::{Display, EnumString};
use zonemgr::clients::Resolver;
use zonemgr::*;

#[derive(Debug, Display, EnumString, PartialEq)]
#[strum(serialize_all = "snake_case")]
enum Command {
    /// Import a zone file, and print it normalized.
    Render,

    /// Import a zone file, and print its verdicts.
    Check,

    /// Import a zone file, apply a recipe, and print the result.
    Recipe,

    /// List the configured recipes.
    Recipes,
}

// A simple type alias so as to DRY.
type Result<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;

#[derive(Debug, PartialEq)]
struct Args {
    command: Command,
    config: Option<String>,

    /// Merge into the zone instead of replacing its records.
    partial: bool,

    /// Also ask the resolvers who the zone is delegated to.
    delegation: bool,

    /// The remaining positional arguments.
    params: Vec<String>,
}

const USAGE: &str = "Usage: zonectl [+config=FILE] [+partial] [+delegation] \
    {render|check} {domain} {file} | recipe {id} {domain} {file} | recipes";

fn parse_args(args: impl Iterator<Item = String>) -> Result<Args> {
    let mut command = None;
    let mut result = Args {
        command: Command::Recipes,
        config: None,
        partial: false,
        delegation: false,
        params: Vec::new(),
    };

    for arg in args {
        match arg.as_str() {
            "+partial" => result.partial = true,
            "+delegation" => result.delegation = true,

            _ => {
                if let Some(path) = arg.strip_prefix("+config=") {
                    result.config = Some(path.to_string());
                } else if arg.starts_with('+') {
                    return Err(format!("Unknown flag: {}", arg).into());
                } else if command.is_none() {
                    command = Some(
                        Command::from_str(&arg)
                            .map_err(|_| format!("Unknown command: {}", arg))?,
                    );
                } else {
                    result.params.push(arg)
                }
            }
        }
    }

    result.command = match command {
        Some(command) => command,
        None => return Err("Missing command".into()),
    };

    let want = match result.command {
        Command::Render | Command::Check => 2,
        Command::Recipe => 3,
        Command::Recipes => 0,
    };
    if result.params.len() != want {
        return Err(format!(
            "{} takes {} arguments, got {}",
            result.command,
            want,
            result.params.len()
        )
        .into());
    }

    Ok(result)
}

/// Imports `path` as `domain` into `store`, and saves it.
fn import(
    store: &MemoryStore,
    settings: &Settings,
    args: &Args,
    domain: &str,
    path: &str,
) -> Result<Zone> {
    let text = fs::read_to_string(path).map_err(|e| format!("unable to read {}: {}", path, e))?;

    let options = ImportOptions {
        partial: args.partial,
        ..Default::default()
    };
    let (mut zone, summary) = load_zone(store, &settings.zone_defaults, domain, &text, options)?;
    info!("{}: {}", path, summary);

    store.save(&mut zone)?;
    Ok(zone)
}

fn run(args: Args) -> Result<()> {
    let settings = match &args.config {
        Some(path) => Settings::from_path(path)?,
        None => Settings::default(),
    };

    let registry = Registry::from_settings(&settings)?;
    let cache = Arc::new(MemoryCache::new());
    let store = MemoryStore::new(cache.clone());

    match args.command {
        Command::Recipes => {
            for id in registry.ids() {
                println!("{:<24} {}", id, registry.get(id)?.description());
            }
        }

        Command::Render => {
            let zone = import(&store, &settings, &args, &args.params[0], &args.params[1])?;
            print!("{}", zones::render(&zone));
        }

        Command::Recipe => {
            let zone = import(&store, &settings, &args, &args.params[1], &args.params[2])?;
            registry.run(&args.params[0], &store, &zone.domain)?;

            match store.get(&zone.domain)? {
                Some(zone) => print!("{}", zones::render(&zone)),
                None => return Err(format!("{} disappeared", zone.domain).into()),
            }
        }

        Command::Check => {
            let zone = import(&store, &settings, &args, &args.params[0], &args.params[1])?;
            let timeout = settings.delegation_timeout();

            let resolver = if settings.resolvers.is_empty() {
                Resolver::new(timeout)?
            } else {
                Resolver::with_servers(&settings.resolvers, timeout)?
            };
            let validator = Validator::new(&settings, resolver, cache);

            let valid = validator.is_valid(&zone);
            println!("{}: {}", Check::Validation, valid);

            let mut ok = valid.as_bool();
            if args.delegation {
                let delegated = validator.is_delegated(&zone);
                println!("{}: {}", Check::Delegation, delegated);
                ok &= delegated.as_bool();
            }

            if !ok {
                process::exit(2);
            }
        }
    }

    Ok(())
}

fn main() {
    env_logger::init();

    let args = match parse_args(env::args().skip(1)) {
        Ok(args) => args,
        Err(e) => {
            eprintln!("{}", e);
            eprintln!("{}", USAGE);
            process::exit(1);
        }
    };

    if let Err(e) = run(args) {
        eprintln!("{}", e);
        process::exit(1);
    }
}
