// `error_chain!` can recurse deeply
#![recursion_limit = "1024"]

extern crate clap;
extern crate filetime;
extern crate regex;
extern crate walkdir;
#[macro_use]
extern crate log;
extern crate log4rs;
#[macro_use]
extern crate error_chain;

// For testing in submodules
#[cfg(test)]
extern crate rand;

use clap::{App, AppSettings, Arg, ArgMatches, SubCommand};
use log::LevelFilter;
use log4rs::append::console::ConsoleAppender;
use log4rs::config::{Appender, Config, Root};
use log4rs::encode::pattern::PatternEncoder;

mod context;
mod copier;
mod error;
mod layout;
mod mover;
mod paths;
mod rewrite;
mod rule;
mod sync;
mod vcs;

#[cfg(test)]
mod testutils;

use context::SyncContext;
use copier::*;
use error::*;
use layout::Layout;
use rule::SkipRule;
use sync::Synchronizer;
use vcs::*;

use std::fs;
use std::path::{Path, PathBuf};

fn main() {
    let argument_matches = create_app().get_matches();

    if let Err(ref error) = configure_logging(argument_matches.occurrences_of("v")) {
        eprintln!("Error: {}", error);
        ::std::process::exit(1);
    }

    // If there was an error, nicely print it and the related causes
    if let Err(ref error) = run(&argument_matches) {
        error!("Error: {}", error);
        for cause in error.iter().skip(1) {
            error!("caused by: {}", cause);
        }
        ::std::process::exit(1);
    } else {
        ::std::process::exit(0);
    }
}

fn create_app<'a, 'b>() -> App<'a, 'b> {
    App::new("vendorsync")
        .version("0.1")
        .author("Mitch S. <mitch+map@applicative.us>")
        .about("Syncs a vendored upstream tree and moves scheduler changes between repositories")
        .setting(AppSettings::SubcommandRequiredElseHelp)
        .arg(
            Arg::with_name("v")
                .short("v")
                .multiple(true)
                .help("Sets the level of verbosity"),
        )
        .arg(
            Arg::with_name("dry-run")
                .short("n")
                .long("dry-run")
                .alias("show")
                .help("Only print what would be done, without writing to the filesystem or running commands"),
        )
        .subcommand(
            SubCommand::with_name("copy")
                .about("Copies files whose path ends with a suffix, keeping the directory structure")
                .arg(
                    Arg::with_name("ext")
                        .short("e")
                        .long("ext")
                        .value_name("SUFFIX")
                        .help("Only copy files whose path ends with this suffix (all files if omitted)")
                        .takes_value(true),
                )
                .arg(
                    Arg::with_name("src")
                        .short("s")
                        .long("src")
                        .value_name("DIRECTORY")
                        .help("Sets the directory to copy from")
                        .takes_value(true)
                        .required(true),
                )
                .arg(
                    Arg::with_name("dst")
                        .short("d")
                        .long("dst")
                        .value_name("DIRECTORY")
                        .help("Sets the directory to copy into")
                        .takes_value(true)
                        .required(true),
                )
                .arg(
                    Arg::with_name("skip")
                        .short("x")
                        .long("skip")
                        .value_name("REGEX")
                        .help("Skips files whose path matches this regex, e.g. '.*/_output/.*'")
                        .takes_value(true),
                ),
        )
        .subcommand(
            SubCommand::with_name("sync")
                .about("Updates the vendor directory and propagates scheduler changes")
                .arg(
                    Arg::with_name("vendor")
                        .long("vendor")
                        .value_name("REVISION")
                        .help("Updates the vendor directory to the given upstream revision")
                        .takes_value(true),
                )
                .arg(
                    Arg::with_name("scheduler")
                        .long("scheduler")
                        .value_name("REVISION")
                        .help("Merges the upstream scheduler at the given revision into the scheduler fork")
                        .takes_value(true)
                        .conflicts_with_all(&["s2m", "m2s"]),
                )
                .arg(
                    Arg::with_name("s2m")
                        .long("s2m")
                        .help("Copies the scheduler fork into the main codebase and rewrites imports")
                        .conflicts_with("m2s"),
                )
                .arg(
                    Arg::with_name("m2s")
                        .long("m2s")
                        .help("Copies the main codebase's scheduler back into the scheduler fork"),
                )
                .arg(
                    Arg::with_name("base")
                        .long("base")
                        .value_name("DIRECTORY")
                        .help("Sets the root of the main codebase")
                        .takes_value(true)
                        .default_value("."),
                )
                .arg(
                    Arg::with_name("upstream")
                        .long("upstream")
                        .value_name("DIRECTORY")
                        .help("Sets the upstream checkout (default: <base>/../../../<namespace>/<repo>)")
                        .takes_value(true),
                )
                .arg(
                    Arg::with_name("fork")
                        .long("fork")
                        .value_name("DIRECTORY")
                        .help("Sets the scheduler fork checkout (default: <base>/../KubeGPU-scheduler)")
                        .takes_value(true),
                )
                .arg(
                    Arg::with_name("namespace")
                        .long("namespace")
                        .value_name("NAMESPACE")
                        .help("Sets the import namespace of the upstream project")
                        .takes_value(true)
                        .default_value("k8s.io"),
                )
                .arg(
                    Arg::with_name("repo")
                        .long("repo")
                        .value_name("NAME")
                        .help("Sets the repository name of the upstream project")
                        .takes_value(true)
                        .default_value("kubernetes"),
                )
                .arg(
                    Arg::with_name("module")
                        .long("module")
                        .value_name("IMPORT_PATH")
                        .help("Sets the import path of the main codebase")
                        .takes_value(true)
                        .default_value("github.com/Microsoft/KubeGPU"),
                ),
        )
}

fn configure_logging(verbosity: u64) -> Result<()> {
    let stdout = ConsoleAppender::builder()
        .encoder(Box::new(PatternEncoder::new("{h({m})}{n}")))
        .build();
    let level = match verbosity {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    let config = Config::builder()
        .appender(Appender::builder().build("stdout", Box::new(stdout)))
        .build(Root::builder().appender("stdout").build(level))
        .chain_err(|| "Unable to build logging configuration")?;
    log4rs::init_config(config).chain_err(|| "Unable to initialize logging")?;
    Ok(())
}

fn run(matches: &ArgMatches) -> Result<()> {
    let context = SyncContext {
        dry_run: matches.is_present("dry-run"),
    };
    if context.dry_run {
        warn!("Dry run: nothing will be written and no commands will be run");
    }

    match matches.subcommand() {
        ("copy", Some(copy_matches)) => run_copy(copy_matches, &context),
        ("sync", Some(sync_matches)) => run_sync(sync_matches, &context),
        (other, _) => bail!("Unknown subcommand '{}'", other),
    }
}

fn run_copy(matches: &ArgMatches, context: &SyncContext) -> Result<()> {
    let skip = match matches.value_of("skip") {
        Some(pattern) => Some(SkipRule::parse(pattern)?),
        None => None,
    };

    // Safe to unwrap these, as they are required
    let source_dir = PathBuf::from(matches.value_of("src").unwrap());
    let dest_dir = PathBuf::from(matches.value_of("dst").unwrap());

    let copied = CopyTask::new(source_dir, dest_dir)
        .with_suffix(matches.value_of("ext"))
        .with_skip(skip)
        .execute(context)?;
    info!("Copied {} entries", copied.len());

    Ok(())
}

fn run_sync(matches: &ArgMatches, context: &SyncContext) -> Result<()> {
    let vendor_revision = matches.value_of("vendor");
    let scheduler_revision = matches.value_of("scheduler");
    let sched_to_main = matches.is_present("s2m");
    let main_to_sched = matches.is_present("m2s");
    if vendor_revision.is_none() && scheduler_revision.is_none() && !sched_to_main && !main_to_sched {
        bail!("Nothing to do: pass --vendor, --scheduler, --s2m or --m2s");
    }

    // Safe to unwrap these, as we have defaults
    let base = resolve_base(Path::new(matches.value_of("base").unwrap()))?;
    let mut layout = Layout::new(
        base,
        matches.value_of("namespace").unwrap(),
        matches.value_of("repo").unwrap(),
        matches.value_of("module").unwrap(),
    );
    if let Some(upstream) = matches.value_of("upstream") {
        layout.upstream = PathBuf::from(upstream);
    }
    if let Some(fork) = matches.value_of("fork") {
        layout.fork = PathBuf::from(fork);
    }
    debug!("Using layout {:?}", layout);

    let runner = ShellRunner;
    let synchronizer = Synchronizer::new(&layout, &runner, context);

    if let Some(revision) = vendor_revision {
        synchronizer.update_vendor(revision)?;
    }

    if let Some(revision) = scheduler_revision {
        synchronizer.update_scheduler(revision)?;
    } else if sched_to_main {
        synchronizer.copy_sched_to_main()?;
    } else if main_to_sched {
        synchronizer.copy_main_to_sched()?;
    }

    Ok(())
}

/// Resolves symlinks in `base`, so default paths next to it land where a real path would.
fn resolve_base(base: &Path) -> Result<PathBuf> {
    if !base.is_dir() {
        bail!(ErrorKind::DirectoryNotFound(base.to_path_buf()));
    }
    fs::canonicalize(base).chain_err(|| format!("Unable to resolve directory {}", base.to_string_lossy()))
}
