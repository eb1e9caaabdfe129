use std::path::PathBuf;

use structopt::clap::AppSettings::*;
use structopt::StructOpt;

mod commands;
mod error;

#[derive(Debug, StructOpt)]
enum Commands {
    #[structopt(name = "c", visible_alias = "create", about = "Create a new archive")]
    Create {
        #[structopt(
            short = "f",
            long = "file",
            parse(from_os_str),
            help = "Path to the archive"
        )]
        archive: PathBuf,
    },

    #[structopt(
        name = "a",
        visible_alias = "append",
        about = "Append files to an existing archive"
    )]
    Append {
        #[structopt(
            short = "f",
            long = "file",
            parse(from_os_str),
            help = "Path to the archive"
        )]
        archive: PathBuf,
    },

    #[structopt(name = "t", visible_alias = "list", about = "List files of an archive")]
    List {
        #[structopt(
            short = "f",
            long = "file",
            parse(from_os_str),
            help = "Path to the archive"
        )]
        archive: PathBuf,

        #[structopt(long, help = "Print entries as JSON")]
        json: bool,
    },

    #[structopt(
        name = "u",
        visible_alias = "update",
        about = "Append newer copies of files already in an archive"
    )]
    Update {
        #[structopt(
            short = "f",
            long = "file",
            parse(from_os_str),
            help = "Path to the archive"
        )]
        archive: PathBuf,
    },

    #[structopt(
        name = "x",
        visible_alias = "extract",
        about = "Extract files from an archive"
    )]
    Extract {
        #[structopt(
            short = "f",
            long = "file",
            parse(from_os_str),
            help = "Path to the archive"
        )]
        archive: PathBuf,

        #[structopt(
            short = "C",
            long,
            parse(from_os_str),
            help = "Extract into this directory instead of the current one"
        )]
        directory: Option<PathBuf>,

        #[structopt(long, help = "Reject entries whose header checksum does not match")]
        verify: bool,
    },
}

#[derive(Debug, StructOpt)]
#[structopt(
    name = "minitar",
    about = "Create, modify and extract ustar archives of regular files.",
    settings = &[SubcommandRequiredElseHelp, DisableHelpSubcommand, VersionlessSubcommands],
    usage = "minitar (c|a|t|u|x) -f <archive> [FLAGS|OPTIONS] [files]..."
)]
struct CliOpts {
    #[structopt(short, long, help = "Show verbose output", global = true)]
    verbose: bool,

    #[structopt(subcommand)]
    cmd: Commands,

    #[structopt(
        name = "files",
        parse(from_os_str),
        help = "Files to add to the archive, in order",
        global = true
    )]
    selected_files: Vec<PathBuf>,
}

fn init_logging(verbose: bool) {
    let level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };

    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let opts = CliOpts::from_iter(wild::args_os());
    init_logging(opts.verbose);

    let result = match opts.cmd {
        Commands::Create { archive } => commands::create(archive, opts.selected_files),
        Commands::Append { archive } => commands::append(archive, opts.selected_files),
        Commands::List { archive, json } => commands::list(archive, opts.verbose, json),
        Commands::Update { archive } => commands::update(archive, opts.selected_files),
        Commands::Extract {
            archive,
            directory,
            verify,
        } => commands::extract(archive, directory, verify, opts.verbose),
    };

    if let Err(e) = result {
        eprintln!("Error: {:?}", e);
        std::process::exit(1);
    }
}
