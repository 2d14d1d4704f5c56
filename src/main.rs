use clap::{Args, Parser, Subcommand};
use dfq_forge::catalog::Catalog;
use dfq_forge::cli::{self, PlanEdits};
use dfq_forge::config::DEFAULT_CONFIG_FILE;
use dfq_forge::types::HeaderRecord;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "dfq")]
#[command(about = "Turn Excel measurement plans into DFQ inspection-plan files")]
#[command(long_about = "DFQ Forge - Excel measurement plans to DFQ

Reads characteristics from the first worksheet of each measurement plan
(rows 1-13 are metadata, then one characteristic per row: name in A,
nominal in C, upper tolerance in D, lower tolerance in E), combines them
with a header preset and writes a DFQ K-field file.

COMMANDS:
  preview   - Import, apply edits, show the plan and the DFQ content
  generate  - Same as preview, then write the .dfq file
  presets   - List, add or remove header presets
  catalog   - Show importance or tolerance-type codes
  inspect   - Summarize an existing .dfq file

EXAMPLES:
  dfq preview plan.xlsx --set 1.K2005=2 --check-upper 1
  dfq generate plan.xlsx --preset 2 --output ./dfq
  dfq presets add --part-number P-100 --part-name Housing --station OP10 --line L1")]
#[command(version)]
struct Cli {
    /// Settings file (header presets, remembered paths)
    #[arg(long, global = true, env = "DFQ_CONFIG", default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    /// Debug logging on stderr (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Plan edits shared by preview and generate. Numbers are 1-based.
#[derive(Args)]
struct EditArgs {
    /// Header preset number
    #[arg(short, long, default_value_t = 1)]
    preset: usize,

    /// Set a field: INDEX.KEY=VALUE or header.KEY=VALUE (KEY is a K-code or field name)
    #[arg(long = "set", value_name = "EDIT")]
    set: Vec<String>,

    /// Leave a parameter out of the DFQ file
    #[arg(long, value_name = "INDEX")]
    deselect: Vec<usize>,

    /// Mark the upper tolerance as a natural limit
    #[arg(long, value_name = "INDEX")]
    check_upper: Vec<usize>,

    /// Mark the lower tolerance as a natural limit
    #[arg(long, value_name = "INDEX")]
    check_lower: Vec<usize>,

    /// Move a parameter one place: INDEX:up or INDEX:down
    #[arg(long = "move", value_name = "MOVE")]
    moves: Vec<String>,
}

impl From<EditArgs> for PlanEdits {
    fn from(args: EditArgs) -> Self {
        PlanEdits {
            set: args.set,
            deselect: args.deselect,
            check_upper: args.check_upper,
            check_lower: args.check_lower,
            moves: args.moves,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    #[command(long_about = "Import Excel files and preview the plan.

Shows the active header, import warnings, the parameter table and the
DFQ lines that generate would write. Deselected parameters are dimmed
and left out of the DFQ content unless --all is given.

EXAMPLE:
  dfq preview a.xlsx b.xlsx --filter bore --set 3.K2142=CMM")]
    /// Preview the plan built from Excel files
    Preview {
        /// Measurement-plan workbooks (.xlsx, .xls)
        #[arg(required = true)]
        files: Vec<PathBuf>,

        #[command(flatten)]
        edits: EditArgs,

        /// Only list parameters whose name or description contains TERM
        #[arg(short, long, value_name = "TERM")]
        filter: Option<String>,

        /// Include deselected parameters in the DFQ content
        #[arg(long)]
        all: bool,
    },

    #[command(long_about = "Import Excel files and write a DFQ file.

The file is named {K1001}_{K1002}_{K1086}_{K1091}_{YYYYMMDDHHMMSS}.dfq and
contains only the selected parameters. Without --output, the directory
used by the previous generate is reused. The directory used and the
folder of the first workbook are saved to the settings file.")]
    /// Write a DFQ file from Excel files
    Generate {
        /// Measurement-plan workbooks (.xlsx, .xls)
        #[arg(required = true)]
        files: Vec<PathBuf>,

        #[command(flatten)]
        edits: EditArgs,

        /// Output directory (created if missing)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Manage header presets
    Presets {
        #[command(subcommand)]
        action: PresetAction,
    },

    /// Show the codes of a field catalog (importance, tolerance-type)
    Catalog {
        /// importance (K2005) or tolerance-type (K2009)
        name: Catalog,
    },

    /// Summarize a DFQ file
    Inspect {
        /// Path to .dfq file
        file: PathBuf,
    },
}

#[derive(Subcommand)]
enum PresetAction {
    /// List presets
    List {
        /// Only presets containing TERM in any field
        #[arg(short, long, value_name = "TERM")]
        search: Option<String>,
    },
    /// Add a preset
    Add {
        /// K1001
        #[arg(long, default_value = "")]
        part_number: String,
        /// K1002
        #[arg(long, default_value = "")]
        part_name: String,
        /// K1086
        #[arg(long, default_value = "")]
        station: String,
        /// K1091
        #[arg(long, default_value = "")]
        line: String,
        /// K1004
        #[arg(long, default_value = "5")]
        sample_count: String,
    },
    /// Remove a preset by number
    Remove {
        number: usize,
    },
}

fn init_tracing(verbose: bool) {
    let default = if verbose {
        "dfq_forge=debug"
    } else {
        "dfq_forge=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| default.into()))
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    let config = cli.config;

    match cli.command {
        Commands::Preview {
            files,
            edits,
            filter,
            all,
        } => {
            let preset = edits.preset;
            cli::preview(&config, files, preset, edits.into(), filter, all)?
        }

        Commands::Generate {
            files,
            edits,
            output,
        } => {
            let preset = edits.preset;
            cli::generate(&config, files, preset, edits.into(), output)?
        }

        Commands::Presets { action } => match action {
            PresetAction::List { search } => cli::presets_list(&config, search)?,
            PresetAction::Add {
                part_number,
                part_name,
                station,
                line,
                sample_count,
            } => cli::presets_add(
                &config,
                HeaderRecord::new(part_number, part_name, station, line, sample_count),
            )?,
            PresetAction::Remove { number } => cli::presets_remove(&config, number)?,
        },

        Commands::Catalog { name } => cli::catalog(name)?,

        Commands::Inspect { file } => cli::inspect(file)?,
    }

    Ok(())
}
