mod commands;
mod output;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "consumo",
    version,
    about = "Split credit card statements into per-person consumption reports"
)]
struct Cli {
    /// Log debug details (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a statement PDF into per-person transaction tables
    Parse {
        /// Path to the statement PDF
        input_file: PathBuf,

        /// Output format: table (default) or json
        #[arg(short, long, default_value = "table")]
        output: String,

        /// Write the report as an Excel workbook
        #[arg(long, value_name = "FILE")]
        xlsx: Option<PathBuf>,

        /// Write the report as a fixed-width text file
        #[arg(long, value_name = "FILE")]
        txt: Option<PathBuf>,

        /// Custom JSON statement template (default: built-in "detalle")
        #[arg(short, long, value_name = "FILE")]
        template: Option<PathBuf>,
    },
    /// Save one cropped image of each person's section
    Capture {
        /// Path to the statement PDF
        input_file: PathBuf,

        /// Directory for the JPEG files
        #[arg(long, value_name = "DIR", default_value = "capturas")]
        out_dir: PathBuf,

        /// Render resolution (default: the template's)
        #[arg(long)]
        dpi: Option<u32>,

        /// Custom JSON statement template (default: built-in "detalle")
        #[arg(short, long, value_name = "FILE")]
        template: Option<PathBuf>,
    },
    /// Send each person their block of a text report
    Send {
        /// Text report written by `parse --txt`
        txt_file: PathBuf,

        /// JSON directory: { "NAME": { "UID": "...", "send_message": true } }
        #[arg(short, long, value_name = "FILE")]
        directory: PathBuf,

        /// Slack bot token
        #[arg(long, env = "SLACK_BOT_TOKEN", hide_env_values = true)]
        token: Option<String>,

        /// Log what would be sent without sending
        #[arg(long)]
        dry_run: bool,

        /// Pause between messages in milliseconds
        #[arg(long, default_value_t = 1000)]
        delay_ms: u64,

        /// Custom JSON statement template (default: built-in "detalle")
        #[arg(short, long, value_name = "FILE")]
        template: Option<PathBuf>,
    },
    /// Inspect statement templates
    Template {
        #[command(subcommand)]
        action: TemplateAction,
    },
}

#[derive(Subcommand)]
enum TemplateAction {
    /// List predefined templates
    List,
    /// Print a predefined template as JSON
    Show {
        /// Preset name (e.g., "detalle")
        #[arg(default_value = "detalle")]
        preset: String,
    },
    /// Validate a custom template file
    Validate {
        /// Path to JSON template file
        file: PathBuf,
    },
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Commands::Parse {
            input_file,
            output,
            xlsx,
            txt,
            template,
        } => commands::parse::run(input_file, &output, xlsx, txt, template),
        Commands::Capture {
            input_file,
            out_dir,
            dpi,
            template,
        } => commands::capture::run(input_file, out_dir, dpi, template),
        Commands::Send {
            txt_file,
            directory,
            token,
            dry_run,
            delay_ms,
            template,
        } => commands::send::run(txt_file, directory, token, dry_run, delay_ms, template),
        Commands::Template { action } => match action {
            TemplateAction::List => commands::template::list(),
            TemplateAction::Show { preset } => commands::template::show(&preset),
            TemplateAction::Validate { file } => commands::template::validate(&file),
        },
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
