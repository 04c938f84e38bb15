use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use logprof_cli::commands;
use logprof_cli::commands::profile::ProfileArgs;
use logprof_core::log::ParserKind;

#[derive(Parser)]
#[command(name = "logprof")]
#[command(author, version)]
#[command(
    about = "Per-endpoint latency and size profiles from HTTP access logs",
    long_about = "logprof reads an access log, groups requests into endpoints (optionally \
                  collapsing parameterized paths with regular expressions), and prints a \
                  ranked table of counts, response-time percentiles and body sizes."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Profile an LTSV access log
    Ltsv(ProfileArgs),

    /// Profile a JSON-lines access log
    Json(ProfileArgs),

    /// Generate shell completion scripts
    #[command(long_about = "Generate shell completion scripts for logprof.

SUPPORTED SHELLS:
    bash, zsh, fish, powershell, elvish

INSTALLATION:
    bash:  logprof completion --shell bash >> ~/.bashrc
    zsh:   logprof completion --shell zsh > \"${fpath[1]}/_logprof\"
    fish:  logprof completion --shell fish > ~/.config/fish/completions/logprof.fish")]
    Completion {
        /// Shell to generate completions for
        #[arg(long, value_enum)]
        shell: Shell,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    init_logging(cli.verbose);

    // Execute the command
    match cli.command {
        Commands::Ltsv(args) => commands::profile::execute(&args, ParserKind::Ltsv).map(|_| ()),
        Commands::Json(args) => commands::profile::execute(&args, ParserKind::Json).map(|_| ()),
        Commands::Completion { shell } => {
            commands::completion::execute(shell, &mut Cli::command())
        }
    }
}

fn init_logging(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let filter = if verbose {
        EnvFilter::new("logprof=debug,logprof_cli=debug,logprof_core=debug")
    } else {
        EnvFilter::new("logprof=info,logprof_cli=info,logprof_core=warn")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();
}
