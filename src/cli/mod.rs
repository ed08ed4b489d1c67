//! CLI surface for the wish ledger.
//!
//! Thin handlers over [`WishService`]; formatting lives in `render`.

use std::ffi::OsString;
use std::io::Write;
use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand, builder::BoolishValueParser};
use thiserror::Error;

use crate::config::Config;
use crate::core::{CoreError, WishId};
use crate::service::WishService;
use crate::share::ShareError;

mod commands;
mod render;

// =============================================================================
// Entry + global options
// =============================================================================

#[derive(Parser, Debug)]
#[command(
    name = "wl",
    version,
    about = "Make a wish, share it, and let supporters raise its odds",
    infer_subcommands = true,
    infer_long_args = true,
    arg_required_else_help = true
)]
pub struct Cli {
    /// Machine-readable JSON output.
    #[arg(
        long,
        global = true,
        default_value_t = false,
        num_args = 0..=1,
        value_parser = BoolishValueParser::new()
    )]
    pub json: bool,

    /// Store file (default: `wishes_data.json` in the data dir).
    #[arg(long, global = true, value_name = "PATH")]
    pub store: Option<PathBuf>,

    /// Log more (repeat for debug).
    #[arg(short = 'v', long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Score wish text without storing it.
    Score(TextArgs),

    /// Submit a wish.
    #[command(alias = "wish")]
    Submit(TextArgs),

    /// Show a stored wish.
    Show(IdArgs),

    /// List stored wishes.
    #[command(alias = "ls")]
    List,

    /// Support a wish once per supporter.
    #[command(alias = "back")]
    Support(SupportArgs),

    /// Print the share link for a wish.
    Share(IdArgs),

    /// Open a share link, rebuilding the wish if the store lost it.
    #[command(alias = "open")]
    Visit(VisitArgs),
}

#[derive(Args, Debug)]
pub struct TextArgs {
    /// Wish text (words are joined with spaces).
    #[arg(value_name = "TEXT", required = true, num_args = 1..)]
    pub text: Vec<String>,
}

impl TextArgs {
    pub fn joined(&self) -> String {
        self.text.join(" ")
    }
}

#[derive(Args, Debug)]
pub struct IdArgs {
    /// Wish id.
    #[arg(value_name = "ID")]
    pub id: String,
}

#[derive(Args, Debug)]
pub struct SupportArgs {
    /// Wish id.
    #[arg(value_name = "ID")]
    pub id: String,

    /// Supporter identity; reuse it to keep support deduplicated.
    /// A fresh one is generated when omitted.
    #[arg(long, short = 's', value_name = "SUPPORTER")]
    pub supporter: Option<String>,

    /// Fixed increment instead of a random draw.
    #[arg(long, value_name = "POINTS")]
    pub increment: Option<f64>,
}

#[derive(Args, Debug)]
pub struct VisitArgs {
    /// Share link, or just its query string.
    #[arg(value_name = "LINK")]
    pub link: String,
}

// =============================================================================
// Errors + exit status
// =============================================================================

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CliError {
    #[error(transparent)]
    Wish(#[from] crate::Error),
    #[error("failed to write output: {0}")]
    Output(#[from] std::io::Error),
    #[error("failed to encode output: {0}")]
    Encode(#[from] serde_json::Error),
}

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        CliError::Wish(err.into())
    }
}

impl From<ShareError> for CliError {
    fn from(err: ShareError) -> Self {
        CliError::Wish(err.into())
    }
}

/// How a command finished, beyond hard errors.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Exit {
    Success,
    /// The wish id is not in the store.
    NotFound,
    /// Submission scored as not-a-wish.
    Rejected,
}

impl Exit {
    pub fn code(self) -> i32 {
        match self {
            Exit::Success => 0,
            Exit::NotFound => 3,
            Exit::Rejected => 4,
        }
    }
}

pub type CliResult = std::result::Result<Exit, CliError>;

// =============================================================================
// Run
// =============================================================================

pub fn parse_from<I, T>(args: I) -> Cli
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let raw: Vec<OsString> = args.into_iter().map(|t| t.into()).collect();
    Cli::parse_from(normalize_args(raw))
}

/// Run the CLI (used by bin).
pub fn run(cli: Cli, mut config: Config) -> CliResult {
    if let Some(store) = cli.store {
        config.store.path = Some(store);
    }
    let ctx = Ctx {
        service: WishService::from_config(config),
        json: cli.json,
    };
    tracing::debug!(store = ?ctx.service.ledger().path(), "using store");

    match cli.command {
        Commands::Score(args) => commands::score::handle(&ctx, &args.joined()),
        Commands::Submit(args) => commands::submit::handle(&ctx, &args.joined()),
        Commands::Show(args) => commands::show::handle(&ctx, &args.id),
        Commands::List => commands::show::handle_list(&ctx),
        Commands::Support(args) => commands::support::handle(&ctx, args),
        Commands::Share(args) => commands::share::handle(&ctx, &args.id),
        Commands::Visit(args) => commands::share::handle_visit(&ctx, &args.link),
    }
}

// =============================================================================
// Context + helpers
// =============================================================================

struct Ctx {
    service: WishService,
    json: bool,
}

fn parse_wish_id(raw: &str) -> Result<WishId, CoreError> {
    WishId::parse(raw)
}

fn print_json(value: &serde_json::Value) -> Result<(), CliError> {
    print_line(&serde_json::to_string_pretty(value)?)
}

fn print_line(s: &str) -> Result<(), CliError> {
    let mut stdout = std::io::stdout().lock();
    match writeln!(stdout, "{s}") {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::BrokenPipe => Ok(()),
        Err(e) => Err(e.into()),
    }
}

// =============================================================================
// Parsing helpers
// =============================================================================

fn normalize_args(mut raw: Vec<OsString>) -> Vec<OsString> {
    if raw.is_empty() {
        return raw;
    }

    let mut out = Vec::with_capacity(raw.len());
    out.push(raw.remove(0)); // program name

    let mut positional_only = false;
    for arg in raw {
        let s = arg.to_string_lossy();
        if !positional_only && s == "--" {
            positional_only = true;
            out.push(arg);
            continue;
        }
        if !positional_only && s.starts_with("--") {
            let mut pieces = s.splitn(2, '=');
            let flag = pieces.next().unwrap_or("");
            let val = pieces.next();
            let canon = flag.to_lowercase().replace('_', "-");
            let canon = canonical_flag(&canon);
            match val {
                Some(v) => out.push(OsString::from(format!("{canon}={v}"))),
                None => out.push(OsString::from(canon)),
            }
        } else {
            out.push(arg);
        }
    }
    out
}

fn canonical_flag(flag: &str) -> &str {
    match flag {
        "--supporter-id" | "--as" => "--supporter",
        "--luck" | "--inc" => "--increment",
        "--store-path" | "--file" => "--store",
        other => other,
    }
}
