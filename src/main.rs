use anyhow::{Context, Result, bail};
use clap::{Parser, ValueEnum};
use kifu::notes::{FsNoteStore, MemoryNoteStore};
use kifu::reader::FsTree;
use kifu::render::{self, RenderSink, TextSink};
use kifu::view::{HandicapFilter, ViewController};
use kifu::{Config, index_corpus, log};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::process::ExitCode;

/// Indexes a folder of SGF game records, keeps a companion note per game
/// and shows filtered win statistics page by page.
#[derive(Parser, Debug)]
#[command(name = "kifu", version, about)]
struct Cli {
    /// TOML config file; command-line flags override its values
    #[arg(short, long, env = "KIFU_CONFIG")]
    config: Option<PathBuf>,

    /// Folder (or glob pattern) holding the record files
    #[arg(short, long, env = "KIFU_ROOT")]
    root: Option<PathBuf>,

    /// Folder the notes are written under
    #[arg(long)]
    vault: Option<PathBuf>,

    /// Only index games played on this board size (9, 13 or 19)
    #[arg(short, long)]
    board_size: Option<u32>,

    /// Sort games whose player names match this text first
    #[arg(short, long)]
    keyword: Option<String>,

    /// Only show games with this handicap, e.g. "2-stone handicap"
    #[arg(long)]
    handicap: Option<String>,

    /// Rows per page (10, 20, 50 or 100)
    #[arg(long)]
    page_size: Option<usize>,

    /// Page to show first
    #[arg(long, default_value_t = 1)]
    page: usize,

    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    /// Keep notes in memory instead of writing them
    #[arg(long)]
    dry_run: bool,

    /// Read view commands from stdin after the first page
    #[arg(short, long)]
    interactive: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

/// One line of interactive input.
#[derive(Debug, PartialEq, Eq)]
enum Command {
    Next,
    Prev,
    Keyword(String),
    Handicap(HandicapFilter),
    PageSize(usize),
    Quit,
}

const COMMAND_HELP: &str = "Commands: n (next), p (prev), k <text>, h <value|all>, s <size>, q";

impl Command {
    fn parse(line: &str) -> Result<Self> {
        let line = line.trim();
        let (head, rest) = match line.split_once(char::is_whitespace) {
            Some((head, rest)) => (head, rest.trim()),
            None => (line, ""),
        };

        Ok(match head {
            "n" => Self::Next,
            "p" => Self::Prev,
            "k" => Self::Keyword(rest.to_string()),
            "h" => Self::Handicap(HandicapFilter::parse(rest)),
            "s" => Self::PageSize(
                rest.parse()
                    .with_context(|| format!("invalid page size '{rest}'"))?,
            ),
            "q" => Self::Quit,
            _ => bail!("unknown command '{line}'"),
        })
    }
}

fn load_config(cli: &Cli) -> Result<Config> {
    let mut config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };

    if let Some(root) = &cli.root {
        config.root = Some(root.clone());
    }
    if let Some(vault) = &cli.vault {
        config.vault = vault.clone();
    }
    if let Some(board_size) = cli.board_size {
        config.board_size = board_size;
    }
    if let Some(page_size) = cli.page_size {
        config.page_size = page_size;
    }
    Ok(config)
}

fn show(view: &ViewController, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Text => {
            let mut sink = TextSink::new(io::stdout().lock());
            render::render_view(view, &mut sink).context("failed to write view")?;
            sink.paragraphs(&[String::new()])?;
        }
        OutputFormat::Json => {
            println!("{}", render::render_json(view)?);
        }
    }
    Ok(())
}

fn run_interactive(view: &mut ViewController, format: OutputFormat) -> Result<()> {
    eprintln!("{COMMAND_HELP}");
    eprintln!("Handicaps: {}", view.handicap_options().join(", "));

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        eprint!("> ");
        io::stderr().flush()?;

        let Some(line) = lines.next() else {
            return Ok(());
        };
        let line = line.context("failed to read command")?;
        if line.trim().is_empty() {
            continue;
        }

        match Command::parse(&line) {
            Ok(Command::Quit) => return Ok(()),
            Ok(Command::Next) => view.next_page(),
            Ok(Command::Prev) => view.prev_page(),
            Ok(Command::Keyword(keyword)) => view.set_keyword(keyword),
            Ok(Command::Handicap(filter)) => view.set_handicap_filter(filter),
            Ok(Command::PageSize(size)) => {
                if let Err(e) = view.set_page_size(size) {
                    eprintln!("{e}");
                    continue;
                }
            }
            Err(e) => {
                eprintln!("{e:#}\n{COMMAND_HELP}");
                continue;
            }
        }
        show(view, format)?;
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = load_config(&cli)?;

    let report = if cli.dry_run {
        let mut store = MemoryNoteStore::new();
        let report = index_corpus(&config, &FsTree, &mut store)?;
        log::info(format!("Dry run: {} note write(s) kept in memory", store.writes()));
        report
    } else {
        let mut store = FsNoteStore::new(config.vault.clone());
        index_corpus(&config, &FsTree, &mut store)?
    };

    if report.note_failures > 0 {
        log::warn(format!("{} note(s) could not be written", report.note_failures));
    }

    let mut view = ViewController::new(config.view_config(), report.records);
    if let Some(keyword) = &cli.keyword {
        view.set_keyword(keyword.as_str());
    }
    if let Some(handicap) = &cli.handicap {
        view.set_handicap_filter(HandicapFilter::parse(handicap));
    }
    view.set_page(cli.page);

    show(&view, cli.format)?;
    if cli.interactive {
        run_interactive(&mut view, cli.format)?;
    }
    Ok(())
}

fn main() -> ExitCode {
    log::init();
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error(format!("{e:#}"));
            ExitCode::FAILURE
        }
    }
}
