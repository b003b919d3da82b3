use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use folio_editor_core::{
    DocumentStats, EditorAction, EditorConfig, EditorDocument, LocalSelection, PlainEditor,
    ThemeMode, execute_action, format_state, html, sanitize,
};
use miette::{IntoDiagnostic, Result, WrapErr, miette};
use tracing_subscriber::EnvFilter;

mod config;

#[derive(Parser)]
#[command(version, about = "Format folio notes from the command line", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// KDL configuration file [default: <config dir>/folio/config.kdl]
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Colour scheme used for highlights (light or dark)
    #[arg(long, global = true)]
    theme: Option<ThemeMode>,

    /// Log applied transforms
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply formatting actions to a piece of text
    Apply {
        /// Note content as HTML
        file: PathBuf,
        /// Text to select
        #[arg(long)]
        select: String,
        /// Which match of the selected text to use, counting from zero
        #[arg(long, default_value_t = 0)]
        occurrence: usize,
        /// bold, italic, h1, h2, h3, clear or highlight:<color>
        #[arg(long = "action", required = true, value_name = "ACTION")]
        actions: Vec<EditorAction>,
        /// Write the result here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Show the formats active on a piece of text
    Inspect {
        file: PathBuf,
        #[arg(long)]
        select: String,
        #[arg(long, default_value_t = 0)]
        occurrence: usize,
    },
    /// Repair heading structure
    Sanitize {
        file: PathBuf,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Count words and characters
    Stats { file: PathBuf },
}

fn main() -> Result<()> {
    init_miette();
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let mut config = config::load(cli.config.as_deref())?;
    if let Some(theme) = cli.theme {
        config.theme = theme;
    }

    match cli.command {
        Commands::Apply {
            file,
            select,
            occurrence,
            actions,
            output,
        } => {
            let mut editor = open(&file, &config)?;
            select_or_fail(&mut editor, &select, occurrence)?;
            for action in &actions {
                if !execute_action(&mut editor, action) {
                    eprintln!("note: `{action}` left the note unchanged");
                }
            }
            emit(&editor.html(), output.as_deref())?;
        }
        Commands::Inspect {
            file,
            select,
            occurrence,
        } => {
            let mut editor = open(&file, &config)?;
            select_or_fail(&mut editor, &select, occurrence)?;
            let state = format_state(&editor);
            println!("bold: {}", yes_no(state.bold));
            println!("italic: {}", yes_no(state.italic));
            match state.heading {
                Some(level) => println!("heading: {}", level.tag()),
                None => println!("heading: none"),
            }
            match state.highlight {
                Some(color) => println!("highlight: {color}"),
                None => println!("highlight: none"),
            }
        }
        Commands::Sanitize { file, output } => {
            let mut surface = html::parse(&read(&file)?);
            let report = sanitize(&mut surface);
            if report.is_clean() {
                eprintln!("structure already valid");
            } else {
                eprintln!("{report}");
            }
            emit(&html::serialize(&surface), output.as_deref())?;
        }
        Commands::Stats { file } => {
            let surface = html::parse(&read(&file)?);
            let stats = DocumentStats::of(&surface);
            println!("words: {}", stats.words);
            println!("characters: {}", stats.characters);
        }
    }

    Ok(())
}

fn read(path: &Path) -> Result<String> {
    std::fs::read_to_string(path)
        .into_diagnostic()
        .wrap_err_with(|| format!("couldn't read {}", path.display()))
}

fn open(path: &Path, config: &EditorConfig) -> Result<PlainEditor> {
    let content = read(path)?;
    let title = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let mut editor = PlainEditor::new(LocalSelection::default(), config.theme, config.clone());
    editor.load(&title, &content);
    Ok(editor)
}

fn select_or_fail(editor: &mut PlainEditor, needle: &str, occurrence: usize) -> Result<()> {
    if editor.select_text(needle, occurrence) {
        Ok(())
    } else {
        Err(miette!(
            help = "matches are searched in the note's visible text",
            "`{needle}` (match {occurrence}) not found"
        ))
    }
}

fn emit(content: &str, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => std::fs::write(path, content)
            .into_diagnostic()
            .wrap_err_with(|| format!("couldn't write {}", path.display())),
        None => {
            println!("{content}");
            Ok(())
        }
    }
}

fn yes_no(value: bool) -> &'static str {
    if value { "yes" } else { "no" }
}

fn init_tracing(verbose: bool) {
    let fallback = if verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback)),
        )
        .init();
}

fn init_miette() {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .with_cause_chain()
                .color(true)
                .context_lines(5)
                .tab_width(2)
                .break_words(true)
                .build(),
        )
    }))
    .expect("couldn't set the miette hook");
    miette::set_panic_hook();
}
