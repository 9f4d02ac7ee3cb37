//! theoremkb CLI
//!
//! Command-line interface for:
//! - Ingesting LaTeX papers into a knowledge base (`ingest`)
//! - Re-resolving cross-references across a knowledge base (`resolve`)
//! - Inspecting label indexes and KaTeX macro tables of a single source (`labels`, `macros`)
//! - Listing the papers and statements of a knowledge base (`show`)

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::fs;
use std::path::{Path, PathBuf};
use theoremkb_ingest_tex::{primary_label, ExtractionConfig, Paper, PaperDraft, TexPipeline};
use theoremkb_model::StatementKind;
use theoremkb_storage::KnowledgeBase;
use tracing::level_filters::LevelFilter;

#[derive(Parser)]
#[command(name = "theoremkb")]
#[command(author, version, about = "theoremkb: statements and cross-references from LaTeX papers")]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Extraction config (JSON)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract a paper, resolve its references and add it to a knowledge base.
    Ingest {
        /// LaTeX source
        input: PathBuf,
        /// Knowledge base JSON (created if missing)
        #[arg(long)]
        kb: PathBuf,
        /// Paper id (default: generated)
        #[arg(long)]
        id: Option<String>,
        /// Paper title
        #[arg(long)]
        title: Option<String>,
        /// Root prepended to statement page URLs in links
        #[arg(long)]
        pages_root: Option<String>,
    },

    /// Resolve references in every paper of a knowledge base.
    Resolve {
        #[arg(long)]
        kb: PathBuf,
        #[arg(long)]
        pages_root: Option<String>,
    },

    /// Print the label → statement id index of a LaTeX source.
    Labels {
        input: PathBuf,
    },

    /// Print the KaTeX macro table of a LaTeX source.
    Macros {
        input: PathBuf,
    },

    /// List the papers and statements of a knowledge base.
    Show {
        #[arg(long)]
        kb: PathBuf,
    },
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::WARN,
        1 => LevelFilter::INFO,
        2 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn load_pipeline(config: Option<&Path>) -> Result<TexPipeline> {
    let Some(path) = config else {
        return Ok(TexPipeline::default());
    };
    let json = fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    let config = ExtractionConfig::from_json(&json)
        .with_context(|| format!("invalid extraction config {}", path.display()))?;
    Ok(TexPipeline::with_config(config))
}

fn read_source(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
}

fn load_kb(path: &Path) -> Result<KnowledgeBase> {
    let kb = KnowledgeBase::load(path)
        .with_context(|| format!("failed to load knowledge base {}", path.display()))?;
    if let Some(warning) = kb.load_warning() {
        eprintln!("{} {}", "warning:".yellow().bold(), warning);
    }
    Ok(kb)
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    let pipeline = load_pipeline(cli.config.as_deref())?;

    match cli.command {
        Commands::Ingest {
            input,
            kb,
            id,
            title,
            pages_root,
        } => cmd_ingest(&pipeline, &input, &kb, id, title, pages_root.as_deref()),
        Commands::Resolve { kb, pages_root } => cmd_resolve(&kb, pages_root.as_deref()),
        Commands::Labels { input } => cmd_labels(&pipeline, &input),
        Commands::Macros { input } => cmd_macros(&pipeline, &input),
        Commands::Show { kb } => cmd_show(&kb),
    }
}

fn cmd_ingest(
    pipeline: &TexPipeline,
    input: &Path,
    kb_path: &Path,
    id: Option<String>,
    title: Option<String>,
    pages_root: Option<&str>,
) -> Result<()> {
    println!("{} {}", "Ingesting".green().bold(), input.display());
    let tex = read_source(input)?;
    let mut kb = load_kb(kb_path)?;

    let draft = PaperDraft {
        paper_id: id,
        title,
        ..PaperDraft::from_tex(tex)
    };
    let mut paper = Paper::build(draft, pipeline)?;
    paper.extend_mathjax_macros(pipeline, false);
    paper.extend_mathjax_environments(pipeline, false);
    let stats = paper.resolve_references(pages_root);

    let paper_id = kb.add_paper(paper)?.paper_id.clone();
    let written = kb.save(None)?;

    println!(
        "  {} {}: {} linked, {} downgraded, {} untouched",
        "paper".cyan(),
        paper_id.bold(),
        stats.linked,
        stats.downgraded,
        stats.untouched
    );
    println!("{} {}", "wrote".green().bold(), written.display().to_string().bold());
    Ok(())
}

fn cmd_resolve(kb_path: &Path, pages_root: Option<&str>) -> Result<()> {
    let mut kb = load_kb(kb_path)?;
    let stats = kb.resolve_all(pages_root);
    let written = kb.save(None)?;
    println!(
        "{} {} papers: {} linked, {} downgraded, {} untouched",
        "Resolved".green().bold(),
        kb.len(),
        stats.linked,
        stats.downgraded,
        stats.untouched
    );
    println!("{} {}", "wrote".green().bold(), written.display().to_string().bold());
    Ok(())
}

fn cmd_labels(pipeline: &TexPipeline, input: &Path) -> Result<()> {
    let mut paper = Paper::from_tex(read_source(input)?, pipeline);
    let index = paper.label_index();
    println!("{}", serde_json::to_string_pretty(index)?);
    Ok(())
}

fn cmd_macros(pipeline: &TexPipeline, input: &Path) -> Result<()> {
    let mut paper = Paper::from_tex(read_source(input)?, pipeline);
    let macros = paper
        .katex_macros(pipeline)
        .with_context(|| format!("failed to translate macros of {}", input.display()))?;
    println!("{}", serde_json::to_string_pretty(&macros)?);
    Ok(())
}

fn cmd_show(kb_path: &Path) -> Result<()> {
    let kb = load_kb(kb_path)?;
    if kb.is_empty() {
        println!("{}", "(no papers)".dimmed());
        return Ok(());
    }

    for paper in kb.papers() {
        let status = if paper.is_resolved() {
            "resolved".green()
        } else {
            "unresolved".yellow()
        };
        println!(
            "{} {} [{}]",
            paper.paper_id.bold(),
            paper.title.as_deref().unwrap_or("(untitled)"),
            status
        );
        for kind in StatementKind::ALL {
            let statements = paper.statements_of_kind(kind);
            if statements.is_empty() {
                continue;
            }
            println!("  {} ({})", kind.plural().cyan(), statements.len());
            for statement in statements {
                let proof = if statement.proof().is_some() { " +proof" } else { "" };
                let label = primary_label(statement)
                    .map(|l| format!("  \\label{{{l}}}"))
                    .unwrap_or_default();
                println!(
                    "    {}  {}{}{}",
                    statement.statement_id,
                    statement.display_name(),
                    label.dimmed(),
                    proof.dimmed()
                );
            }
        }
    }
    Ok(())
}
