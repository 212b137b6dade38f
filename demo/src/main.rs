//! medscribe demo CLI
//!
//! Analyzes a clinical encounter transcript and renders notes from it.
//!
//! Usage:
//!   cargo run -p demo -- samples
//!   cargo run -p demo -- analyze --sample chest-pain
//!   cargo run -p demo -- analyze --file visit.txt --json
//!   cargo run -p demo -- note --text "BP 300 over 180, heart rate 220" --format ed-note

use std::error::Error;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use medscribe::{sample, Analysis, NoteFormat, Scribe, ScribeConfig, SAMPLES};

type DemoResult = Result<(), Box<dyn Error>>;

// ── CLI definition ────────────────────────────────────────────────────────────

/// medscribe: deterministic clinical transcript analysis.
#[derive(Parser)]
#[command(
    name = "demo",
    about = "medscribe clinical transcript demo",
    long_about = "Extracts a structured encounter from a transcript, screens it against\n\
                  the red-flag rule bank, and renders clinical notes."
)]
struct Cli {
    /// Pipeline configuration file (medscribe.toml).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the extracted encounter, red flags and diagnostics.
    Analyze {
        #[command(flatten)]
        input: Input,
        /// Print the analysis as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Render a clinical note.
    Note {
        #[command(flatten)]
        input: Input,
        /// soap, ed-note, narrative, structured or differential.
        #[arg(long)]
        format: Option<NoteFormat>,
    },
    /// List the built-in sample transcripts.
    Samples,
}

/// Where the transcript comes from. Exactly one source is required.
#[derive(Args)]
#[group(required = true, multiple = false)]
struct Input {
    /// Transcript text.
    #[arg(long)]
    text: Option<String>,
    /// File containing the transcript.
    #[arg(long)]
    file: Option<PathBuf>,
    /// Name of a built-in sample transcript.
    #[arg(long)]
    sample: Option<String>,
}

impl Input {
    fn transcript(&self) -> Result<String, Box<dyn Error>> {
        if let Some(text) = &self.text {
            return Ok(text.clone());
        }
        if let Some(path) = &self.file {
            return std::fs::read_to_string(path)
                .map_err(|e| format!("cannot read '{}': {}", path.display(), e).into());
        }
        let name = self.sample.as_deref().unwrap_or_default();
        sample(name)
            .map(|s| s.transcript.to_string())
            .ok_or_else(|| format!("unknown sample '{name}'; run `demo samples`").into())
    }
}

// ── Entry point ───────────────────────────────────────────────────────────────

fn main() {
    // Set RUST_LOG=debug for verbose output.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_target(false)
        .compact()
        .init();

    let cli = Cli::parse();

    let result = match &cli.command {
        Command::Samples => {
            list_samples();
            Ok(())
        }
        Command::Analyze { input, json } => run_analyze(cli.config.as_ref(), input, *json),
        Command::Note { input, format } => run_note(cli.config.as_ref(), input, *format),
    };

    if let Err(e) = result {
        eprintln!("demo error: {}", e);
        std::process::exit(1);
    }
}

// ── Commands ──────────────────────────────────────────────────────────────────

fn load_scribe(config: Option<&PathBuf>) -> Result<Scribe, Box<dyn Error>> {
    let config = match config {
        Some(path) => ScribeConfig::from_file(path)?,
        None => ScribeConfig::default(),
    };
    debug!(?config, "loading pipeline");
    Ok(Scribe::from_config(&config)?)
}

fn run_analyze(config: Option<&PathBuf>, input: &Input, json: bool) -> DemoResult {
    let scribe = load_scribe(config)?;
    let analysis = scribe.analyze(&input.transcript()?);
    if json {
        println!("{}", serde_json::to_string_pretty(&analysis)?);
    } else {
        print_analysis(&analysis);
    }
    Ok(())
}

fn run_note(config: Option<&PathBuf>, input: &Input, format: Option<NoteFormat>) -> DemoResult {
    let scribe = load_scribe(config)?;
    let analysis = scribe.analyze(&input.transcript()?);
    let format = format.unwrap_or_else(|| scribe.default_format());
    print!("{}", scribe.render(&analysis, format));
    Ok(())
}

fn list_samples() {
    println!("Sample transcripts:");
    for s in SAMPLES {
        println!("  {:<20} {}", s.name, s.description);
    }
}

// ── Output ────────────────────────────────────────────────────────────────────

fn print_analysis(analysis: &Analysis) {
    let e = &analysis.encounter;
    let list = |items: Vec<String>| {
        if items.is_empty() {
            "-".to_string()
        } else {
            items.join(", ")
        }
    };

    println!("Chief complaint:     {}", e.chief_complaint);
    println!("Characteristics:     {}", list(e.characteristics.clone()));
    println!(
        "Onset:               {}",
        e.timeline.onset.as_deref().unwrap_or("-")
    );
    println!(
        "Progression:         {}",
        e.timeline.progression.map_or("-".to_string(), |p| p.to_string())
    );
    println!("Associated symptoms: {}", list(e.associated_symptoms.iter().cloned().collect()));
    println!("Pertinent negatives: {}", list(e.pertinent_negatives.iter().cloned().collect()));
    println!("Medical history:     {}", list(e.medical_history.iter().cloned().collect()));
    println!("Medications:         {}", list(e.medications.iter().map(|m| m.to_string()).collect()));
    let allergies = if e.allergies.is_empty() && e.no_known_allergies {
        "NKDA".to_string()
    } else {
        list(e.allergies.iter().map(|a| a.to_string()).collect())
    };
    println!("Allergies:           {}", allergies);
    println!();

    if analysis.red_flags.is_empty() {
        println!("Red flags: none");
    } else {
        println!("Red flags:");
        for flag in &analysis.red_flags {
            println!(
                "  [{}] {} ({}%): {}",
                flag.severity,
                flag.category,
                flag.confidence_percent(),
                flag.matched_findings.join(", ")
            );
            println!("      -> {}", flag.recommendation);
        }
    }

    if !analysis.diagnostics.is_empty() {
        println!();
        println!("Diagnostics:");
        for diagnostic in &analysis.diagnostics {
            println!("  - {}", diagnostic);
        }
    }
}
