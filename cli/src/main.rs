//! undoc CLI - PDF and DOCX to Markdown conversion tool

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};

use undoc::{ConversionStats, ConvertResult, Undoc};

#[derive(Parser)]
#[command(name = "undoc")]
#[command(author = "iyulab")]
#[command(version)]
#[command(about = "Convert PDF and DOCX documents to Markdown", long_about = None)]
#[command(args_conflicts_with_subcommands = true)]
struct Cli {
    /// Input PDF or DOCX file
    #[arg(value_name = "FILE")]
    input: Option<PathBuf>,

    /// Output file (stdout if not specified)
    #[arg(short, long, value_name = "OUT")]
    output: Option<PathBuf>,

    #[command(flatten)]
    convert: ConvertArgs,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Args, Clone, Default)]
struct ConvertArgs {
    /// Write images to this directory instead of embedding them
    #[arg(long, value_name = "DIR", env = "UNDOC_IMAGES_DIR")]
    images_dir: Option<PathBuf>,

    /// Omit images from the output
    #[arg(long)]
    no_images: bool,

    /// Prefix image file names with a per-run token
    #[arg(long)]
    unique_image_names: bool,

    /// Emit undecodable pages empty instead of failing
    #[arg(long)]
    lenient: bool,

    /// Print conversion statistics to stderr
    #[arg(long)]
    stats: bool,
}

impl ConvertArgs {
    fn builder(&self) -> Undoc {
        let mut builder = Undoc::new().with_images(!self.no_images);
        if let Some(ref dir) = self.images_dir {
            builder = builder.with_images_dir(dir);
        }
        if self.unique_image_names {
            builder = builder.unique_image_names();
        }
        if self.lenient {
            builder = builder.lenient();
        }
        if self.stats {
            builder = builder.with_stats();
        }
        builder
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Show document information
    Info {
        /// Input PDF or DOCX file
        #[arg(value_name = "FILE")]
        input: PathBuf,
    },

    /// Convert several documents in parallel
    Batch {
        /// Input files
        #[arg(value_name = "FILES", required = true)]
        inputs: Vec<PathBuf>,

        /// Output directory (next to each input if not specified)
        #[arg(short, long, value_name = "DIR")]
        output: Option<PathBuf>,

        #[command(flatten)]
        convert: ConvertArgs,
    },

    /// Show version information
    Version,
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();

    let result = match cli.command {
        Some(Commands::Info { input }) => cmd_info(&input),
        Some(Commands::Batch {
            inputs,
            output,
            convert,
        }) => cmd_batch(&inputs, output.as_deref(), &convert),
        Some(Commands::Version) => {
            cmd_version();
            Ok(())
        }
        None => {
            if let Some(input) = cli.input {
                cmd_convert(&input, cli.output.as_deref(), &cli.convert)
            } else {
                println!("{}", "Usage: undoc <FILE> [-o OUT]".yellow());
                println!("       undoc --help for more information");
                Ok(())
            }
        }
    };

    if let Err(e) = result {
        eprintln!("{}: {}", "Error".red().bold(), e);
        std::process::exit(1);
    }
}

fn cmd_convert(
    input: &Path,
    output: Option<&Path>,
    args: &ConvertArgs,
) -> Result<(), Box<dyn std::error::Error>> {
    let builder = args.builder();

    let result = match output {
        Some(path) => {
            let pb = spinner(format!("Converting {}...", input.display()))?;
            let result = builder.convert(input)?;
            fs::write(path, &result.content)?;
            pb.finish_and_clear();
            println!("{} {}", "Saved to".green(), path.display());
            result
        }
        None => {
            let result = builder.convert(input)?;
            println!("{}", result.content);
            result
        }
    };

    if let Some(stats) = result.stats {
        print_stats(&stats);
    }

    Ok(())
}

fn cmd_batch(
    inputs: &[PathBuf],
    output: Option<&Path>,
    args: &ConvertArgs,
) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(dir) = output {
        fs::create_dir_all(dir)?;
    }

    let pb = spinner(format!("Converting {} documents...", inputs.len()))?;
    let results = args.builder().convert_many(inputs);
    pb.finish_and_clear();

    let mut failed = 0;
    let mut total = ConversionStats::new();
    for (input, result) in inputs.iter().zip(results) {
        match result.and_then(|r| write_markdown(input, output, r)) {
            Ok((path, stats)) => {
                println!("{} {}", "Converted".green(), path.display());
                if let Some(stats) = stats {
                    total.merge(&stats);
                }
            }
            Err(e) => {
                eprintln!("{} {}: {}", "Failed".red(), input.display(), e);
                failed += 1;
            }
        }
    }

    if args.stats {
        print_stats(&total);
    }

    println!(
        "\n{} {} converted, {} failed",
        "Done!".green().bold(),
        inputs.len() - failed,
        failed
    );

    if failed > 0 {
        return Err(format!("{} of {} documents failed", failed, inputs.len()).into());
    }
    Ok(())
}

fn write_markdown(
    input: &Path,
    output_dir: Option<&Path>,
    result: ConvertResult,
) -> undoc::Result<(PathBuf, Option<ConversionStats>)> {
    let path = markdown_path(input, output_dir);
    fs::write(&path, &result.content)?;
    Ok((path, result.stats))
}

/// `report.pdf` becomes `report.md`, placed in `output_dir` when given.
fn markdown_path(input: &Path, output_dir: Option<&Path>) -> PathBuf {
    let file_name = input.with_extension("md");
    match (output_dir, file_name.file_name()) {
        (Some(dir), Some(name)) => dir.join(name),
        _ => file_name,
    }
}

fn cmd_info(input: &Path) -> Result<(), Box<dyn std::error::Error>> {
    // Lenient so that metadata is shown even when some pages fail to decode
    let result = Undoc::new()
        .with_images(false)
        .lenient()
        .with_stats()
        .convert(input)?;
    let meta = &result.metadata;

    println!("{}", "Document Information".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());

    println!("{}: {}", "File".bold(), input.display());
    match (&meta.format, &meta.pdf_version) {
        (_, Some(version)) => println!("{}: PDF {}", "Format".bold(), version),
        (Some(format), None) => println!("{}: {}", "Format".bold(), format),
        (None, None) => {}
    }
    if meta.page_count > 0 {
        println!("{}: {}", "Pages".bold(), meta.page_count);
    }

    if let Some(ref title) = meta.title {
        println!("{}: {}", "Title".bold(), title);
    }
    if let Some(ref author) = meta.author {
        println!("{}: {}", "Author".bold(), author);
    }
    if let Some(ref subject) = meta.subject {
        println!("{}: {}", "Subject".bold(), subject);
    }
    if let Some(ref creator) = meta.creator {
        println!("{}: {}", "Creator".bold(), creator);
    }
    if let Some(ref producer) = meta.producer {
        println!("{}: {}", "Producer".bold(), producer);
    }
    if let Some(ref created) = meta.created {
        println!("{}: {}", "Created".bold(), created);
    }
    if let Some(ref modified) = meta.modified {
        println!("{}: {}", "Modified".bold(), modified);
    }

    println!();
    println!("{}", "Content Statistics".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());

    let words = result.content.split_whitespace().count();
    println!("{}: {}", "Words".bold(), words);
    if let Some(stats) = result.stats {
        println!("{}: {}", "Headings".bold(), stats.heading_count);
        println!("{}: {}", "List items".bold(), stats.list_item_count);
        println!("{}: {}", "Paragraphs".bold(), stats.paragraph_count);
    }

    Ok(())
}

fn print_stats(stats: &ConversionStats) {
    match serde_json::to_string_pretty(stats) {
        Ok(json) => eprintln!("{}", json),
        Err(e) => log::warn!("Could not serialize statistics: {}", e),
    }
}

fn spinner(message: String) -> Result<ProgressBar, Box<dyn std::error::Error>> {
    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} {msg}")?);
    pb.set_message(message);
    pb.enable_steady_tick(Duration::from_millis(100));
    Ok(pb)
}

fn cmd_version() {
    println!("{} {}", "undoc".cyan().bold(), env!("CARGO_PKG_VERSION"));
    println!("PDF and DOCX to Markdown conversion tool");
    println!();
    println!("License: MIT");
}
