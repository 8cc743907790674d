//! pdfsift CLI - single-pass PDF extraction tool

mod server;

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{Parser, Subcommand};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};

use pdfsift::render::{self, JsonFormat};
use pdfsift::{DocumentBuffer, Extractor, LopdfSource, PageSelection, TokenEncoding};

use server::ServerConfig;

#[derive(Parser)]
#[command(name = "pdfsift")]
#[command(version)]
#[command(about = "Extract text, token counts, tables and images from PDF files", long_about = None)]
struct Cli {
    /// Input PDF file
    #[arg(value_name = "FILE")]
    input: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract a PDF to JSON
    Extract {
        /// Input PDF file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Output file (stdout if not specified)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Output compact JSON
        #[arg(long)]
        compact: bool,

        /// Skip table detection
        #[arg(long)]
        no_tables: bool,

        /// Skip embedded images
        #[arg(long)]
        no_images: bool,

        /// Token encoding (cl100k_base, o200k_base, p50k_base, r50k_base)
        #[arg(long, env = "PDFSIFT_ENCODING", default_value = "cl100k_base")]
        encoding: TokenEncoding,

        /// Pages scanned for tables (e.g., "1-10", "1,3,5")
        #[arg(long)]
        table_pages: Option<String>,

        /// Probe the page count concurrently with extraction
        #[arg(long)]
        parallel: bool,
    },

    /// Show document information
    Info {
        /// Input PDF file
        #[arg(value_name = "FILE")]
        input: PathBuf,
    },

    /// Run the HTTP upload service
    Serve {
        /// Address to bind
        #[arg(long, env = "PDFSIFT_HOST", default_value = "0.0.0.0")]
        host: String,

        /// Port to listen on
        #[arg(short, long, env = "PDFSIFT_PORT", default_value_t = 5001)]
        port: u16,

        /// Largest accepted upload, in megabytes
        #[arg(long, env = "PDFSIFT_MAX_UPLOAD_MB", default_value_t = 64)]
        max_upload_mb: usize,

        /// Token encoding
        #[arg(long, env = "PDFSIFT_ENCODING", default_value = "cl100k_base")]
        encoding: TokenEncoding,
    },

    /// Show version information
    Version,
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();

    let result = match cli.command {
        Some(Commands::Extract {
            input,
            output,
            compact,
            no_tables,
            no_images,
            encoding,
            table_pages,
            parallel,
        }) => {
            let extractor = Extractor::new()
                .with_encoding(encoding)
                .with_tables(!no_tables)
                .with_images(!no_images)
                .with_parallel(parallel);
            cmd_extract(
                &input,
                output.as_deref(),
                compact,
                extractor,
                table_pages.as_deref(),
            )
        }
        Some(Commands::Info { input }) => cmd_info(&input),
        Some(Commands::Serve {
            host,
            port,
            max_upload_mb,
            encoding,
        }) => cmd_serve(ServerConfig {
            host,
            port,
            max_upload_mb,
            encoding,
        }),
        Some(Commands::Version) => {
            cmd_version();
            Ok(())
        }
        None => {
            // Default behavior: extract to stdout if input is provided
            if let Some(input) = cli.input {
                cmd_extract(&input, None, false, Extractor::new(), None)
            } else {
                println!("{}", "Usage: pdfsift <FILE>".yellow());
                println!("       pdfsift --help for more information");
                Ok(())
            }
        }
    };

    if let Err(e) = result {
        eprintln!("{}: {}", "Error".red().bold(), e);
        std::process::exit(1);
    }
}

fn cmd_extract(
    input: &Path,
    output: Option<&Path>,
    compact: bool,
    mut extractor: Extractor,
    table_pages: Option<&str>,
) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(p) = table_pages {
        let selection = PageSelection::parse(p).map_err(|e| format!("Invalid page range: {}", e))?;
        extractor = extractor.with_table_pages(selection);
    }

    let format = if compact {
        JsonFormat::Compact
    } else {
        JsonFormat::Pretty
    };

    // No spinner while the JSON itself goes to stdout.
    let pb = output.map(|_| {
        let pb = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
            pb.set_style(style);
        }
        pb.enable_steady_tick(Duration::from_millis(100));
        pb.set_message(format!("Extracting {}...", input.display()));
        pb
    });

    let result = extractor.extract_file(input);
    if let Some(pb) = &pb {
        pb.finish_and_clear();
    }
    let result = result?;

    let json = render::to_json(&result, format)?;

    if let Some(path) = output {
        fs::write(path, &json)?;
        println!("{} {}", "Saved to".green(), path.display());
        println!(
            "  {} {} pages, {} tokens, {} tables, {} images",
            "└─".dimmed(),
            result.page_count,
            result.token_count,
            result.tables.len(),
            result.images.len()
        );
    } else {
        println!("{}", json);
    }

    Ok(())
}

fn cmd_info(input: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let buffer = DocumentBuffer::from_file(input)?;
    let source = LopdfSource::load_bytes(buffer.as_bytes())?;

    println!("{}", "Document Information".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());

    println!("{}: {}", "File".bold(), input.display());
    println!("{}: {} bytes", "Size".bold(), buffer.len());
    match buffer.format() {
        Ok(format) => println!("{}: {}", "Format".bold(), format),
        Err(_) => println!("{}: PDF {}", "Format".bold(), source.version()),
    }
    println!(
        "{}: {}",
        "Pages".bold(),
        pdfsift::page_count(buffer.as_bytes())
    );
    println!(
        "{}: {}",
        "Encrypted".bold(),
        if source.is_encrypted() { "Yes" } else { "No" }
    );

    let result = Extractor::new().with_tables(false).extract(&buffer)?;

    println!();
    println!("{}", "Content Statistics".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());

    println!("{}: {}", "Words".bold(), result.text.split_whitespace().count());
    println!("{}: {}", "Characters".bold(), result.text.chars().count());
    println!(
        "{}: {} ({})",
        "Tokens".bold(),
        result.token_count,
        TokenEncoding::default()
    );
    println!("{}: {}", "Images".bold(), result.images.len());

    Ok(())
}

fn cmd_serve(config: ServerConfig) -> Result<(), Box<dyn std::error::Error>> {
    println!(
        "{} http://{}:{}",
        "Serving on".green(),
        config.host,
        config.port
    );

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(server::serve(config))
}

fn cmd_version() {
    println!("{} {}", "pdfsift".cyan().bold(), env!("CARGO_PKG_VERSION"));
    println!("Single-pass PDF extraction tool");
    println!();
    println!("License: MIT");
}
