//! dyexport - Dump and query Mach-O export tries.
//!
//! Reads a raw export trie (or a byte range of a larger file holding one) and
//! prints its exports, or resolves individual symbols.

use std::fs::File;
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use memmap2::Mmap;
use rayon::prelude::*;
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

use dyexport::{resolve_reexport_dylibs, ExportTrie, TrieLimits};

/// Export trie decoder for Mach-O images and dyld shared caches.
#[derive(Parser, Debug)]
#[command(name = "dyexport")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print every export in the trie
    Dump {
        #[command(flatten)]
        input: TrieInput,

        /// Dependent dylib install names in load command order, used to name
        /// the source of re-exports (repeat once per dylib)
        #[arg(short, long = "dylib")]
        dylibs: Vec<String>,

        /// Print export flags next to each entry
        #[arg(short = 'F', long)]
        flags: bool,
    },

    /// Look up one or more symbols
    Lookup {
        #[command(flatten)]
        input: TrieInput,

        /// Symbols to look up (e.g., "_malloc")
        #[arg(required = true)]
        symbols: Vec<String>,

        /// Number of parallel jobs (default: number of CPUs)
        #[arg(short, long)]
        jobs: Option<usize>,
    },
}

/// Where the trie comes from and how to interpret it.
#[derive(Args, Debug)]
struct TrieInput {
    /// File holding the export trie
    file: PathBuf,

    /// Byte offset of the trie within the file
    #[arg(long, default_value = "0", value_parser = parse_u64)]
    offset: u64,

    /// Size of the trie in bytes (default: to end of file)
    #[arg(long, value_parser = parse_u64)]
    size: Option<u64>,

    /// Image load address added to regular and thread-local exports (hex or decimal)
    #[arg(short, long, default_value = "0", value_parser = parse_u64)]
    load_address: u64,

    /// Maximum number of trie nodes to visit (default: bounded by trie size)
    #[arg(long)]
    max_nodes: Option<usize>,

    /// Verbosity level (0=quiet, 1=warnings, 2=info, 3=debug)
    #[arg(short, long, default_value = "1")]
    verbosity: u8,
}

impl TrieInput {
    fn limits(&self) -> TrieLimits {
        TrieLimits {
            max_nodes: self.max_nodes,
            ..Default::default()
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Dump {
            input,
            dylibs,
            flags,
        } => {
            setup_logging(input.verbosity);
            cmd_dump(&input, &dylibs, flags)
        }
        Commands::Lookup {
            input,
            symbols,
            jobs,
        } => {
            setup_logging(input.verbosity);
            cmd_lookup(&input, &symbols, jobs)
        }
    }
}

fn setup_logging(verbosity: u8) {
    let level = match verbosity {
        0 => Level::ERROR,
        1 => Level::WARN,
        2 => Level::INFO,
        _ => Level::DEBUG,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .without_time()
        .finish();

    tracing::subscriber::set_global_default(subscriber).ok();
}

/// Parses a hex (`0x` prefixed) or decimal number.
fn parse_u64(s: &str) -> std::result::Result<u64, String> {
    let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u64::from_str_radix(hex, 16),
        None => s.parse(),
    };
    parsed.map_err(|e| format!("invalid number '{}': {}", s, e))
}

/// Memory-maps the input file.
fn map_file(path: &Path) -> Result<Option<Mmap>> {
    let file =
        File::open(path).with_context(|| format!("Failed to open file: {}", path.display()))?;

    // Zero-length files cannot be mapped on every platform.
    let len = file
        .metadata()
        .with_context(|| format!("Failed to stat file: {}", path.display()))?
        .len();
    if len == 0 {
        return Ok(None);
    }

    let mmap = unsafe { Mmap::map(&file) }
        .with_context(|| format!("Failed to memory map file: {}", path.display()))?;
    Ok(Some(mmap))
}

/// Selects the trie byte range from the mapped file.
fn trie_slice<'a>(data: &'a [u8], input: &TrieInput) -> Result<&'a [u8]> {
    let start = usize::try_from(input.offset).context("Trie offset does not fit in memory")?;
    if start > data.len() {
        bail!(
            "Trie offset {:#x} is past the end of {} ({:#x} bytes)",
            input.offset,
            input.file.display(),
            data.len()
        );
    }

    let end = match input.size {
        Some(size) => {
            let end = usize::try_from(size)
                .ok()
                .and_then(|size| start.checked_add(size))
                .filter(|&end| end <= data.len());
            match end {
                Some(end) => end,
                None => bail!(
                    "Trie range {:#x}+{:#x} extends past the end of {} ({:#x} bytes)",
                    input.offset,
                    size,
                    input.file.display(),
                    data.len()
                ),
            }
        }
        None => data.len(),
    };

    Ok(&data[start..end])
}

fn cmd_dump(input: &TrieInput, dylibs: &[String], show_flags: bool) -> Result<()> {
    let start = Instant::now();

    let mmap = map_file(&input.file)?;
    let data = trie_slice(mmap.as_deref().unwrap_or_default(), input)?;
    info!("Decoding {} byte export trie", data.len());

    let trie = ExportTrie::with_limits(data, input.limits());
    let mut entries = trie
        .parse_all(input.load_address)
        .with_context(|| format!("Failed to decode export trie: {}", input.file.display()))?;
    resolve_reexport_dylibs(&mut entries, dylibs);

    for entry in &entries {
        if show_flags {
            println!("{}  [{}]", entry, entry.flags);
        } else {
            println!("{}", entry);
        }
    }

    info!(
        "Decoded {} exports in {:.2}s",
        entries.len(),
        start.elapsed().as_secs_f64()
    );

    Ok(())
}

fn cmd_lookup(input: &TrieInput, symbols: &[String], jobs: Option<usize>) -> Result<()> {
    let mmap = map_file(&input.file)?;
    let data = trie_slice(mmap.as_deref().unwrap_or_default(), input)?;
    let trie = ExportTrie::with_limits(data, input.limits());

    // Configure thread pool
    if let Some(n) = jobs {
        rayon::ThreadPoolBuilder::new()
            .num_threads(n)
            .build_global()
            .ok();
    }

    let results: Vec<_> = symbols
        .par_iter()
        .map(|symbol| (symbol, trie.lookup(symbol, input.load_address)))
        .collect();

    let mut failures = 0usize;
    for (symbol, result) in results {
        match result {
            Ok(Some(entry)) => println!("{}", entry),
            Ok(None) => println!("{}: not found", symbol),
            Err(e) => {
                error!("  {}: {}", symbol, e);
                failures += 1;
            }
        }
    }

    if failures > 0 {
        bail!("{} of {} lookups failed", failures, symbols.len());
    }

    Ok(())
}
