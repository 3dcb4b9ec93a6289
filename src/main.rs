use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use clap::{Parser, ValueEnum};
use memmap2::MmapOptions;
use rootcause::prelude::*;
use tracing::{Level, info, warn};

use preinstanced::export::text_dump;
use preinstanced::{
    DecodeOptions, Decoded, TrailingStrip, UvLayout, parse_preinstanced,
    parse_preinstanced_parallel,
};

#[derive(Clone, Copy, Debug, ValueEnum)]
enum UvLayoutArg {
    /// One UV channel in the last 8 bytes of each vertex
    Single,
    /// Primary UV at stride-16, secondary at stride-8
    Dual,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Format {
    /// Vertex/triangle text dump
    Text,
    /// Model and decode report as JSON
    Json,
    /// Only the per-file summary line
    Summary,
}

/// Extract triangle meshes from `.preinstanced` files
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Write one output file per input into this directory instead of stdout
    #[clap(short, long)]
    out_dir: Option<PathBuf>,

    #[clap(long, value_enum, default_value_t = UvLayoutArg::Single)]
    uv_layout: UvLayoutArg,

    /// Triangulate an unterminated final strip instead of dropping it
    #[clap(long)]
    keep_trailing_strips: bool,

    /// Replace NaN UV components with 0
    #[clap(long)]
    sanitize_uvs: bool,

    /// Decode at most this many chunks per file
    #[clap(long)]
    max_chunks: Option<usize>,

    /// Decode chunks on all cores
    #[clap(long)]
    parallel: bool,

    #[clap(short, long, value_enum, default_value_t = Format::Text)]
    format: Format,

    /// Increase log verbosity (-v debug, -vv trace)
    #[clap(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// `.preinstanced` file(s) or glob patterns
    #[clap(required = true)]
    inputs: Vec<String>,
}

impl Args {
    fn decode_options(&self) -> DecodeOptions {
        let uv_layout = match self.uv_layout {
            UvLayoutArg::Single => UvLayout::Single,
            UvLayoutArg::Dual => UvLayout::Dual,
        };
        let trailing_strip = if self.keep_trailing_strips {
            TrailingStrip::Keep
        } else {
            TrailingStrip::Discard
        };
        DecodeOptions::builder()
            .uv_layout(uv_layout)
            .trailing_strip(trailing_strip)
            .sanitize_uvs(self.sanitize_uvs)
            .maybe_max_chunks(self.max_chunks)
            .build()
    }
}

fn expand_inputs(inputs: &[String]) -> Result<Vec<PathBuf>, Report> {
    let mut paths = Vec::new();
    for pattern in inputs {
        let before = paths.len();
        for entry in glob::glob(pattern).context_with(|| format!("Bad input pattern: {pattern}"))? {
            let path = entry?;
            if path.is_file() {
                paths.push(path);
            }
        }
        if paths.len() == before {
            warn!(pattern, "no files matched");
        }
    }
    Ok(paths)
}

fn decode_file(path: &Path, options: &DecodeOptions, parallel: bool) -> Result<Decoded, Report> {
    let file =
        File::open(path).context_with(|| format!("Failed to open {}", path.display()))?;
    if file.metadata()?.len() == 0 {
        return Ok(parse_preinstanced(&[], options));
    }

    // Safety: the map is read-only and dropped before this function returns.
    let mmap = unsafe { MmapOptions::new().map(&file) }
        .context_with(|| format!("Failed to map {}", path.display()))?;

    Ok(if parallel {
        parse_preinstanced_parallel(&mmap[..], options)
    } else {
        parse_preinstanced(&mmap[..], options)
    })
}

/// One output file per input under `out_dir`, named after the input file.
/// Inputs that would write the same output file are rejected.
fn output_paths(
    out_dir: &Path,
    inputs: &[PathBuf],
    format: Format,
) -> Result<Vec<PathBuf>, Report> {
    let extension = if format == Format::Json { "json" } else { "txt" };
    let mut claimed: HashMap<PathBuf, &Path> = HashMap::new();
    let mut out_paths = Vec::with_capacity(inputs.len());
    for input in inputs {
        let mut file_name = input.file_name().unwrap_or_default().to_os_string();
        file_name.push(".");
        file_name.push(extension);
        let out_path = out_dir.join(file_name);
        if let Some(previous) = claimed.insert(out_path.clone(), input) {
            bail!(
                "{} and {} would both write {}",
                previous.display(),
                input.display(),
                out_path.display()
            );
        }
        out_paths.push(out_path);
    }
    Ok(out_paths)
}

fn render(decoded: &Decoded, format: Format) -> Result<String, Report> {
    Ok(match format {
        Format::Text => text_dump::model_to_string(&decoded.model),
        Format::Json => serde_json::to_string_pretty(decoded).context("Failed to serialize model")?,
        Format::Summary => String::new(),
    })
}

fn summary_line(path: &Path, decoded: &Decoded) -> String {
    let report = &decoded.report;
    format!(
        "{}: {} chunks located, {} decoded, {} meshes, {} chunks skipped, {} submeshes skipped, {} dangling triangles, {} degenerate strides, {} strip tails dropped",
        path.display(),
        report.chunks_located,
        report.chunks_decoded,
        report.meshes_decoded,
        report.skipped_chunks().count(),
        report.skipped_submeshes().count(),
        report.dangling_triangles,
        report.degenerate_strides,
        report.discarded_strip_tails,
    )
}

fn main() -> Result<(), Report> {
    let args = Args::parse();

    let level = match args.verbose {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(io::stderr)
        .compact()
        .init();

    let options = args.decode_options();
    let paths = expand_inputs(&args.inputs)?;
    if paths.is_empty() {
        bail!("no input files found");
    }

    let out_paths = match &args.out_dir {
        Some(out_dir) if args.format != Format::Summary => {
            let out_paths = output_paths(out_dir, &paths, args.format)?;
            fs::create_dir_all(out_dir)
                .context_with(|| format!("Failed to create {}", out_dir.display()))?;
            Some(out_paths)
        }
        _ => None,
    };

    let stdout = io::stdout();
    for (i, path) in paths.iter().enumerate() {
        let decoded = decode_file(path, &options, args.parallel)?;
        let summary = summary_line(path, &decoded);
        info!("{summary}");

        if args.format == Format::Summary {
            writeln!(stdout.lock(), "{summary}")?;
            continue;
        }

        let rendered = render(&decoded, args.format)?;
        match out_paths.as_ref().and_then(|out_paths| out_paths.get(i)) {
            Some(out_path) => fs::write(out_path, rendered)
                .context_with(|| format!("Failed to write {}", out_path.display()))?,
            None => stdout.lock().write_all(rendered.as_bytes())?,
        }
    }

    Ok(())
}
