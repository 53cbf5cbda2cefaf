use clap::Parser;
use palettize::codec::{self, CodecError};
use palettize::{kmeans, rng, CompressOptions, InputImage, InvalidParameter};
use snafu::prelude::*;
use std::io::{self, BufRead, IsTerminal, Write};
use std::path::PathBuf;
use std::time::Instant;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

/// Reduce the number of colors in an image with K-means clustering
#[derive(Parser)]
#[command(version, about)]
struct Args {
    /// Image to compress
    #[arg(default_value = "image.png")]
    input: PathBuf,

    /// Number of colors in the output; asked for interactively when omitted
    #[arg(short = 'k', long)]
    colors: Option<usize>,

    /// Number of K-means rounds
    #[arg(short, long, default_value_t = kmeans::DEFAULT_ITERATIONS)]
    iterations: usize,

    /// Seed for picking the initial centroids
    #[arg(short, long, default_value_t = rng::DEFAULT_SEED)]
    seed: u64,

    /// Stop before all rounds ran once no pixel changes its cluster
    #[arg(long)]
    until_stable: bool,

    /// Output PNG [default: compressed_<K>_colors.png]
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Debug, Snafu)]
enum Error {
    #[snafu(display("failed to read the number of colors"))]
    Prompt { source: io::Error },

    #[snafu(display("could not load the input image"))]
    Load { source: CodecError },

    #[snafu(display("could not compress the image"))]
    Compress { source: InvalidParameter },

    #[snafu(display("could not save the compressed image"))]
    Save { source: CodecError },
}

fn init_tracing(verbose: u8) {
    let filter = match verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(io::stderr)
        .init();
}

fn parse_colors(answer: &str) -> usize {
    answer.trim().parse().unwrap_or(kmeans::DEFAULT_CLUSTERS)
}

fn prompt_colors() -> io::Result<usize> {
    let stdin = io::stdin();
    if !stdin.is_terminal() {
        return Ok(kmeans::DEFAULT_CLUSTERS);
    }

    print!(
        "Number of colors in the compressed image [{}]: ",
        kmeans::DEFAULT_CLUSTERS
    );
    io::stdout().flush()?;

    let mut answer = String::new();
    stdin.lock().read_line(&mut answer)?;
    Ok(parse_colors(&answer))
}

fn default_output(colors: usize) -> PathBuf {
    PathBuf::from(format!("compressed_{colors}_colors.png"))
}

#[snafu::report]
fn main() -> Result<(), Error> {
    let args = Args::parse();
    init_tracing(args.verbose);

    let colors = match args.colors {
        Some(colors) => colors,
        None => prompt_colors().context(PromptSnafu)?,
    };
    let output = args.output.unwrap_or_else(|| default_output(colors));

    let t = Instant::now();
    let (width, height, pixels) = codec::load_pixels(&args.input).context(LoadSnafu)?;
    let input = InputImage::from_pixels(width, height, &pixels).context(CompressSnafu)?;

    let options = CompressOptions {
        clusters: colors,
        iterations: args.iterations,
        seed: args.seed,
        stop_when_stable: args.until_stable,
    };
    let compressed = palettize::compress(input, &options).context(CompressSnafu)?;
    info!(
        colors,
        iterations = compressed.iterations,
        converged = compressed.converged,
        elapsed = ?t.elapsed(),
        "clustered {}x{} image",
        width,
        height
    );

    codec::save_pixels(&output, width, height, &compressed.pixels).context(SaveSnafu)?;
    println!("Compressed image saved as {}", output.display());

    Ok(())
}
