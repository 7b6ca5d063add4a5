mod output;

use std::fs::File;
use std::io::{stderr, stdout, BufReader, Read, Write};
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use pms5003::{serial::SerialOpts, Pms5003, StreamOpts};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use output::OutputOpts;

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Options shared by all output formats.
#[derive(Args, Debug)]
struct StreamArgs {
    /// Serial port the sensor is attached to.
    #[arg(short, long, env = "PMS5003_PORT", default_value = SerialOpts::DEFAULT_PORT)]
    port: String,

    /// Serial port baud rate.
    #[arg(long, default_value_t = SerialOpts::DEFAULT_BAUD_RATE)]
    baud_rate: u32,

    /// Read a previously captured byte stream from this file rather than from the
    /// serial port. Output ends when the end of the file is reached.
    #[arg(long, value_name = "path")]
    replay: Option<PathBuf>,

    /// Output every measurement, even if identical to the one before it.
    #[arg(long, action)]
    no_dedupe: bool,

    /// Seconds after startup during which measurements are read but not output.
    #[arg(short, long, default_value_t = 30.0, value_name = "secs")]
    warmup: f64,

    /// Do not include a timestamp with each measurement.
    #[arg(long, action)]
    no_timestamp: bool,

    /// Output file path. Defaults to stdout.
    #[arg(short, long, value_name = "path")]
    output: Option<PathBuf>,

    /// Delete output file if it already exists
    #[arg(long, action)]
    clobber: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Write measurements as CSV rows.
    Csv {
        #[command(flatten)]
        args: StreamArgs,

        /// Do not write a header row.
        #[arg(long, action)]
        no_header: bool,
    },
    /// Write measurements as JSON lines.
    Json {
        #[command(flatten)]
        args: StreamArgs,
    },
}

#[derive(Debug, Clone, Copy)]
enum Format {
    Csv,
    Json,
}

fn create_output(args: &StreamArgs) -> Result<Box<dyn Write>> {
    match &args.output {
        Some(path) => {
            if !args.clobber && path.exists() {
                bail!("{path:?} exists; use --clobber");
            }
            let file = File::create(path)
                .with_context(|| format!("failed to create output {path:?}"))?;
            Ok(Box::new(file))
        }
        None => Ok(Box::new(stdout().lock())),
    }
}

fn write<R>(pms: Pms5003<R>, format: Format, args: &StreamArgs, opts: &OutputOpts) -> Result<usize>
where
    R: Read + Send,
{
    let stream_opts = StreamOpts::new()
        .with_dedupe(!args.no_dedupe)
        .with_warmup_secs(args.warmup);
    debug!("{stream_opts:?}");
    if !stream_opts.warmup.is_zero() {
        info!("warming up for {:?}", stream_opts.warmup);
    }

    let dest = create_output(args)?;
    let mut stream = pms.stream(stream_opts);
    let count = match format {
        Format::Csv => output::write_csv(stream.by_ref(), dest, opts)?,
        Format::Json => output::write_json(stream.by_ref(), dest, opts)?,
    };
    info!(stats = ?stream.stats(), "wrote {count} measurements");
    Ok(count)
}

fn run(format: Format, args: &StreamArgs, opts: &OutputOpts) -> Result<()> {
    if let Some(path) = &args.replay {
        info!("replaying {path:?}");
        let src = BufReader::new(File::open(path).context("opening replay input")?);
        write(Pms5003::new(src), format, args, opts)?;
        return Ok(());
    }

    let serial_opts = SerialOpts::new(&args.port).with_baud_rate(args.baud_rate);
    let pms = pms5003::serial::open(&serial_opts)
        .with_context(|| format!("failed to open serial port {}", args.port))?;
    info!("reading from {}", args.port);
    let count = write(pms, format, args, opts)?;
    bail!("serial port {} closed after {count} measurements", args.port)
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    tracing_subscriber::fmt()
        .with_target(false)
        .with_writer(stderr)
        .with_ansi(false)
        .without_time()
        .with_env_filter(
            EnvFilter::try_from_env("PMS5003_LOG").unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    debug!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));

    match &cli.command {
        Commands::Csv { args, no_header } => {
            let opts = OutputOpts {
                with_timestamp: !args.no_timestamp,
                with_header: !no_header,
            };
            run(Format::Csv, args, &opts)
        }
        Commands::Json { args } => {
            let opts = OutputOpts {
                with_timestamp: !args.no_timestamp,
                with_header: false,
            };
            run(Format::Json, args, &opts)
        }
    }
}
