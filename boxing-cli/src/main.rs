#![allow(dead_code)]

use std::error;
use std::error::Error;
use std::fmt;
use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use log::info;

use boxing::{ResultCode, Unboxer};
use boxing_config::{named_preset, parse_frame_format, parse_pipeline_spec, RawConfig};
use boxing_core::Image;

#[derive(Debug)]
enum CliError {
    UnsupportedImage { extension: String },
    MalformedPnm(String),
}

impl error::Error for CliError {}
impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::UnsupportedImage { extension } => write!(f, "unsupported image extension {:?}", extension),
            Self::MalformedPnm(msg) => write!(f, "malformed PNM image: {}", msg),
        }
    }
}

/// Unboxes a captured frame image, recovering its content payload and
/// metadata from a piql generic preservation format frame.
#[derive(Parser)]
#[command(name = "boxing", version, about)]
struct Opts {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Decode a single captured frame.
    Unbox(UnboxArgs),
}

#[derive(Args)]
struct UnboxArgs {
    /// Path to the captured frame image (8-bit raw PGM, "P5").
    image: PathBuf,

    /// Named built-in frame-format preset (e.g. "4kv7"), overriding the
    /// `[FrameFormat]`/`[FrameRaster]` sections of --config if both are given.
    #[arg(long)]
    format: Option<String>,

    /// Path to a boxing config file supplying the codec dispatcher and
    /// per-stage sections (and, absent --format, the frame format too).
    #[arg(long)]
    config: PathBuf,
}

/// The minimal 8-bit grayscale raster reader this crate performs: binary
/// PGM ("P5"), single whitespace-separated header, no comments.
fn read_pgm(bytes: &[u8]) -> Result<Image, CliError> {
    if !bytes.starts_with(b"P5") {
        return Err(CliError::MalformedPnm("missing P5 magic number".into()));
    }

    let mut fields = Vec::new();
    let mut cursor = 2usize;
    while fields.len() < 3 {
        while cursor < bytes.len() && bytes[cursor].is_ascii_whitespace() {
            cursor += 1;
        }
        let start = cursor;
        while cursor < bytes.len() && !bytes[cursor].is_ascii_whitespace() {
            cursor += 1;
        }
        if start == cursor {
            return Err(CliError::MalformedPnm("truncated PGM header".into()));
        }
        let token = std::str::from_utf8(&bytes[start..cursor])
            .map_err(|_| CliError::MalformedPnm("non-UTF8 header token".into()))?;
        fields.push(
            token
                .parse::<usize>()
                .map_err(|_| CliError::MalformedPnm(format!("invalid header token {:?}", token)))?,
        );
    }
    cursor += 1; // the single whitespace byte separating the header from pixel data

    let (width, height, maxval) = (fields[0], fields[1], fields[2]);
    if maxval > 255 {
        return Err(CliError::MalformedPnm("only 8-bit PGM is supported".into()));
    }
    let pixels = bytes
        .get(cursor..cursor + width * height)
        .ok_or_else(|| CliError::MalformedPnm("pixel data shorter than width * height".into()))?
        .to_vec();
    Ok(Image::new(width, height, pixels))
}

fn run() -> Result<ResultCode, Box<dyn Error>> {
    env_logger::init();
    let opts = Opts::parse();

    match opts.command {
        Command::Unbox(args) => {
            let config_text = fs::read_to_string(&args.config)?;
            let config = RawConfig::parse(&config_text)?;

            let format = match &args.format {
                Some(name) => named_preset(name)?,
                None => parse_frame_format(&config)?,
            };
            let spec = parse_pipeline_spec(&config)?;

            let extension = args
                .image
                .extension()
                .and_then(|e| e.to_str())
                .unwrap_or_default()
                .to_ascii_lowercase();
            if extension != "pgm" && extension != "raw" {
                return Err(Box::new(CliError::UnsupportedImage { extension }));
            }
            let bytes = fs::read(&args.image)?;
            let image = read_pgm(&bytes)?;

            let unboxer = Unboxer::new(format, spec);
            match unboxer.decode(&image) {
                Ok(result) => {
                    info!(
                        "unboxed {} content bytes, {} metadata items, {} resolved / {} unresolved errors",
                        result.content.len(),
                        result.metadata.len(),
                        result.stats.resolved_errors,
                        result.stats.unresolved_errors
                    );
                    println!("{}", result.content.len());
                    Ok(ResultCode::Ok)
                }
                Err(e) => {
                    eprintln!("unbox failed: {}", e);
                    Ok(ResultCode::from(&e))
                }
            }
        }
    }
}

fn main() -> ExitCode {
    match run() {
        Ok(ResultCode::Ok) => ExitCode::SUCCESS,
        Ok(_) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}
