use clap::{Parser, Subcommand, ValueEnum};
use qr_scan::detector::{locate_with, resolve_with};
use qr_scan::synth::{RenderOptions, encode_symbol, rasterize, smallest_version};
use qr_scan::{
    ECLevel, FailureReason, MaskPattern, Orchestrator, ScanConfig, ScanEvent, ScanMode,
    ScanOutcome, ScanSource, Version, binarize,
};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Instant;

#[derive(Parser)]
#[command(name = "qrscan", version, about = "QR scanning tools")]
struct Cli {
    /// Log pipeline stages to stderr
    #[arg(short, long, global = true)]
    verbose: bool,
    /// Log per-candidate detail to stderr
    #[arg(long, global = true)]
    trace: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Decode the QR symbol in an image
    Scan { image: PathBuf },
    /// Print finder candidates and the resolved symbol frame
    Locate { image: PathBuf },
    /// Render text as a byte-mode symbol to a PNG
    Render {
        text: String,
        out: PathBuf,
        /// Symbol version (smallest fitting version if omitted)
        #[arg(long)]
        version: Option<u8>,
        #[arg(long, value_enum, default_value_t = Level::M)]
        ec: Level,
        #[arg(long, default_value_t = 0)]
        mask: u8,
        /// Pixels per module
        #[arg(long, default_value_t = 4)]
        module: usize,
        /// Quiet zone in modules
        #[arg(long, default_value_t = 4)]
        quiet: usize,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Level {
    L,
    M,
    Q,
    H,
}

impl From<Level> for ECLevel {
    fn from(level: Level) -> Self {
        match level {
            Level::L => ECLevel::L,
            Level::M => ECLevel::M,
            Level::Q => ECLevel::Q,
            Level::H => ECLevel::H,
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    qr_scan::logging::init(cli.verbose, cli.trace);

    let result = match cli.command {
        Command::Scan { image } => scan_cmd(&image).await,
        Command::Locate { image } => locate_cmd(&image),
        Command::Render {
            text,
            out,
            version,
            ec,
            mask,
            module,
            quiet,
        } => render_cmd(&text, &out, version, ec.into(), mask, module, quiet),
    };

    match result {
        Ok(code) => code,
        Err(message) => {
            eprintln!("{message}");
            ExitCode::FAILURE
        }
    }
}

async fn scan_cmd(image: &Path) -> Result<ExitCode, String> {
    let bytes = std::fs::read(image)
        .map_err(|err| format!("Failed to read {}: {}", image.display(), err))?;

    let orchestrator = Orchestrator::new(ScanConfig::from_env());
    let start = Instant::now();
    let mut handle = orchestrator.submit(ScanSource::Encoded(bytes), ScanMode::Qr);

    let mut result = None;
    while let Some(event) = handle.next_event().await {
        match event {
            ScanEvent::Progress(p) => tracing::debug!(progress = p, "scan progress"),
            ScanEvent::Finished(r) => result = Some(r),
        }
    }
    let result = result.ok_or_else(|| "Scan was cancelled".to_string())?;

    println!("Image: {}", image.display());
    println!("Elapsed: {:.1?}", start.elapsed());
    match result.outcome {
        ScanOutcome::Success | ScanOutcome::LowConfidence => {
            println!("Words: {}", result.word_count);
            println!("{}", result.text);
            Ok(ExitCode::SUCCESS)
        }
        ScanOutcome::NoContentFound => {
            println!("No QR code found");
            if let Some(reason) = result.reason {
                println!("Hint: {}", hint(reason));
            }
            Ok(ExitCode::from(2))
        }
        ScanOutcome::Failure(reason) => Err(format!("Scan failed: {reason}")),
    }
}

fn hint(reason: FailureReason) -> &'static str {
    match reason {
        FailureReason::InsufficientPatterns => "make sure all three corner squares are visible",
        FailureReason::IncoherentGeometry => "hold the camera square to the code",
        FailureReason::TimingMismatch | FailureReason::FormatInfoCorrupt => {
            "try a sharper or closer photo"
        }
        FailureReason::UncorrectableErrors => "the code may be damaged or partly covered",
        FailureReason::UnsupportedEncoding => "the code uses an encoding this reader cannot show",
        _ => "try another image",
    }
}

fn locate_cmd(image: &Path) -> Result<ExitCode, String> {
    let bytes = std::fs::read(image)
        .map_err(|err| format!("Failed to read {}: {}", image.display(), err))?;
    let config = ScanConfig::from_env();
    let gray = qr_scan::utils::grayscale::load_with_limit(&bytes, config.max_encoded_bytes)
        .map_err(|err| format!("Failed to load image {}: {}", image.display(), err))?;

    println!("Image: {} ({}x{})", image.display(), gray.width(), gray.height());
    let grid = binarize(&gray, None);
    let candidates = locate_with(&grid, &config.qr.locator);
    println!("Found {} finder candidates", candidates.len());
    for (i, c) in candidates.iter().take(10).enumerate() {
        println!(
            "  Candidate {}: center=({:.1}, {:.1}) module_size={:.2} score={:.2} hits={}",
            i, c.center.x, c.center.y, c.module_size, c.score, c.hits
        );
    }

    match resolve_with(&candidates, &config.qr.resolver) {
        Ok(geometry) => {
            println!(
                "Symbol: version={} dimension={} module_size={:.2} rotation={:.1}deg",
                geometry.version().number(),
                geometry.dimension(),
                geometry.module_size(),
                geometry.rotation().to_degrees()
            );
            for (name, p) in ["TL", "TR", "BR", "BL"].iter().zip(geometry.corners()) {
                println!("  {}: ({:.1}, {:.1})", name, p.x, p.y);
            }
            Ok(ExitCode::SUCCESS)
        }
        Err(reason) => {
            println!("No symbol: {reason}");
            Ok(ExitCode::from(2))
        }
    }
}

fn render_cmd(
    text: &str,
    out: &Path,
    version: Option<u8>,
    ec_level: ECLevel,
    mask: u8,
    module_px: usize,
    quiet_zone: usize,
) -> Result<ExitCode, String> {
    let payload = text.as_bytes();
    let version = match version {
        Some(n) => Version::new(n).ok_or_else(|| format!("Unsupported version {n}"))?,
        None => smallest_version(payload.len(), ec_level)
            .ok_or_else(|| format!("{} bytes do not fit any supported version", payload.len()))?,
    };

    let symbol = encode_symbol(payload, version, ec_level, MaskPattern::from_bits(mask))
        .map_err(|err| err.to_string())?;
    let options = RenderOptions {
        module_px,
        quiet_zone,
        quarter_turns: 0,
    };
    let rendered = rasterize(&symbol, &options).map_err(|err| err.to_string())?;

    let img = image::GrayImage::from_raw(
        rendered.width() as u32,
        rendered.height() as u32,
        rendered.samples().to_vec(),
    )
    .ok_or_else(|| "Rendered buffer has the wrong size".to_string())?;
    img.save(out)
        .map_err(|err| format!("Failed to write {}: {}", out.display(), err))?;

    println!(
        "Wrote {} (version {}, {}x{} px)",
        out.display(),
        version.number(),
        rendered.width(),
        rendered.height()
    );
    Ok(ExitCode::SUCCESS)
}
