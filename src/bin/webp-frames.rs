use std::{
    fs::File,
    io::{BufReader, Write as _},
    path::{Path, PathBuf},
};

use anyhow::Context as _;
use clap::{Parser, Subcommand, ValueEnum};
use webp_frames::FragmentSource as _;

#[derive(Parser, Debug)]
#[command(name = "webp-frames", version)]
struct Cli {
    /// Log progress at debug level.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Write every composited frame of an animated WebP to a directory.
    Extract(ExtractArgs),
    /// Print container metadata as JSON.
    Info(InfoArgs),
}

#[derive(Parser, Debug)]
struct ExtractArgs {
    /// Input WebP file.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Output directory.
    #[arg(long)]
    out: Option<PathBuf>,

    /// Output image format.
    #[arg(long, value_enum)]
    format: Option<FormatChoice>,

    /// File name prefix for written frames.
    #[arg(long)]
    prefix: Option<String>,

    /// Write the frame manifest to this path instead of stdout.
    #[arg(long)]
    manifest: Option<PathBuf>,

    /// JSON file with sink options; flags override its values.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Refuse canvases larger than this many pixels [default: 134217728].
    #[arg(long)]
    max_canvas_pixels: Option<u64>,
}

#[derive(Parser, Debug)]
struct InfoArgs {
    /// Input WebP file.
    #[arg(long = "in")]
    in_path: PathBuf,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum FormatChoice {
    Png,
    Bmp,
    Tiff,
}

impl From<FormatChoice> for webp_frames::OutputFormat {
    fn from(value: FormatChoice) -> Self {
        match value {
            FormatChoice::Png => Self::Png,
            FormatChoice::Bmp => Self::Bmp,
            FormatChoice::Tiff => Self::Tiff,
        }
    }
}

#[derive(serde::Serialize)]
struct Manifest<'a> {
    input: &'a Path,
    #[serde(flatten)]
    extraction: &'a webp_frames::Extraction,
}

#[derive(serde::Serialize)]
struct InfoReport<'a> {
    #[serde(flatten)]
    info: &'a webp_frames::AnimationInfo,
    fragments: Vec<FragmentInfo>,
}

#[derive(serde::Serialize)]
struct FragmentInfo {
    index: webp_frames::FragmentIndex,
    x: u32,
    y: u32,
    width: u32,
    height: u32,
    duration: u32,
    blend: Option<webp_frames::BlendMode>,
    dispose: Option<webp_frames::DisposeMode>,
    payload_bytes: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl FragmentInfo {
    fn empty(index: webp_frames::FragmentIndex) -> Self {
        Self {
            index,
            x: 0,
            y: 0,
            width: 0,
            height: 0,
            duration: 0,
            blend: None,
            dispose: None,
            payload_bytes: 0,
            error: None,
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    match cli.cmd {
        Command::Extract(args) => cmd_extract(args),
        Command::Info(args) => cmd_info(args),
    }
}

fn init_tracing(verbose: bool) {
    let level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn read_input(path: &Path) -> anyhow::Result<Vec<u8>> {
    std::fs::read(path).with_context(|| format!("read input '{}'", path.display()))
}

fn read_sink_config(path: &Path) -> anyhow::Result<webp_frames::ImageDirSinkOpts> {
    let f = File::open(path).with_context(|| format!("open config '{}'", path.display()))?;
    let opts = serde_json::from_reader(BufReader::new(f))
        .with_context(|| format!("parse config JSON '{}'", path.display()))?;
    Ok(opts)
}

fn sink_opts(args: &ExtractArgs) -> anyhow::Result<webp_frames::ImageDirSinkOpts> {
    let mut opts = match &args.config {
        Some(path) => read_sink_config(path)?,
        None => webp_frames::ImageDirSinkOpts::default(),
    };
    if let Some(out) = &args.out {
        opts.out_dir = out.clone();
    } else if args.config.is_none() {
        anyhow::bail!("either --out or --config must name the output directory");
    }
    if let Some(format) = args.format {
        opts.format = format.into();
    }
    if let Some(prefix) = &args.prefix {
        opts.prefix = prefix.clone();
    }
    Ok(opts)
}

fn cmd_extract(args: ExtractArgs) -> anyhow::Result<()> {
    let bytes = read_input(&args.in_path)?;
    let opts = sink_opts(&args)?;
    let out_dir = opts.out_dir.clone();
    let mut sink = webp_frames::ImageDirSink::new(opts);

    let mut extract_opts = webp_frames::ExtractOpts::default();
    if args.max_canvas_pixels.is_some() {
        extract_opts.max_canvas_pixels = args.max_canvas_pixels;
    }
    let extractor = webp_frames::Extractor::new(extract_opts);
    let extraction = extractor
        .extract(&bytes, &mut sink)
        .with_context(|| format!("extract frames from '{}'", args.in_path.display()))?;

    let manifest = Manifest {
        input: &args.in_path,
        extraction: &extraction,
    };
    match &args.manifest {
        Some(path) => {
            let f = File::create(path)
                .with_context(|| format!("create manifest '{}'", path.display()))?;
            serde_json::to_writer_pretty(f, &manifest).with_context(|| "write manifest JSON")?;
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            serde_json::to_writer_pretty(&mut stdout, &manifest)
                .with_context(|| "write manifest JSON")?;
            writeln!(stdout)?;
        }
    }

    for s in &extraction.skipped {
        eprintln!("skipped fragment {}: {} ({})", s.index, s.kind, s.message);
    }
    eprintln!(
        "wrote {} of {} frames to {}",
        extraction.frames.len(),
        extraction.fragment_count,
        out_dir.display()
    );
    Ok(())
}

fn cmd_info(args: InfoArgs) -> anyhow::Result<()> {
    let bytes = read_input(&args.in_path)?;
    let container = webp_frames::WebpContainer::parse(&bytes)
        .with_context(|| format!("parse '{}'", args.in_path.display()))?;

    let info = container.info();
    let fragments = (1..=info.fragment_count)
        .map(|i| {
            let index = webp_frames::FragmentIndex(i);
            match container.fragment(index) {
                Ok(f) => FragmentInfo {
                    index,
                    x: f.x_offset,
                    y: f.y_offset,
                    width: f.width,
                    height: f.height,
                    duration: f.duration_ms,
                    blend: Some(f.blend),
                    dispose: Some(f.dispose),
                    payload_bytes: f.payload.len(),
                    error: None,
                },
                Err(e) => FragmentInfo {
                    index,
                    error: Some(e.to_string()),
                    ..FragmentInfo::empty(index)
                },
            }
        })
        .collect();

    let report = InfoReport { info, fragments };
    let mut stdout = std::io::stdout().lock();
    serde_json::to_writer_pretty(&mut stdout, &report).with_context(|| "write info JSON")?;
    writeln!(stdout)?;
    Ok(())
}
