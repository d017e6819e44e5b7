use std::path::PathBuf;

use anyhow::Context as _;
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "pixelgrab", version)]
struct Cli {
    #[command(flatten)]
    common: CommonArgs,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Args, Debug)]
struct CommonArgs {
    /// JSON config file; flags below override its values.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Main site origin.
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Backup storage origin.
    #[arg(long, global = true)]
    storage_url: Option<String>,

    /// Worker threads per tile batch (bounds concurrent requests).
    #[arg(long, global = true)]
    threads: Option<usize>,

    /// Log every request and retry.
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List the canvases that can be downloaded.
    Canvases,
    /// Download the current state of an area as one PNG.
    Area(AreaArgs),
    /// Download the day-by-day history of an area as numbered PNG frames.
    History(HistoryArgs),
}

#[derive(Parser, Debug)]
struct AreaArgs {
    /// Canvas id (see `pixelgrab canvases`).
    canvas: String,

    /// Top-left corner as X_Y (inclusive).
    top_left: String,

    /// Bottom-right corner as X_Y (inclusive).
    bottom_right: String,

    /// Output PNG path.
    out: PathBuf,
}

#[derive(Parser, Debug)]
struct HistoryArgs {
    /// Canvas id (see `pixelgrab canvases`).
    canvas: String,

    /// Top-left corner as X_Y (inclusive).
    top_left: String,

    /// Bottom-right corner as X_Y (inclusive).
    bottom_right: String,

    /// First day, YYYY-MM-DD.
    start: NaiveDate,

    /// Last day (inclusive), YYYY-MM-DD. Defaults to today.
    end: Option<NaiveDate>,

    /// Directory receiving t1.png, t2.png, ...
    #[arg(long, default_value = "timelapse")]
    out_dir: PathBuf,

    /// Keep every n-th time slice of a day.
    #[arg(long)]
    frame_skip: Option<usize>,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.common.verbose);

    let mut cfg = load_config(&cli.common)?;
    match cli.cmd {
        Command::Canvases => cmd_canvases(&cfg),
        Command::Area(args) => cmd_area(&cfg, args),
        Command::History(args) => {
            if let Some(n) = args.frame_skip {
                cfg.frame_skip = n;
            }
            cmd_history(&cfg, args)
        }
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn load_config(args: &CommonArgs) -> anyhow::Result<pixelgrab::GrabConfig> {
    let mut cfg = match &args.config {
        Some(path) => pixelgrab::GrabConfig::from_path(path)?,
        None => pixelgrab::GrabConfig::default(),
    };
    if let Some(url) = &args.api_url {
        cfg.api_url = url.clone();
    }
    if let Some(url) = &args.storage_url {
        cfg.storage_url = url.clone();
    }
    if args.threads.is_some() {
        cfg.threads = args.threads;
    }
    cfg.validate()?;
    Ok(cfg)
}

fn fetch_me(
    cfg: &pixelgrab::GrabConfig,
    connector: &pixelgrab::HttpConnector,
) -> anyhow::Result<pixelgrab::ApiMe> {
    use pixelgrab::Connect as _;

    let session = connector.connect()?;
    let endpoints = pixelgrab::Endpoints::from_config(cfg);
    let fetcher = pixelgrab::TileFetcher::new(
        session.as_ref(),
        &endpoints,
        cfg.tile_retry,
        cfg.metadata_retry,
    );
    let me = fetcher.fetch_me().context("fetch canvas metadata")?;
    Ok(me)
}

fn canvas_list(me: &pixelgrab::ApiMe) -> String {
    me.flat_canvases()
        .iter()
        .map(|(id, title)| format!("{id} = {title}"))
        .collect::<Vec<_>>()
        .join(", ")
}

fn lookup_canvas<'m>(
    me: &'m pixelgrab::ApiMe,
    id: &str,
) -> anyhow::Result<&'m pixelgrab::CanvasMeta> {
    let canvas = me
        .canvas(id)
        .with_context(|| format!("available canvases: {}", canvas_list(me)))?;
    canvas.ensure_2d()?;
    Ok(canvas)
}

fn cmd_canvases(cfg: &pixelgrab::GrabConfig) -> anyhow::Result<()> {
    let connector = pixelgrab::HttpConnector::from_config(cfg);
    let me = fetch_me(cfg, &connector)?;
    for (id, title) in me.flat_canvases() {
        let size = me.canvas(id).map(|c| c.size)?;
        println!("{id}\t{size}\t{title}");
    }
    Ok(())
}

fn cmd_area(cfg: &pixelgrab::GrabConfig, args: AreaArgs) -> anyhow::Result<()> {
    let connector = pixelgrab::HttpConnector::from_config(cfg);
    let me = fetch_me(cfg, &connector)?;
    let canvas = lookup_canvas(&me, &args.canvas)?;
    let region = pixelgrab::parse_corners(&args.top_left, &args.bottom_right, canvas.size)?;

    let img = pixelgrab::download_area(&connector, cfg, &args.canvas, canvas, region)?;
    pixelgrab::save_png(&args.out, &img)?;

    eprintln!("wrote {}", args.out.display());
    Ok(())
}

fn cmd_history(cfg: &pixelgrab::GrabConfig, args: HistoryArgs) -> anyhow::Result<()> {
    let connector = pixelgrab::HttpConnector::from_config(cfg);
    let me = fetch_me(cfg, &connector)?;
    let canvas = lookup_canvas(&me, &args.canvas)?;
    let region = pixelgrab::parse_corners(&args.top_left, &args.bottom_right, canvas.size)?;

    let end = args
        .end
        .unwrap_or_else(|| chrono::Local::now().date_naive());
    let days = pixelgrab::DayRange::new(args.start, end)?;

    let mut sink = pixelgrab::PngDirSink::create(&args.out_dir)?;
    let stats = pixelgrab::download_history(
        &connector,
        cfg,
        &args.canvas,
        canvas,
        region,
        days,
        &mut sink,
    )?;

    eprintln!(
        "wrote {} frames for {} days into {}",
        stats.frames,
        stats.days,
        args.out_dir.display()
    );
    eprintln!("to create a timelapse from it:");
    eprintln!(
        "ffmpeg -framerate 15 -f image2 -i {}/t%d.png -c:v libvpx-vp9 -pix_fmt yuva420p output.webm",
        args.out_dir.display()
    );
    Ok(())
}
