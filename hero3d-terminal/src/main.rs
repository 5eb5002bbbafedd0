/// Hero3D Terminal Demo - Interactive hero scenes
///
/// Controls:
///   - Mouse drag: Rotate the scene
///   - Q/ESC: Quit
use clap::{Parser, ValueEnum};
use hero3d_core::{stl, Scene, SceneConfig};
use hero3d_terminal::TerminalApp;
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum SceneKind {
    Cube,
    Building,
    House,
}

#[derive(Debug, Parser)]
#[command(version, about = "Interactive 3D hero scenes in the terminal")]
struct Args {
    /// Scene to show (also the placeholder while a model loads)
    #[arg(short, long, value_enum, default_value_t = SceneKind::Building)]
    scene: SceneKind,

    /// STL model to load in the background and swap in when ready
    #[arg(short, long)]
    model: Option<PathBuf>,

    /// JSON file overriding scene constants
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Disable idle auto-rotation
    #[arg(long)]
    no_auto_rotate: bool,

    /// Target frames per second
    #[arg(long, default_value_t = 30)]
    fps: u32,

    /// Caption drawn on the bottom row
    #[arg(long)]
    caption: Option<String>,

    /// Log destination (stdout belongs to the renderer)
    #[arg(long, default_value = "hero3d-terminal.log")]
    log_file: PathBuf,
}

fn init_logging(path: &Path) -> io::Result<()> {
    let file = File::create(path)?;
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "hero3d_core=info,hero3d_terminal=info".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(Mutex::new(file)),
        )
        .init();
    Ok(())
}

fn load_config(args: &Args) -> io::Result<SceneConfig> {
    let mut config = match &args.config {
        Some(path) => {
            let text = std::fs::read_to_string(path)?;
            SceneConfig::from_json(&text)
                .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e.to_string()))?
        }
        None => SceneConfig::default(),
    };
    if args.no_auto_rotate {
        config.auto_rotate = false;
    }
    Ok(config)
}

fn build_scene(kind: SceneKind, config: &SceneConfig) -> io::Result<Scene> {
    let scene = match kind {
        SceneKind::Cube => Ok(Scene::single_cube(2.0, &config.palette)),
        SceneKind::Building => Scene::building(&config.palette),
        SceneKind::House => Scene::house(&config.palette),
    };
    scene.map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e.to_string()))
}

fn main() -> io::Result<()> {
    let args = Args::parse();
    init_logging(&args.log_file)?;

    let config = load_config(&args)?;
    let scene = build_scene(args.scene, &config)?;
    info!(scene = ?args.scene, meshes = scene.meshes().len(), "starting");

    let mut app = TerminalApp::new(scene, &config, args.fps)?;
    if let Some(caption) = &args.caption {
        app = app.with_caption(caption.clone());
    }

    // Parse the model off the UI thread; the render loop picks it up when done
    if let Some(path) = args.model.clone() {
        let (sender, receiver) = flume::bounded(1);
        let color = config
            .palette
            .first()
            .copied()
            .unwrap_or(hero3d_core::Rgb::GREY);
        std::thread::spawn(move || {
            let result = stl::load_stl(&path, color);
            if let Err(err) = &result {
                warn!(path = %path.display(), %err, "model load failed");
            }
            // The app may already have quit
            let _ = sender.send(result);
        });
        app = app.with_model_loads(receiver);
    }

    app.run()?;

    info!("exited cleanly");
    Ok(())
}
