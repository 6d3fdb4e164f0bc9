pub mod app;
pub mod camera;
pub mod engine;
pub mod gesture;
pub mod pointer;
pub mod settings;
pub mod tracking;
pub mod utils;

use anyhow::{bail, Context, Result};
use clap::Parser;
use std::time::Duration;

use app::{activation::stdin_activation, cli::Cli, VirtualMouseApp};
use camera::{FrameSource, ImageSequenceGrabber, ThreadedFrameSource};
use engine::Engine;
use settings::Config;
use tracking::{LandmarkDetector, SubprocessDetector};

pub fn run() -> Result<()> {
    let cli = Cli::parse();
    let mut config = Config::load(cli.config.as_deref())?;
    cli.apply(&mut config);

    if let Some(path) = &cli.save_config {
        config.persist(path)?;
        println!("Settings written to {}", path.display());
        return Ok(());
    }

    utils::logging::init_logging(&config.logging)?;
    log::info!("Virtual mouse starting up...");

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .thread_name("virtual-mouse")
        .build()
        .context("failed to build tokio runtime")?;
    let result = runtime.block_on(run_app(config));
    // A detector stuck in a blocking read must not keep the process alive.
    runtime.shutdown_timeout(Duration::from_secs(1));
    result
}

async fn run_app(config: Config) -> Result<()> {
    let engine = Engine::new(
        config.clone(),
        frame_source(&config)?,
        landmark_detector(&config)?,
        pointer::system_pointer()?,
    );
    let mut app = VirtualMouseApp::new(config, engine);

    let controls = app.controls();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                log::info!("interrupt received, shutting down");
                controls.shutdown();
            }
            Err(err) => log::warn!("failed to listen for ctrl-c: {err}"),
        }
    });

    let activation = stdin_activation()?;
    app.run(activation).await
}

fn frame_source(config: &Config) -> Result<Box<dyn FrameSource>> {
    match &config.camera.frames_dir {
        Some(dir) => Ok(Box::new(ThreadedFrameSource::new(
            config.camera.clone(),
            ImageSequenceGrabber::new(dir),
        ))),
        None => bail!(
            "no camera backend configured for index {}; set camera.frames_dir or pass --frames-dir",
            config.camera.index
        ),
    }
}

fn landmark_detector(config: &Config) -> Result<Box<dyn LandmarkDetector>> {
    match &config.app.detector_command {
        Some(command) => Ok(Box::new(SubprocessDetector::spawn(command)?)),
        None => bail!(
            "no landmark detector configured; set app.detector_command or pass --detector"
        ),
    }
}
