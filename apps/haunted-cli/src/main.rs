use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use glam::Vec2;
use haunted_assets::TextureLoader;
use haunted_house::{GraveOptions, HauntedHouse, HouseOptions, build_haunted_house};
use haunted_render::{
    DebugTextRenderer, DragMode, FrameLoop, FrameSnapshot, ManualScheduler, OrbitControls,
    Renderer, Viewport,
};
use haunted_scene::Scene;
use haunted_tools::{DebugPanel, SceneInspector};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "haunted-cli", about = "CLI tool for the haunted house scene")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print version and crate info
    Info,
    /// Build the scene and print its node tree
    Inspect {
        /// Print JSON instead of an indented listing
        #[arg(long)]
        json: bool,
        #[command(flatten)]
        scene: SceneArgs,
    },
    /// Run the frame loop headlessly against the text renderer
    Frames {
        /// Number of frames to run
        #[arg(short, long, default_value = "60")]
        count: u64,
        /// Logical viewport width
        #[arg(long, default_value = "1280")]
        width: u32,
        /// Logical viewport height
        #[arg(long, default_value = "720")]
        height: u32,
        /// Device pixel ratio to simulate
        #[arg(long, default_value = "1.0")]
        pixel_ratio: f64,
        /// Horizontal rotate drag, in pixels, applied before the first frame
        #[arg(long, default_value = "0")]
        drag: f32,
        /// Ambient light intensity, set through the debug panel
        #[arg(long)]
        ambient: Option<f32>,
        #[command(flatten)]
        scene: SceneArgs,
    },
}

#[derive(Args)]
struct SceneArgs {
    /// Directory holding textures/; omit to build with flat colors only
    #[arg(long)]
    asset_root: Option<PathBuf>,
    /// Give the door its texture maps and make it transparent
    #[arg(long)]
    textured_door: bool,
    /// Give the floor grass texture maps
    #[arg(long)]
    textured_grass: bool,
    /// Scatter this many graves around the house
    #[arg(long)]
    graves: Option<usize>,
    /// Seed for grave placement
    #[arg(long, default_value = "42")]
    seed: u64,
}

impl SceneArgs {
    fn options(&self) -> HouseOptions {
        HouseOptions {
            textured_door: self.textured_door,
            textured_grass: self.textured_grass,
            graves: self.graves.map(|count| GraveOptions {
                count,
                seed: self.seed,
            }),
        }
    }

    fn build(&self, aspect: f32) -> anyhow::Result<(Scene, HauntedHouse)> {
        let mut scene = Scene::new();
        let mut loader = self.asset_root.as_ref().map(TextureLoader::new);
        let house = build_haunted_house(&mut scene, loader.as_mut(), aspect, &self.options())
            .context("failed to build the haunted house")?;
        if let Some(loader) = loader {
            tracing::info!(
                "loaded {} textures from {}",
                loader.store().len(),
                loader.root().display()
            );
        }
        Ok((scene, house))
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    match cli.command {
        Commands::Info => {
            println!("haunted-cli v{}", env!("CARGO_PKG_VERSION"));
            println!("assets: {}", haunted_assets::crate_info());
            println!("render: {}", haunted_render::crate_info());
            println!("tools: {}", haunted_tools::crate_info());
            let (scene, _) = SceneArgs {
                asset_root: None,
                textured_door: false,
                textured_grass: false,
                graves: None,
                seed: 42,
            }
            .build(16.0 / 9.0)?;
            println!("{}", SceneInspector::summary(&scene));
        }
        Commands::Inspect { json, scene } => {
            let (scene, _) = scene.build(16.0 / 9.0)?;
            if json {
                let report = serde_json::json!({
                    "summary": SceneInspector::summary(&scene),
                    "nodes": SceneInspector::tree(&scene),
                });
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                println!("{}", SceneInspector::summary(&scene));
                print!("{}", SceneInspector::tree_text(&scene));
            }
        }
        Commands::Frames {
            count,
            width,
            height,
            pixel_ratio,
            drag,
            ambient,
            scene,
        } => {
            let mut viewport = Viewport::new(width, height, pixel_ratio);
            let (mut scene, house) = scene.build(viewport.aspect())?;

            let panel = DebugPanel::for_lights(house.ambient_light, house.moon_light);
            if let Some(value) = ambient {
                let written = panel.set(&mut scene, 0, value)?;
                println!("ambient intensity = {written}");
            }

            let mut renderer = DebugTextRenderer::default();
            {
                let (camera, _) = scene.camera_mut(house.camera)?;
                renderer.resize(viewport.resize(width, height, pixel_ratio, camera));
            }

            let mut controls = OrbitControls::default().with_damping();
            if drag != 0.0 {
                let (camera, transform) = scene.camera_mut(house.camera)?;
                controls.pointer_down(DragMode::Rotate, Vec2::ZERO);
                controls.pointer_move(Vec2::new(drag, 0.0), height as f32, camera, transform);
                controls.pointer_up();
            }

            let scheduler = ManualScheduler::new();
            let mut frame_loop = FrameLoop::new();
            frame_loop.start(&scheduler);

            let mut report = String::new();
            while frame_loop.frames_rendered() < count && scheduler.take_request() {
                let Some(time) = frame_loop.begin_frame() else {
                    break;
                };
                let (_, transform) = scene.camera_mut(house.camera)?;
                controls.update(transform);
                let snapshot = FrameSnapshot::extract(&scene, house.camera)?;
                report = renderer.render(&scene, &snapshot);
                tracing::debug!("frame {} at {:.4}s", time.frame, time.elapsed);
                frame_loop.end_frame(&scheduler);
            }
            frame_loop.stop();

            println!(
                "Ran {} frames ({} requested)",
                frame_loop.frames_rendered(),
                scheduler.total_requests()
            );
            print!("{report}");
        }
    }

    Ok(())
}
