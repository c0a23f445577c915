//! Headless flight over a planet or flat terrain.
//!
//! Runs the full per-frame loop (selection, texture provisioning, drawing)
//! against a recording device and reports LOD statistics.
//!
//! Usage: cargo run --release -- [OPTIONS]
//!
//! Options:
//!   --config <PATH>          Load a JSON surface config (default: built-in planet)
//!   --radius <METERS>        Override the planet radius
//!   --flat <METERS>          Use flat terrain of this width instead of a planet
//!   --frames <N>             Frames to simulate (default: 240)
//!   --end-altitude <METERS>  Final altitude above the surface (default: 100)
//!   --save-config <PATH>     Write the effective config as JSON and continue
//!   --dump-heightmap <PNG>   Write the first root's height map as a PNG

use std::path::PathBuf;
use std::time::Instant;

use quadsphere::core::logging;
use quadsphere::core::types::{DVec3, Result};
use quadsphere::lod::PatchKey;
use quadsphere::render::{EffectHandle, RecordingDevice};
use quadsphere::{Camera, Surface, SurfaceConfig, SurfaceShape};

const SUN_DIRECTION: DVec3 = DVec3::X;

fn main() {
    logging::init();

    if let Err(e) = run() {
        log::error!("{}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let args: Vec<String> = std::env::args().collect();

    let mut config = match parse_str_arg(&args, "--config") {
        Some(path) => SurfaceConfig::load(&PathBuf::from(path))?,
        None => SurfaceConfig::default(),
    };
    if let Some(radius) = parse_f64_arg(&args, "--radius") {
        config.shape = SurfaceShape::Planet { radius };
    }
    if let Some(width) = parse_f64_arg(&args, "--flat") {
        config.shape = SurfaceShape::Flat { width };
    }
    let frames = parse_usize_arg(&args, "--frames").unwrap_or(240).max(1);
    let end_altitude = parse_f64_arg(&args, "--end-altitude").unwrap_or(100.0).max(1.0);

    if let Some(path) = parse_str_arg(&args, "--save-config") {
        config.save(&PathBuf::from(&path))?;
        println!("Config written to {}", path);
    }

    let mut surface = Surface::with_fractal(config.clone())?;
    let mut device = RecordingDevice::new();
    surface.initialise(&mut device, EffectHandle(0))?;

    if let Some(path) = parse_str_arg(&args, "--dump-heightmap") {
        let face = &surface.faces()[0];
        let key = PatchKey::new(0, face.roots()[0]);
        if let Some(map) = surface.height_map(key) {
            map.save_png(&PathBuf::from(&path))?;
            println!("Root height map ({:.1}..{:.1}) written to {}", map.min(), map.max(), path);
        }
    }

    let size = config.shape.root_width();
    let start_altitude = size * 4.0;

    println!("=== Quadsphere Flight ===");
    println!("Shape:     {:?}", config.shape);
    println!("Grid:      {}x{}", config.grid_size, config.grid_size);
    println!("Max level: {}", surface.max_level());
    println!("Frames:    {}", frames);
    println!("Altitude:  {:.0} -> {:.0}", start_altitude, end_altitude);
    println!();

    let start = Instant::now();
    let mut peak_patches = 0;
    let mut peak_textures = 0;

    for frame in 0..frames {
        let t = frame as f64 / (frames - 1).max(1) as f64;
        // Exponential descent so each frame covers a similar share of the remaining height
        let altitude = start_altitude * (end_altitude / start_altitude).powf(t);
        let camera = flight_camera(config.shape, altitude, t);

        device.clear_draws();
        let stats = surface.frame(&mut device, &camera, SUN_DIRECTION)?;
        peak_patches = peak_patches.max(stats.selection.visible);
        peak_textures = peak_textures.max(device.live_textures());

        if frame % 20 == 0 || frame + 1 == frames {
            log::info!(
                "frame {:4}: altitude {:>12.1}, depth {:2}, patches {:5} {:?}, culled {:4}, draws {:5}, textures {:6}",
                frame,
                altitude,
                stats.selection.deepest_level,
                stats.selection.visible,
                stats.selection.visible_per_face,
                stats.selection.culled,
                stats.draw.draw_calls,
                device.live_textures()
            );
        }
    }

    let elapsed = start.elapsed();
    println!();
    println!("=== Summary ===");
    println!("Frames:          {} in {:.2?} ({:.2?}/frame)", frames, elapsed, elapsed / frames as u32);
    println!("Deepest level:   {}", surface.deepest_level());
    println!("Final patches:   {}", surface.patch_count());
    println!("Peak patches:    {}", peak_patches);
    println!("Peak textures:   {}", peak_textures);
    println!("Textures made:   {}", device.textures_created());
    println!("Textures freed:  {}", device.textures_released());

    surface.release(&mut device);
    Ok(())
}

/// Camera for normalised flight time `t` at `altitude` above the surface,
/// drifting sideways and looking at the ground ahead.
fn flight_camera(shape: SurfaceShape, altitude: f64, t: f64) -> Camera {
    match shape {
        SurfaceShape::Planet { radius } => {
            let angle = t * 0.5;
            let dir = DVec3::new(angle.sin(), angle.cos(), 0.0);
            let ahead = DVec3::new((angle + 0.05).sin(), (angle + 0.05).cos(), 0.0) * radius;
            Camera::look_at(dir * (radius + altitude), ahead, dir)
        }
        SurfaceShape::Flat { width } => {
            let x = (t - 0.5) * width * 0.5;
            let position = DVec3::new(x, altitude, 0.0);
            Camera::look_at(position, DVec3::new(x + width * 0.05, 0.0, 0.0), DVec3::Y)
        }
    }
}

fn parse_f64_arg(args: &[String], flag: &str) -> Option<f64> {
    args.iter().position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .and_then(|s| s.parse().ok())
}

fn parse_usize_arg(args: &[String], flag: &str) -> Option<usize> {
    args.iter().position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .and_then(|s| s.parse().ok())
}

fn parse_str_arg(args: &[String], flag: &str) -> Option<String> {
    args.iter().position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .cloned()
}
