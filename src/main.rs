use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use std::time::Instant;

use clap::Parser;
use softframe::display::{InputEvent, Key, Sdl2Host};
use softframe::spriteset::Spriteset;
use softframe::texture::{checkerboard_rgba, disc_rgba};
use softframe::{create_backend, Result, VideoBackend, VideoConfig};

const DEFAULT_CONFIG: &str = "softframe.json";
const FRAME_DUMP: &str = "frame.ppm";

const TILE: u32 = 8;
const SPRITE: u32 = 32;

#[derive(Parser, Debug)]
#[command(name = "softframe")]
#[command(about = "Software sprite compositor demo", long_about = None)]
struct Cli {
    /// JSON config file (defaults are used if it can't be read)
    #[arg(long, default_value = DEFAULT_CONFIG)]
    config: PathBuf,

    /// Window width
    #[arg(short = 'W', long)]
    width: Option<u32>,

    /// Window height
    #[arg(short = 'H', long)]
    height: Option<u32>,

    /// Backbuffer size, e.g. 320x240
    #[arg(long, value_parser = parse_size)]
    backbuffer: Option<(u32, u32)>,

    /// Start fullscreen
    #[arg(long)]
    fullscreen: bool,

    /// Fullscreen resolution index (see --list-resolutions)
    #[arg(long)]
    resolution: Option<usize>,

    /// Let the window be resized by dragging
    #[arg(long)]
    resizable: bool,

    /// Disable VSync for uncapped framerate
    #[arg(long = "no-vsync")]
    no_vsync: bool,

    /// Print the display's resolutions and exit
    #[arg(long)]
    list_resolutions: bool,
}

/// Parse `WxH` (e.g. 320x240)
fn parse_size(s: &str) -> std::result::Result<(u32, u32), String> {
    let (w, h) = s
        .split_once('x')
        .ok_or_else(|| format!("expected WxH, got '{}'", s))?;
    let w = w.parse::<u32>().map_err(|e| e.to_string())?;
    let h = h.parse::<u32>().map_err(|e| e.to_string())?;
    Ok((w, h))
}

fn load_config(cli: &Cli) -> VideoConfig {
    let mut cfg = VideoConfig::load(&cli.config).unwrap_or_else(|e| {
        log::info!("Using default config ({}: {})", cli.config.display(), e);
        VideoConfig::default()
    });

    if let Some(w) = cli.width {
        cfg.window_width = w;
    }
    if let Some(h) = cli.height {
        cfg.window_height = h;
    }
    if let Some((w, h)) = cli.backbuffer {
        cfg.backbuffer_width = w;
        cfg.backbuffer_height = h;
    }
    if let Some(index) = cli.resolution {
        cfg.resolution = index;
    }
    cfg.fullscreen |= cli.fullscreen;
    cfg.resizable |= cli.resizable;
    cfg.vsync &= !cli.no_vsync;
    cfg
}

/// Write the composited frame as a binary PPM, via the two-phase read-back
fn dump_frame(backend: &dyn VideoBackend, path: &str) -> Result<()> {
    let len = backend.backbuffer_data(None)?;
    let mut data = vec![0u8; len];
    backend.backbuffer_data(Some(&mut data))?;
    let (w, h) = backend.backbuffer_dimensions()?;

    let mut file = BufWriter::new(File::create(path)?);
    write!(file, "P6\n{} {}\n255\n", w, h)?;
    file.write_all(&data)?;
    file.flush()?;
    Ok(())
}

/// Keyed sprite: a disc with an eye on its right side, so flipping shows
fn sprite_rgba(color: (u8, u8, u8)) -> Vec<u8> {
    let mut data = disc_rgba(SPRITE, color);
    for y in 10..16 {
        for x in 20..26 {
            let i = ((y * SPRITE + x) * 4) as usize;
            data[i..i + 4].copy_from_slice(&[16, 16, 16, 255]);
        }
    }
    data
}

fn report(action: &str, result: Result<()>) {
    if let Err(e) = result {
        log::debug!("{} failed: {}", action, e);
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let cfg = load_config(&cli);

    let host = Sdl2Host::new()?;
    let mut backend = create_backend(cfg.backend, host)?;

    if cli.list_resolutions {
        for i in 0..backend.count_resolutions() {
            let res = backend.resolution(i)?;
            println!(
                "{:3}: {} x {} @ {}Hz",
                i, res.width, res.height, res.refresh_rate
            );
        }
        return Ok(());
    }

    if cfg.fullscreen {
        backend.init_window_fullscreen(
            cfg.resolution,
            cfg.backbuffer_width,
            cfg.backbuffer_height,
            &cfg.title,
            cfg.resizable,
            cfg.vsync,
        )?;
    } else {
        backend.init_window(
            cfg.window_width,
            cfg.window_height,
            cfg.backbuffer_width,
            cfg.backbuffer_height,
            &cfg.title,
            cfg.resizable,
            cfg.vsync,
        )?;
        if cfg.resolution != 0 {
            backend.set_resolution(cfg.resolution)?;
        }
    }
    backend.set_background_color(cfg.background)?;

    let tiles = backend.load_texture(
        &checkerboard_rgba(2 * TILE, TILE, (40, 44, 52), (60, 66, 80)),
        2 * TILE,
        2 * TILE,
    )?;
    let tiles = Spriteset::new(tiles, 2 * TILE, 2 * TILE, TILE, TILE)?;
    let sprite = backend.load_texture(&sprite_rgba((255, 187, 51)), SPRITE, SPRITE)?;
    let sprite = Spriteset::new(sprite, SPRITE, SPRITE, SPRITE, SPRITE)?;

    let (bb_w, bb_h) = backend.backbuffer_dimensions()?;
    let mut resolution = cfg.resolution;
    let mut fullscreen = cfg.fullscreen;

    println!("=== softframe ===");
    println!("Backbuffer: {}x{}", bb_w, bb_h);
    println!("Controls:");
    println!("  F          - Toggle fullscreen");
    println!("  R          - Next fullscreen resolution");
    println!("  + / -      - Grow / shrink window");
    println!("  P          - Save frame to {}", FRAME_DUMP);
    println!("  I          - Log draw info");
    println!("  Click      - Log backbuffer coordinates");
    println!("  Escape     - Quit");

    let mut pos = (20.0f32, 30.0f32);
    let mut vel = (70.0f32, 45.0f32);
    let mut scroll = 0.0f32;
    let mut last = Instant::now();

    'main: loop {
        for event in backend.poll_events() {
            match event {
                InputEvent::Quit | InputEvent::KeyDown(Key::Escape) => break 'main,
                InputEvent::KeyDown(Key::Char('f')) => {
                    let result = if fullscreen {
                        backend.set_windowed()
                    } else {
                        backend.set_fullscreen()
                    };
                    if result.is_ok() {
                        fullscreen = !fullscreen;
                    }
                    report("mode switch", result);
                },
                InputEvent::KeyDown(Key::Char('r')) => {
                    let count = backend.count_resolutions().max(1);
                    resolution = (resolution + 1) % count;
                    report("resolution change", backend.set_resolution(resolution));
                },
                InputEvent::KeyDown(key @ (Key::Plus | Key::Minus)) => {
                    if let Ok((w, h)) = backend.dimensions() {
                        let (w, h) = if key == Key::Plus {
                            (w + bb_w, h + bb_h)
                        } else {
                            (w.saturating_sub(bb_w), h.saturating_sub(bb_h))
                        };
                        report("resize", backend.set_dimensions(w, h));
                    }
                },
                InputEvent::KeyDown(Key::Char('p')) => match dump_frame(backend.as_ref(), FRAME_DUMP) {
                    Ok(()) => log::info!("Frame saved to {}", FRAME_DUMP),
                    Err(e) => log::warn!("Frame dump failed: {}", e),
                },
                InputEvent::KeyDown(Key::Char('i')) => {
                    if let Ok(info) = backend.draw_info() {
                        log::info!(
                            "Last frame: {} sprites in {} batches, {:.1} fps",
                            info.sprites,
                            info.batched,
                            backend.frame_clock().average_fps()
                        );
                    }
                },
                InputEvent::MouseDown { x, y, button } => {
                    if let Ok((bx, by)) = backend.window_to_backbuffer(x, y) {
                        log::info!("{:?} click at ({}, {}) -> backbuffer ({}, {})", button, x, y, bx, by);
                    }
                },
                // Desktop fullscreen reports the display size, not a user resize
                InputEvent::Resized { width, height } if !fullscreen => {
                    report("resize", backend.set_dimensions(width, height));
                },
                _ => {},
            }
        }

        let now = Instant::now();
        let dt = now.duration_since(last).as_secs_f32().min(0.1);
        last = now;

        pos.0 += vel.0 * dt;
        pos.1 += vel.1 * dt;
        let max_x = bb_w.saturating_sub(SPRITE) as f32;
        let max_y = bb_h.saturating_sub(SPRITE) as f32;
        if pos.0 < 0.0 || pos.0 > max_x {
            vel.0 = -vel.0;
            pos.0 = pos.0.clamp(0.0, max_x);
        }
        if pos.1 < 0.0 || pos.1 > max_y {
            vel.1 = -vel.1;
            pos.1 = pos.1.clamp(0.0, max_y);
        }
        scroll = (scroll + 12.0 * dt) % (TILE as f32 * 2.0);

        backend.draw_begin()?;

        // Scrolling tile floor, one tile of overhang on each side to exercise clipping
        let offset = scroll as i32;
        let cols = (bb_w / TILE) as i32 + 2;
        let rows = (bb_h / TILE) as i32 + 2;
        for row in 0..rows {
            for col in 0..cols {
                let tile = (row + col) % 4;
                backend.draw_tile(
                    &tiles,
                    (col - 1) * TILE as i32 - offset,
                    (row - 1) * TILE as i32 + offset,
                    tile,
                    false,
                )?;
            }
        }

        // Facing the direction of travel
        backend.draw_tile(&sprite, pos.0 as i32, pos.1 as i32, 0, vel.0 < 0.0)?;

        backend.draw_end()?;
    }

    Ok(())
}
