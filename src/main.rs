mod controller;
mod downsample;
mod input;
mod raster;
mod scene;
mod view;
mod waveform;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use log::info;
use macroquad::prelude::*;

use controller::InteractionController;
use input::HostInput;
use raster::Renderer;
use scene::Layout;
use waveform::Waveform;

const WINDOW_TITLE: &str = "Signal Viewer";
const SCREEN_WIDTH: i32 = 1000;
const SCREEN_HEIGHT: i32 = 400;
const BACKGROUND: Color = WHITE;

#[derive(Parser)]
#[command(name = "signal-viewer")]
#[command(about = "Zoomable viewer for binary waveform description files")]
struct Cli {
    /// File with optional TIMESTEP;/UNITS; records followed by DATA; and one 0/1 sample per line
    #[arg(default_value = "data.txt")]
    input: PathBuf,
}

fn main() {
    if let Err(err) = init_logging() {
        eprintln!("[startup] {err:?}");
    }

    let cli = Cli::parse();
    info!("opening {}", cli.input.display());
    let waveform = Waveform::load_or_empty(&cli.input);

    macroquad::Window::from_config(window_conf(), async move {
        let mut viewer = Viewer::new(waveform);
        loop {
            viewer.frame();
            next_frame().await;
        }
    });
}

fn init_logging() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp(None)
        .try_init()
        .context("failed to install the log backend")
}

fn window_conf() -> Conf {
    Conf {
        window_title: WINDOW_TITLE.into(),
        fullscreen: false,
        sample_count: 1,
        window_width: SCREEN_WIDTH,
        window_height: SCREEN_HEIGHT,
        window_resizable: true,
        high_dpi: false,
        ..Default::default()
    }
}

/// Application context: owns the loaded waveform and everything derived from input.
struct Viewer {
    waveform: Waveform,
    controller: InteractionController,
    renderer: Renderer,
    input: HostInput,
}

impl Viewer {
    fn new(waveform: Waveform) -> Self {
        Self {
            waveform,
            controller: InteractionController::default(),
            renderer: Renderer::default(),
            input: HostInput::default(),
        }
    }

    fn frame(&mut self) {
        let gestures = self.input.poll();
        let size = self.input.size();
        let layout = Layout::compute(size, self.waveform.len());
        for gesture in gestures {
            if self.controller.handle(gesture, &layout).needs_redraw() {
                self.renderer.invalidate();
            }
        }
        self.input.set_grabbing(self.controller.is_dragging());

        clear_background(BACKGROUND);
        let texture = self
            .renderer
            .present(&self.waveform, self.controller.view(), size);
        draw_texture_ex(
            texture,
            0.0,
            0.0,
            WHITE,
            DrawTextureParams {
                dest_size: Some(vec2(size.width as f32, size.height as f32)),
                ..Default::default()
            },
        );
    }
}
