// SPDX-License-Identifier: CEPL-1.0
#![deny(unsafe_op_in_unsafe_fn)]
use anyhow::{Context, Result};
use clap::Parser;
use coral_core::{init_tracing, or_exit};
use coral_render::{PresentModePreference, Renderer, RendererContext, RendererOptions};
use coral_render_vk::VkRenderer;
use tracing::{info, warn};

use coral_platform::winit::{
    application::ApplicationHandler,
    event::WindowEvent,
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    window::WindowId,
};
use coral_platform::{Window, WindowDesc};

use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Config file to read
    #[arg(long, default_value = "coral.toml")]
    config: PathBuf,
    /// Request the Khronos validation layer
    #[arg(long)]
    validation: bool,
    /// Try integrated GPUs before discrete ones
    #[arg(long)]
    integrated: bool,
    /// Present with FIFO even when mailbox is available
    #[arg(long)]
    fifo: bool,
}

#[derive(Debug, Deserialize, Clone)]
struct WindowCfg {
    #[serde(default = "default_title")]
    title: String,
    #[serde(default = "default_width")]
    width: u32,
    #[serde(default = "default_height")]
    height: u32,
    #[serde(default = "default_true")]
    resizable: bool,
}

#[derive(Debug, Deserialize, Clone, Copy)]
struct RenderCfg {
    #[serde(default)]
    validation: bool,
    #[serde(default = "default_true")]
    prefer_discrete: bool,
    #[serde(default)]
    present_mode: PresentModeCfg,
    #[serde(default = "default_image_count")]
    image_count: u32,
}

#[derive(Debug, Clone, Copy, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
enum PresentModeCfg {
    Fifo,
    #[default]
    Mailbox,
}

#[derive(Debug, Deserialize, Default)]
struct AppCfg {
    #[serde(default)]
    window: WindowCfg,
    #[serde(default)]
    render: RenderCfg,
}

impl Default for WindowCfg {
    fn default() -> Self {
        WindowCfg {
            title: default_title(),
            width: default_width(),
            height: default_height(),
            resizable: true,
        }
    }
}

impl Default for RenderCfg {
    fn default() -> Self {
        RenderCfg {
            validation: false,
            prefer_discrete: true,
            present_mode: PresentModeCfg::Mailbox,
            image_count: default_image_count(),
        }
    }
}

fn default_title() -> String {
    String::from("coral")
}
fn default_width() -> u32 {
    1280
}
fn default_height() -> u32 {
    720
}
fn default_true() -> bool {
    true
}
fn default_image_count() -> u32 {
    3
}

fn load_cfg(path: &Path) -> AppCfg {
    match fs::read_to_string(path) {
        Ok(s) => toml::from_str::<AppCfg>(&s).unwrap_or_else(|e| {
            warn!("ignoring {}: {e}", path.display());
            AppCfg::default()
        }),
        Err(_) => AppCfg::default(),
    }
}

impl AppCfg {
    fn apply_args(&mut self, args: &Args) {
        if args.validation {
            self.render.validation = true;
        }
        if args.integrated {
            self.render.prefer_discrete = false;
        }
        if args.fifo {
            self.render.present_mode = PresentModeCfg::Fifo;
        }
    }

    fn window_desc(&self) -> WindowDesc {
        WindowDesc {
            title: self.window.title.clone(),
            width: self.window.width,
            height: self.window.height,
            resizable: self.window.resizable,
        }
    }

    fn renderer_options(&self) -> RendererOptions {
        RendererOptions {
            enable_validation: self.render.validation,
            prefer_discrete: self.render.prefer_discrete,
            present_mode: match self.render.present_mode {
                PresentModeCfg::Fifo => PresentModePreference::Fifo,
                PresentModeCfg::Mailbox => PresentModePreference::Mailbox,
            },
            desired_image_count: self.render.image_count,
        }
    }
}

struct App {
    cfg: AppCfg,
    window: Option<Window>,
    renderer: Option<VkRenderer>,
    exiting: bool,
}

impl App {
    fn start(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let window = Window::create(event_loop, &self.cfg.window_desc())?;
        let target = window.surface_target()?;

        let mut ctx = RendererContext::new(self.cfg.window.title.clone(), window.framebuffer_size());
        ctx.required_extensions = coral_render_vk::required_extensions(target.display)
            .context("querying presentation extensions")?;
        ctx.options = self.cfg.renderer_options();

        let mut renderer = VkRenderer::load()?;
        renderer.init(&ctx, &target)?;

        self.window = Some(window);
        self.renderer = Some(renderer);
        Ok(())
    }

    fn frame(&mut self) -> Result<()> {
        let (Some(window), Some(renderer)) = (self.window.as_mut(), self.renderer.as_mut()) else {
            return Ok(());
        };
        renderer.begin_frame(window)?;
        renderer.end_frame()
    }

    fn stop(&mut self, event_loop: &ActiveEventLoop) {
        self.exiting = true;
        if let Some(mut renderer) = self.renderer.take() {
            renderer.shutdown();
        }
        self.window = None;
        event_loop.exit();
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_none() {
            or_exit(self.start(event_loop));
        }
        event_loop.set_control_flow(ControlFlow::Poll);
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        window_id: WindowId,
        event: WindowEvent,
    ) {
        let Some(window) = self.window.as_mut() else {
            return;
        };
        if window_id != window.id() {
            return;
        }
        window.observe(&event);

        if window.should_close() {
            info!("close requested");
            self.stop(event_loop);
            return;
        }

        if let WindowEvent::RedrawRequested = event {
            if !self.exiting {
                or_exit(self.frame());
            }
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if self.exiting {
            return;
        }
        if let Some(w) = &self.window {
            w.request_redraw();
        }
    }
}

fn main() -> Result<()> {
    init_tracing();
    let args = Args::parse();

    let mut cfg = load_cfg(&args.config);
    cfg.apply_args(&args);
    info!("render cfg = {:?}", cfg.render);

    let event_loop: EventLoop<()> = EventLoop::new()?;
    let mut app = App {
        cfg,
        window: None,
        renderer: None,
        exiting: false,
    };

    event_loop.run_app(&mut app)?;
    Ok(())
}
