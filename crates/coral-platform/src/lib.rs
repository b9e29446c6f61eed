// SPDX-License-Identifier: CEPL-1.0
//! Window collaborator: owns the native window, exposes the handles the
//! renderer binds its surface to, and turns window events into the two
//! signals the frame loop cares about (resize and close).

use anyhow::{Context, Result};
use coral_render::{RenderSize, ResizeSlot, ResizeSource, SurfaceTarget};
use tracing::{debug, info};

pub use winit;

use winit::{
    dpi::PhysicalSize,
    event::WindowEvent,
    event_loop::ActiveEventLoop,
    raw_window_handle::{HasDisplayHandle, HasWindowHandle},
    window::WindowId,
};

#[derive(Clone, Debug)]
pub struct WindowDesc {
    pub title: String,
    pub width: u32,
    pub height: u32,
    pub resizable: bool,
}

impl Default for WindowDesc {
    fn default() -> Self {
        Self {
            title: String::from("coral"),
            width: 1280,
            height: 720,
            resizable: true,
        }
    }
}

/// Resize and close state collected from window events between frames.
#[derive(Debug, Default)]
pub struct WindowSignals {
    resize: ResizeSlot,
    close_requested: bool,
}

impl WindowSignals {
    pub fn observe(&mut self, event: &WindowEvent) {
        match event {
            WindowEvent::Resized(size) => {
                debug!("framebuffer resized to {}x{}", size.width, size.height);
                self.resize.post(RenderSize::new(size.width, size.height));
            }
            WindowEvent::CloseRequested => self.close_requested = true,
            _ => {}
        }
    }

    pub fn should_close(&self) -> bool {
        self.close_requested
    }
}

impl ResizeSource for WindowSignals {
    fn take_resize(&mut self) -> Option<RenderSize> {
        self.resize.take_resize()
    }
}

pub struct Window {
    inner: winit::window::Window,
    signals: WindowSignals,
}

impl Window {
    pub fn create(event_loop: &ActiveEventLoop, desc: &WindowDesc) -> Result<Self> {
        let attrs = winit::window::Window::default_attributes()
            .with_title(desc.title.clone())
            .with_inner_size(PhysicalSize::new(desc.width.max(1), desc.height.max(1)))
            .with_resizable(desc.resizable);
        let inner = event_loop.create_window(attrs).context("create_window")?;

        let size = inner.inner_size();
        info!("window \"{}\" created ({}x{})", desc.title, size.width, size.height);
        Ok(Self {
            inner,
            signals: WindowSignals::default(),
        })
    }

    pub fn id(&self) -> WindowId {
        self.inner.id()
    }

    pub fn framebuffer_size(&self) -> RenderSize {
        let size = self.inner.inner_size();
        RenderSize::new(size.width, size.height)
    }

    pub fn surface_target(&self) -> Result<SurfaceTarget> {
        let display = self.inner.display_handle().context("display_handle")?.as_raw();
        let window = self.inner.window_handle().context("window_handle")?.as_raw();
        Ok(SurfaceTarget { display, window })
    }

    pub fn observe(&mut self, event: &WindowEvent) {
        self.signals.observe(event);
    }

    pub fn should_close(&self) -> bool {
        self.signals.should_close()
    }

    pub fn request_redraw(&self) {
        self.inner.request_redraw();
    }
}

impl ResizeSource for Window {
    fn take_resize(&mut self) -> Option<RenderSize> {
        self.signals.take_resize()
    }
}
