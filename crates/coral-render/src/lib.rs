// SPDX-License-Identifier: CEPL-1.0
use std::ffi::CString;

use anyhow::Result;
use bitflags::bitflags;
use raw_window_handle::{RawDisplayHandle, RawWindowHandle};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RenderSize {
    pub width: u32,
    pub height: u32,
}

impl RenderSize {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn is_zero_area(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

bitflags! {
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
    pub struct RendererFlags: u32 {
        /// The swapchain no longer matches the window; rebuild it before the
        /// next acquire.
        const RECREATE_SWAPCHAIN = 1 << 0;
    }
}

/// State shared across the renderer/application boundary. The window side
/// writes the framebuffer size and raises the dirty flag, the renderer
/// consumes and clears it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RendererProperties {
    pub framebuffer_size: RenderSize,
    pub flags: RendererFlags,
}

impl RendererProperties {
    pub fn notify_resized(&mut self, size: RenderSize) {
        self.framebuffer_size = size;
        self.flags.insert(RendererFlags::RECREATE_SWAPCHAIN);
    }

    pub fn needs_recreate(&self) -> bool {
        self.flags.contains(RendererFlags::RECREATE_SWAPCHAIN)
    }

    pub fn mark_recreated(&mut self) {
        self.flags.remove(RendererFlags::RECREATE_SWAPCHAIN);
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PresentModePreference {
    /// Mailbox when the surface offers it, FIFO otherwise.
    #[default]
    Mailbox,
    /// Always FIFO.
    Fifo,
}

/// Feature flags for the renderer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RendererOptions {
    pub enable_validation: bool,
    pub prefer_discrete: bool,
    pub present_mode: PresentModePreference,
    pub desired_image_count: u32,
}

impl Default for RendererOptions {
    fn default() -> Self {
        Self {
            enable_validation: false,
            prefer_discrete: true,
            present_mode: PresentModePreference::Mailbox,
            desired_image_count: 3,
        }
    }
}

/// Everything `init` needs to know about the hosting application.
#[derive(Clone, Debug)]
pub struct RendererContext {
    pub app_name: String,
    pub app_version: (u32, u32, u32),
    /// Instance extensions the windowing side needs for presentation.
    /// Passed through to instance creation unchanged.
    pub required_extensions: Vec<CString>,
    pub initial_size: RenderSize,
    pub options: RendererOptions,
}

impl RendererContext {
    pub fn new(app_name: impl Into<String>, initial_size: RenderSize) -> Self {
        Self {
            app_name: app_name.into(),
            app_version: (1, 0, 0),
            required_extensions: Vec::new(),
            initial_size,
            options: RendererOptions::default(),
        }
    }
}

/// Native handles of the window the renderer presents into.
#[derive(Clone, Copy, Debug)]
pub struct SurfaceTarget {
    pub display: RawDisplayHandle,
    pub window: RawWindowHandle,
}

/// Source of framebuffer-resize notifications, drained once per frame.
pub trait ResizeSource {
    fn take_resize(&mut self) -> Option<RenderSize>;
}

/// Single-slot resize message: later resizes overwrite earlier ones that
/// were not drained yet.
#[derive(Clone, Copy, Debug, Default)]
pub struct ResizeSlot {
    pending: Option<RenderSize>,
}

impl ResizeSlot {
    pub fn post(&mut self, size: RenderSize) {
        self.pending = Some(size);
    }
}

impl ResizeSource for ResizeSlot {
    fn take_resize(&mut self) -> Option<RenderSize> {
        self.pending.take()
    }
}

pub trait Renderer {
    fn init(&mut self, ctx: &RendererContext, target: &SurfaceTarget) -> Result<()>;

    /// Drains pending resizes and rebuilds the swapchain if it went stale.
    fn begin_frame(&mut self, events: &mut dyn ResizeSource) -> Result<()>;

    /// Submit/present hook.
    fn end_frame(&mut self) -> Result<()>;

    fn shutdown(&mut self);

    fn properties(&self) -> &RendererProperties;
    fn properties_mut(&mut self) -> &mut RendererProperties;
}
