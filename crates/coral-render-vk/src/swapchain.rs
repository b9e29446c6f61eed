// SPDX-License-Identifier: CEPL-1.0
//! Presentable image chain: creation, resize recreation and teardown.
//!
//! The manager is either `Absent` (nothing live) or `Live` (one swapchain
//! with one view per image). It never owns the instance, device or surface;
//! those are borrowed through the `GraphicsApi` for each operation.
//!
//! Teardown order is always image views first, then the swapchain handle.
//! Recreation tears the old chain down completely before building the new
//! one, so there is at most one swapchain alive at any time.

use ash::vk;
use coral_render::RendererOptions;
use tracing::{debug, info};

use crate::api::{GraphicsApi, SwapchainDesc};
use crate::caps::{SurfaceSupport, SwapchainSettings};
use crate::error::VkError;

/// What a swapchain is built against.
#[derive(Clone, Copy, Debug)]
pub struct SwapchainTarget {
    pub phys: vk::PhysicalDevice,
    pub surface: vk::SurfaceKHR,
    pub queue_family: u32,
}

#[derive(Debug)]
pub struct Swapchain {
    handle: vk::SwapchainKHR,
    images: Vec<vk::Image>,
    image_views: Vec<vk::ImageView>,
    format: vk::SurfaceFormatKHR,
    present_mode: vk::PresentModeKHR,
    extent: vk::Extent2D,
}

impl Swapchain {
    pub fn handle(&self) -> vk::SwapchainKHR {
        self.handle
    }

    pub fn images(&self) -> &[vk::Image] {
        &self.images
    }

    pub fn image_views(&self) -> &[vk::ImageView] {
        &self.image_views
    }

    pub fn image_count(&self) -> u32 {
        self.images.len() as u32
    }

    pub fn format(&self) -> vk::SurfaceFormatKHR {
        self.format
    }

    pub fn present_mode(&self) -> vk::PresentModeKHR {
        self.present_mode
    }

    pub fn extent(&self) -> vk::Extent2D {
        self.extent
    }
}

#[derive(Debug, Default)]
enum SwapchainState {
    #[default]
    Absent,
    Live(Swapchain),
}

#[derive(Debug, Default)]
pub struct SwapchainManager {
    state: SwapchainState,
}

impl SwapchainManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_live(&self) -> bool {
        matches!(self.state, SwapchainState::Live(_))
    }

    pub fn current(&self) -> Option<&Swapchain> {
        match &self.state {
            SwapchainState::Live(sc) => Some(sc),
            SwapchainState::Absent => None,
        }
    }

    /// Absent -> Live.
    pub fn create<A: GraphicsApi + ?Sized>(
        &mut self,
        api: &mut A,
        target: &SwapchainTarget,
        settings: &SwapchainSettings,
    ) -> Result<(), VkError> {
        if self.is_live() {
            return Err(VkError::InvalidState("create called on a live swapchain"));
        }
        let sc = build(api, target, settings)?;
        info!(
            "swapchain ready ({}x{}, {:?}, {:?}, {} images)",
            sc.extent.width,
            sc.extent.height,
            sc.format.format,
            sc.present_mode,
            sc.images.len()
        );
        self.state = SwapchainState::Live(sc);
        Ok(())
    }

    /// Live -> Live. Waits for the device, releases the outgoing chain,
    /// re-reads the surface capabilities and builds a fresh chain.
    pub fn recreate<A: GraphicsApi + ?Sized>(
        &mut self,
        api: &mut A,
        target: &SwapchainTarget,
        options: &RendererOptions,
    ) -> Result<(), VkError> {
        if !self.is_live() {
            return Err(VkError::InvalidState("recreate called without a live swapchain"));
        }
        api.wait_idle()?;
        self.release(api);

        let support = SurfaceSupport::query(&*api, target.phys, target.surface)?;
        let settings = SwapchainSettings::select(&support, options)?;
        let sc = build(api, target, &settings)?;
        info!(
            "swapchain recreated ({}x{}, {:?}, {} images)",
            sc.extent.width,
            sc.extent.height,
            sc.present_mode,
            sc.images.len()
        );
        self.state = SwapchainState::Live(sc);
        Ok(())
    }

    /// Live -> Absent. No-op when nothing is live.
    pub fn destroy<A: GraphicsApi + ?Sized>(&mut self, api: &mut A) {
        if self.is_live() {
            self.release(api);
            debug!("swapchain destroyed");
        }
    }

    fn release<A: GraphicsApi + ?Sized>(&mut self, api: &mut A) {
        if let SwapchainState::Live(sc) = std::mem::take(&mut self.state) {
            for &view in &sc.image_views {
                api.destroy_image_view(view);
            }
            api.destroy_swapchain(sc.handle);
        }
    }
}

fn build<A: GraphicsApi + ?Sized>(
    api: &mut A,
    target: &SwapchainTarget,
    settings: &SwapchainSettings,
) -> Result<Swapchain, VkError> {
    let desc = SwapchainDesc {
        surface: target.surface,
        queue_family: target.queue_family,
        image_count: settings.image_count,
        format: settings.format,
        extent: settings.extent,
        present_mode: settings.present_mode,
        pre_transform: settings.pre_transform,
    };
    let handle = api.create_swapchain(&desc)?;

    let images = match api.swapchain_images(handle) {
        Ok(images) => images,
        Err(e) => {
            api.destroy_swapchain(handle);
            return Err(e);
        }
    };

    let mut image_views = Vec::with_capacity(images.len());
    for &image in &images {
        match api.create_image_view(image, settings.format.format) {
            Ok(view) => image_views.push(view),
            Err(e) => {
                for &view in &image_views {
                    api.destroy_image_view(view);
                }
                api.destroy_swapchain(handle);
                return Err(e);
            }
        }
    }

    Ok(Swapchain {
        handle,
        images,
        image_views,
        format: settings.format,
        present_mode: settings.present_mode,
        extent: settings.extent,
    })
}
