// SPDX-License-Identifier: CEPL-1.0
//! Surface capability queries and the per-swapchain selections made from
//! them: color format, present mode, extent and image count.

use ash::vk;
use coral_render::{PresentModePreference, RendererOptions};
use tracing::{debug, warn};

use crate::api::GraphicsApi;
use crate::error::VkError;

/// Triple buffering.
pub const PREFERRED_IMAGE_COUNT: u32 = 3;

/// Snapshot of what a surface supports on one physical device.
#[derive(Clone, Debug)]
pub struct SurfaceSupport {
    pub capabilities: vk::SurfaceCapabilitiesKHR,
    pub formats: Vec<vk::SurfaceFormatKHR>,
    pub present_modes: Vec<vk::PresentModeKHR>,
}

impl SurfaceSupport {
    pub fn query<A: GraphicsApi + ?Sized>(
        api: &A,
        phys: vk::PhysicalDevice,
        surface: vk::SurfaceKHR,
    ) -> Result<Self, VkError> {
        Ok(Self {
            capabilities: api.surface_capabilities(phys, surface)?,
            formats: api.surface_formats(phys, surface)?,
            present_modes: api.surface_present_modes(phys, surface)?,
        })
    }
}

/// First BGRA8 sRGB / sRGB-nonlinear entry, or the first reported format.
/// `None` only when the list is empty.
pub fn choose_surface_format(formats: &[vk::SurfaceFormatKHR]) -> Option<vk::SurfaceFormatKHR> {
    let exact = formats.iter().copied().find(|f| {
        f.format == vk::Format::B8G8R8A8_SRGB && f.color_space == vk::ColorSpaceKHR::SRGB_NONLINEAR
    });
    if exact.is_none() && !formats.is_empty() {
        warn!(
            "no B8G8R8A8_SRGB/SRGB_NONLINEAR surface format, using {:?}",
            formats[0].format
        );
    }
    exact.or_else(|| formats.first().copied())
}

/// Mailbox if offered, otherwise FIFO, which every implementation must support.
pub fn choose_present_mode(
    modes: &[vk::PresentModeKHR],
    preference: PresentModePreference,
) -> vk::PresentModeKHR {
    match preference {
        PresentModePreference::Mailbox if modes.contains(&vk::PresentModeKHR::MAILBOX) => {
            vk::PresentModeKHR::MAILBOX
        }
        _ => vk::PresentModeKHR::FIFO,
    }
}

// Lower bound wins over the upper one, so a minimized surface reporting a
// zero max still gets a non-zero extent.
fn clamp_dim(value: u32, min: u32, max: u32) -> u32 {
    value.min(max).max(min.max(1))
}

/// The surface's current extent clamped into its min/max range. A surface
/// that leaves the extent undefined (`u32::MAX`) resolves to the max bound.
pub fn choose_extent(caps: &vk::SurfaceCapabilitiesKHR) -> vk::Extent2D {
    let (min, max) = (caps.min_image_extent, caps.max_image_extent);
    let extent = vk::Extent2D {
        width: clamp_dim(caps.current_extent.width, min.width, max.width),
        height: clamp_dim(caps.current_extent.height, min.height, max.height),
    };
    if exceeds_max_extent(extent, caps) {
        debug!(
            "extent {}x{} raised above surface max {}x{} (minimized surface?)",
            extent.width, extent.height, max.width, max.height
        );
    }
    extent
}

fn exceeds_max_extent(extent: vk::Extent2D, caps: &vk::SurfaceCapabilitiesKHR) -> bool {
    extent.width > caps.max_image_extent.width || extent.height > caps.max_image_extent.height
}

/// `desired` clamped into `[min_image_count, max_image_count]`; a zero max
/// means there is no upper bound.
pub fn choose_image_count(caps: &vk::SurfaceCapabilitiesKHR, desired: u32) -> u32 {
    let count = desired.max(caps.min_image_count);
    if caps.max_image_count == 0 {
        count
    } else {
        count.min(caps.max_image_count)
    }
}

/// Everything picked for one swapchain build.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SwapchainSettings {
    pub format: vk::SurfaceFormatKHR,
    pub present_mode: vk::PresentModeKHR,
    pub extent: vk::Extent2D,
    pub image_count: u32,
    pub pre_transform: vk::SurfaceTransformFlagsKHR,
}

impl SwapchainSettings {
    pub fn select(support: &SurfaceSupport, options: &RendererOptions) -> Result<Self, VkError> {
        let format = choose_surface_format(&support.formats).ok_or(VkError::NoSurfaceFormats)?;
        let present_mode = choose_present_mode(&support.present_modes, options.present_mode);
        let extent = choose_extent(&support.capabilities);
        let desired = if options.desired_image_count == 0 {
            PREFERRED_IMAGE_COUNT
        } else {
            options.desired_image_count
        };
        let image_count = choose_image_count(&support.capabilities, desired);

        debug!(
            "swapchain settings: {:?}/{:?}, {:?}, {}x{}, {} images",
            format.format, format.color_space, present_mode, extent.width, extent.height, image_count
        );

        Ok(Self {
            format,
            present_mode,
            extent,
            image_count,
            pre_transform: support.capabilities.current_transform,
        })
    }
}
