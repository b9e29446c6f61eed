// SPDX-License-Identifier: CEPL-1.0
use ash::vk;
use tracing::{debug, info};

use crate::api::{GraphicsApi, PhysicalDeviceInfo};
use crate::error::VkError;

/// Picks a GPU: the first discrete device, else the first integrated one,
/// else whatever was enumerated first. With `prefer_discrete` off the two
/// tiers swap. Selection is first-match per tier in enumeration order.
pub fn select_physical_device(
    devices: &[PhysicalDeviceInfo],
    prefer_discrete: bool,
) -> Result<usize, VkError> {
    if devices.is_empty() {
        return Err(VkError::NoPhysicalDevice);
    }

    let tiers = if prefer_discrete {
        [vk::PhysicalDeviceType::DISCRETE_GPU, vk::PhysicalDeviceType::INTEGRATED_GPU]
    } else {
        [vk::PhysicalDeviceType::INTEGRATED_GPU, vk::PhysicalDeviceType::DISCRETE_GPU]
    };

    let index = tiers
        .iter()
        .find_map(|&tier| devices.iter().position(|d| d.device_type == tier))
        .unwrap_or(0);
    Ok(index)
}

/// First queue family, in index order, that can both run graphics commands
/// and present to the bound surface. Separate graphics and present queues
/// are not supported.
pub fn resolve_queue_family<F>(
    families: &[vk::QueueFamilyProperties],
    mut supports_present: F,
) -> Result<Option<u32>, VkError>
where
    F: FnMut(u32) -> Result<bool, VkError>,
{
    for (i, family) in families.iter().enumerate() {
        let index = i as u32;
        if family.queue_flags.contains(vk::QueueFlags::GRAPHICS) && supports_present(index)? {
            return Ok(Some(index));
        }
    }
    Ok(None)
}

/// Resolves the queue family of `phys` against `surface` through `api`.
pub fn find_queue_family<A: GraphicsApi + ?Sized>(
    api: &A,
    phys: &PhysicalDeviceInfo,
    surface: vk::SurfaceKHR,
) -> Result<u32, VkError> {
    let families = api.queue_family_properties(phys.handle)?;
    debug!("{} exposes {} queue families", phys.name, families.len());

    resolve_queue_family(&families, |i| api.surface_support(phys.handle, i, surface))?.ok_or_else(
        || VkError::NoSuitableQueueFamily {
            device: phys.name.clone(),
        },
    )
}

/// The queue graphics and present share on the opened device.
#[derive(Clone, Copy, Debug)]
pub struct LogicalDevice {
    pub queue: vk::Queue,
    pub queue_family: u32,
}

pub fn create_logical_device<A: GraphicsApi + ?Sized>(
    api: &mut A,
    phys: &PhysicalDeviceInfo,
    queue_family: u32,
) -> Result<LogicalDevice, VkError> {
    api.create_device(phys.handle, queue_family)?;
    let queue = api.device_queue(queue_family, 0)?;
    info!("logical device ready on {} (queue family {queue_family})", phys.name);
    Ok(LogicalDevice {
        queue,
        queue_family,
    })
}
