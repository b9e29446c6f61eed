// SPDX-License-Identifier: CEPL-1.0
#![deny(unsafe_op_in_unsafe_fn)]
//! Vulkan bootstrap and swapchain lifecycle for coral.

pub mod api;
mod ash_api;
pub mod caps;
pub mod device;
mod error;
mod renderer;
pub mod swapchain;

#[cfg(test)]
mod mock;

pub use api::{GraphicsApi, PhysicalDeviceInfo};
pub use ash_api::{required_extensions, AshApi};
pub use error::{SwapchainStatus, VkError, VkResultExt};
pub use renderer::{VkRenderer, ENGINE_NAME};
