// SPDX-License-Identifier: CEPL-1.0
//! The slice of the Vulkan API the bootstrap and swapchain code talks to.
//!
//! Every creation step and every capability query of the renderer goes
//! through [`GraphicsApi`], which keeps the ordering and selection logic
//! independent of a live driver. [`crate::AshApi`] is the production
//! implementation.

use std::ffi::{CStr, CString};

use ash::vk;
use coral_render::SurfaceTarget;

use crate::error::VkError;

pub struct InstanceDesc<'a> {
    pub app_name: &'a CStr,
    pub app_version: u32,
    pub engine_name: &'a CStr,
    pub engine_version: u32,
    pub api_version: u32,
    pub extensions: &'a [CString],
    pub layers: &'a [CString],
}

#[derive(Clone, Debug)]
pub struct PhysicalDeviceInfo {
    pub handle: vk::PhysicalDevice,
    pub device_type: vk::PhysicalDeviceType,
    pub name: String,
}

#[derive(Clone, Copy, Debug)]
pub struct SwapchainDesc {
    pub surface: vk::SurfaceKHR,
    pub queue_family: u32,
    pub image_count: u32,
    pub format: vk::SurfaceFormatKHR,
    pub extent: vk::Extent2D,
    pub present_mode: vk::PresentModeKHR,
    pub pre_transform: vk::SurfaceTransformFlagsKHR,
}

pub trait GraphicsApi {
    fn create_instance(&mut self, desc: &InstanceDesc<'_>) -> Result<(), VkError>;
    fn create_surface(&mut self, target: &SurfaceTarget) -> Result<vk::SurfaceKHR, VkError>;

    fn enumerate_physical_devices(&self) -> Result<Vec<PhysicalDeviceInfo>, VkError>;
    fn queue_family_properties(
        &self,
        phys: vk::PhysicalDevice,
    ) -> Result<Vec<vk::QueueFamilyProperties>, VkError>;
    fn surface_support(
        &self,
        phys: vk::PhysicalDevice,
        queue_family: u32,
        surface: vk::SurfaceKHR,
    ) -> Result<bool, VkError>;
    fn surface_capabilities(
        &self,
        phys: vk::PhysicalDevice,
        surface: vk::SurfaceKHR,
    ) -> Result<vk::SurfaceCapabilitiesKHR, VkError>;
    fn surface_formats(
        &self,
        phys: vk::PhysicalDevice,
        surface: vk::SurfaceKHR,
    ) -> Result<Vec<vk::SurfaceFormatKHR>, VkError>;
    fn surface_present_modes(
        &self,
        phys: vk::PhysicalDevice,
        surface: vk::SurfaceKHR,
    ) -> Result<Vec<vk::PresentModeKHR>, VkError>;

    /// Opens the logical device with one queue from `queue_family` and the
    /// swapchain extension enabled.
    fn create_device(
        &mut self,
        phys: vk::PhysicalDevice,
        queue_family: u32,
    ) -> Result<(), VkError>;
    fn device_queue(&self, queue_family: u32, index: u32) -> Result<vk::Queue, VkError>;
    fn wait_idle(&mut self) -> Result<(), VkError>;

    fn create_swapchain(&mut self, desc: &SwapchainDesc) -> Result<vk::SwapchainKHR, VkError>;
    fn swapchain_images(&self, swapchain: vk::SwapchainKHR) -> Result<Vec<vk::Image>, VkError>;
    fn create_image_view(
        &mut self,
        image: vk::Image,
        format: vk::Format,
    ) -> Result<vk::ImageView, VkError>;

    fn destroy_image_view(&mut self, view: vk::ImageView);
    fn destroy_swapchain(&mut self, swapchain: vk::SwapchainKHR);
    fn destroy_device(&mut self);
    fn destroy_surface(&mut self, surface: vk::SurfaceKHR);
    fn destroy_instance(&mut self);
}
