// SPDX-License-Identifier: CEPL-1.0
//! Recording [`GraphicsApi`] for tests (no GPU required).
//!
//! Hands out sequential fake handles, records every create/destroy in
//! order and tracks which swapchains and views are still alive.

use std::collections::HashSet;

use ash::vk::{self, Handle};
use coral_render::SurfaceTarget;

use crate::api::{GraphicsApi, InstanceDesc, PhysicalDeviceInfo, SwapchainDesc};
use crate::error::VkError;

const SURFACE_RAW: u64 = 0x5_0000;
const QUEUE_RAW: u64 = 0xE_0000;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Call {
    CreateInstance {
        app_name: String,
        extensions: Vec<String>,
        layers: Vec<String>,
    },
    CreateSurface,
    CreateDevice { queue_family: u32 },
    WaitIdle,
    CreateSwapchain(vk::SwapchainKHR),
    CreateImageView(vk::ImageView),
    DestroyImageView(vk::ImageView),
    DestroySwapchain(vk::SwapchainKHR),
    DestroyDevice,
    DestroySurface,
    DestroyInstance,
}

pub struct MockApi {
    pub devices: Vec<PhysicalDeviceInfo>,
    pub queue_families: Vec<vk::QueueFamilyProperties>,
    /// Present support per queue family index.
    pub present_support: Vec<bool>,
    pub capabilities: vk::SurfaceCapabilitiesKHR,
    pub formats: Vec<vk::SurfaceFormatKHR>,
    pub present_modes: Vec<vk::PresentModeKHR>,

    /// Fail `vkCreateImageView` once this many views have been created.
    pub fail_view_after: Option<usize>,
    /// Fail this named creation call.
    pub fail_call: Option<&'static str>,

    pub calls: Vec<Call>,
    pub live_swapchains: HashSet<vk::SwapchainKHR>,
    pub live_views: HashSet<vk::ImageView>,
    pub last_swapchain_desc: Option<SwapchainDesc>,

    instance_live: bool,
    surface_live: bool,
    device_live: bool,
    views_created: usize,
    next_handle: u64,
}

impl MockApi {
    /// A single discrete GPU with one graphics+present family and a
    /// 800x600 surface offering BGRA8 sRGB and mailbox.
    pub fn new() -> Self {
        Self {
            devices: vec![PhysicalDeviceInfo {
                handle: vk::PhysicalDevice::from_raw(0x100),
                device_type: vk::PhysicalDeviceType::DISCRETE_GPU,
                name: String::from("mock discrete"),
            }],
            queue_families: vec![vk::QueueFamilyProperties {
                queue_flags: vk::QueueFlags::GRAPHICS | vk::QueueFlags::COMPUTE,
                queue_count: 1,
                ..Default::default()
            }],
            present_support: vec![true],
            capabilities: vk::SurfaceCapabilitiesKHR {
                min_image_count: 2,
                max_image_count: 8,
                current_extent: vk::Extent2D { width: 800, height: 600 },
                min_image_extent: vk::Extent2D { width: 1, height: 1 },
                max_image_extent: vk::Extent2D { width: 4096, height: 4096 },
                max_image_array_layers: 1,
                current_transform: vk::SurfaceTransformFlagsKHR::IDENTITY,
                ..Default::default()
            },
            formats: vec![
                vk::SurfaceFormatKHR {
                    format: vk::Format::R8G8B8A8_UNORM,
                    color_space: vk::ColorSpaceKHR::SRGB_NONLINEAR,
                },
                vk::SurfaceFormatKHR {
                    format: vk::Format::B8G8R8A8_SRGB,
                    color_space: vk::ColorSpaceKHR::SRGB_NONLINEAR,
                },
            ],
            present_modes: vec![vk::PresentModeKHR::FIFO, vk::PresentModeKHR::MAILBOX],
            fail_view_after: None,
            fail_call: None,
            calls: Vec::new(),
            live_swapchains: HashSet::new(),
            live_views: HashSet::new(),
            last_swapchain_desc: None,
            instance_live: false,
            surface_live: false,
            device_live: false,
            views_created: 0,
            next_handle: 0x1000,
        }
    }

    /// Instance, surface and device already up; no calls recorded.
    pub fn ready() -> Self {
        let mut api = Self::new();
        api.instance_live = true;
        api.surface_live = true;
        api.device_live = true;
        api
    }

    pub fn surface_handle() -> vk::SurfaceKHR {
        vk::SurfaceKHR::from_raw(SURFACE_RAW)
    }

    pub fn instance_live(&self) -> bool {
        self.instance_live
    }

    pub fn surface_live(&self) -> bool {
        self.surface_live
    }

    pub fn device_live(&self) -> bool {
        self.device_live
    }

    fn next(&mut self) -> u64 {
        self.next_handle += 1;
        self.next_handle
    }

    #[track_caller]
    fn maybe_fail(&self, call: &'static str) -> Result<(), VkError> {
        if self.fail_call == Some(call) {
            Err(VkError::api(call, vk::Result::ERROR_INITIALIZATION_FAILED))
        } else {
            Ok(())
        }
    }

    fn need(&self, live: bool, stage: &'static str) -> Result<(), VkError> {
        if live {
            Ok(())
        } else {
            Err(VkError::MissingStage(stage))
        }
    }
}

fn names(list: &[std::ffi::CString]) -> Vec<String> {
    list.iter().map(|c| c.to_string_lossy().into_owned()).collect()
}

impl GraphicsApi for MockApi {
    fn create_instance(&mut self, desc: &InstanceDesc<'_>) -> Result<(), VkError> {
        self.maybe_fail("vkCreateInstance")?;
        self.instance_live = true;
        self.calls.push(Call::CreateInstance {
            app_name: desc.app_name.to_string_lossy().into_owned(),
            extensions: names(desc.extensions),
            layers: names(desc.layers),
        });
        Ok(())
    }

    fn create_surface(&mut self, _target: &SurfaceTarget) -> Result<vk::SurfaceKHR, VkError> {
        self.need(self.instance_live, "instance")?;
        self.maybe_fail("vkCreateSurfaceKHR")?;
        self.surface_live = true;
        self.calls.push(Call::CreateSurface);
        Ok(Self::surface_handle())
    }

    fn enumerate_physical_devices(&self) -> Result<Vec<PhysicalDeviceInfo>, VkError> {
        self.need(self.instance_live, "instance")?;
        Ok(self.devices.clone())
    }

    fn queue_family_properties(
        &self,
        _phys: vk::PhysicalDevice,
    ) -> Result<Vec<vk::QueueFamilyProperties>, VkError> {
        self.need(self.instance_live, "instance")?;
        Ok(self.queue_families.clone())
    }

    fn surface_support(
        &self,
        _phys: vk::PhysicalDevice,
        queue_family: u32,
        _surface: vk::SurfaceKHR,
    ) -> Result<bool, VkError> {
        self.need(self.surface_live, "surface")?;
        Ok(self
            .present_support
            .get(queue_family as usize)
            .copied()
            .unwrap_or(false))
    }

    fn surface_capabilities(
        &self,
        _phys: vk::PhysicalDevice,
        _surface: vk::SurfaceKHR,
    ) -> Result<vk::SurfaceCapabilitiesKHR, VkError> {
        self.need(self.surface_live, "surface")?;
        Ok(self.capabilities)
    }

    fn surface_formats(
        &self,
        _phys: vk::PhysicalDevice,
        _surface: vk::SurfaceKHR,
    ) -> Result<Vec<vk::SurfaceFormatKHR>, VkError> {
        self.need(self.surface_live, "surface")?;
        Ok(self.formats.clone())
    }

    fn surface_present_modes(
        &self,
        _phys: vk::PhysicalDevice,
        _surface: vk::SurfaceKHR,
    ) -> Result<Vec<vk::PresentModeKHR>, VkError> {
        self.need(self.surface_live, "surface")?;
        Ok(self.present_modes.clone())
    }

    fn create_device(
        &mut self,
        _phys: vk::PhysicalDevice,
        queue_family: u32,
    ) -> Result<(), VkError> {
        self.need(self.instance_live, "instance")?;
        self.maybe_fail("vkCreateDevice")?;
        self.device_live = true;
        self.calls.push(Call::CreateDevice { queue_family });
        Ok(())
    }

    fn device_queue(&self, _queue_family: u32, _index: u32) -> Result<vk::Queue, VkError> {
        self.need(self.device_live, "device")?;
        Ok(vk::Queue::from_raw(QUEUE_RAW))
    }

    fn wait_idle(&mut self) -> Result<(), VkError> {
        self.need(self.device_live, "device")?;
        self.calls.push(Call::WaitIdle);
        Ok(())
    }

    fn create_swapchain(&mut self, desc: &SwapchainDesc) -> Result<vk::SwapchainKHR, VkError> {
        self.need(self.device_live, "device")?;
        self.maybe_fail("vkCreateSwapchainKHR")?;
        let sc = vk::SwapchainKHR::from_raw(self.next());
        self.live_swapchains.insert(sc);
        self.last_swapchain_desc = Some(*desc);
        self.calls.push(Call::CreateSwapchain(sc));
        Ok(sc)
    }

    fn swapchain_images(&self, swapchain: vk::SwapchainKHR) -> Result<Vec<vk::Image>, VkError> {
        self.need(self.live_swapchains.contains(&swapchain), "swapchain")?;
        let count = self.last_swapchain_desc.map(|d| d.image_count).unwrap_or(0) as u64;
        Ok((0..count)
            .map(|i| vk::Image::from_raw(swapchain.as_raw() * 100 + i))
            .collect())
    }

    fn create_image_view(
        &mut self,
        _image: vk::Image,
        _format: vk::Format,
    ) -> Result<vk::ImageView, VkError> {
        self.need(self.device_live, "device")?;
        if self.fail_view_after == Some(self.views_created) {
            return Err(VkError::api(
                "vkCreateImageView",
                vk::Result::ERROR_OUT_OF_DEVICE_MEMORY,
            ));
        }
        self.views_created += 1;
        let view = vk::ImageView::from_raw(self.next());
        self.live_views.insert(view);
        self.calls.push(Call::CreateImageView(view));
        Ok(view)
    }

    fn destroy_image_view(&mut self, view: vk::ImageView) {
        assert!(self.live_views.remove(&view), "double destroy of {view:?}");
        self.calls.push(Call::DestroyImageView(view));
    }

    fn destroy_swapchain(&mut self, swapchain: vk::SwapchainKHR) {
        assert!(
            self.live_swapchains.remove(&swapchain),
            "double destroy of {swapchain:?}"
        );
        self.calls.push(Call::DestroySwapchain(swapchain));
    }

    fn destroy_device(&mut self) {
        assert!(self.live_swapchains.is_empty(), "device destroyed under a live swapchain");
        self.device_live = false;
        self.calls.push(Call::DestroyDevice);
    }

    fn destroy_surface(&mut self, _surface: vk::SurfaceKHR) {
        assert!(!self.device_live, "surface destroyed before device");
        self.surface_live = false;
        self.calls.push(Call::DestroySurface);
    }

    fn destroy_instance(&mut self) {
        assert!(!self.surface_live, "instance destroyed before surface");
        self.instance_live = false;
        self.calls.push(Call::DestroyInstance);
    }
}
