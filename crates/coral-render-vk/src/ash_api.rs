// SPDX-License-Identifier: CEPL-1.0
use std::ffi::{c_char, CStr, CString};

use ash::khr::{surface, swapchain};
use ash::{vk, Entry, Instance};
use coral_render::SurfaceTarget;
use raw_window_handle::RawDisplayHandle;
use tracing::debug;

use crate::api::{GraphicsApi, InstanceDesc, PhysicalDeviceInfo, SwapchainDesc};
use crate::error::{VkError, VkResultExt};

/// Instance extensions the windowing system needs to present to `display`.
pub fn required_extensions(display: RawDisplayHandle) -> Result<Vec<CString>, VkError> {
    let exts = ash_window::enumerate_required_extensions(display)
        .check("vkEnumerateInstanceExtensionProperties")?;
    // SAFETY: ash-window hands out pointers to static, nul-terminated names.
    Ok(exts.iter().map(|&p| unsafe { CStr::from_ptr(p) }.to_owned()).collect())
}

/// [`GraphicsApi`] over a dynamically loaded Vulkan driver.
///
/// Holds the loaders for each stage as it comes up; calls that need a stage
/// which does not exist yet fail with [`VkError::MissingStage`].
pub struct AshApi {
    entry: Entry,
    instance: Option<Instance>,
    surface_loader: Option<surface::Instance>,
    device: Option<ash::Device>,
    swapchain_loader: Option<swapchain::Device>,
}

impl AshApi {
    pub fn load() -> Result<Self, VkError> {
        // SAFETY: the loader library stays alive for as long as `entry`.
        let entry = unsafe { Entry::load()? };
        Ok(Self {
            entry,
            instance: None,
            surface_loader: None,
            device: None,
            swapchain_loader: None,
        })
    }

    fn instance(&self) -> Result<&Instance, VkError> {
        self.instance.as_ref().ok_or(VkError::MissingStage("instance"))
    }

    fn surface_loader(&self) -> Result<&surface::Instance, VkError> {
        self.surface_loader.as_ref().ok_or(VkError::MissingStage("instance"))
    }

    fn device(&self) -> Result<&ash::Device, VkError> {
        self.device.as_ref().ok_or(VkError::MissingStage("device"))
    }

    fn swapchain_loader(&self) -> Result<&swapchain::Device, VkError> {
        self.swapchain_loader.as_ref().ok_or(VkError::MissingStage("device"))
    }
}

impl GraphicsApi for AshApi {
    fn create_instance(&mut self, desc: &InstanceDesc<'_>) -> Result<(), VkError> {
        if self.instance.is_some() {
            return Err(VkError::InvalidState("instance already created"));
        }
        let app_info = vk::ApplicationInfo {
            s_type: vk::StructureType::APPLICATION_INFO,
            p_application_name: desc.app_name.as_ptr(),
            application_version: desc.app_version,
            p_engine_name: desc.engine_name.as_ptr(),
            engine_version: desc.engine_version,
            api_version: desc.api_version,
            ..Default::default()
        };

        let ext_ptrs: Vec<*const c_char> = desc.extensions.iter().map(|e| e.as_ptr()).collect();
        let layer_ptrs: Vec<*const c_char> = desc.layers.iter().map(|l| l.as_ptr()).collect();

        let create_info = vk::InstanceCreateInfo {
            s_type: vk::StructureType::INSTANCE_CREATE_INFO,
            p_application_info: &app_info,
            enabled_layer_count: layer_ptrs.len() as u32,
            pp_enabled_layer_names: layer_ptrs.as_ptr(),
            enabled_extension_count: ext_ptrs.len() as u32,
            pp_enabled_extension_names: ext_ptrs.as_ptr(),
            ..Default::default()
        };

        let instance =
            unsafe { self.entry.create_instance(&create_info, None) }.check("vkCreateInstance")?;
        self.surface_loader = Some(surface::Instance::new(&self.entry, &instance));
        self.instance = Some(instance);
        Ok(())
    }

    fn create_surface(&mut self, target: &SurfaceTarget) -> Result<vk::SurfaceKHR, VkError> {
        let instance = self.instance()?;
        unsafe {
            ash_window::create_surface(&self.entry, instance, target.display, target.window, None)
        }
        .check("vkCreateSurfaceKHR")
    }

    fn enumerate_physical_devices(&self) -> Result<Vec<PhysicalDeviceInfo>, VkError> {
        let instance = self.instance()?;
        let handles =
            unsafe { instance.enumerate_physical_devices() }.check("vkEnumeratePhysicalDevices")?;

        Ok(handles
            .into_iter()
            .map(|handle| {
                let props = unsafe { instance.get_physical_device_properties(handle) };
                let name = props
                    .device_name_as_c_str()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_else(|_| String::from("<unnamed>"));
                PhysicalDeviceInfo {
                    handle,
                    device_type: props.device_type,
                    name,
                }
            })
            .collect())
    }

    fn queue_family_properties(
        &self,
        phys: vk::PhysicalDevice,
    ) -> Result<Vec<vk::QueueFamilyProperties>, VkError> {
        let instance = self.instance()?;
        Ok(unsafe { instance.get_physical_device_queue_family_properties(phys) })
    }

    fn surface_support(
        &self,
        phys: vk::PhysicalDevice,
        queue_family: u32,
        surface: vk::SurfaceKHR,
    ) -> Result<bool, VkError> {
        let loader = self.surface_loader()?;
        unsafe { loader.get_physical_device_surface_support(phys, queue_family, surface) }
            .check("vkGetPhysicalDeviceSurfaceSupportKHR")
    }

    fn surface_capabilities(
        &self,
        phys: vk::PhysicalDevice,
        surface: vk::SurfaceKHR,
    ) -> Result<vk::SurfaceCapabilitiesKHR, VkError> {
        let loader = self.surface_loader()?;
        unsafe { loader.get_physical_device_surface_capabilities(phys, surface) }
            .check("vkGetPhysicalDeviceSurfaceCapabilitiesKHR")
    }

    fn surface_formats(
        &self,
        phys: vk::PhysicalDevice,
        surface: vk::SurfaceKHR,
    ) -> Result<Vec<vk::SurfaceFormatKHR>, VkError> {
        let loader = self.surface_loader()?;
        unsafe { loader.get_physical_device_surface_formats(phys, surface) }
            .check("vkGetPhysicalDeviceSurfaceFormatsKHR")
    }

    fn surface_present_modes(
        &self,
        phys: vk::PhysicalDevice,
        surface: vk::SurfaceKHR,
    ) -> Result<Vec<vk::PresentModeKHR>, VkError> {
        let loader = self.surface_loader()?;
        unsafe { loader.get_physical_device_surface_present_modes(phys, surface) }
            .check("vkGetPhysicalDeviceSurfacePresentModesKHR")
    }

    fn create_device(
        &mut self,
        phys: vk::PhysicalDevice,
        queue_family: u32,
    ) -> Result<(), VkError> {
        if self.device.is_some() {
            return Err(VkError::InvalidState("device already created"));
        }
        let instance = self.instance()?;

        let priorities = [1.0_f32];
        let qinfo = vk::DeviceQueueCreateInfo {
            s_type: vk::StructureType::DEVICE_QUEUE_CREATE_INFO,
            queue_family_index: queue_family,
            queue_count: 1,
            p_queue_priorities: priorities.as_ptr(),
            ..Default::default()
        };

        let device_exts = [swapchain::NAME.as_ptr()];
        let dinfo = vk::DeviceCreateInfo {
            s_type: vk::StructureType::DEVICE_CREATE_INFO,
            queue_create_info_count: 1,
            p_queue_create_infos: &qinfo,
            enabled_extension_count: device_exts.len() as u32,
            pp_enabled_extension_names: device_exts.as_ptr(),
            ..Default::default()
        };

        let device =
            unsafe { instance.create_device(phys, &dinfo, None) }.check("vkCreateDevice")?;
        self.swapchain_loader = Some(swapchain::Device::new(instance, &device));
        self.device = Some(device);
        Ok(())
    }

    fn device_queue(&self, queue_family: u32, index: u32) -> Result<vk::Queue, VkError> {
        let device = self.device()?;
        Ok(unsafe { device.get_device_queue(queue_family, index) })
    }

    fn wait_idle(&mut self) -> Result<(), VkError> {
        let device = self.device()?;
        unsafe { device.device_wait_idle() }.check("vkDeviceWaitIdle")
    }

    fn create_swapchain(&mut self, desc: &SwapchainDesc) -> Result<vk::SwapchainKHR, VkError> {
        let loader = self.swapchain_loader()?;
        let queue_families = [desc.queue_family];

        let swap_info = vk::SwapchainCreateInfoKHR {
            s_type: vk::StructureType::SWAPCHAIN_CREATE_INFO_KHR,
            surface: desc.surface,
            min_image_count: desc.image_count,
            image_format: desc.format.format,
            image_color_space: desc.format.color_space,
            image_extent: desc.extent,
            image_array_layers: 1,
            image_usage: vk::ImageUsageFlags::COLOR_ATTACHMENT,
            image_sharing_mode: vk::SharingMode::EXCLUSIVE,
            queue_family_index_count: queue_families.len() as u32,
            p_queue_family_indices: queue_families.as_ptr(),
            pre_transform: desc.pre_transform,
            composite_alpha: vk::CompositeAlphaFlagsKHR::OPAQUE,
            present_mode: desc.present_mode,
            clipped: vk::TRUE,
            old_swapchain: vk::SwapchainKHR::null(),
            ..Default::default()
        };

        unsafe { loader.create_swapchain(&swap_info, None) }.check("vkCreateSwapchainKHR")
    }

    fn swapchain_images(&self, swapchain: vk::SwapchainKHR) -> Result<Vec<vk::Image>, VkError> {
        let loader = self.swapchain_loader()?;
        unsafe { loader.get_swapchain_images(swapchain) }.check("vkGetSwapchainImagesKHR")
    }

    fn create_image_view(
        &mut self,
        image: vk::Image,
        format: vk::Format,
    ) -> Result<vk::ImageView, VkError> {
        let device = self.device()?;
        let sub = vk::ImageSubresourceRange {
            aspect_mask: vk::ImageAspectFlags::COLOR,
            base_mip_level: 0,
            level_count: 1,
            base_array_layer: 0,
            layer_count: 1,
        };
        let iv_info = vk::ImageViewCreateInfo {
            s_type: vk::StructureType::IMAGE_VIEW_CREATE_INFO,
            image,
            view_type: vk::ImageViewType::TYPE_2D,
            format,
            subresource_range: sub,
            ..Default::default()
        };
        unsafe { device.create_image_view(&iv_info, None) }.check("vkCreateImageView")
    }

    fn destroy_image_view(&mut self, view: vk::ImageView) {
        if let Some(device) = &self.device {
            unsafe { device.destroy_image_view(view, None) };
        }
    }

    fn destroy_swapchain(&mut self, swapchain: vk::SwapchainKHR) {
        if let Some(loader) = &self.swapchain_loader {
            unsafe { loader.destroy_swapchain(swapchain, None) };
        }
    }

    fn destroy_device(&mut self) {
        self.swapchain_loader = None;
        if let Some(device) = self.device.take() {
            unsafe { device.destroy_device(None) };
            debug!("device destroyed");
        }
    }

    fn destroy_surface(&mut self, surface: vk::SurfaceKHR) {
        if let Some(loader) = &self.surface_loader {
            unsafe { loader.destroy_surface(surface, None) };
        }
    }

    fn destroy_instance(&mut self) {
        self.surface_loader = None;
        if let Some(instance) = self.instance.take() {
            unsafe { instance.destroy_instance(None) };
            debug!("instance destroyed");
        }
    }
}
