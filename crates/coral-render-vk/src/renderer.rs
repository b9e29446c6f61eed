// SPDX-License-Identifier: CEPL-1.0
use std::ffi::{CStr, CString};

use anyhow::{Context, Result};
use ash::prelude::VkResult;
use ash::vk;
use coral_render::{
    Renderer, RendererContext, RendererOptions, RendererProperties, ResizeSource, SurfaceTarget,
};
use tracing::{debug, info, warn};

use crate::api::{GraphicsApi, InstanceDesc, PhysicalDeviceInfo};
use crate::ash_api::AshApi;
use crate::caps::{SurfaceSupport, SwapchainSettings};
use crate::device::{create_logical_device, find_queue_family, select_physical_device, LogicalDevice};
use crate::error::{SwapchainStatus, VkError};
use crate::swapchain::{Swapchain, SwapchainManager, SwapchainTarget};

pub const ENGINE_NAME: &CStr = c"coral";
const VALIDATION_LAYER: &CStr = c"VK_LAYER_KHRONOS_validation";

/// Vulkan renderer. Sole owner of every GPU handle it creates; they are
/// released in reverse creation order by [`Renderer::shutdown`] or on drop.
pub struct VkRenderer<A: GraphicsApi = AshApi> {
    api: A,
    options: RendererOptions,
    properties: RendererProperties,

    instance_live: bool,
    phys: Option<PhysicalDeviceInfo>,
    surface: Option<vk::SurfaceKHR>,
    device: Option<LogicalDevice>,
    swapchain: SwapchainManager,
}

impl VkRenderer<AshApi> {
    pub fn load() -> Result<Self> {
        let api = AshApi::load().context("loading Vulkan")?;
        Ok(Self::with_api(api))
    }
}

impl<A: GraphicsApi> VkRenderer<A> {
    pub fn with_api(api: A) -> Self {
        Self {
            api,
            options: RendererOptions::default(),
            properties: RendererProperties::default(),
            instance_live: false,
            phys: None,
            surface: None,
            device: None,
            swapchain: SwapchainManager::new(),
        }
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    pub fn physical_device(&self) -> Option<&PhysicalDeviceInfo> {
        self.phys.as_ref()
    }

    pub fn device(&self) -> Option<&LogicalDevice> {
        self.device.as_ref()
    }

    pub fn swapchain(&self) -> Option<&Swapchain> {
        self.swapchain.current()
    }

    /// Feeds the result of an acquire or present back into the renderer.
    /// Out-of-date and suboptimal results raise the recreate flag for the
    /// next `begin_frame`; any other failure is returned.
    #[track_caller]
    pub fn note_present_result(
        &mut self,
        call: &'static str,
        result: VkResult<bool>,
    ) -> Result<SwapchainStatus, VkError> {
        let status = SwapchainStatus::classify(call, result)?;
        if status.is_stale() {
            debug!("{call} reported {status:?}, swapchain marked for recreation");
            let size = self.properties.framebuffer_size;
            self.properties.notify_resized(size);
        }
        Ok(status)
    }

    fn swapchain_target(&self) -> Result<SwapchainTarget, VkError> {
        let phys = self.phys.as_ref().ok_or(VkError::MissingStage("physical device"))?;
        let surface = self.surface.ok_or(VkError::MissingStage("surface"))?;
        let device = self.device.as_ref().ok_or(VkError::MissingStage("device"))?;
        Ok(SwapchainTarget {
            phys: phys.handle,
            surface,
            queue_family: device.queue_family,
        })
    }

    fn create_instance(&mut self, ctx: &RendererContext) -> Result<(), VkError> {
        let layers: Vec<CString> = if self.options.enable_validation {
            vec![VALIDATION_LAYER.to_owned()]
        } else {
            Vec::new()
        };
        let (major, minor, patch) = ctx.app_version;
        let app_name = CString::new(ctx.app_name.as_str())
            .map_err(|_| VkError::InvalidAppName(ctx.app_name.clone()))?;

        self.api.create_instance(&InstanceDesc {
            app_name: &app_name,
            app_version: vk::make_api_version(0, major, minor, patch),
            engine_name: ENGINE_NAME,
            engine_version: vk::make_api_version(0, 1, 0, 0),
            api_version: vk::API_VERSION_1_3,
            extensions: &ctx.required_extensions,
            layers: &layers,
        })?;
        self.instance_live = true;
        debug!(
            "instance created ({} extensions, validation={})",
            ctx.required_extensions.len(),
            self.options.enable_validation
        );
        Ok(())
    }

    fn pick_physical_device(&mut self) -> Result<(), VkError> {
        let devices = self.api.enumerate_physical_devices()?;
        for (i, d) in devices.iter().enumerate() {
            debug!("gpu[{i}] {} ({:?})", d.name, d.device_type);
        }
        let index = select_physical_device(&devices, self.options.prefer_discrete)?;
        let phys = devices[index].clone();
        info!("selected GPU {} ({:?})", phys.name, phys.device_type);
        self.phys = Some(phys);
        Ok(())
    }

    // Instance -> physical device -> surface -> queue family -> device ->
    // swapchain. Each step consumes the previous one's output.
    fn init_steps(&mut self, ctx: &RendererContext, target: &SurfaceTarget) -> Result<(), VkError> {
        if self.instance_live {
            return Err(VkError::InvalidState("renderer already initialized"));
        }
        self.options = ctx.options;
        self.properties.framebuffer_size = ctx.initial_size;

        self.create_instance(ctx)?;
        self.pick_physical_device()?;

        let surface = self.api.create_surface(target)?;
        self.surface = Some(surface);

        let phys = self.phys.clone().ok_or(VkError::MissingStage("physical device"))?;
        let queue_family = find_queue_family(&self.api, &phys, surface)?;
        self.device = Some(create_logical_device(&mut self.api, &phys, queue_family)?);

        let swap_target = self.swapchain_target()?;
        let support = SurfaceSupport::query(&self.api, phys.handle, surface)?;
        let settings = SwapchainSettings::select(&support, &self.options)?;
        self.swapchain.create(&mut self.api, &swap_target, &settings)?;
        Ok(())
    }

    fn recreate_swapchain(&mut self) -> Result<(), VkError> {
        let target = self.swapchain_target()?;
        self.swapchain.recreate(&mut self.api, &target, &self.options)?;
        self.properties.mark_recreated();
        Ok(())
    }
}

impl<A: GraphicsApi> Renderer for VkRenderer<A> {
    fn init(&mut self, ctx: &RendererContext, target: &SurfaceTarget) -> Result<()> {
        self.init_steps(ctx, target).context("renderer init")
    }

    fn begin_frame(&mut self, events: &mut dyn ResizeSource) -> Result<()> {
        if let Some(size) = events.take_resize() {
            if size.is_zero_area() {
                debug!("framebuffer is {}x{}, window minimized", size.width, size.height);
            }
            self.properties.notify_resized(size);
        }
        if self.properties.needs_recreate() {
            self.recreate_swapchain().context("swapchain recreation")?;
        }
        // Acquire goes here; the swapchain is never stale at this point.
        Ok(())
    }

    fn end_frame(&mut self) -> Result<()> {
        Ok(())
    }

    fn shutdown(&mut self) {
        if !self.instance_live {
            return;
        }
        if self.device.is_some() {
            if let Err(e) = self.api.wait_idle() {
                warn!("wait idle before shutdown failed: {e}");
            }
        }

        self.swapchain.destroy(&mut self.api);
        if self.device.take().is_some() {
            self.api.destroy_device();
        }
        if let Some(surface) = self.surface.take() {
            self.api.destroy_surface(surface);
        }
        self.phys = None;
        self.api.destroy_instance();
        self.instance_live = false;
        info!("renderer shut down");
    }

    fn properties(&self) -> &RendererProperties {
        &self.properties
    }

    fn properties_mut(&mut self) -> &mut RendererProperties {
        &mut self.properties
    }
}

impl<A: GraphicsApi> Drop for VkRenderer<A> {
    fn drop(&mut self) {
        self.shutdown();
    }
}
