// SPDX-License-Identifier: CEPL-1.0
use std::panic::Location;

use ash::prelude::VkResult;
use ash::vk;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum VkError {
    #[error("failed to load the Vulkan loader: {0}")]
    Loader(#[from] ash::LoadingError),

    #[error("no Vulkan physical devices were enumerated")]
    NoPhysicalDevice,

    #[error("device `{device}` has no queue family supporting both graphics and present")]
    NoSuitableQueueFamily { device: String },

    #[error("surface reports no formats")]
    NoSurfaceFormats,

    #[error("application name {0:?} contains a NUL byte")]
    InvalidAppName(String),

    #[error("{0} has not been created")]
    MissingStage(&'static str),

    #[error("invalid swapchain transition: {0}")]
    InvalidState(&'static str),

    #[error("{call} returned {result:?} at {file}:{line}")]
    Api {
        call: &'static str,
        result: vk::Result,
        file: &'static str,
        line: u32,
    },
}

impl VkError {
    #[track_caller]
    pub fn api(call: &'static str, result: vk::Result) -> Self {
        let loc = Location::caller();
        VkError::Api {
            call,
            result,
            file: loc.file(),
            line: loc.line(),
        }
    }
}

/// Tags a raw Vulkan result with the call name and the call site.
pub trait VkResultExt<T> {
    fn check(self, call: &'static str) -> Result<T, VkError>;
}

impl<T> VkResultExt<T> for VkResult<T> {
    #[track_caller]
    fn check(self, call: &'static str) -> Result<T, VkError> {
        let loc = Location::caller();
        self.map_err(|result| VkError::Api {
            call,
            result,
            file: loc.file(),
            line: loc.line(),
        })
    }
}

/// Outcome of an acquire or present. The two stale variants are signals to
/// rebuild the swapchain, not failures.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SwapchainStatus {
    Optimal,
    Suboptimal,
    OutOfDate,
}

impl SwapchainStatus {
    /// `result` is what ash returns from `acquire_next_image` /
    /// `queue_present`: `Ok(suboptimal)` or the error code.
    #[track_caller]
    pub fn classify(call: &'static str, result: VkResult<bool>) -> Result<Self, VkError> {
        match result {
            Ok(false) => Ok(SwapchainStatus::Optimal),
            Ok(true) | Err(vk::Result::SUBOPTIMAL_KHR) => Ok(SwapchainStatus::Suboptimal),
            Err(vk::Result::ERROR_OUT_OF_DATE_KHR) => Ok(SwapchainStatus::OutOfDate),
            Err(e) => Err(VkError::api(call, e)),
        }
    }

    pub fn is_stale(self) -> bool {
        !matches!(self, SwapchainStatus::Optimal)
    }
}
