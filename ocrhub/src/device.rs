//! GPU availability, computed once at startup.
//!
//! The result is an immutable [`DeviceConfig`] that is handed to the OCR
//! service. Nothing here is re-evaluated per request.

use std::path::Path;
use std::process::{Command, Stdio};

use serde::Serialize;

const NVIDIA_PROC_ENTRY: &str = "/proc/driver/nvidia/version";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, utoipa::ToSchema)]
pub struct DeviceConfig {
    /// Operator asked for GPU execution (`USE_GPU`).
    pub gpu_requested: bool,
    /// A CUDA-capable device was found when the process started.
    pub gpu_detected: bool,
}

impl DeviceConfig {
    pub fn new(gpu_requested: bool, gpu_detected: bool) -> Self {
        Self {
            gpu_requested,
            gpu_detected,
        }
    }

    /// Probe the host and combine the result with the operator preference.
    ///
    /// The probe is skipped entirely when GPU use was not requested.
    pub fn detect(gpu_requested: bool) -> Self {
        let gpu_detected = gpu_requested && probe_cuda_device();
        if gpu_requested && !gpu_detected {
            tracing::warn!("USE_GPU is set but no CUDA device was found; engines will run on CPU");
        }
        Self::new(gpu_requested, gpu_detected)
    }

    pub fn cpu_only() -> Self {
        Self::new(false, false)
    }

    pub fn use_gpu(&self) -> bool {
        self.gpu_requested && self.gpu_detected
    }

    /// A request may opt out of the GPU but never force it on.
    pub fn effective(&self, requested: Option<bool>) -> bool {
        self.use_gpu() && requested.unwrap_or(true)
    }
}

fn probe_cuda_device() -> bool {
    if let Ok(visible) = std::env::var("CUDA_VISIBLE_DEVICES") {
        if !cuda_devices_visible(&visible) {
            tracing::info!("CUDA_VISIBLE_DEVICES hides every device");
            return false;
        }
    }

    if Path::new(NVIDIA_PROC_ENTRY).exists() {
        tracing::debug!("NVIDIA driver detected via {}", NVIDIA_PROC_ENTRY);
        return true;
    }

    match Command::new("nvidia-smi")
        .arg("-L")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
    {
        Ok(status) => status.success(),
        Err(e) => {
            tracing::debug!("nvidia-smi not runnable: {}", e);
            false
        }
    }
}

fn cuda_devices_visible(value: &str) -> bool {
    let value = value.trim();
    !(value.is_empty() || value == "-1" || value.eq_ignore_ascii_case("none"))
}
