//! Device and swapchain setup for the map window.
//!
//! The map draws a few thousand triangles a frame, so any adapter that can
//! present to the window will do; the setup fails with [`EngineError::Gpu`]
//! rather than panicking when none can.

use std::sync::Arc;
use winit::window::Window;

use crate::core::error::{EngineError, Result};

fn gpu_err(what: &str, e: impl std::fmt::Display) -> EngineError {
    EngineError::Gpu(format!("{}: {}", what, e))
}

async fn pick_adapter(instance: &wgpu::Instance, surface: &wgpu::Surface<'_>) -> Result<wgpu::Adapter> {
    let options = wgpu::RequestAdapterOptions {
        power_preference: wgpu::PowerPreference::LowPower,
        compatible_surface: Some(surface),
        force_fallback_adapter: false,
    };
    let adapter = instance
        .request_adapter(&options)
        .await
        .ok_or_else(|| EngineError::Gpu("no adapter can present to the map window".into()))?;
    let info = adapter.get_info();
    tracing::info!("Map adapter: {} via {:?}", info.name, info.backend);
    Ok(adapter)
}

async fn open_device(adapter: &wgpu::Adapter) -> Result<(wgpu::Device, wgpu::Queue)> {
    // WebGL2 limits cover every buffer and texture the map uses.
    let descriptor = wgpu::DeviceDescriptor {
        label: Some("Map Device"),
        required_features: wgpu::Features::empty(),
        required_limits: wgpu::Limits::downlevel_webgl2_defaults().using_resolution(adapter.limits()),
    };
    adapter
        .request_device(&descriptor, None)
        .await
        .map_err(|e| gpu_err("device request failed", e))
}

/// Swapchain settings for a `width` x `height` window. Palette colors are
/// authored in sRGB, so an sRGB format wins when offered.
fn swapchain_config(caps: &wgpu::SurfaceCapabilities, width: u32, height: u32) -> Result<wgpu::SurfaceConfiguration> {
    let format = caps
        .formats
        .iter()
        .copied()
        .find(wgpu::TextureFormat::is_srgb)
        .or_else(|| caps.formats.first().copied())
        .ok_or_else(|| EngineError::Gpu("window surface offers no formats".into()))?;
    let alpha_mode = caps.alpha_modes.first().copied().unwrap_or(wgpu::CompositeAlphaMode::Auto);

    Ok(wgpu::SurfaceConfiguration {
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        format,
        width: width.max(1),
        height: height.max(1),
        present_mode: wgpu::PresentMode::AutoVsync,
        alpha_mode,
        view_formats: Vec::new(),
        desired_maximum_frame_latency: 2,
    })
}

/// The device, queue and swapchain the map renders into.
pub struct GpuContext {
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub surface: wgpu::Surface<'static>,
    pub config: wgpu::SurfaceConfiguration,
}

impl GpuContext {
    pub async fn new(window: Arc<Window>) -> Result<Self> {
        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });
        let size = window.inner_size();
        let surface = instance
            .create_surface(window)
            .map_err(|e| gpu_err("window surface unavailable", e))?;

        let adapter = pick_adapter(&instance, &surface).await?;
        let (device, queue) = open_device(&adapter).await?;
        let config = swapchain_config(&surface.get_capabilities(&adapter), size.width, size.height)?;
        surface.configure(&device, &config);
        tracing::debug!("Swapchain {:?} at {}x{}", config.format, config.width, config.height);

        Ok(Self {
            device,
            queue,
            surface,
            config,
        })
    }

    /// Follow a window resize. A minimized window reports zero and keeps the
    /// previous swapchain.
    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.config.width = width;
        self.config.height = height;
        self.reconfigure();
    }

    /// Re-apply the current swapchain settings after a lost surface.
    pub fn reconfigure(&self) {
        self.surface.configure(&self.device, &self.config);
    }

    pub fn format(&self) -> wgpu::TextureFormat {
        self.config.format
    }

    /// Swapchain size in physical pixels.
    pub fn size(&self) -> (u32, u32) {
        (self.config.width, self.config.height)
    }
}
