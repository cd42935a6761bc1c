use std::time::Duration;

use super::{Probe, RawReading, ResourceKind};
use crate::error::ProbeUnavailable;

/// Throughput of an elementwise square kernel on the first working GPU
pub struct AcceleratorProbe {
    elements: u64,
    enabled: bool,
}

impl AcceleratorProbe {
    pub fn new(elements: u64, enabled: bool) -> Self {
        Self { elements, enabled }
    }
}

impl Probe for AcceleratorProbe {
    fn kind(&self) -> ResourceKind {
        ResourceKind::Accelerator
    }

    fn read(&mut self, _window: Duration) -> Result<Vec<RawReading>, ProbeUnavailable> {
        if !self.enabled {
            return Err(ProbeUnavailable::new(ResourceKind::Accelerator, "disabled"));
        }
        run_square_kernel(self.elements).map(|reading| vec![reading])
    }
}

#[cfg(not(feature = "gpu"))]
fn run_square_kernel(_elements: u64) -> Result<RawReading, ProbeUnavailable> {
    tracing::info!("built without GPU support, skipping accelerator benchmark");
    Err(ProbeUnavailable::capability_absent(ResourceKind::Accelerator))
}

#[cfg(feature = "gpu")]
fn run_square_kernel(elements: u64) -> Result<RawReading, ProbeUnavailable> {
    let instance = wgpu::Instance::new(wgpu::InstanceDescriptor::default());
    let adapters = instance.enumerate_adapters(wgpu::Backends::all());
    if adapters.is_empty() {
        return Err(ProbeUnavailable::capability_absent(ResourceKind::Accelerator));
    }

    for adapter in adapters {
        let info = adapter.get_info();
        tracing::info!(device = %info.name, backend = ?info.backend, "running square kernel");
        match gpu::square_throughput(&adapter, elements) {
            Ok(elements_per_sec) => {
                return Ok(super::Measurement::Accelerator {
                    device: info.name,
                    elements_per_sec,
                }
                .into());
            }
            Err(e) => {
                tracing::warn!(device = %info.name, error = %e, "failed to run on device");
            }
        }
    }

    Err(ProbeUnavailable::new(
        ResourceKind::Accelerator,
        "no device completed the benchmark",
    ))
}

#[cfg(feature = "gpu")]
mod gpu {
    use std::borrow::Cow;
    use std::time::Instant;

    const WORKGROUP_SIZE: u64 = 64;

    const SQUARE_SHADER: &str = r#"
@group(0) @binding(0) var<storage, read> input: array<f32>;
@group(0) @binding(1) var<storage, read_write> output: array<f32>;

@compute @workgroup_size(64)
fn main(@builtin(global_invocation_id) gid: vec3<u32>, @builtin(num_workgroups) groups: vec3<u32>) {
    let index = gid.y * groups.x * 64u + gid.x;
    if (index >= arrayLength(&input)) {
        return;
    }
    output[index] = input[index] * input[index];
}
"#;

    /// Split `groups` workgroups over x/y so neither exceeds the per-dimension limit
    pub(super) fn dispatch_dims(groups: u64, max_per_dim: u32) -> (u32, u32) {
        let max = u64::from(max_per_dim.max(1));
        let x = groups.clamp(1, max);
        let y = groups.div_ceil(x);
        (x as u32, y as u32)
    }

    /// Run the kernel once and return elements per second.
    /// Any device-level error is returned, never panicked on.
    pub(super) fn square_throughput(adapter: &wgpu::Adapter, elements: u64) -> Result<f64, String> {
        let limits = adapter.limits();
        let size = elements * std::mem::size_of::<f32>() as u64;
        if size > u64::from(limits.max_storage_buffer_binding_size) || size > limits.max_buffer_size {
            return Err(format!("buffer of {size} bytes exceeds device limits"));
        }

        let groups = elements.div_ceil(WORKGROUP_SIZE);
        let (x, y) = dispatch_dims(groups, limits.max_compute_workgroups_per_dimension);
        if y > limits.max_compute_workgroups_per_dimension {
            return Err(format!("{elements} elements need more workgroups than the device allows"));
        }

        let (device, queue) = pollster::block_on(adapter.request_device(
            &wgpu::DeviceDescriptor {
                label: Some("square kernel"),
                required_features: wgpu::Features::empty(),
                required_limits: limits,
            },
            None,
        ))
        .map_err(|e| e.to_string())?;

        device.push_error_scope(wgpu::ErrorFilter::OutOfMemory);
        device.push_error_scope(wgpu::ErrorFilter::Validation);

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("square"),
            source: wgpu::ShaderSource::Wgsl(Cow::Borrowed(SQUARE_SHADER)),
        });
        let pipeline = device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
            label: Some("square"),
            layout: None,
            module: &shader,
            entry_point: "main",
            compilation_options: Default::default(),
        });

        let input = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("input"),
            size,
            usage: wgpu::BufferUsages::STORAGE,
            mapped_at_creation: false,
        });
        let output = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("output"),
            size,
            usage: wgpu::BufferUsages::STORAGE,
            mapped_at_creation: false,
        });

        let layout = pipeline.get_bind_group_layout(0);
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("square"),
            layout: &layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: input.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: output.as_entire_binding(),
                },
            ],
        });

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("square"),
        });
        {
            let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some("square"),
                timestamp_writes: None,
            });
            pass.set_pipeline(&pipeline);
            pass.set_bind_group(0, &bind_group, &[]);
            pass.dispatch_workgroups(x, y, 1);
        }

        let start = Instant::now();
        queue.submit(Some(encoder.finish()));
        let _ = device.poll(wgpu::Maintain::Wait);
        let elapsed = start.elapsed().as_secs_f64();

        if let Some(e) = pollster::block_on(device.pop_error_scope()) {
            return Err(e.to_string());
        }
        if let Some(e) = pollster::block_on(device.pop_error_scope()) {
            return Err(e.to_string());
        }

        if elapsed <= 0.0 {
            return Err("kernel finished faster than the clock resolution".to_string());
        }
        Ok(elements as f64 / elapsed)
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn default_element_count_fits_one_dimension() {
            let groups = (10 * 1024 * 1024u64).div_ceil(WORKGROUP_SIZE);
            assert_eq!(dispatch_dims(groups, 65535), (65535, 3));
            assert_eq!(dispatch_dims(100, 65535), (100, 1));
        }

        #[test]
        fn dims_cover_every_group() {
            for groups in [1u64, 64, 65535, 65536, 1_000_000] {
                let (x, y) = dispatch_dims(groups, 65535);
                assert!(u64::from(x) * u64::from(y) >= groups);
                assert!(x <= 65535);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disabled_probe_reports_unavailable() {
        let mut probe = AcceleratorProbe::new(1024, false);
        let err = probe.read(Duration::ZERO).unwrap_err();
        assert_eq!(err.kind, ResourceKind::Accelerator);
        assert_eq!(err.reason, "disabled");
    }
}
