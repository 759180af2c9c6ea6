//! Headless uniform-layout probe.
//!
//! Builds a uniform block, uploads a few frames of values (alternating the
//! queued and staged paths) and reads the block back through a compute shader.
//! Any component the device sees at a different place than the host wrote it
//! is reported and the process exits with an error.
//!
//! Usage: `ubo-probe [frames]` (default 4).

mod readback;
mod shader;

use anyhow::{Context, Result};
use ubo_engine::device::{GpuContext, GpuInit};
use ubo_engine::layout::{StructLayout, StructSpec};
use ubo_engine::logging::{init_logging, LoggingConfig};
use ubo_engine::{UniformBuffer, UniformError, WgpuTransport};

use readback::Probe;

const DEFAULT_FRAMES: u32 = 4;

fn main() -> Result<()> {
    init_logging(LoggingConfig::default());

    let frames = match std::env::args().nth(1) {
        Some(arg) => arg.parse().with_context(|| format!("invalid frame count `{arg}`"))?,
        None => DEFAULT_FRAMES,
    };

    let layout = StructSpec::new()
        .field("resolution", "vec2<f32>")
        .field("mousePos", "vec2<f32>")
        .field("time", "f32")
        .field("tint", "vec3<f32>")
        .field("xform", "mat3x3<f32>")
        .field("frame", "u32")
        .field("scroll", "vec2<i32>")
        .build()
        .context("invalid probe uniform layout")?;

    for entry in layout.iter() {
        log::info!(
            "  {:<12} {:<12} offset {:>3}  size {:>2}  align {:>2}",
            entry.name(),
            entry.ty().to_string(),
            entry.offset,
            entry.ty().size_of(),
            entry.ty().align_of()
        );
    }
    log::info!("total size {} bytes, align {}", layout.total_size(), layout.max_align());

    let source = shader::probe_source(&layout)?;
    log::debug!("probe shader:\n{source}");

    pollster::block_on(run(layout, &source, frames))
}

async fn run(layout: StructLayout, source: &str, frames: u32) -> Result<()> {
    let gpu = GpuContext::new(GpuInit::default()).await?;
    let slots = shader::component_total(&layout);

    let mut uniforms = gpu.create_uniforms(layout, "probe uniforms");
    let probe = Probe::new(&gpu, &uniforms, source, slots)?;

    let mut mismatches = 0usize;
    for frame in 0..frames {
        if frame % 2 == 0 {
            write_frame(&mut uniforms, frame)?;
        } else {
            let mut upload = uniforms.begin_staged().await?;
            write_frame_staged(&mut upload, frame)?;
            upload.commit();
        }

        let device_bits = probe.run(&gpu).await?;
        let host_bits = shader::expected_bits(uniforms.layout(), uniforms.bytes());
        mismatches += report(&uniforms, frame, &host_bits, &device_bits);
    }

    anyhow::ensure!(mismatches == 0, "{mismatches} component(s) disagree between host and device");
    log::info!("{frames} frame(s) verified; host and device layouts agree");
    Ok(())
}

/// Per-frame values for every field, in declaration order.
fn frame_values(frame: u32) -> Vec<(&'static str, Vec<f64>)> {
    let t = f64::from(frame) * 0.016;
    let (s, c) = t.sin_cos();
    vec![
        ("resolution", vec![1280.0, 720.0]),
        ("mousePos", vec![f64::from(frame) * 3.0, f64::from(frame) * 5.0]),
        ("time", vec![t]),
        ("tint", vec![0.25, 0.5, 0.75]),
        ("xform", vec![c, s, 0.0, -s, c, 0.0, 0.0, 0.0, 1.0]),
        ("frame", vec![f64::from(frame)]),
        ("scroll", vec![-f64::from(frame), f64::from(frame) * 2.0]),
    ]
}

fn write_frame(uniforms: &mut UniformBuffer<WgpuTransport>, frame: u32) -> Result<(), UniformError> {
    let values = frame_values(frame);
    uniforms.set_fields(values.iter().map(|(name, v)| (*name, v.as_slice())))?;
    Ok(())
}

fn write_frame_staged(
    upload: &mut ubo_engine::StagedUpload<'_, WgpuTransport>,
    frame: u32,
) -> Result<(), UniformError> {
    let values = frame_values(frame);
    upload.set_fields(values.iter().map(|(name, v)| (*name, v.as_slice())))?;
    Ok(())
}

/// Logs per-field disagreements and returns how many components differ.
fn report(
    uniforms: &UniformBuffer<WgpuTransport>,
    frame: u32,
    host: &[u32],
    device: &[u32],
) -> usize {
    let mut slot = 0usize;
    let mut bad = 0usize;
    for entry in uniforms.layout().iter() {
        let n = entry.ty().component_count();
        let (want, got) = (&host[slot..slot + n], &device[slot..slot + n]);
        let differing = want.iter().zip(got).filter(|(h, d)| h != d).count();
        if differing > 0 {
            log::error!(
                "frame {frame}: field `{}` at offset {}: host {want:08x?} device {got:08x?}",
                entry.name(),
                entry.offset,
            );
            bad += differing;
        }
        slot += n;
    }
    if bad == 0 {
        log::info!("frame {frame}: {slot} components match");
    }
    bad
}
