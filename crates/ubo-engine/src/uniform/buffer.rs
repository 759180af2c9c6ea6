use std::sync::Arc;

use anyhow::Result;
use ubo_layout::StructLayout;

use super::encode::encode_values;
use super::error::UniformError;
use super::staged::StagedUpload;
use super::transport::UniformTransport;

/// Outcome of one successful field write.
///
/// `values_written < component_count` marks a partial write: only the
/// leading components were updated and the rest keep their previous bytes.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct FieldWrite {
    /// Base offset of the field inside the uniform block.
    pub byte_offset: u64,
    /// Bytes covered by the write, starting at `byte_offset`.
    pub byte_len: u64,
    pub values_written: usize,
    pub component_count: usize,
}

impl FieldWrite {
    #[inline]
    pub fn is_partial(&self) -> bool {
        self.values_written < self.component_count
    }
}

/// A validated write that has not touched any buffer yet.
pub(super) struct PreparedWrite {
    bytes: Vec<u8>,
    report: FieldWrite,
    field: usize,
}

/// Host state saved when a staged upload begins.
pub(super) struct HostSnapshot {
    host: Vec<u8>,
    partial_writes: u64,
}

/// A uniform block: host copy + device buffer sized to the layout.
///
/// Field writes update the host copy and queue the same bytes on the
/// transport. The device sees them at the next queue submission, so writes for
/// a frame must be issued before that frame's command buffers are submitted.
pub struct UniformBuffer<T: UniformTransport> {
    layout: Arc<StructLayout>,
    transport: T,
    buffer: T::Buffer,
    staging: Option<T::Staging>,
    host: Vec<u8>,
    partial_writes: u64,
    label: String,
}

impl<T: UniformTransport> UniformBuffer<T> {
    /// Allocates a zeroed device buffer of `layout.total_size()` bytes.
    pub fn new(transport: T, layout: impl Into<Arc<StructLayout>>, label: &str) -> Self {
        let layout = layout.into();
        let size = layout.total_size() as u64;
        let buffer = transport.create_uniform_buffer(label, size);

        log::debug!("created uniform buffer `{label}` ({size} bytes, {} fields)", layout.len());

        Self {
            transport,
            buffer,
            staging: None,
            host: vec![0; size as usize],
            partial_writes: 0,
            label: label.to_string(),
            layout,
        }
    }

    /// Layout the buffer was sized from. Shared read-only.
    pub fn layout(&self) -> &Arc<StructLayout> {
        &self.layout
    }

    /// Buffer size in bytes (the layout's total size).
    pub fn total_size(&self) -> u64 {
        self.host.len() as u64
    }

    pub fn buffer(&self) -> &T::Buffer {
        &self.buffer
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// Host copy of the whole uniform block as last written.
    pub fn bytes(&self) -> &[u8] {
        &self.host
    }

    /// Number of writes so far that supplied fewer values than the field has
    /// components.
    pub fn partial_writes(&self) -> u64 {
        self.partial_writes
    }

    /// Writes `values` into field `name` and queues the bytes on the device.
    ///
    /// Fewer values than the field's component count are accepted; only that
    /// prefix is written and the returned [`FieldWrite`] reports it. More values
    /// fail with [`UniformError::SizeMismatch`] and nothing is written.
    pub fn set_field<V>(&mut self, name: &str, values: &[V]) -> Result<FieldWrite, UniformError>
    where
        V: Into<f64> + Copy,
    {
        let prepared = self.prepare(name, values)?;
        Ok(self.apply_queued(prepared))
    }

    /// Writes several fields, validating all of them first.
    ///
    /// If any entry fails, no field is written.
    pub fn set_fields<'n, V, I>(&mut self, fields: I) -> Result<Vec<FieldWrite>, UniformError>
    where
        V: Into<f64> + Copy + 'n,
        I: IntoIterator<Item = (&'n str, &'n [V])>,
    {
        let prepared = self.prepare_all(fields)?;
        Ok(prepared.into_iter().map(|p| self.apply_queued(p)).collect())
    }

    /// Starts a staged upload.
    ///
    /// Resolves once the staging region is mapped for writing. Field writes on
    /// the returned [`StagedUpload`] only reach the device after
    /// [`StagedUpload::commit`].
    pub async fn begin_staged(&mut self) -> Result<StagedUpload<'_, T>> {
        if self.host.is_empty() {
            return Ok(StagedUpload::new(self, false));
        }

        let size = self.total_size();
        let staging = self.staging.get_or_insert_with(|| {
            log::debug!("creating staging buffer for `{}` ({size} bytes)", self.label);
            self.transport.create_staging(&format!("{} staging", self.label), size)
        });
        self.transport.map_staging(staging).await?;

        Ok(StagedUpload::new(self, true))
    }

    // ── internals ──────────────────────────────────────────────────────────

    pub(super) fn prepare<V>(&self, name: &str, values: &[V]) -> Result<PreparedWrite, UniformError>
    where
        V: Into<f64> + Copy,
    {
        let field = self
            .layout
            .index_of(name)
            .ok_or_else(|| UniformError::UnknownField(name.to_string()))?;
        let entry = &self.layout.entries()[field];

        let component_count = entry.ty().component_count();
        if values.len() > component_count {
            return Err(UniformError::SizeMismatch {
                field: name.to_string(),
                expected: component_count,
                got: values.len(),
            });
        }

        let values: Vec<f64> = values.iter().map(|&v| v.into()).collect();
        let bytes = encode_values(entry.ty(), &values);

        Ok(PreparedWrite {
            report: FieldWrite {
                byte_offset: entry.offset as u64,
                byte_len: bytes.len() as u64,
                values_written: values.len(),
                component_count,
            },
            bytes,
            field,
        })
    }

    pub(super) fn prepare_all<'n, V, I>(&self, fields: I) -> Result<Vec<PreparedWrite>, UniformError>
    where
        V: Into<f64> + Copy + 'n,
        I: IntoIterator<Item = (&'n str, &'n [V])>,
    {
        fields
            .into_iter()
            .map(|(name, values)| self.prepare(name, values))
            .collect()
    }

    /// Copies a prepared write into the host block.
    pub(super) fn apply_host(&mut self, prepared: &PreparedWrite) -> FieldWrite {
        let report = prepared.report;
        if report.is_partial() {
            self.partial_writes += 1;
            log::debug!(
                "partial write to uniform field `{}`: {} of {} values",
                self.layout.entries()[prepared.field].name(),
                report.values_written,
                report.component_count
            );
        }

        let start = report.byte_offset as usize;
        self.host[start..start + prepared.bytes.len()].copy_from_slice(&prepared.bytes);
        report
    }

    fn apply_queued(&mut self, prepared: PreparedWrite) -> FieldWrite {
        let report = self.apply_host(&prepared);
        if !prepared.bytes.is_empty() {
            self.transport.queue_write(&self.buffer, report.byte_offset, &prepared.bytes);
        }
        report
    }

    pub(super) fn finish_staged(&mut self, mapped: bool) {
        let Some(staging) = self.staging.as_ref().filter(|_| mapped) else { return };
        self.transport.write_staging(staging, 0, &self.host);
        self.transport.unmap_staging(staging);
        self.transport.copy_staging(staging, &self.buffer, self.host.len() as u64);
    }

    /// Unmaps the staging buffer and puts the host block back as it was when
    /// the upload began.
    pub(super) fn abandon_staged(&mut self, mapped: bool, saved: HostSnapshot) {
        self.host = saved.host;
        self.partial_writes = saved.partial_writes;
        let Some(staging) = self.staging.as_ref().filter(|_| mapped) else { return };
        self.transport.unmap_staging(staging);
    }

    pub(super) fn snapshot(&self) -> HostSnapshot {
        HostSnapshot { host: self.host.clone(), partial_writes: self.partial_writes }
    }
}
