use super::buffer::{FieldWrite, HostSnapshot, UniformBuffer};
use super::error::UniformError;
use super::transport::UniformTransport;

/// An in-progress staged upload with the staging region mapped for writing.
///
/// Obtained from [`UniformBuffer::begin_staged`]. Field writes go to the host
/// block only; [`commit`](Self::commit) copies the whole block into the
/// staging region, unmaps it and submits the copy into the uniform buffer.
///
/// Dropping without committing unmaps the staging region and rolls the host
/// block (and the partial-write count) back to where it stood at
/// [`UniformBuffer::begin_staged`], so neither side sees the abandoned writes.
#[must_use = "staged writes reach the device only after commit()"]
pub struct StagedUpload<'a, T: UniformTransport> {
    owner: &'a mut UniformBuffer<T>,
    saved: Option<HostSnapshot>,
    mapped: bool,
    writes: usize,
}

impl<'a, T: UniformTransport> StagedUpload<'a, T> {
    pub(super) fn new(owner: &'a mut UniformBuffer<T>, mapped: bool) -> Self {
        let saved = Some(owner.snapshot());
        Self { owner, saved, mapped, writes: 0 }
    }

    /// Same contract as [`UniformBuffer::set_field`], without queueing.
    pub fn set_field<V>(&mut self, name: &str, values: &[V]) -> Result<FieldWrite, UniformError>
    where
        V: Into<f64> + Copy,
    {
        let prepared = self.owner.prepare(name, values)?;
        self.writes += 1;
        Ok(self.owner.apply_host(&prepared))
    }

    /// Same contract as [`UniformBuffer::set_fields`], without queueing.
    pub fn set_fields<'n, V, I>(&mut self, fields: I) -> Result<Vec<FieldWrite>, UniformError>
    where
        V: Into<f64> + Copy + 'n,
        I: IntoIterator<Item = (&'n str, &'n [V])>,
    {
        let prepared = self.owner.prepare_all(fields)?;
        self.writes += prepared.len();
        Ok(prepared.iter().map(|p| self.owner.apply_host(p)).collect())
    }

    /// Field writes made through this upload so far.
    pub fn write_count(&self) -> usize {
        self.writes
    }

    /// Writes the host block into the staging region, unmaps it and submits
    /// the copy into the uniform buffer.
    pub fn commit(mut self) {
        self.owner.finish_staged(self.mapped);
        self.saved = None;
        log::trace!("committed staged upload for `{}` ({} writes)", self.owner.label(), self.writes);
    }
}

impl<T: UniformTransport> Drop for StagedUpload<'_, T> {
    fn drop(&mut self) {
        let Some(saved) = self.saved.take() else { return };
        log::warn!(
            "staged upload for `{}` dropped without commit; {} writes discarded",
            self.owner.label(),
            self.writes
        );
        self.owner.abandon_staged(self.mapped, saved);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::uniform::transport::recording::{Op, RecordingTransport};
    use ubo_layout::StructSpec;

    fn buffer() -> (UniformBuffer<RecordingTransport>, RecordingTransport) {
        let layout = StructSpec::new()
            .field("resolution", "vec2<f32>")
            .field("time", "f32")
            .build()
            .unwrap();
        let transport = RecordingTransport::default();
        let ubo = UniformBuffer::new(transport.clone(), layout, "staged");
        transport.clear();
        (ubo, transport)
    }

    #[test]
    fn acquire_write_commit_runs_in_order() {
        let (mut ubo, transport) = buffer();

        let mut upload = pollster::block_on(ubo.begin_staged()).unwrap();
        upload.set_field("time", &[2.5f32]).unwrap();
        upload.commit();

        let mut expected = vec![0u8; 16];
        expected[8..12].copy_from_slice(&2.5f32.to_ne_bytes());
        assert_eq!(
            transport.ops(),
            [
                Op::CreateStaging { size: 16 },
                Op::Map,
                Op::WriteStaging { offset: 0, bytes: expected.clone() },
                Op::Unmap,
                Op::Copy { size: 16 },
            ]
        );
        assert_eq!(ubo.bytes(), expected.as_slice());
    }

    #[test]
    fn staging_buffer_is_reused() {
        let (mut ubo, transport) = buffer();
        for _ in 0..3 {
            pollster::block_on(ubo.begin_staged()).unwrap().commit();
        }
        let creates = transport
            .ops()
            .iter()
            .filter(|op| matches!(op, Op::CreateStaging { .. }))
            .count();
        assert_eq!(creates, 1);
    }

    #[test]
    fn staged_errors_match_queued_errors() {
        let (mut ubo, transport) = buffer();
        let mut upload = pollster::block_on(ubo.begin_staged()).unwrap();

        assert_eq!(
            upload.set_field("nope", &[1.0]),
            Err(UniformError::UnknownField("nope".into()))
        );
        assert!(matches!(
            upload.set_field("time", &[1.0, 2.0]),
            Err(UniformError::SizeMismatch { expected: 1, got: 2, .. })
        ));
        assert_eq!(upload.write_count(), 0);
        upload.commit();

        // Only the full (zeroed) block went out; no queued writes.
        assert!(!transport.ops().iter().any(|op| matches!(op, Op::QueueWrite { .. })));
        assert!(ubo.bytes().iter().all(|&b| b == 0));
    }

    #[test]
    fn dropping_without_commit_unmaps_and_skips_copy() {
        let (mut ubo, transport) = buffer();
        {
            let mut upload = pollster::block_on(ubo.begin_staged()).unwrap();
            upload.set_field("resolution", &[640.0f32, 480.0]).unwrap();
        }
        assert_eq!(transport.ops(), [Op::CreateStaging { size: 16 }, Op::Map, Op::Unmap]);
        assert!(ubo.bytes().iter().all(|&b| b == 0));
    }

    // ── rollback ──────────────────────────────────────────────────────────

    #[test]
    fn abandoned_values_never_reach_a_later_commit() {
        let (mut ubo, transport) = buffer();
        ubo.set_field("time", &[1.5f32]).unwrap();
        let before = ubo.bytes().to_vec();

        {
            let mut upload = pollster::block_on(ubo.begin_staged()).unwrap();
            upload.set_field("time", &[9.0f32]).unwrap();
        }
        assert_eq!(ubo.bytes(), before.as_slice());

        transport.clear();
        pollster::block_on(ubo.begin_staged()).unwrap().commit();

        let staged: Vec<_> = transport
            .ops()
            .into_iter()
            .filter_map(|op| match op {
                Op::WriteStaging { bytes, .. } => Some(bytes),
                _ => None,
            })
            .collect();
        assert_eq!(staged, [before]);
        assert_eq!(&staged[0][8..12], &1.5f32.to_ne_bytes());
    }

    #[test]
    fn abandoned_partial_writes_are_not_counted() {
        let (mut ubo, _) = buffer();
        ubo.set_field("resolution", &[1.0f32]).unwrap();
        {
            let mut upload = pollster::block_on(ubo.begin_staged()).unwrap();
            upload.set_field("resolution", &[2.0f32]).unwrap();
        }
        assert_eq!(ubo.partial_writes(), 1);
    }

    #[test]
    fn empty_layout_abandon_is_a_no_op() {
        let layout = StructSpec::new().build().unwrap();
        let transport = RecordingTransport::default();
        let mut ubo = UniformBuffer::new(transport.clone(), layout, "empty");
        transport.clear();

        drop(pollster::block_on(ubo.begin_staged()).unwrap());
        assert!(transport.ops().is_empty());
        assert!(ubo.bytes().is_empty());
    }

    #[test]
    fn failed_map_surfaces_error() {
        let layout = StructSpec::new().field("time", "f32").build().unwrap();
        let transport = RecordingTransport::failing_map();
        let mut ubo = UniformBuffer::new(transport.clone(), layout, "fails");

        assert!(pollster::block_on(ubo.begin_staged()).is_err());
        assert!(!transport.ops().contains(&Op::Map));
    }

    #[test]
    fn empty_layout_skips_staging() {
        let layout = StructSpec::new().build().unwrap();
        let transport = RecordingTransport::default();
        let mut ubo = UniformBuffer::new(transport.clone(), layout, "empty");
        transport.clear();

        pollster::block_on(ubo.begin_staged()).unwrap().commit();
        assert!(transport.ops().is_empty());
    }

    #[test]
    fn staged_partial_write_is_counted() {
        let (mut ubo, _) = buffer();
        let mut upload = pollster::block_on(ubo.begin_staged()).unwrap();
        let w = upload.set_field("resolution", &[1.0f32]).unwrap();
        assert!(w.is_partial());
        upload.commit();
        assert_eq!(ubo.partial_writes(), 1);
    }
}
