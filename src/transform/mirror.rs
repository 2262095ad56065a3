//! GPU mirror of the world-matrix block.

use crate::math::Matrix4;
use thiserror::Error;

/// Default mirror capacity, in matrices.
pub const MIRROR_DEFAULT_CAPACITY: usize = 16384;

/// Destination for the per-frame world-matrix snapshot.
///
/// The transform system copies the whole world-matrix block into the
/// attached mirror at the end of every update. The renderer is
/// responsible for any fencing before it reads the buffer.
pub trait TransformMirror {
    /// Number of matrices the mirror can hold.
    fn capacity_matrices(&self) -> usize;

    /// Copy the world-matrix block into the mirror. Slices longer than
    /// the capacity are truncated.
    fn write(&mut self, matrices: &[Matrix4]);
}

/// Errors from creating a GPU mirror.
#[derive(Error, Debug)]
pub enum MirrorError {
    /// The requested capacity does not fit in a single storage binding.
    #[error("mirror of {requested} matrices ({bytes} bytes) exceeds the device's storage binding limit of {limit} bytes")]
    CapacityTooLarge {
        /// Requested capacity in matrices.
        requested: usize,
        /// Requested capacity in bytes.
        bytes: u64,
        /// Device storage-binding byte limit.
        limit: u64,
    },
}

/// A wgpu storage-buffer mirror.
///
/// Shaders bind [`StorageBufferMirror::buffer`] as a read-only storage
/// buffer of column-major `mat4x4<f32>` entries indexed by transform
/// handle.
pub struct StorageBufferMirror {
    buffer: wgpu::Buffer,
    queue: wgpu::Queue,
    capacity: usize,
}

impl StorageBufferMirror {
    /// Create a mirror holding `max_matrices` world matrices.
    pub fn new(
        device: &wgpu::Device,
        queue: wgpu::Queue,
        max_matrices: usize,
    ) -> Result<Self, MirrorError> {
        let bytes = (max_matrices * std::mem::size_of::<Matrix4>()) as u64;
        let limit = u64::from(device.limits().max_storage_buffer_binding_size);
        if bytes > limit {
            return Err(MirrorError::CapacityTooLarge {
                requested: max_matrices,
                bytes,
                limit,
            });
        }

        let buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Transform World Matrix Mirror"),
            size: bytes,
            usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        Ok(Self {
            buffer,
            queue,
            capacity: max_matrices,
        })
    }

    /// Create a mirror with [`MIRROR_DEFAULT_CAPACITY`].
    pub fn with_default_capacity(
        device: &wgpu::Device,
        queue: wgpu::Queue,
    ) -> Result<Self, MirrorError> {
        Self::new(device, queue, MIRROR_DEFAULT_CAPACITY)
    }

    /// The underlying storage buffer, for bind group creation.
    #[inline]
    pub fn buffer(&self) -> &wgpu::Buffer {
        &self.buffer
    }
}

impl TransformMirror for StorageBufferMirror {
    fn capacity_matrices(&self) -> usize {
        self.capacity
    }

    fn write(&mut self, matrices: &[Matrix4]) {
        let count = matrices.len().min(self.capacity);
        self.queue
            .write_buffer(&self.buffer, 0, bytemuck::cast_slice(&matrices[..count]));
    }
}
