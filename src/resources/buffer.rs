//! CPU-Side Uniform Buffers
//!
//! [`CpuBuffer<T>`] owns a uniform value on the CPU and tracks a version
//! number so the renderer can skip redundant GPU uploads. Settings structs
//! (bloom, tone mapping, depth of field) embed these buffers and expose
//! setter methods that go through [`CpuBuffer::write`]; the version bump is
//! automatic when the write guard drops.
//!
//! The GPU buffer itself is created lazily on the first [`CpuBuffer::sync`]
//! call and reused for the lifetime of the value. Its size never changes, so
//! bind groups that reference it stay valid across updates.

use std::sync::Arc;

use bytemuck::Pod;

/// Declares a `#[repr(C)]` plain-old-data struct for GPU upload.
///
/// Fields may carry `= expr` initializers which feed the generated
/// `Default` impl; fields without one fall back to `Default::default()`.
/// WGSL `std140`-style alignment is the caller's responsibility: pad
/// structs to 16 bytes with explicit `__pad` fields.
#[macro_export]
macro_rules! define_gpu_data_struct {
    (
        $(#[$struct_meta:meta])*
        $struct_vis:vis struct $name:ident {
            $(
                $(#[$field_meta:meta])*
                $vis:vis $field:ident : $ty:ty $(= $default:expr)?
            ),* $(,)?
        }
    ) => {
        $(#[$struct_meta])*
        #[repr(C)]
        #[derive(Debug, Clone, Copy, PartialEq, ::bytemuck::Pod, ::bytemuck::Zeroable)]
        $struct_vis struct $name {
            $(
                $(#[$field_meta])*
                $vis $field: $ty,
            )*
        }

        impl Default for $name {
            fn default() -> Self {
                Self {
                    $(
                        $field: $crate::define_gpu_data_struct!(@default $($default)?),
                    )*
                }
            }
        }
    };
    (@default $default:expr) => { $default };
    (@default) => { ::core::default::Default::default() };
}

/// Uniform data with automatic version tracking and lazy GPU mirroring.
#[derive(Debug)]
pub struct CpuBuffer<T: Pod> {
    data: T,
    version: u64,

    usage: wgpu::BufferUsages,
    label: Option<&'static str>,

    // GPU 镜像：首次 sync 时创建，之后只做 write_buffer
    gpu: Option<Arc<wgpu::Buffer>>,
    synced_version: u64,
}

impl<T: Pod> CpuBuffer<T> {
    pub fn new(data: T, usage: wgpu::BufferUsages, label: Option<&'static str>) -> Self {
        Self {
            data,
            version: 1,
            usage,
            label,
            gpu: None,
            synced_version: 0,
        }
    }

    /// Read access to the current value.
    #[inline]
    pub fn read(&self) -> BufferReadGuard<'_, T> {
        BufferReadGuard { data: &self.data }
    }

    /// Write access. The version is bumped when the guard drops, whether or
    /// not the value actually changed.
    #[inline]
    pub fn write(&mut self) -> BufferGuard<'_, T> {
        BufferGuard {
            data: &mut self.data,
            version: &mut self.version,
        }
    }

    /// Current data version.
    #[inline]
    #[must_use]
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Ensures the GPU mirror exists and carries the current value.
    ///
    /// Uploads only when the version changed since the last sync. The
    /// returned buffer handle is stable across calls.
    pub fn sync(&mut self, device: &wgpu::Device, queue: &wgpu::Queue) -> &Arc<wgpu::Buffer> {
        if self.gpu.is_none() {
            self.synced_version = 0;
        }

        let (usage, label) = (self.usage, self.label);
        let size = std::mem::size_of::<T>() as u64;
        let buffer = self.gpu.get_or_insert_with(|| {
            Arc::new(device.create_buffer(&wgpu::BufferDescriptor {
                label,
                size,
                usage,
                mapped_at_creation: false,
            }))
        });

        if self.synced_version != self.version {
            queue.write_buffer(buffer, 0, bytemuck::bytes_of(&self.data));
            self.synced_version = self.version;
        }

        buffer
    }

    /// Returns the GPU buffer if `sync` has been called at least once.
    #[inline]
    #[must_use]
    pub fn gpu_buffer(&self) -> Option<&Arc<wgpu::Buffer>> {
        self.gpu.as_ref()
    }
}

// 克隆只复制 CPU 数据，GPU 镜像在下一次 sync 时重建
impl<T: Pod> Clone for CpuBuffer<T> {
    fn clone(&self) -> Self {
        Self {
            data: self.data,
            version: self.version,
            usage: self.usage,
            label: self.label,
            gpu: None,
            synced_version: 0,
        }
    }
}

/// Shared read guard over a [`CpuBuffer`] value.
pub struct BufferReadGuard<'a, T> {
    data: &'a T,
}

impl<T> std::ops::Deref for BufferReadGuard<'_, T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        self.data
    }
}

/// Mutable guard; bumps the buffer version when dropped.
pub struct BufferGuard<'a, T> {
    data: &'a mut T,
    version: &'a mut u64,
}

impl<T> std::ops::Deref for BufferGuard<'_, T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        self.data
    }
}

impl<T> std::ops::DerefMut for BufferGuard<'_, T> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.data
    }
}

impl<T> Drop for BufferGuard<'_, T> {
    fn drop(&mut self) {
        *self.version = self.version.wrapping_add(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    define_gpu_data_struct!(
        struct TestUniforms {
            pub value: f32 = 2.5,
            pub __pad: [u32; 3],
        }
    );

    define_gpu_data_struct!(
        pub struct VisibleUniforms {
            pub value: u32 = 1,
            pub __pad: [u32; 3],
        }
    );

    fn make_buffer() -> CpuBuffer<TestUniforms> {
        CpuBuffer::new(
            TestUniforms::default(),
            wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            Some("TestUniforms"),
        )
    }

    #[test]
    fn defaults_come_from_field_initializers() {
        let u = TestUniforms::default();
        assert_eq!(u.value, 2.5);
        assert_eq!(u.__pad, [0, 0, 0]);
    }

    #[test]
    fn macro_accepts_a_struct_visibility() {
        // 调用端可以写 `pub struct`，生成的结构体跟随该可见性
        assert_eq!(VisibleUniforms::default().value, 1);
    }

    #[test]
    fn write_guard_bumps_version_on_drop() {
        let mut buf = make_buffer();
        let v0 = buf.version();

        buf.write().value = 7.0;

        assert_eq!(buf.read().value, 7.0);
        assert_eq!(buf.version(), v0 + 1, "dropping the guard must bump the version");
    }

    #[test]
    fn read_does_not_bump_version() {
        let buf = make_buffer();
        let v0 = buf.version();
        let _ = buf.read().value;
        assert_eq!(buf.version(), v0);
    }

    #[test]
    fn clone_detaches_gpu_mirror() {
        let mut buf = make_buffer();
        buf.write().value = 3.0;

        let cloned = buf.clone();
        assert_eq!(cloned.read().value, 3.0);
        assert_eq!(cloned.version(), buf.version());
        assert!(cloned.gpu_buffer().is_none());
    }
}
