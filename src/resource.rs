//! Loading resource bytes, in place from flash when possible.
//!
//! A resource can come to us two ways:
//!
//! * **Mapped:** the resource lives in read-only, memory-mapped flash, so we
//!   hand out a view of it directly. Every live view holds one count in a
//!   shared table, and the count drops when the view is released.
//! * **Heap:** the resource can't be mapped (it's not flash resident, or the
//!   platform can't map flash), so it's read into a fresh heap buffer.
//!
//! [`ResourceBytes`] is the handle for either kind. Releasing it (explicitly
//! with [`ResourceMap::release`], or just by dropping it) does the right thing
//! for whichever kind it is, so a mapped view can never be "freed" and a heap
//! copy can never leak.

use alloc::{collections::BTreeMap, sync::Arc, vec::Vec};
use core::cell::RefCell;

use critical_section::Mutex;
use log::{debug, trace, warn};

use crate::{DecodeError, PlatformConfig};

/// Identifies which app's resource pack a resource is in.
pub type AppNum = u32;

/// Identifies a resource within an app's resource pack.
pub type ResourceId = u32;

/// An `(app, resource)` pair.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[allow(missing_docs)]
pub struct ResourceKey {
  pub app: AppNum,
  pub id: ResourceId,
}

/// How many extra bytes a padded heap load gets.
pub const ALIGNMENT_PAD: usize = 7;

/// The system's resource storage.
///
/// This is implemented outside of this crate, by whatever owns the flash and
/// the resource table.
pub trait ResourceStore {
  /// Size of the resource in bytes, or 0 if there's no such resource.
  fn size(&self, app: AppNum, id: ResourceId) -> usize;

  /// Reads bytes from `offset` into `buffer`, returning how many bytes were
  /// actually read.
  fn load_range(&self, app: AppNum, id: ResourceId, offset: usize, buffer: &mut [u8]) -> usize;

  /// The resource's bytes, but only if they are directly addressable
  /// read-only memory (built-in or flash resident).
  fn read_only_bytes(&self, app: AppNum, id: ResourceId) -> Option<&'static [u8]>;
}

impl<S: ResourceStore + ?Sized> ResourceStore for &S {
  #[inline]
  fn size(&self, app: AppNum, id: ResourceId) -> usize {
    S::size(self, app, id)
  }
  #[inline]
  fn load_range(&self, app: AppNum, id: ResourceId, offset: usize, buffer: &mut [u8]) -> usize {
    S::load_range(self, app, id, offset, buffer)
  }
  #[inline]
  fn read_only_bytes(&self, app: AppNum, id: ResourceId) -> Option<&'static [u8]> {
    S::read_only_bytes(self, app, id)
  }
}

/// Count of live views per mapped resource.
struct MappingTable {
  counts: Mutex<RefCell<BTreeMap<ResourceKey, usize>>>,
}
impl MappingTable {
  fn new() -> Self {
    Self { counts: Mutex::new(RefCell::new(BTreeMap::new())) }
  }

  fn acquire(&self, key: ResourceKey) -> usize {
    critical_section::with(|cs| {
      let mut counts = self.counts.borrow_ref_mut(cs);
      let count = counts.entry(key).or_insert(0);
      *count += 1;
      *count
    })
  }

  fn release(&self, key: ResourceKey) -> usize {
    critical_section::with(|cs| {
      let mut counts = self.counts.borrow_ref_mut(cs);
      match counts.get_mut(&key) {
        Some(count) if *count > 1 => {
          *count -= 1;
          *count
        }
        Some(_) => {
          counts.remove(&key);
          0
        }
        None => {
          warn!("released a mapping of {key:?} that had no live count");
          0
        }
      }
    })
  }

  fn count(&self, key: ResourceKey) -> usize {
    critical_section::with(|cs| self.counts.borrow_ref(cs).get(&key).copied().unwrap_or(0))
  }
}

/// A read-only view of a flash-mapped resource.
///
/// Holds one count on the mapping for as long as it's alive.
pub struct MappedBytes {
  key: ResourceKey,
  bytes: &'static [u8],
  table: Arc<MappingTable>,
}
impl MappedBytes {
  /// Which resource this is a view of.
  #[inline]
  #[must_use]
  pub fn key(&self) -> ResourceKey {
    self.key
  }
}
impl Drop for MappedBytes {
  fn drop(&mut self) {
    let left = self.table.release(self.key);
    trace!("unmapped {:?}, {} views left", self.key, left);
  }
}
impl core::fmt::Debug for MappedBytes {
  fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
    f.debug_struct("MappedBytes").field("key", &self.key).field("len", &self.bytes.len()).finish()
  }
}

/// A private heap copy of (part of) a resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeapBytes {
  buf: Vec<u8>,
  start: usize,
  len: usize,
}
impl HeapBytes {
  /// Wraps an existing buffer.
  #[inline]
  #[must_use]
  pub fn from_vec(buf: Vec<u8>) -> Self {
    let len = buf.len();
    Self { buf, start: 0, len }
  }

  /// Extra bytes past the data which can be used to re-align it.
  #[inline]
  #[must_use]
  pub fn slack(&self) -> usize {
    self.buf.len() - self.len
  }

  /// Shifts the data within its buffer so that it starts at an address that's
  /// a multiple of `align`.
  ///
  /// This only works when there's enough slack, which is what the
  /// `want_alignment_pad` option of [`ResourceMap::mmap_or_load`] is for.
  /// Returns if the data is now aligned.
  pub fn align_start(&mut self, align: usize) -> bool {
    if align == 0 || !align.is_power_of_two() {
      return false;
    }
    let base = self.buf.as_ptr() as usize;
    let new_start = (align - (base % align)) % align;
    if new_start + self.len > self.buf.len() {
      return false;
    }
    if new_start != self.start {
      self.buf.copy_within(self.start..self.start + self.len, new_start);
      self.start = new_start;
    }
    true
  }

  /// Drops `n` leading bytes by moving the rest of the data to the front.
  pub(crate) fn absorb_front(&mut self, n: usize) {
    let n = n.min(self.len);
    self.buf.copy_within(self.start + n..self.start + self.len, self.start);
    self.len -= n;
  }

  /// Unwraps into just the data bytes.
  #[must_use]
  pub fn into_vec(mut self) -> Vec<u8> {
    if self.start != 0 {
      self.buf.copy_within(self.start..self.start + self.len, 0);
    }
    self.buf.truncate(self.len);
    self.buf
  }
}

/// Bytes of a resource, either mapped from flash or copied to the heap.
#[derive(Debug)]
pub enum ResourceBytes {
  /// A view into read-only flash.
  Mapped(MappedBytes),
  /// A heap buffer owned by this handle.
  Heap(HeapBytes),
}
impl ResourceBytes {
  /// The resource data.
  #[inline]
  #[must_use]
  pub fn as_slice(&self) -> &[u8] {
    match self {
      Self::Mapped(m) => m.bytes,
      Self::Heap(h) => &h.buf[h.start..h.start + h.len],
    }
  }

  /// The resource data, if it's writable (only heap copies are).
  #[inline]
  #[must_use]
  pub fn as_mut_slice(&mut self) -> Option<&mut [u8]> {
    match self {
      Self::Mapped(_) => None,
      Self::Heap(h) => Some(&mut h.buf[h.start..h.start + h.len]),
    }
  }

  #[inline]
  #[must_use]
  #[allow(missing_docs)]
  pub fn len(&self) -> usize {
    self.as_slice().len()
  }

  #[inline]
  #[must_use]
  #[allow(missing_docs)]
  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }

  /// If this is a view of read-only flash.
  #[inline]
  #[must_use]
  pub fn is_mapped(&self) -> bool {
    matches!(self, Self::Mapped(_))
  }

  /// Removes `n` bytes from the front of the data.
  ///
  /// A mapped view just narrows. A heap copy moves the remaining data to the
  /// front of its buffer, so the header it's absorbing costs nothing extra.
  pub fn advance(&mut self, n: usize) {
    match self {
      Self::Mapped(m) => m.bytes = m.bytes.get(n..).unwrap_or(&[]),
      Self::Heap(h) => h.absorb_front(n),
    }
  }

  /// Converts into a private, writable copy.
  ///
  /// A heap copy is returned as is; a mapped view is copied (and released).
  pub fn into_heap(self) -> Result<HeapBytes, DecodeError> {
    match self {
      Self::Heap(h) => Ok(h),
      Self::Mapped(m) => {
        let mut buf = Vec::new();
        buf.try_reserve_exact(m.bytes.len())?;
        buf.extend_from_slice(m.bytes);
        Ok(HeapBytes::from_vec(buf))
      }
    }
  }
}

/// Gives out resource bytes, zero-copy when possible.
pub struct ResourceMap<S> {
  store: S,
  table: Arc<MappingTable>,
  mapping_enabled: bool,
}
impl<S: ResourceStore> ResourceMap<S> {
  /// A map that will use flash mapping whenever the store offers it.
  #[inline]
  #[must_use]
  pub fn new(store: S) -> Self {
    Self { store, table: Arc::new(MappingTable::new()), mapping_enabled: true }
  }

  /// A map that only tries flash mapping if the platform supports it.
  #[inline]
  #[must_use]
  pub fn with_platform(store: S, platform: &PlatformConfig) -> Self {
    Self { store, table: Arc::new(MappingTable::new()), mapping_enabled: platform.mappable_flash }
  }

  /// The underlying store.
  #[inline]
  #[must_use]
  pub fn store(&self) -> &S {
    &self.store
  }

  /// Size of a resource, 0 if it doesn't exist.
  #[inline]
  #[must_use]
  pub fn size(&self, app: AppNum, id: ResourceId) -> usize {
    self.store.size(app, id)
  }

  /// Gets `length` bytes of a resource starting at `offset`.
  ///
  /// A read-only mapping is tried first. If the resource can't be mapped the
  /// bytes are read into a new heap buffer instead. With `want_alignment_pad`
  /// the heap buffer gets [`ALIGNMENT_PAD`] bytes of slack so the caller can
  /// [re-align](HeapBytes::align_start) the data. Whether that matters
  /// depends on the platform's cost for unaligned access. The option has no
  /// effect on a mapping.
  ///
  /// ## Failure
  /// * The range is outside of a mappable resource.
  /// * The heap buffer couldn't be allocated.
  /// * The read came up short. A partly filled buffer is never returned.
  pub fn mmap_or_load(
    &self, app: AppNum, id: ResourceId, offset: usize, length: usize, want_alignment_pad: bool,
  ) -> Option<ResourceBytes> {
    self.fetch(app, id, offset, length, want_alignment_pad).ok()
  }

  /// [`mmap_or_load`](Self::mmap_or_load), keeping the reason for a failure.
  ///
  /// A bad range or a short read is `Malformed`, since the store disagrees
  /// with its own size. Only a failed allocation is `OutOfMemory`.
  fn fetch(
    &self, app: AppNum, id: ResourceId, offset: usize, length: usize, want_alignment_pad: bool,
  ) -> Result<ResourceBytes, DecodeError> {
    let key = ResourceKey { app, id };
    if self.mapping_enabled {
      if let Some(all_bytes) = self.store.read_only_bytes(app, id) {
        let range = offset.checked_add(length).and_then(|end| all_bytes.get(offset..end));
        let bytes = match range {
          Some(bytes) => bytes,
          None => {
            warn!("mapping of {key:?} at {offset}+{length} is out of range");
            return Err(DecodeError::Malformed);
          }
        };
        let count = self.table.acquire(key);
        trace!("mapped {key:?} at {offset}+{length}, {count} views live");
        return Ok(ResourceBytes::Mapped(MappedBytes {
          key,
          bytes,
          table: Arc::clone(&self.table),
        }));
      }
    }
    let capacity = length
      .checked_add(if want_alignment_pad { ALIGNMENT_PAD } else { 0 })
      .ok_or(DecodeError::OutOfMemory)?;
    let mut buf: Vec<u8> = Vec::new();
    if buf.try_reserve_exact(capacity).is_err() {
      warn!("no memory to load {key:?} ({capacity} bytes)");
      return Err(DecodeError::OutOfMemory);
    }
    buf.resize(capacity, 0);
    let read = self.store.load_range(app, id, offset, &mut buf[..length]);
    if read != length {
      warn!("short read of {key:?}: {read} of {length} bytes");
      return Err(DecodeError::Malformed);
    }
    trace!("loaded {key:?} at {offset}+{length} to the heap");
    Ok(ResourceBytes::Heap(HeapBytes { buf, start: 0, len: length }))
  }

  /// Gets the whole of a resource.
  ///
  /// ## Failure
  /// * `NotFound` if the resource is missing or empty.
  /// * `OutOfMemory` if there's no room for a heap copy.
  /// * `Malformed` if the store hands back fewer bytes than it claims to hold.
  pub fn load(
    &self, app: AppNum, id: ResourceId, want_alignment_pad: bool,
  ) -> Result<ResourceBytes, DecodeError> {
    let size = self.store.size(app, id);
    if size == 0 {
      return Err(DecodeError::NotFound);
    }
    let bytes = self.fetch(app, id, 0, size, want_alignment_pad)?;
    debug!(
      "resource {app}:{id} is {size} bytes ({})",
      if bytes.is_mapped() { "mapped" } else { "heap" }
    );
    Ok(bytes)
  }

  /// Gives back bytes from [`mmap_or_load`](Self::mmap_or_load).
  ///
  /// Mapped views drop their count, heap copies are freed. Dropping the
  /// handle has the same effect, this just makes it explicit.
  pub fn release(&self, bytes: ResourceBytes) {
    match bytes {
      ResourceBytes::Mapped(m) => trace!("releasing mapped view of {:?}", m.key),
      ResourceBytes::Heap(h) => trace!("freeing {} heap bytes", h.buf.len()),
    }
  }

  /// How many mapped views of a resource are currently live.
  #[inline]
  #[must_use]
  pub fn mapped_refcount(&self, app: AppNum, id: ResourceId) -> usize {
    self.table.count(ResourceKey { app, id })
  }
}
