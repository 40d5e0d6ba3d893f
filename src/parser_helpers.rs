#![forbid(unsafe_code)]

//! Shorthands for pulling fixed-size values off the front of a byte slice.
//!
//! Everything here is bounds checked: running out of bytes is
//! [`DecodeError::Malformed`], never a panic.

use alloc::vec::Vec;
use bytemuck::{checked::pod_read_unaligned, Pod};
use core::mem::size_of;

use crate::DecodeError;

#[inline]
pub(crate) fn try_pull_byte_array<const N: usize>(
  bytes: &[u8],
) -> Result<([u8; N], &[u8]), DecodeError> {
  let (head, tail) = try_split_at(bytes, N)?;
  let head: [u8; N] = head.try_into().map_err(|_| DecodeError::Malformed)?;
  Ok((head, tail))
}

#[inline]
pub(crate) fn try_pull_pod<T: Pod>(bytes: &[u8]) -> Result<(T, &[u8]), DecodeError> {
  let position = size_of::<T>();
  if bytes.len() >= position {
    let (head, tail) = bytes.split_at(position);
    Ok((pod_read_unaligned(head), tail))
  } else {
    Err(DecodeError::Malformed)
  }
}

#[inline]
pub(crate) fn try_split_at(bytes: &[u8], mid: usize) -> Result<(&[u8], &[u8]), DecodeError> {
  if bytes.len() >= mid {
    Ok(bytes.split_at(mid))
  } else {
    Err(DecodeError::Malformed)
  }
}

#[inline]
#[must_use]
pub(crate) fn u16_le(bytes: [u8; 2]) -> u16 {
  u16::from_le_bytes(bytes)
}

#[inline]
#[must_use]
pub(crate) fn u32_be(bytes: [u8; 4]) -> u32 {
  u32::from_be_bytes(bytes)
}

/// Makes a zeroed `Vec` of the given length, reporting allocation failure.
#[inline]
pub(crate) fn try_zeroed_vec(len: usize) -> Result<Vec<u8>, DecodeError> {
  let mut v: Vec<u8> = Vec::new();
  v.try_reserve_exact(len)?;
  v.resize(len, 0);
  Ok(v)
}

#[test]
fn test_pullers_never_overrun() {
  assert_eq!(try_pull_byte_array::<2>(&[1, 2, 3]), Ok(([1, 2], &[3][..])));
  assert_eq!(try_pull_byte_array::<4>(&[1, 2, 3]), Err(DecodeError::Malformed));
  assert_eq!(try_pull_pod::<u8>(&[]), Err(DecodeError::Malformed));
  assert_eq!(try_split_at(&[1, 2], 3), Err(DecodeError::Malformed));
  assert_eq!(try_zeroed_vec(3).unwrap(), [0, 0, 0]);
}
