// Copyright (c) 2023 Jonathan "Razordor" Alan Thomason
use std::{ffi, marker};

/// The address of an exported symbol, valid while its [`Library`](crate::Library) is borrowed.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
#[repr(transparent)]
pub struct Symbol<'a>(*const ffi::c_void, marker::PhantomData<&'a ()>);

impl<'a> Symbol<'a> {
	#[inline]
	pub(crate) const fn new(addr: *const ffi::c_void) -> Self {
		Self(addr, marker::PhantomData)
	}

	/// Casts to a pointer of another type.
	#[inline]
	pub const fn cast<T>(self) -> *const T {
		self.0.cast()
	}

	#[inline]
	pub const fn as_ptr(self) -> *const ffi::c_void {
		self.0
	}
}
