// Copyright (c) 2023 Jonathan "Razordor" Alan Thomason
use std::os::windows::ffi::OsStrExt;
use std::{ffi, io, path::Path, ptr};

use super::Handle;

mod c;

fn to_wide(path: &ffi::OsStr) -> Vec<u16> {
	path.encode_wide().chain(std::iter::once(0u16)).collect()
}

#[inline]
pub(crate) unsafe fn dylib_open(path: &Path) -> io::Result<Handle> {
	let wide_str: Vec<u16> = to_wide(path.as_os_str());
	// absolute candidates resolve their own dependencies from their directory
	let flags = if path.is_absolute() {
		c::LOAD_WITH_ALTERED_SEARCH_PATH
	} else {
		0
	};
	let handle = c::LoadLibraryExW(wide_str.as_ptr(), ptr::null_mut(), flags);
	if handle.is_null() {
		Err(io::Error::last_os_error())
	} else {
		Ok(handle)
	}
}

#[inline]
pub(crate) unsafe fn dylib_symbol(lib_handle: Handle, name: &str) -> io::Result<*const ffi::c_void> {
	let c_str = ffi::CString::new(name)?;
	let addr = c::GetProcAddress(lib_handle, c_str.as_ptr());
	if addr.is_null() {
		Err(io::Error::last_os_error())
	} else {
		Ok(addr)
	}
}

#[inline]
pub(crate) unsafe fn dylib_close(lib_handle: Handle) -> io::Result<()> {
	if c::FreeLibrary(lib_handle) == 0 {
		Err(io::Error::last_os_error())
	} else {
		Ok(())
	}
}
