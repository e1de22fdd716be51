// Copyright (c) 2023 Jonathan "Razordor" Alan Thomason
use std::{
	ffi, io,
	path::{Path, PathBuf},
	sync::atomic::{AtomicPtr, Ordering},
};

use crate::{
	os,
	resolve::{DefaultPathResolver, PathResolver},
	sym::Symbol,
	Error, Result,
};

/// The platform capability used to turn a candidate path into a library handle.
///
/// `Loader` can also be used to make custom loaders.
///
/// # Safety
/// `sym` must only return addresses that stay valid until `close` is called.
pub unsafe trait Loader: Send + Sized {
	/// Attempts to open a shared library.
	unsafe fn open(path: &Path) -> io::Result<Self>;
	/// Retrieves the address of `symbol`.
	unsafe fn sym(&self, symbol: &str) -> io::Result<*const ffi::c_void>;
	/// Releases the handle. The library may stay mapped if other handles remain.
	unsafe fn close(self) -> io::Result<()>;
}

/// Library handle from the operating system's own loader.
#[derive(Debug)]
pub struct System(AtomicPtr<ffi::c_void>);

unsafe impl Loader for System {
	/// Increments the reference count of the shared library.
	unsafe fn open(path: &Path) -> io::Result<Self> {
		os::dylib_open(path).map(|handle| Self(handle.into()))
	}

	unsafe fn sym(&self, symbol: &str) -> io::Result<*const ffi::c_void> {
		os::dylib_symbol(self.0.load(Ordering::Relaxed), symbol)
	}

	/// Decrements the reference count. When it hits zero the library is unloaded.
	unsafe fn close(self) -> io::Result<()> {
		os::dylib_close(self.0.into_inner())
	}
}

/// A loaded native library.
///
/// The handle is released when dropped, or explicitly through [`free`](Library::free).
#[derive(Debug)]
pub struct Library<L: Loader = System> {
	handle: Option<L>,
	path: PathBuf,
}

impl Library {
	/// Loads `name` with a [`DefaultPathResolver`] for the running process.
	pub fn load_default(name: &str) -> Result<Self> {
		Self::load(name, &DefaultPathResolver::host())
	}
}

impl<L: Loader> Library<L> {
	/// Tries every candidate `resolver` yields for `name`, in order, and keeps
	/// the first one that loads.
	///
	/// # Errors
	/// [`Error::UnsupportedArchitecture`] from the resolver, or
	/// [`Error::LibraryNotFound`] listing every attempted path with the last
	/// loader error as its source.
	pub fn load<R: PathResolver + ?Sized>(name: &str, resolver: &R) -> Result<Self> {
		let mut attempted = Vec::new();
		let mut last_error = None;
		if !name.is_empty() {
			for path in resolver.enumerate_candidates(name)? {
				match unsafe { L::open(&path) } {
					Ok(handle) => {
						tracing::debug!(name, path = %path.display(), "loaded library");
						return Ok(Self {
							handle: Some(handle),
							path,
						});
					}
					Err(e) => {
						tracing::trace!(name, path = %path.display(), error = %e, "candidate failed");
						attempted.push(path);
						last_error = Some(e);
					}
				}
			}
		}
		tracing::debug!(name, attempts = attempted.len(), "library not found");
		Err(Error::LibraryNotFound {
			name: name.to_owned(),
			attempted,
			source: last_error,
		})
	}

	/// Loads exactly `path`, bypassing resolution.
	pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
		let path = path.as_ref();
		match unsafe { L::open(path) } {
			Ok(handle) => Ok(Self {
				handle: Some(handle),
				path: path.to_path_buf(),
			}),
			Err(e) => Err(Error::LibraryNotFound {
				name: path.display().to_string(),
				attempted: vec![path.to_path_buf()],
				source: Some(e),
			}),
		}
	}

	/// The candidate path this library was loaded from.
	#[inline]
	pub fn path(&self) -> &Path {
		&self.path
	}

	/// Looks up an exported symbol.
	///
	/// # Errors
	/// [`Error::SymbolNotFound`] if the library doesn't export `name`.
	pub fn symbol(&self, name: &str) -> Result<Symbol<'_>> {
		let not_found = |source| Error::SymbolNotFound {
			symbol: name.to_owned(),
			library: self.path.clone(),
			source,
		};
		let Some(ref handle) = self.handle else {
			return Err(not_found(io::Error::new(io::ErrorKind::Other, "library already freed")));
		};
		match unsafe { handle.sym(name) } {
			Ok(addr) => Ok(Symbol::new(addr)),
			Err(e) => Err(not_found(e)),
		}
	}

	/// Releases the handle, returning whether the OS reported success.
	///
	/// Failure is not actionable beyond logging, so it is not an error.
	pub fn free(mut self) -> bool {
		self.release()
	}

	fn release(&mut self) -> bool {
		let Some(handle) = self.handle.take() else {
			return true;
		};
		match unsafe { handle.close() } {
			Ok(()) => true,
			Err(e) => {
				tracing::warn!(path = %self.path.display(), error = %e, "failed to release library");
				false
			}
		}
	}
}

impl<L: Loader> Drop for Library<L> {
	fn drop(&mut self) {
		self.release();
	}
}
