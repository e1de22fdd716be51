#![cfg(unix)]

use std::ffi::{c_char, c_int};

use nativelib::*;

#[cfg(target_os = "linux")]
const LIBC: &str = "libc.so.6";
#[cfg(target_os = "macos")]
const LIBC: &str = "libSystem.B.dylib";
#[cfg(not(any(target_os = "linux", target_os = "macos")))]
const LIBC: &str = "libc.so";

fn resolver() -> DefaultPathResolver<StaticEnvironment, Manifest> {
	DefaultPathResolver::new(StaticEnvironment::host(), None)
}

#[test]
fn test_load_libc_by_bare_name() {
	let lib: Library = Library::load(LIBC, &resolver()).unwrap();
	assert_eq!(lib.path().to_str(), Some(LIBC));

	let atoi = lib.symbol("atoi").unwrap();
	let atoi: unsafe extern "C" fn(*const c_char) -> c_int = unsafe { std::mem::transmute(atoi.as_ptr()) };
	let five = unsafe { atoi(b"5\0".as_ptr().cast()) };
	assert_eq!(five, 5);
	assert!(lib.free());
}

#[test]
fn test_missing_symbol() {
	let lib: Library = Library::load(LIBC, &resolver()).unwrap();
	let err = lib.symbol("nativelib_no_such_symbol").unwrap_err();
	assert_eq!(err.kind(), ErrorKind::SymNotFound);
}

#[test]
fn test_missing_library() {
	let err = Library::<System>::load("nativelib_no_such_library", &resolver()).unwrap_err();
	let Error::LibraryNotFound { attempted, source, .. } = err else {
		panic!("expected LibraryNotFound");
	};
	assert_eq!(attempted.len(), 2);
	assert!(source.is_some());
}
