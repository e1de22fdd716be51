// Copyright (c) 2023 Jonathan "Razordor" Alan Thomason

//! Thin wrappers over the platform loader APIs. Everything here is `unsafe`
//! and reports failure through `io::Error`.

#[cfg(unix)]
mod unix;
#[cfg(windows)]
mod windows;

#[cfg(unix)]
pub(crate) use unix::*;
#[cfg(windows)]
pub(crate) use windows::*;

pub(crate) type Handle = *mut std::ffi::c_void;
