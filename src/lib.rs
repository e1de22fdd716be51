// Copyright (c) 2023 Jonathan "Razordor" Alan Thomason

//! Locate and load native shared libraries by short name.
//!
//! Candidates come from a [`PathResolver`]; the default one prefers a copy
//! next to the application, then the OS loader's own search, then the native
//! assets a dependency manifest lists for the current runtime identifier.
//!
//! ```no_run
//! use nativelib::Library;
//!
//! let lib = Library::load_default("sqlite3")?;
//! let sym = lib.symbol("sqlite3_libversion")?;
//! println!("{:p}", sym.as_ptr());
//! # Ok::<(), nativelib::Error>(())
//! ```
#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod config;
pub mod env;
pub mod error;
pub mod manifest;
pub mod resolve;
pub mod rid;

mod loader;
mod os;
mod sym;

pub use config::ResolverConfig;
pub use env::{Environment, HostEnvironment, StaticEnvironment};
pub use error::{Error, ErrorKind};
pub use loader::{Library, Loader, System};
pub use manifest::{DependencyManifest, Manifest, NativeAsset};
pub use resolve::{DefaultPathResolver, PathResolver};
pub use rid::{Architecture, OsFamily, RuntimeIdentifier};
pub use sym::Symbol;

/// The result of a nativelib function.
pub type Result<T> = std::result::Result<T, error::Error>;
