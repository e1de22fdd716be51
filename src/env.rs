// Copyright (c) 2023 Jonathan "Razordor" Alan Thomason
use std::{env, path::PathBuf};

use crate::{
	rid::{Architecture, OsFamily, RuntimeIdentifier},
	Result,
};

#[cfg(windows)]
const HOME_VAR: &str = "USERPROFILE";
#[cfg(not(windows))]
const HOME_VAR: &str = "HOME";

/// The process facts path resolution depends on.
pub trait Environment {
	/// Directory the application was deployed to, if known.
	fn base_directory(&self) -> Option<PathBuf>;
	/// The user's home (POSIX) or profile (Windows) directory.
	fn home_directory(&self) -> Option<PathBuf>;
	fn os(&self) -> Option<OsFamily>;
	/// The raw architecture name, which may be outside the supported set.
	fn architecture(&self) -> &str;

	/// # Errors
	/// [`Error::UnsupportedArchitecture`](crate::Error::UnsupportedArchitecture)
	/// if [`architecture`](Self::architecture) has no RID spelling.
	fn runtime_identifier(&self) -> Result<RuntimeIdentifier> {
		let arch: Architecture = self.architecture().parse()?;
		Ok(RuntimeIdentifier::new(self.os(), arch))
	}
}

/// The environment of the running process.
#[derive(Debug, Clone, Copy, Default)]
pub struct HostEnvironment;

impl Environment for HostEnvironment {
	fn base_directory(&self) -> Option<PathBuf> {
		let exe = env::current_exe().ok()?;
		exe.parent().map(PathBuf::from)
	}

	fn home_directory(&self) -> Option<PathBuf> {
		env::var_os(HOME_VAR).filter(|v| !v.is_empty()).map(PathBuf::from)
	}

	fn os(&self) -> Option<OsFamily> {
		OsFamily::current()
	}

	fn architecture(&self) -> &str {
		env::consts::ARCH
	}
}

/// An environment with every fact given up front.
///
/// Useful when the host can't be trusted to describe itself, e.g. a plugin
/// host that knows its real deployment directory, or in tests.
#[derive(Debug, Clone)]
pub struct StaticEnvironment {
	base_directory: Option<PathBuf>,
	home_directory: Option<PathBuf>,
	os: Option<OsFamily>,
	architecture: String,
	rid: Option<RuntimeIdentifier>,
}

impl StaticEnvironment {
	pub fn new(os: Option<OsFamily>, architecture: impl Into<String>) -> Self {
		Self {
			base_directory: None,
			home_directory: None,
			os,
			architecture: architecture.into(),
			rid: None,
		}
	}

	/// Snapshot of the running process.
	pub fn host() -> Self {
		let host = HostEnvironment;
		Self {
			base_directory: host.base_directory(),
			home_directory: host.home_directory(),
			os: host.os(),
			architecture: host.architecture().to_owned(),
			rid: None,
		}
	}

	pub fn with_base_directory(mut self, dir: impl Into<PathBuf>) -> Self {
		self.base_directory = Some(dir.into());
		self
	}

	pub fn with_home_directory(mut self, dir: impl Into<PathBuf>) -> Self {
		self.home_directory = Some(dir.into());
		self
	}

	/// Replaces the `{os}-{arch}` RID, e.g. with a versioned one like `osx.10.13-x64`.
	///
	/// The architecture is still validated.
	pub fn with_runtime_identifier(mut self, rid: impl Into<RuntimeIdentifier>) -> Self {
		self.rid = Some(rid.into());
		self
	}
}

impl Environment for StaticEnvironment {
	fn base_directory(&self) -> Option<PathBuf> {
		self.base_directory.clone()
	}

	fn home_directory(&self) -> Option<PathBuf> {
		self.home_directory.clone()
	}

	fn os(&self) -> Option<OsFamily> {
		self.os
	}

	fn architecture(&self) -> &str {
		&self.architecture
	}

	fn runtime_identifier(&self) -> Result<RuntimeIdentifier> {
		let arch: Architecture = self.architecture.parse()?;
		Ok(match self.rid {
			Some(ref rid) => rid.clone(),
			None => RuntimeIdentifier::new(self.os, arch),
		})
	}
}
