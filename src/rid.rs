// Copyright (c) 2023 Jonathan "Razordor" Alan Thomason

//! Runtime identifiers (RIDs) and the fallback chain used to pick native assets.
//!
//! A RID has the form `{os}-{arch}`, optionally with a version baked into the OS
//! component (`osx.10.13-x64`). The manifest maps a RID to the more general
//! RIDs it may borrow assets from.

use std::{fmt, str::FromStr};

use crate::{manifest::DependencyManifest, Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OsFamily {
	Windows,
	Linux,
	Osx,
}

impl OsFamily {
	/// The OS family this crate was compiled for, if it is one with a RID spelling.
	pub const fn current() -> Option<Self> {
		if cfg!(windows) {
			Some(Self::Windows)
		} else if cfg!(target_os = "macos") {
			Some(Self::Osx)
		} else if cfg!(target_os = "linux") {
			Some(Self::Linux)
		} else {
			None
		}
	}

	pub const fn as_str(self) -> &'static str {
		match self {
			Self::Windows => "win",
			Self::Linux => "linux",
			Self::Osx => "osx",
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Architecture {
	X64,
	X86,
	Arm,
	Arm64,
}

impl Architecture {
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::X64 => "x64",
			Self::X86 => "x86",
			Self::Arm => "arm",
			Self::Arm64 => "arm64",
		}
	}
}

impl FromStr for Architecture {
	type Err = Error;

	/// Accepts both the RID spelling and the spelling of `std::env::consts::ARCH`.
	fn from_str(s: &str) -> Result<Self> {
		match s {
			"x64" | "x86_64" => Ok(Self::X64),
			"x86" | "i386" | "i586" | "i686" => Ok(Self::X86),
			"arm" => Ok(Self::Arm),
			"arm64" | "aarch64" => Ok(Self::Arm64),
			other => Err(Error::UnsupportedArchitecture(other.to_owned())),
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RuntimeIdentifier(String);

impl RuntimeIdentifier {
	/// Builds `{os}-{arch}`. An unknown OS leaves the OS component empty, which
	/// is still a well formed string but never matches a manifest key.
	pub fn new(os: Option<OsFamily>, arch: Architecture) -> Self {
		let os = os.map(OsFamily::as_str).unwrap_or_default();
		Self(format!("{os}-{}", arch.as_str()))
	}

	#[inline]
	pub fn as_str(&self) -> &str {
		&self.0
	}

	/// The component after the last `-`, e.g. `x64` for `osx.10.13-x64`.
	pub fn architecture_suffix(&self) -> Option<&str> {
		self.0.rsplit_once('-').map(|(_, arch)| arch)
	}

	/// The component before the last `-`, e.g. `osx.10.13` for `osx.10.13-x64`.
	pub fn os_component(&self) -> &str {
		self.0.rsplit_once('-').map_or(self.0.as_str(), |(os, _)| os)
	}
}

impl From<String> for RuntimeIdentifier {
	fn from(value: String) -> Self {
		Self(value)
	}
}

impl From<&str> for RuntimeIdentifier {
	fn from(value: &str) -> Self {
		Self(value.to_owned())
	}
}

impl AsRef<str> for RuntimeIdentifier {
	fn as_ref(&self) -> &str {
		&self.0
	}
}

impl fmt::Display for RuntimeIdentifier {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.0)
	}
}

/// Hard-coded compatibility rule for RIDs the manifest's runtime graph does not know.
///
/// Only versioned macOS identifiers have a guess: `osx.10.13` maps onto the
/// `osx.10.12` assets, every other version onto the general `osx` RID.
pub fn guess_fallback(rid: &RuntimeIdentifier) -> Option<RuntimeIdentifier> {
	let arch = rid.architecture_suffix()?;
	match rid.os_component() {
		"osx.10.13" => Some(format!("osx.10.12-{arch}").into()),
		"osx" => None,
		os if os.starts_with("osx") => Some(format!("osx-{arch}").into()),
		_ => None,
	}
}

/// Lists the RIDs to scan for assets, most specific first.
///
/// The runtime graph entry for `current` wins. Only when there is none is the
/// [`guess_fallback`] rule consulted, and the guess's own graph entry appended.
pub fn rid_candidates<M>(current: &RuntimeIdentifier, manifest: &M) -> Vec<RuntimeIdentifier>
where
	M: DependencyManifest + ?Sized,
{
	let mut rids = vec![current.clone()];
	if !append_fallbacks(&mut rids, current, manifest) {
		if let Some(guess) = guess_fallback(current) {
			tracing::debug!(rid = %current, %guess, "no runtime graph entry, using guessed fallback");
			push_unique(&mut rids, guess.clone());
			append_fallbacks(&mut rids, &guess, manifest);
		}
	}
	rids
}

// Returns whether `rid` had an entry in the runtime graph.
fn append_fallbacks<M>(rids: &mut Vec<RuntimeIdentifier>, rid: &RuntimeIdentifier, manifest: &M) -> bool
where
	M: DependencyManifest + ?Sized,
{
	match manifest.fallbacks(rid.as_str()) {
		Some(fallbacks) => {
			for fallback in fallbacks {
				push_unique(rids, fallback.as_str().into());
			}
			true
		}
		None => false,
	}
}

fn push_unique(rids: &mut Vec<RuntimeIdentifier>, rid: RuntimeIdentifier) {
	if !rids.contains(&rid) {
		rids.push(rid);
	}
}
