// Copyright (c) 2023 Jonathan "Razordor" Alan Thomason

//! Candidate path generation.
//!
//! For a short library name the [`DefaultPathResolver`] yields, in order:
//!
//! 1. `{base_directory}/{name}`
//! 2. `{name}`, so the OS loader applies its own search rules
//! 3. the manifest asset under the base directory
//! 4. the manifest asset under the per-user package cache
//!
//! Steps 3 and 4 are only computed once the iterator reaches them.

use std::{
	env, mem,
	path::{Component, Path, PathBuf},
};

use crate::{
	config::ResolverConfig,
	env::{Environment, HostEnvironment},
	manifest::{DependencyManifest, Manifest, NativeAsset},
	rid::{self, RuntimeIdentifier},
	Result,
};

/// Produces the paths a loader should try for a library, most preferred first.
pub trait PathResolver {
	type Candidates<'a>: Iterator<Item = PathBuf>
	where
		Self: 'a;

	/// An empty or short sequence is not an error; only environment faults are.
	fn enumerate_candidates(&self, name: &str) -> Result<Self::Candidates<'_>>;
}

#[derive(Debug, Clone)]
pub struct DefaultPathResolver<E = HostEnvironment, M = Manifest> {
	env: E,
	manifest: Option<M>,
	config: ResolverConfig,
}

impl DefaultPathResolver {
	/// Resolver for the running process, using the `*.deps.json` next to the
	/// executable if there is one.
	pub fn host() -> Self {
		let manifest = HostEnvironment.base_directory().and_then(Manifest::discover);
		Self::new(HostEnvironment, manifest)
	}
}

impl<E: Environment, M: DependencyManifest> DefaultPathResolver<E, M> {
	pub fn new(env: E, manifest: Option<M>) -> Self {
		Self {
			env,
			manifest,
			config: ResolverConfig::default(),
		}
	}

	pub fn with_config(mut self, config: ResolverConfig) -> Self {
		self.config = config;
		self
	}

	#[inline]
	pub fn environment(&self) -> &E {
		&self.env
	}

	#[inline]
	pub fn manifest(&self) -> Option<&M> {
		self.manifest.as_ref()
	}

	#[inline]
	pub fn config(&self) -> &ResolverConfig {
		&self.config
	}

	/// `{home}/{package_store}/packages`. A missing home directory leaves a
	/// relative path that simply won't exist.
	pub fn package_cache_root(&self) -> PathBuf {
		self.env
			.home_directory()
			.unwrap_or_default()
			.join(&self.config.package_store)
			.join("packages")
	}
}

impl<E: Environment, M: DependencyManifest> PathResolver for DefaultPathResolver<E, M> {
	type Candidates<'a> = Candidates<'a, E, M> where Self: 'a;

	fn enumerate_candidates(&self, name: &str) -> Result<Candidates<'_, E, M>> {
		// Resolved before anything is yielded so an unsupported architecture
		// can't surface halfway through the sequence.
		let rid = self.env.runtime_identifier()?;
		tracing::debug!(name, %rid, manifest = self.manifest.is_some(), "enumerating library candidates");
		Ok(Candidates {
			resolver: self,
			name: name.to_owned(),
			base: self.env.base_directory(),
			rid,
			stage: Stage::AppLocal,
		})
	}
}

#[derive(Debug)]
enum Stage {
	AppLocal,
	Bare,
	Manifest,
	PackageCache(PathBuf),
	Done,
}

/// Lazy candidate sequence returned by [`DefaultPathResolver`].
#[derive(Debug)]
pub struct Candidates<'a, E, M> {
	resolver: &'a DefaultPathResolver<E, M>,
	name: String,
	base: Option<PathBuf>,
	rid: RuntimeIdentifier,
	stage: Stage,
}

impl<E: Environment, M: DependencyManifest> Candidates<'_, E, M> {
	#[inline]
	pub fn runtime_identifier(&self) -> &RuntimeIdentifier {
		&self.rid
	}

	fn find_asset(&self) -> Option<NativeAsset> {
		let manifest = self.resolver.manifest.as_ref()?;
		let rids = rid::rid_candidates(&self.rid, manifest);
		let found = manifest.find_native_asset(&rids, &self.name);
		if found.is_none() {
			tracing::debug!(name = %self.name, ?rids, "no native asset in manifest");
		}
		found
	}
}

impl<E: Environment, M: DependencyManifest> Iterator for Candidates<'_, E, M> {
	type Item = PathBuf;

	fn next(&mut self) -> Option<PathBuf> {
		let resolver = self.resolver;
		let config = &resolver.config;
		loop {
			match mem::replace(&mut self.stage, Stage::Done) {
				Stage::AppLocal => {
					self.stage = Stage::Bare;
					if let (true, Some(base)) = (config.probe_app_local, &self.base) {
						return Some(base.join(&self.name));
					}
				}
				Stage::Bare => {
					self.stage = Stage::Manifest;
					if config.probe_bare_name {
						return Some(PathBuf::from(&self.name));
					}
				}
				Stage::Manifest => {
					let asset = self.find_asset()?;
					let cached = normalize(&join_asset(
						&resolver.package_cache_root()
							.join(asset.package.to_lowercase())
							.join(&asset.version),
						&asset.path,
					));
					match self.base {
						Some(ref base) => {
							self.stage = Stage::PackageCache(cached);
							return Some(normalize(&join_asset(base, &asset.path)));
						}
						None => return Some(cached),
					}
				}
				Stage::PackageCache(path) => return Some(path),
				Stage::Done => return None,
			}
		}
	}
}

// Manifest paths are `/` separated regardless of platform.
fn join_asset(root: &Path, asset: &str) -> PathBuf {
	asset
		.split('/')
		.filter(|part| !part.is_empty())
		.fold(root.to_path_buf(), |path, part| path.join(part))
}

/// Makes `path` absolute against the current directory and folds `.` and `..`
/// lexically. Never touches the filesystem.
pub(crate) fn normalize(path: &Path) -> PathBuf {
	let absolute = if path.is_absolute() {
		path.to_path_buf()
	} else {
		match env::current_dir() {
			Ok(cwd) => cwd.join(path),
			Err(_) => path.to_path_buf(),
		}
	};
	let mut out = PathBuf::new();
	for component in absolute.components() {
		match component {
			Component::CurDir => {}
			Component::ParentDir => {
				out.pop();
			}
			other => out.push(other.as_os_str()),
		}
	}
	out
}
