// Copyright (c) 2023 Jonathan "Razordor" Alan Thomason

//! Read-only view of the dependency manifest that says which package ships which
//! native asset for which runtime identifier.

use std::{
	collections::HashMap,
	env, fs,
	path::{Path, PathBuf},
	sync::Arc,
};

use serde::{de::DeserializeOwned, Deserialize};
use serde_json::{Map, Value};

use crate::{rid::RuntimeIdentifier, Result};

const DEPS_SUFFIX: &str = ".deps.json";

/// A native binary advertised by a package for one runtime identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NativeAsset {
	pub package: String,
	pub version: String,
	/// Relative to the package root, always `/` separated.
	pub path: String,
}

impl NativeAsset {
	pub fn new(package: impl Into<String>, version: impl Into<String>, path: impl Into<String>) -> Self {
		Self {
			package: package.into(),
			version: version.into(),
			path: path.into(),
		}
	}

	/// The last `/` separated component of [`path`](Self::path).
	pub fn file_name(&self) -> &str {
		self.path.rsplit('/').next().unwrap_or(&self.path)
	}

	/// True if the file name equals `name`, with or without its extension.
	pub fn matches(&self, name: &str) -> bool {
		let file_name = self.file_name();
		if file_name == name {
			return true;
		}
		match file_name.rsplit_once('.') {
			Some((stem, _)) => stem == name,
			None => false,
		}
	}
}

/// The queries the path resolver makes against a manifest.
pub trait DependencyManifest {
	/// The runtime graph entry for `rid`, or `None` if the graph doesn't know it.
	fn fallbacks(&self, rid: &str) -> Option<&[String]>;

	/// All native assets for `rid`, in manifest order.
	fn native_assets(&self, rid: &str) -> Vec<NativeAsset>;

	/// Scans `rids` in order and returns the first asset matching `name`.
	fn find_native_asset(&self, rids: &[RuntimeIdentifier], name: &str) -> Option<NativeAsset> {
		rids.iter().find_map(|rid| {
			let found = self.native_assets(rid.as_str()).into_iter().find(|asset| asset.matches(name));
			if let Some(ref asset) = found {
				tracing::debug!(%rid, package = %asset.package, path = %asset.path, "matched native asset");
			}
			found
		})
	}
}

impl<M: DependencyManifest + ?Sized> DependencyManifest for &M {
	fn fallbacks(&self, rid: &str) -> Option<&[String]> {
		(**self).fallbacks(rid)
	}
	fn native_assets(&self, rid: &str) -> Vec<NativeAsset> {
		(**self).native_assets(rid)
	}
}

impl<M: DependencyManifest + ?Sized> DependencyManifest for Arc<M> {
	fn fallbacks(&self, rid: &str) -> Option<&[String]> {
		(**self).fallbacks(rid)
	}
	fn native_assets(&self, rid: &str) -> Vec<NativeAsset> {
		(**self).native_assets(rid)
	}
}

/// An in-memory manifest snapshot.
#[derive(Debug, Clone, Default)]
pub struct Manifest {
	runtimes: HashMap<String, Vec<String>>,
	assets: Vec<(String, NativeAsset)>,
}

impl Manifest {
	pub fn new() -> Self {
		Self::default()
	}

	/// Sets the runtime graph entry for `rid`, replacing any previous one.
	pub fn with_fallbacks<I, S>(mut self, rid: impl Into<String>, fallbacks: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.runtimes.insert(rid.into(), fallbacks.into_iter().map(Into::into).collect());
		self
	}

	pub fn with_native_asset(mut self, rid: impl Into<String>, asset: NativeAsset) -> Self {
		self.assets.push((rid.into(), asset));
		self
	}

	pub fn is_empty(&self) -> bool {
		self.runtimes.is_empty() && self.assets.is_empty()
	}

	/// Parses a `.deps.json` dependency file.
	///
	/// Native assets come from the `runtimeTargets` of the target named by
	/// `runtimeTarget` (or the first target), the runtime graph from `runtimes`.
	/// Only libraries of type `package` contribute assets. Individual entries
	/// of the wrong shape are skipped; only invalid JSON is an error.
	pub fn from_deps_json(json: &str) -> Result<Self> {
		let deps: DepsFile = serde_json::from_str(json)?;
		let target = match deps.runtime_target.and_then(|t| t.name) {
			Some(name) => deps.targets.get(&name).cloned(),
			None => deps.targets.values().next().cloned(),
		};

		let mut manifest = Self::new();
		for (rid, fallbacks) in deps.runtimes {
			if let Some(fallbacks) = lenient::<Vec<String>>(&rid, fallbacks) {
				manifest = manifest.with_fallbacks(rid, fallbacks);
			}
		}

		let Some(Value::Object(libraries)) = target else {
			return Ok(manifest);
		};
		for (key, library) in libraries {
			let Some((package, version)) = key.rsplit_once('/') else {
				continue;
			};
			let kind = deps
				.libraries
				.get(&key)
				.cloned()
				.and_then(|info| lenient::<LibraryInfo>(&key, info))
				.and_then(|info| info.kind);
			if kind.as_deref() != Some("package") {
				tracing::trace!(library = %key, ?kind, "skipping non-package library");
				continue;
			}
			let Some(library) = lenient::<TargetLibrary>(&key, library) else {
				continue;
			};
			for (path, runtime_target) in library.runtime_targets {
				let Some(runtime_target) = lenient::<RuntimeTarget>(&path, runtime_target) else {
					continue;
				};
				if runtime_target.asset_type.as_deref() != Some("native") {
					continue;
				}
				if let Some(rid) = runtime_target.rid {
					manifest = manifest.with_native_asset(rid, NativeAsset::new(package, version, path));
				}
			}
		}
		Ok(manifest)
	}

	pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
		let json = fs::read_to_string(path)?;
		Self::from_deps_json(&json)
	}

	/// Parses the running executable's `{name}.deps.json` in `dir`.
	///
	/// See [`discover_for`](Self::discover_for).
	pub fn discover<P: AsRef<Path>>(dir: P) -> Option<Self> {
		let exe = env::current_exe().ok();
		let app = exe.as_deref().and_then(Path::file_stem).and_then(|s| s.to_str());
		Self::discover_for(dir, app)
	}

	/// Looks for `{app}.deps.json` in `dir`, or failing that the first
	/// `*.deps.json` by file name, and parses it.
	///
	/// Returns `None` when there is no such file or it can't be parsed.
	pub fn discover_for<P: AsRef<Path>>(dir: P, app: Option<&str>) -> Option<Self> {
		let dir = dir.as_ref();
		let own = app.map(|app| dir.join(format!("{app}{DEPS_SUFFIX}"))).filter(|p| p.is_file());
		let path = match own {
			Some(path) => path,
			None => {
				let mut found: Vec<PathBuf> = fs::read_dir(dir)
					.ok()?
					.filter_map(|entry| entry.ok().map(|e| e.path()))
					.filter(|path| {
						path.file_name()
							.and_then(|n| n.to_str())
							.is_some_and(|n| n.ends_with(DEPS_SUFFIX))
					})
					.collect();
				found.sort();
				found.into_iter().next()?
			}
		};
		match Self::from_path(&path) {
			Ok(manifest) => {
				tracing::debug!(path = %path.display(), "loaded dependency manifest");
				Some(manifest)
			}
			Err(e) => {
				tracing::warn!(path = %path.display(), error = %e, "ignoring unreadable dependency manifest");
				None
			}
		}
	}
}

fn lenient<T: DeserializeOwned>(key: &str, value: Value) -> Option<T> {
	match serde_json::from_value(value) {
		Ok(v) => Some(v),
		Err(e) => {
			tracing::warn!(entry = key, error = %e, "skipping malformed manifest entry");
			None
		}
	}
}

impl DependencyManifest for Manifest {
	fn fallbacks(&self, rid: &str) -> Option<&[String]> {
		self.runtimes.get(rid).map(Vec::as_slice)
	}

	fn native_assets(&self, rid: &str) -> Vec<NativeAsset> {
		self.assets
			.iter()
			.filter(|(asset_rid, _)| asset_rid == rid)
			.map(|(_, asset)| asset.clone())
			.collect()
	}
}

// Maps stay `serde_json::Map` so that `preserve_order` keeps file order.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct DepsFile {
	#[serde(default)]
	runtime_target: Option<RuntimeTargetName>,
	#[serde(default)]
	targets: Map<String, Value>,
	#[serde(default)]
	libraries: Map<String, Value>,
	#[serde(default)]
	runtimes: Map<String, Value>,
}

#[derive(Deserialize)]
struct LibraryInfo {
	#[serde(rename = "type")]
	kind: Option<String>,
}

#[derive(Deserialize)]
struct RuntimeTargetName {
	name: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TargetLibrary {
	#[serde(default)]
	runtime_targets: Map<String, Value>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RuntimeTarget {
	rid: Option<String>,
	asset_type: Option<String>,
}
