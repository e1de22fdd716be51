// Copyright (c) 2023 Jonathan "Razordor" Alan Thomason
use serde::Deserialize;

/// Knobs for [`DefaultPathResolver`](crate::resolve::DefaultPathResolver).
///
/// Deserializable so an embedding application can keep it in its own
/// settings file.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct ResolverConfig {
	/// Directory under the user's home that holds the package cache, e.g. `.nuget`.
	pub package_store: String,
	/// Yield `{base_directory}/{name}` first.
	pub probe_app_local: bool,
	/// Yield the bare name, leaving the search to the OS loader.
	pub probe_bare_name: bool,
}

impl Default for ResolverConfig {
	fn default() -> Self {
		Self {
			package_store: ".nuget".to_owned(),
			probe_app_local: true,
			probe_bare_name: true,
		}
	}
}

impl ResolverConfig {
	pub fn from_json(json: &str) -> crate::Result<Self> {
		Ok(serde_json::from_str(json)?)
	}
}
