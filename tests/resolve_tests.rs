use std::cell::Cell;
use std::path::PathBuf;

use nativelib::*;

fn init_tracing() {
	let _ = tracing_subscriber::fmt()
		.with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
		.with_test_writer()
		.try_init();
}

fn root() -> PathBuf {
	if cfg!(windows) {
		PathBuf::from(r"C:\")
	} else {
		PathBuf::from("/")
	}
}

fn join_all(base: PathBuf, parts: &[&str]) -> PathBuf {
	parts.iter().fold(base, |path, part| path.join(part))
}

fn sni_manifest() -> Manifest {
	Manifest::new().with_native_asset(
		"win-x64",
		NativeAsset::new("Native.Sni", "1.2.0", "runtimes/win-x64/native/sni.dll"),
	)
}

#[test]
fn test_end_to_end_sequence() {
	init_tracing();
	let env = StaticEnvironment::new(Some(OsFamily::Windows), "x64")
		.with_base_directory(root().join("app"))
		.with_home_directory(join_all(root(), &["Users", "alice"]));
	let resolver = DefaultPathResolver::new(env, Some(sni_manifest()));

	let candidates: Vec<PathBuf> = resolver.enumerate_candidates("sni").unwrap().collect();
	let asset = ["runtimes", "win-x64", "native", "sni.dll"];
	assert_eq!(
		candidates,
		[
			root().join("app").join("sni"),
			PathBuf::from("sni"),
			join_all(root().join("app"), &asset),
			join_all(join_all(root(), &["Users", "alice", ".nuget", "packages", "native.sni", "1.2.0"]), &asset),
		]
	);
}

#[test]
fn test_deterministic() {
	let env = StaticEnvironment::new(Some(OsFamily::Windows), "x64").with_base_directory(root().join("app"));
	let resolver = DefaultPathResolver::new(env, Some(sni_manifest()));
	let first: Vec<_> = resolver.enumerate_candidates("sni").unwrap().collect();
	let second: Vec<_> = resolver.enumerate_candidates("sni").unwrap().collect();
	assert_eq!(first, second);
	assert_eq!(first.len(), 4);
}

#[test]
fn test_absent_manifest_yields_two() {
	for name in ["foo", "libfoo.so", "sni", "a b"] {
		let env = StaticEnvironment::new(Some(OsFamily::Linux), "arm64").with_base_directory(root().join("app"));
		let resolver = DefaultPathResolver::<_, Manifest>::new(env, None);
		let candidates: Vec<_> = resolver.enumerate_candidates(name).unwrap().collect();
		assert_eq!(candidates, [root().join("app").join(name), PathBuf::from(name)]);
	}
}

#[test]
fn test_unsupported_arch_before_candidates() {
	let env = StaticEnvironment::new(Some(OsFamily::Linux), "unsupported-arch").with_base_directory(root().join("app"));
	let resolver = DefaultPathResolver::new(env, Some(sni_manifest()));
	match resolver.enumerate_candidates("sni") {
		Err(Error::UnsupportedArchitecture(arch)) => assert_eq!(arch, "unsupported-arch"),
		other => panic!("expected unsupported architecture, got {:?}", other.map(|c| c.count())),
	}
}

#[test]
fn test_exact_rid_wins_over_fallback() {
	let manifest = Manifest::new()
		.with_fallbacks("linux-x64", ["linux"])
		.with_native_asset("linux", NativeAsset::new("Generic", "1.0.0", "runtimes/linux/native/libfoo.so"))
		.with_native_asset("linux-x64", NativeAsset::new("Specific", "2.0.0", "runtimes/linux-x64/native/libfoo.so"));
	let env = StaticEnvironment::new(Some(OsFamily::Linux), "x64")
		.with_base_directory(root().join("app"))
		.with_home_directory(root().join("home"));
	let resolver = DefaultPathResolver::new(env, Some(manifest));
	let candidates: Vec<_> = resolver.enumerate_candidates("libfoo").unwrap().collect();
	assert_eq!(candidates.len(), 4);
	assert!(candidates[2].ends_with("runtimes/linux-x64/native/libfoo.so"));
	assert!(candidates[3].ends_with(".nuget/packages/specific/2.0.0/runtimes/linux-x64/native/libfoo.so"));
}

#[test]
fn test_fallback_rid_used_when_exact_missing() {
	let manifest = Manifest::new()
		.with_fallbacks("osx.10.13-x64", ["osx.10.12-x64"])
		.with_native_asset("osx.10.12-x64", NativeAsset::new("Foo", "1.0.0", "runtimes/osx.10.12-x64/native/libfoo.dylib"));
	let env = StaticEnvironment::new(Some(OsFamily::Osx), "x64")
		.with_runtime_identifier("osx.10.13-x64")
		.with_base_directory(root().join("app"));
	let resolver = DefaultPathResolver::new(env, Some(manifest));
	let candidates: Vec<_> = resolver.enumerate_candidates("libfoo").unwrap().collect();
	assert_eq!(candidates.len(), 4);
	assert!(candidates[2].ends_with("runtimes/osx.10.12-x64/native/libfoo.dylib"));
}

#[test]
fn test_guessed_rid_used() {
	let manifest = Manifest::new()
		.with_native_asset("osx-x64", NativeAsset::new("Foo", "1.0.0", "runtimes/osx-x64/native/libfoo.dylib"));
	let env = StaticEnvironment::new(Some(OsFamily::Osx), "x64")
		.with_runtime_identifier("osx.10.9-x64")
		.with_base_directory(root().join("app"));
	let resolver = DefaultPathResolver::new(env, Some(manifest));
	let candidates: Vec<_> = resolver.enumerate_candidates("libfoo.dylib").unwrap().collect();
	assert_eq!(candidates.len(), 4);
	assert!(candidates[2].ends_with("runtimes/osx-x64/native/libfoo.dylib"));
}

#[test]
fn test_unknown_os_never_matches() {
	let manifest = Manifest::new()
		.with_native_asset("linux-x64", NativeAsset::new("Foo", "1.0.0", "native/libfoo.so"));
	let env = StaticEnvironment::new(None, "x64").with_base_directory(root().join("app"));
	let resolver = DefaultPathResolver::new(env, Some(manifest));
	assert_eq!(resolver.enumerate_candidates("libfoo").unwrap().count(), 2);
}

struct CountingManifest {
	inner: Manifest,
	scans: Cell<usize>,
}

impl DependencyManifest for CountingManifest {
	fn fallbacks(&self, rid: &str) -> Option<&[String]> {
		self.inner.fallbacks(rid)
	}

	fn native_assets(&self, rid: &str) -> Vec<NativeAsset> {
		self.scans.set(self.scans.get() + 1);
		self.inner.native_assets(rid)
	}
}

#[test]
fn test_manifest_scan_is_lazy() {
	let manifest = CountingManifest {
		inner: sni_manifest(),
		scans: Cell::new(0),
	};
	let env = StaticEnvironment::new(Some(OsFamily::Windows), "x64").with_base_directory(root().join("app"));
	let resolver = DefaultPathResolver::new(env, Some(&manifest));

	let first_two: Vec<_> = resolver.enumerate_candidates("sni").unwrap().take(2).collect();
	assert_eq!(first_two.len(), 2);
	assert_eq!(manifest.scans.get(), 0);

	let all: Vec<_> = resolver.enumerate_candidates("sni").unwrap().collect();
	assert_eq!(all.len(), 4);
	assert_eq!(manifest.scans.get(), 1);
}

#[test]
fn test_deps_json_end_to_end() {
	init_tracing();
	let json = r#"{
		"targets": {
			"net8.0": {
				"Native.Sni/1.2.0": {
					"runtimeTargets": {
						"runtimes/linux-arm64/native/libsni.so": { "rid": "linux-arm64", "assetType": "native" }
					}
				}
			}
		},
		"libraries": {
			"Native.Sni/1.2.0": { "type": "package", "serviceable": true, "path": "native.sni/1.2.0" }
		}
	}"#;
	let dir = tempfile::tempdir().unwrap();
	std::fs::write(dir.path().join("App.deps.json"), json).unwrap();

	let manifest = Manifest::discover(dir.path()).unwrap();
	let env = StaticEnvironment::new(Some(OsFamily::Linux), "aarch64")
		.with_base_directory(dir.path())
		.with_home_directory(root().join("home"));
	let resolver = DefaultPathResolver::new(env, Some(manifest));
	let candidates: Vec<_> = resolver.enumerate_candidates("libsni").unwrap().collect();
	assert_eq!(candidates.len(), 4);
	assert!(candidates[2].starts_with(dir.path()));
	assert!(candidates[3].ends_with(".nuget/packages/native.sni/1.2.0/runtimes/linux-arm64/native/libsni.so"));
}
