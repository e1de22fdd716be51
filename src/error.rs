// Copyright (c) 2023 Jonathan "Razordor" Alan Thomason
use std::{io, path::PathBuf};

use thiserror::Error;

/// A coarse classification of [`Error`], for callers that only need to branch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
	UnsupportedArchitecture,
	LibNotFound,
	SymNotFound,
	Manifest,
	Io,
}

#[derive(Debug, Error)]
pub enum Error {
	/// The CPU architecture has no runtime identifier spelling.
	#[error("unsupported architecture `{0}`")]
	UnsupportedArchitecture(String),
	/// Every candidate path failed to load. `source` is the error from the last attempt.
	#[error("library `{name}` not found ({} candidate(s) tried)", .attempted.len())]
	LibraryNotFound {
		name: String,
		attempted: Vec<PathBuf>,
		#[source]
		source: Option<io::Error>,
	},
	#[error("symbol `{symbol}` not found in `{}`", .library.display())]
	SymbolNotFound {
		symbol: String,
		library: PathBuf,
		#[source]
		source: io::Error,
	},
	#[error("malformed dependency manifest: {0}")]
	Manifest(#[from] serde_json::Error),
	#[error(transparent)]
	Io(#[from] io::Error),
}

impl Error {
	#[inline]
	pub const fn kind(&self) -> ErrorKind {
		match self {
			Self::UnsupportedArchitecture(_) => ErrorKind::UnsupportedArchitecture,
			Self::LibraryNotFound { .. } => ErrorKind::LibNotFound,
			Self::SymbolNotFound { .. } => ErrorKind::SymNotFound,
			Self::Manifest(_) => ErrorKind::Manifest,
			Self::Io(_) => ErrorKind::Io,
		}
	}
}
