//! Locating the Playwright driver.
//!
//! The harness does not bundle a driver; it finds an installed one the same
//! way the official language ports do, preferring explicit overrides over
//! npm lookups.

use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use tracing::warn;

use crate::error::{Error, Result};

/// Locates the driver, returning `(node_executable, cli_js)`.
///
/// Candidates are tried in order:
/// 1. `DROVER_NODE_EXE` and `DROVER_CLI_JS` environment variables
/// 2. `DROVER_DRIVER_PATH` pointing at a driver directory (`node` plus
///    `package/cli.js`)
/// 3. Global npm installation (`npm root -g`)
/// 4. Local npm installation (`npm root`)
///
/// A candidate whose node binary does not run (NixOS and containers hit this
/// with dynamically-linked binaries) is retried with a node found on PATH
/// before moving on.
///
/// # Errors
///
/// Returns [`Error::DriverNotFound`] if every candidate fails.
pub fn get_driver_executable() -> Result<(PathBuf, PathBuf)> {
	if let Some((node, cli)) = try_node_cli_env() {
		if let Some(paths) = resolve_candidate_with_fallback(
			"DROVER_NODE_EXE/DROVER_CLI_JS",
			node,
			cli,
			find_node_executable,
		) {
			return Ok(paths);
		}
	}

	if let Some((node, cli)) = try_driver_path_env() {
		if let Some(paths) =
			resolve_candidate_with_fallback("DROVER_DRIVER_PATH", node, cli, find_node_executable)
		{
			return Ok(paths);
		}
	}

	if let Some((node, cli)) = try_npm_root(true) {
		if let Some(paths) =
			resolve_candidate_with_fallback("npm global", node, cli, find_node_executable)
		{
			return Ok(paths);
		}
	}

	if let Some((node, cli)) = try_npm_root(false) {
		if let Some(paths) =
			resolve_candidate_with_fallback("npm local", node, cli, find_node_executable)
		{
			return Ok(paths);
		}
	}

	Err(Error::DriverNotFound(
		"no Playwright driver found; install the playwright npm package or set \
		 DROVER_NODE_EXE and DROVER_CLI_JS"
			.to_string(),
	))
}

fn resolve_candidate_with_fallback<F>(
	label: &str,
	node: PathBuf,
	cli: PathBuf,
	find_node: F,
) -> Option<(PathBuf, PathBuf)>
where
	F: Fn() -> Result<PathBuf>,
{
	let usable = node_is_usable(&node);
	debug_candidate(label, &node, &cli, usable);
	if usable {
		return Some((node, cli));
	}

	warn!(
		target = "drover",
		source = label,
		node = %node.display(),
		cli = %cli.display(),
		"driver candidate node is not runnable; trying fallback node"
	);

	let fallback_node = find_node().ok()?;
	if fallback_node == node {
		return None;
	}

	let fallback_usable = node_is_usable(&fallback_node);
	let fallback_label = format!("{label} (fallback node)");
	debug_candidate(&fallback_label, &fallback_node, &cli, fallback_usable);
	if fallback_usable {
		warn!(
			target = "drover",
			source = label,
			node = %fallback_node.display(),
			cli = %cli.display(),
			"using fallback node executable for the driver"
		);
		return Some((fallback_node, cli));
	}

	None
}

fn try_node_cli_env() -> Option<(PathBuf, PathBuf)> {
	let (Ok(node_exe), Ok(cli_js)) = (
		std::env::var("DROVER_NODE_EXE"),
		std::env::var("DROVER_CLI_JS"),
	) else {
		return None;
	};

	let node_path = PathBuf::from(node_exe);
	let cli_path = PathBuf::from(cli_js);
	(node_path.exists() && cli_path.exists()).then_some((node_path, cli_path))
}

fn try_driver_path_env() -> Option<(PathBuf, PathBuf)> {
	let driver_dir = PathBuf::from(std::env::var("DROVER_DRIVER_PATH").ok()?);
	let node_exe = if cfg!(windows) {
		driver_dir.join("node.exe")
	} else {
		driver_dir.join("node")
	};
	let cli_js = driver_dir.join("package").join("cli.js");

	(node_exe.exists() && cli_js.exists()).then_some((node_exe, cli_js))
}

fn try_npm_root(global: bool) -> Option<(PathBuf, PathBuf)> {
	let args: &[&str] = if global { &["root", "-g"] } else { &["root"] };
	let output = Command::new("npm").args(args).output().ok()?;
	if !output.status.success() {
		return None;
	}

	let npm_root = String::from_utf8_lossy(&output.stdout).trim().to_string();
	let node_modules = PathBuf::from(npm_root);
	if !node_modules.exists() {
		return None;
	}

	find_driver_in_node_modules(&node_modules).ok()
}

fn find_driver_in_node_modules(node_modules: &Path) -> Result<(PathBuf, PathBuf)> {
	let package_dirs = [
		node_modules.join("playwright"),
		node_modules.join("playwright-core"),
		node_modules.join("@playwright").join("test"),
	];

	for package_dir in &package_dirs {
		if !package_dir.exists() {
			continue;
		}

		let cli_js = package_dir.join("cli.js");
		if !cli_js.exists() {
			continue;
		}

		if let Ok(node_exe) = find_node_executable() {
			return Ok((node_exe, cli_js));
		}
	}

	Err(Error::DriverNotFound(format!(
		"no driver package under {}",
		node_modules.display()
	)))
}

fn node_is_usable(node: &Path) -> bool {
	Command::new(node)
		.arg("--version")
		.stdout(Stdio::null())
		.stderr(Stdio::null())
		.status()
		.map(|status| status.success())
		.unwrap_or(false)
}

fn debug_candidate(label: &str, node: &Path, cli: &Path, usable: bool) {
	if std::env::var("DROVER_DEBUG_DRIVER").is_ok() {
		eprintln!(
			"[driver-check] {label}: node={} cli={} usable={}",
			node.display(),
			cli.display(),
			usable
		);
	}
}

/// Finds a node executable on PATH or in common install locations.
fn find_node_executable() -> Result<PathBuf> {
	#[cfg(not(windows))]
	let which_cmd = "which";
	#[cfg(windows)]
	let which_cmd = "where";

	if let Ok(output) = Command::new(which_cmd).arg("node").output() {
		if output.status.success() {
			let node_path = String::from_utf8_lossy(&output.stdout).trim().to_string();
			if !node_path.is_empty() {
				let path = PathBuf::from(node_path.lines().next().unwrap_or(&node_path));
				if path.exists() {
					return Ok(path);
				}
			}
		}
	}

	#[cfg(not(windows))]
	let common_locations = [
		"/usr/local/bin/node",
		"/usr/bin/node",
		"/opt/homebrew/bin/node",
		"/opt/local/bin/node",
	];

	#[cfg(windows)]
	let common_locations = [
		"C:\\Program Files\\nodejs\\node.exe",
		"C:\\Program Files (x86)\\nodejs\\node.exe",
	];

	for location in &common_locations {
		let path = PathBuf::from(location);
		if path.exists() {
			return Ok(path);
		}
	}

	Err(Error::LaunchFailed(
		"Node.js executable not found. Install Node.js or set DROVER_NODE_EXE.".to_string(),
	))
}

#[cfg(test)]
mod tests {
	use std::fs;
	#[cfg(unix)]
	use std::os::unix::fs::PermissionsExt;
	#[cfg(unix)]
	use std::path::Path;

	#[cfg(unix)]
	use tempfile::TempDir;

	use super::*;

	#[cfg(unix)]
	fn write_mock_node(path: &Path, exit_code: i32) {
		let script = format!("#!/bin/sh\n[ \"$1\" = \"--version\" ]\nexit {}\n", exit_code);
		fs::write(path, script).unwrap();
		let mut perms = fs::metadata(path).unwrap().permissions();
		perms.set_mode(0o755);
		fs::set_permissions(path, perms).unwrap();
	}

	#[test]
	fn test_find_node_executable() {
		match find_node_executable() {
			Ok(node_path) => {
				println!("Found node at: {:?}", node_path);
				assert!(node_path.exists());
			}
			Err(e) => {
				println!("Node.js not found (expected if Node.js not installed): {:?}", e);
			}
		}
	}

	#[test]
	fn test_get_driver_executable() {
		match get_driver_executable() {
			Ok((node, cli)) => {
				println!("Found driver: node={:?} cli={:?}", node, cli);
				assert!(node.exists());
				assert!(cli.exists());
			}
			Err(Error::DriverNotFound(_)) => {
				println!("Driver not found (expected in some environments)");
			}
			Err(e) => panic!("Unexpected error: {:?}", e),
		}
	}

	#[cfg(unix)]
	#[test]
	fn test_resolve_candidate_falls_back_to_second_node() {
		let temp = TempDir::new().unwrap();
		let candidate_node = temp.path().join("candidate-node");
		let fallback_node = temp.path().join("fallback-node");
		let cli_js = temp.path().join("cli.js");

		write_mock_node(&candidate_node, 1);
		write_mock_node(&fallback_node, 0);
		fs::write(&cli_js, "// test cli").unwrap();

		let resolved =
			resolve_candidate_with_fallback("test", candidate_node.clone(), cli_js.clone(), || {
				Ok(fallback_node.clone())
			});

		assert_eq!(resolved, Some((fallback_node, cli_js)));
	}

	#[cfg(unix)]
	#[test]
	fn test_resolve_candidate_keeps_first_node_when_usable() {
		let temp = TempDir::new().unwrap();
		let candidate_node = temp.path().join("candidate-node");
		let cli_js = temp.path().join("cli.js");

		write_mock_node(&candidate_node, 0);
		fs::write(&cli_js, "// test cli").unwrap();

		let resolved =
			resolve_candidate_with_fallback("test", candidate_node.clone(), cli_js.clone(), || {
				panic!("fallback should not be consulted when candidate node is usable");
			});

		assert_eq!(resolved, Some((candidate_node, cli_js)));
	}

	#[cfg(unix)]
	#[test]
	fn test_resolve_candidate_returns_none_when_fallback_unavailable() {
		let temp = TempDir::new().unwrap();
		let candidate_node = temp.path().join("candidate-node");
		let cli_js = temp.path().join("cli.js");

		write_mock_node(&candidate_node, 1);
		fs::write(&cli_js, "// test cli").unwrap();

		let resolved = resolve_candidate_with_fallback("test", candidate_node, cli_js, || {
			Err(Error::LaunchFailed("missing node".to_string()))
		});

		assert!(resolved.is_none());
	}
}
