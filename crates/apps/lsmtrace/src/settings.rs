use std::path::Path;
use std::time::Duration;

use lib_ebpf_common::{HookCategory, HookSite, HOOK_SITES};
use lib_event::{OverflowPolicy, DEFAULT_CAPACITY_BYTES};
use serde::Deserialize;
use tracing::debug;

use crate::cli::args::Cli;
use crate::{Error, Result};

const DEFAULT_STATS_INTERVAL_SECS: u64 = 5;

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct ChannelSettings {
	pub capacity_bytes: usize,
	pub overflow: OverflowPolicy,
}

impl Default for ChannelSettings {
	fn default() -> Self {
		Self {
			capacity_bytes: DEFAULT_CAPACITY_BYTES,
			overflow: OverflowPolicy::default(),
		}
	}
}

/// Empty `categories` means every category.
#[derive(Debug, Deserialize, Clone, Default, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct HookSettings {
	pub categories: Vec<String>,
	pub exclude: Vec<String>,
	pub log_hooks: bool,
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct OutputSettings {
	pub stats_interval_secs: u64,
}

impl Default for OutputSettings {
	fn default() -> Self {
		Self {
			stats_interval_secs: DEFAULT_STATS_INTERVAL_SECS,
		}
	}
}

#[derive(Debug, Deserialize, Clone, Default, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
	pub channel: ChannelSettings,
	pub hooks: HookSettings,
	pub output: OutputSettings,
}

impl Settings {
	/// Defaults, then the optional TOML file, then command-line overrides.
	pub fn load(cli: &Cli) -> Result<Self> {
		let mut settings = match cli.config.as_deref() {
			Some(path) => Self::from_file(path)?,
			None => Self::default(),
		};
		settings.merge_cli(cli);
		debug!("settings: {settings:?}");
		Ok(settings)
	}

	pub fn from_file(path: &Path) -> Result<Self> {
		let content = std::fs::read_to_string(path)?;
		Self::from_toml(&content)
	}

	pub fn from_toml(content: &str) -> Result<Self> {
		Ok(toml::from_str(content)?)
	}

	pub fn merge_cli(&mut self, cli: &Cli) {
		if let Some(capacity) = cli.capacity {
			self.channel.capacity_bytes = capacity;
		}
		if let Some(overflow) = cli.overflow {
			self.channel.overflow = overflow;
		}
		if !cli.categories.is_empty() {
			self.hooks.categories = cli.categories.iter().map(|c| c.to_string()).collect();
		}
		self.hooks.exclude.extend(cli.exclude.iter().cloned());
		self.hooks.log_hooks |= cli.log_hooks;
	}

	pub fn stats_interval(&self) -> Duration {
		Duration::from_secs(self.output.stats_interval_secs.max(1))
	}

	/// Hook sites to attach, in table order. Unknown names are configuration errors.
	pub fn enabled_hooks(&self) -> Result<Vec<&'static HookSite>> {
		let categories = self
			.hooks
			.categories
			.iter()
			.map(|name| name.parse::<HookCategory>().map_err(|_| Error::UnknownCategory(name.clone())))
			.collect::<Result<Vec<_>>>()?;

		let excluded = self
			.hooks
			.exclude
			.iter()
			.map(|name| HookSite::lookup(name).map_err(|_| Error::UnknownHook(name.clone())))
			.collect::<Result<Vec<_>>>()?;

		let hooks: Vec<&'static HookSite> = HOOK_SITES
			.iter()
			.filter(|site| categories.is_empty() || categories.contains(&site.category))
			.filter(|site| !excluded.iter().any(|ex| ex.id == site.id))
			.collect();

		if hooks.is_empty() {
			return Err(Error::NoHooksEnabled);
		}
		Ok(hooks)
	}
}

// region:    --- Tests

#[cfg(test)]
mod tests {
	type Result<T> = core::result::Result<T, Box<dyn std::error::Error>>; // For tests.

	use lib_ebpf_common::HOOK_COUNT;

	use super::*;

	#[test]
	fn defaults_enable_every_hook() -> Result<()> {
		// -- Setup & Fixtures
		let settings = Settings::default();

		// -- Exec
		let hooks = settings.enabled_hooks()?;

		// -- Check
		assert_eq!(hooks.len(), HOOK_COUNT);
		assert_eq!(settings.channel.capacity_bytes, DEFAULT_CAPACITY_BYTES);
		assert_eq!(settings.channel.overflow, OverflowPolicy::DropNewest);
		assert!(!settings.hooks.log_hooks);

		Ok(())
	}

	#[test]
	fn toml_file_sections_parse() -> Result<()> {
		// -- Setup & Fixtures
		let fx_toml = r#"
[channel]
capacity_bytes = 65536
overflow = "drop-oldest"

[hooks]
categories = ["exec", "file"]
exclude = ["file_permission"]
log_hooks = true

[output]
stats_interval_secs = 10
"#;

		// -- Exec
		let settings = Settings::from_toml(fx_toml)?;
		let hooks = settings.enabled_hooks()?;

		// -- Check
		assert_eq!(settings.channel.capacity_bytes, 65536);
		assert_eq!(settings.channel.overflow, OverflowPolicy::DropOldest);
		assert!(settings.hooks.log_hooks);
		assert_eq!(settings.stats_interval(), Duration::from_secs(10));
		assert_eq!(hooks.len(), 5 + 9 - 1);
		assert!(hooks.iter().all(|h| matches!(h.category, HookCategory::Exec | HookCategory::File)));
		assert!(hooks.iter().all(|h| h.name != "file_permission"));

		Ok(())
	}

	#[test]
	fn partial_toml_keeps_defaults() -> Result<()> {
		// -- Exec
		let settings = Settings::from_toml("[hooks]\nexclude = [\"inode_permission\"]\n")?;

		// -- Check
		assert_eq!(settings.channel, ChannelSettings::default());
		assert_eq!(settings.output, OutputSettings::default());
		assert_eq!(settings.enabled_hooks()?.len(), HOOK_COUNT - 1);

		Ok(())
	}

	#[test]
	fn unknown_fields_are_rejected() -> Result<()> {
		// -- Exec
		let res = Settings::from_toml("[channel]\nsize = 12\n");

		// -- Check
		assert!(matches!(res, Err(Error::Toml(_))));

		Ok(())
	}

	#[test]
	fn cli_overrides_file_values() -> Result<()> {
		// -- Setup & Fixtures
		let mut settings = Settings::from_toml("[channel]\ncapacity_bytes = 4096\n[hooks]\ncategories = [\"inode\"]\n")?;
		let fx_cli = Cli {
			capacity: Some(8192),
			overflow: Some(OverflowPolicy::DropOldest),
			categories: vec![HookCategory::Superblock],
			exclude: vec!["sb_mount".to_string()],
			log_hooks: true,
			..Default::default()
		};

		// -- Exec
		settings.merge_cli(&fx_cli);
		let hooks = settings.enabled_hooks()?;

		// -- Check
		assert_eq!(settings.channel.capacity_bytes, 8192);
		assert_eq!(settings.channel.overflow, OverflowPolicy::DropOldest);
		assert!(settings.hooks.log_hooks);
		assert_eq!(hooks.len(), 15);
		assert!(hooks.iter().all(|h| h.category == HookCategory::Superblock));

		Ok(())
	}

	#[test]
	fn unknown_hook_name_is_fatal() -> Result<()> {
		// -- Setup & Fixtures
		let mut settings = Settings::default();
		settings.hooks.exclude.push("socket_connect".to_string());

		// -- Exec
		let res = settings.enabled_hooks();

		// -- Check
		assert!(matches!(res, Err(Error::UnknownHook(name)) if name == "socket_connect"));

		Ok(())
	}

	#[test]
	fn unknown_category_is_fatal() -> Result<()> {
		// -- Setup & Fixtures
		let mut settings = Settings::default();
		settings.hooks.categories.push("network".to_string());

		// -- Exec
		let res = settings.enabled_hooks();

		// -- Check
		assert!(matches!(res, Err(Error::UnknownCategory(name)) if name == "network"));

		Ok(())
	}

	#[test]
	fn excluding_everything_is_an_error() -> Result<()> {
		// -- Setup & Fixtures
		let mut settings = Settings::default();
		settings.hooks.categories = vec!["kernfs".to_string()];
		settings.hooks.exclude = vec!["kernfs_init_security".to_string()];

		// -- Exec
		let res = settings.enabled_hooks();

		// -- Check
		assert!(matches!(res, Err(Error::NoHooksEnabled)));

		Ok(())
	}
}

// endregion: --- Tests
