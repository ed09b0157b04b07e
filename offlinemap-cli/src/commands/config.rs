//! `offlinemap config` - read and edit `~/.offlinemap/config.ini`.

use clap::Subcommand;
use offlinemap::config::{config_file_path, ConfigFile, ConfigKey};

use crate::error::CliError;

#[derive(Debug, Subcommand)]
pub enum ConfigCommands {
    /// Print one setting, e.g. `export.max_tiles`
    Get { key: String },

    /// Validate and store one setting
    Set { key: String, value: String },

    /// Print every setting, grouped by section
    List,

    /// Print where the configuration file lives
    Path,
}

pub fn run(command: ConfigCommands) -> Result<(), CliError> {
    match command {
        ConfigCommands::Get { key } => {
            let key = lookup(&key)?;
            println!("{}", display_value(key, &ConfigFile::load()?));
        }
        ConfigCommands::Set { key, value } => {
            let key = lookup(&key)?;
            let mut config = ConfigFile::load()?;
            key.set(&mut config, &value)
                .map_err(|e| CliError::Config(e.to_string()))?;
            config.save()?;
            println!("{} = {}", key.name(), display_value(key, &config));
        }
        ConfigCommands::List => {
            let config = ConfigFile::load()?;
            for line in listing(&config) {
                println!("{}", line);
            }
        }
        ConfigCommands::Path => println!("{}", config_file_path().display()),
    }
    Ok(())
}

fn lookup(name: &str) -> Result<ConfigKey, CliError> {
    name.parse().map_err(|e| {
        CliError::Config(format!("{} (see 'offlinemap config list')", e))
    })
}

fn display_value(key: ConfigKey, config: &ConfigFile) -> String {
    let value = key.get(config);
    if value.is_empty() {
        "(not set)".to_string()
    } else {
        value
    }
}

/// INI-style lines: a `[section]` header before each group of keys.
fn listing(config: &ConfigFile) -> Vec<String> {
    let mut lines = Vec::new();
    let mut section = None;
    for &key in ConfigKey::all() {
        let (group, field) = key.name().split_once('.').unwrap_or(("", key.name()));
        if section != Some(group) {
            if section.is_some() {
                lines.push(String::new());
            }
            lines.push(format!("[{}]", group));
            section = Some(group);
        }
        lines.push(format!("{} = {}", field, display_value(key, config)));
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_listing_groups_keys_by_section() {
        let mut config = ConfigFile::default();
        config.export.max_level = None;
        config.export.max_tiles = 1234;

        let lines = listing(&config);

        assert_eq!(lines.first().map(String::as_str), Some("[cache]"));
        assert!(lines.contains(&"max_level = (not set)".to_string()));
        assert!(lines.contains(&"max_tiles = 1234".to_string()));
        let headers = lines.iter().filter(|l| l.starts_with('[')).count();
        assert_eq!(headers, 4);
    }

    #[test]
    fn test_unknown_key_is_a_config_error() {
        assert!(matches!(lookup("service.nope"), Err(CliError::Config(_))));
        assert_eq!(lookup("service.url").unwrap(), ConfigKey::ServiceUrl);
    }
}
