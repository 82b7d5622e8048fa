//! Config command implementation.

use crate::cli::{ConfigAction, Output};
use crate::config::Settings;
use anyhow::Result;

/// Run the config command.
pub fn run_config(action: &ConfigAction, settings: Settings) -> Result<()> {
    match action {
        ConfigAction::Show => {
            let toml_str = toml::to_string_pretty(&settings)
                .map_err(|e| anyhow::anyhow!("Failed to serialize config: {}", e))?;
            println!("{}", toml_str);
        }

        ConfigAction::Set { key, value } => {
            let mut updated = toml::Value::try_from(&settings)
                .map_err(|e| anyhow::anyhow!("Failed to serialize config: {}", e))?;
            set_key(&mut updated, key, value)?;

            let updated: Settings = updated
                .try_into()
                .map_err(|e| anyhow::anyhow!("Invalid value for {}: {}", key, e))?;
            updated.save()?;
            Output::success(&format!("Set {} = {}", key, value));
        }

        ConfigAction::Edit => {
            let config_path = Settings::default_config_path();

            // Create default config if it doesn't exist
            if !config_path.exists() {
                settings.save()?;
                Output::info(&format!("Created default config at {:?}", config_path));
            }

            // Try to open in editor
            let editor = std::env::var("EDITOR").unwrap_or_else(|_| "vim".to_string());

            Output::info(&format!("Opening config in {}...", editor));

            let status = std::process::Command::new(&editor)
                .arg(&config_path)
                .status();

            match status {
                Ok(s) if s.success() => {
                    Output::success("Config saved.");
                }
                Ok(_) => {
                    Output::warning("Editor exited with non-zero status.");
                }
                Err(e) => {
                    Output::error(&format!("Failed to open editor: {}", e));
                    Output::info(&format!("Config file is at: {:?}", config_path));
                }
            }
        }

        ConfigAction::Path => {
            let config_path = Settings::default_config_path();
            println!("{}", config_path.display());
        }
    }

    Ok(())
}

/// Set a dotted key (e.g. "indexing.mode") in a TOML document, keeping the
/// existing type of the field where one exists.
fn set_key(root: &mut toml::Value, key: &str, value: &str) -> Result<()> {
    let mut current = root;
    let mut parts = key.split('.').peekable();

    while let Some(part) = parts.next() {
        let table = current
            .as_table_mut()
            .ok_or_else(|| anyhow::anyhow!("'{}' is not a configuration section", part))?;

        if parts.peek().is_none() {
            let parsed = match table.get(part) {
                Some(toml::Value::Integer(_)) => toml::Value::Integer(value.parse()?),
                Some(toml::Value::Float(_)) => toml::Value::Float(value.parse()?),
                Some(toml::Value::Boolean(_)) => toml::Value::Boolean(value.parse()?),
                _ => toml::Value::String(value.to_string()),
            };
            table.insert(part.to_string(), parsed);
            return Ok(());
        }

        current = table
            .get_mut(part)
            .ok_or_else(|| anyhow::anyhow!("Unknown configuration section: {}", part))?;
    }

    Err(anyhow::anyhow!("Empty configuration key"))
}
