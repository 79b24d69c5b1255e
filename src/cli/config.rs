//! Configuration management CLI commands.
//!
//! Commands for viewing and modifying prices, labor rates and BDI settings.

use std::path::Path;

use clap::Subcommand;

use crate::settings::Settings;

#[derive(Subcommand, Debug, Clone)]
pub enum ConfigCommand {
    /// List all settings and their current values
    List {
        /// Show only settings matching this prefix (e.g., "labor", "material")
        #[arg(short, long)]
        filter: Option<String>,
    },

    /// Get a specific setting value
    Get {
        /// Setting path (e.g., "material.cimento")
        path: String,
    },

    /// Set a setting value
    Set {
        /// Setting path (e.g., "labor.pedreiro")
        path: String,

        /// Value to set (accepts "1.234,56" or "1234.56")
        value: String,
    },

    /// Reset a setting to its default value
    Reset {
        /// Setting path (e.g., "bdi_final")
        path: String,
    },

    /// Show the settings file path
    Path,
}

/// Run a config command against the settings file at `file`.
pub fn run_config_command(cmd: ConfigCommand, file: &Path) -> anyhow::Result<()> {
    match cmd {
        ConfigCommand::List { filter } => list_settings(file, filter),
        ConfigCommand::Get { path } => get_setting(file, &path),
        ConfigCommand::Set { path, value } => set_setting(file, &path, &value),
        ConfigCommand::Reset { path } => reset_setting(file, &path),
        ConfigCommand::Path => show_path(file),
    }
}

/// Settings rows matching an optional prefix.
fn filtered(settings: &Settings, filter: Option<&str>) -> Vec<(String, String)> {
    settings
        .list()
        .into_iter()
        .filter(|(key, _)| filter.is_none_or(|f| key.starts_with(f)))
        .collect()
}

/// List all settings.
fn list_settings(file: &Path, filter: Option<String>) -> anyhow::Result<()> {
    let settings = Settings::load_or_default(file)?;
    let rows = filtered(&settings, filter.as_deref());

    let max_key_len = rows.iter().map(|(k, _)| k.len()).max().unwrap_or(0);

    println!("Settings:");
    println!();

    for (key, value) in rows {
        println!("  {:width$}  {}", key, value, width = max_key_len);
    }

    Ok(())
}

/// Get a specific setting.
fn get_setting(file: &Path, path: &str) -> anyhow::Result<()> {
    let settings = Settings::load_or_default(file)?;

    match settings.get(path) {
        Some(value) => {
            println!("{}", value);
            Ok(())
        }
        None => {
            anyhow::bail!("Setting not found: {}", path);
        }
    }
}

/// Set a setting value.
fn set_setting(file: &Path, path: &str, value: &str) -> anyhow::Result<()> {
    let mut settings = Settings::load_or_default(file)?;

    settings
        .set(path, value)
        .map_err(|e| anyhow::anyhow!("{}", e))?;

    settings.save_to(file)?;

    let stored = settings.get(path).unwrap_or_else(|| value.to_string());
    println!("Set {} = {}", path, stored);
    Ok(())
}

/// Reset a setting to default.
fn reset_setting(file: &Path, path: &str) -> anyhow::Result<()> {
    let mut settings = Settings::load_or_default(file)?;

    settings.reset(path).map_err(|e| anyhow::anyhow!("{}", e))?;
    settings.save_to(file)?;

    let current = settings.get(path).unwrap_or_default();
    println!("Reset {} to default: {}", path, current);
    Ok(())
}

/// Show the settings file path.
fn show_path(file: &Path) -> anyhow::Result<()> {
    println!("{}", file.display());

    if file.exists() {
        let metadata = std::fs::metadata(file)?;
        println!("  Size: {} bytes", metadata.len());
        if let Ok(modified) = metadata.modified() {
            let modified: chrono::DateTime<chrono::Local> = modified.into();
            let age = chrono::Local::now().signed_duration_since(modified);
            println!("  Modified: {}", describe_age(age));
        }
    } else {
        println!("  (does not exist, using defaults)");
    }

    Ok(())
}

fn describe_age(age: chrono::TimeDelta) -> String {
    let secs = age.num_seconds().max(0);
    if secs < 60 {
        format!("{} seconds ago", secs)
    } else if secs < 3600 {
        format!("{} minutes ago", secs / 60)
    } else if secs < 86400 {
        format!("{} hours ago", secs / 3600)
    } else {
        format!("{} days ago", secs / 86400)
    }
}
