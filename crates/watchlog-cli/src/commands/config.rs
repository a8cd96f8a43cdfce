use crate::output::{Output, OutputFormat};
use color_eyre::eyre::eyre;
use color_eyre::Result;
use history_sync_config::Config;
use serde_json::json;
use std::path::{Path, PathBuf};

pub fn run_show(config_path: Option<&Path>, full: bool, output: &Output) -> Result<()> {
    let file: Option<PathBuf> = config_path.map(Path::to_path_buf).or_else(Config::default_path);
    let config = Config::load_unvalidated(file.as_deref())
        .map_err(|e| eyre!("Failed to load configuration: {}", e))?;
    let validation = config.validate();
    let shown = if full { config.clone() } else { config.masked() };

    match output.format() {
        OutputFormat::Human => {
            match &file {
                Some(path) => output.println(format!("# Config file: {}", path.display())),
                None => output.println("# No config file; values come from defaults and environment"),
            }
            let rendered = shown
                .to_toml()
                .map_err(|e| eyre!("Failed to render configuration: {}", e))?;
            output.println(rendered);
            match validation {
                Ok(()) => output.success("Configuration is complete"),
                Err(e) => output.warn(format!("Configuration is incomplete: {}", e)),
            }
        }
        OutputFormat::Json | OutputFormat::JsonPretty => {
            output.json(&json!({
                "type": "config",
                "file": file.as_ref().map(|p| p.display().to_string()),
                "valid": validation.is_ok(),
                "problem": validation.err().map(|e| e.to_string()),
                "config": serde_json::to_value(&shown)?,
            }));
        }
    }

    Ok(())
}
