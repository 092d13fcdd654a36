use clap::Subcommand;
use leanstreak_core::Config;

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Print one value by dot path
    Get {
        /// e.g. "engine.reward_cap" or "trackers.noalc.day_assignment"
        key: String,
    },
    /// Change one value and save the config file
    Set {
        /// e.g. "trackers.meditation.rule.threshold"
        key: String,
        /// Parsed as the type of the current value
        value: String,
    },
    /// Print the whole configuration as JSON
    List,
    /// Restore the default engine parameters and tracker presets
    Reset,
}

/// Names a missing tracker in `trackers.<name>...` keys, listing the known ones.
fn check_tracker_key(config: &Config, key: &str) -> Result<(), String> {
    let Some(rest) = key.strip_prefix("trackers.") else {
        return Ok(());
    };
    let name = rest.split('.').next().unwrap_or(rest);
    if config.tracker(name).is_ok() {
        return Ok(());
    }
    let known: Vec<&str> = config.trackers.iter().map(|t| t.name.as_str()).collect();
    Err(format!("unknown tracker '{name}' (known: {})", known.join(", ")))
}

pub fn run(action: ConfigAction) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        ConfigAction::Get { key } => {
            let config = Config::load()?;
            check_tracker_key(&config, &key)?;
            let value = config
                .get(&key)
                .ok_or_else(|| format!("unknown configuration key: {key}"))?;
            println!("{value}");
        }
        ConfigAction::Set { key, value } => {
            let mut config = Config::load()?;
            check_tracker_key(&config, &key)?;
            config.set(&key, &value)?;
            tracing::debug!(%key, %value, "configuration updated");
            println!("ok");
        }
        ConfigAction::List => {
            println!("{}", serde_json::to_string_pretty(&Config::load()?)?);
        }
        ConfigAction::Reset => {
            Config::default().save()?;
            println!("config reset to defaults");
        }
    }
    Ok(())
}
