use crate::commands::{CmdMessage, CmdResult};
use crate::config::BinderConfig;
use crate::error::Result;
use std::path::Path;

#[derive(Debug, Clone)]
pub enum ConfigAction {
    ShowAll,
    ShowKey(String),
    Set(String, String),
}

/// Reads or updates `config.json` in `dir`. Invalid keys and values come
/// back as error messages and nothing is written.
pub fn run(dir: &Path, action: ConfigAction) -> Result<CmdResult> {
    let mut config = BinderConfig::load(dir)?;
    let mut result = CmdResult::default();

    match action {
        ConfigAction::ShowAll => return Ok(result.with_config(config)),
        ConfigAction::ShowKey(key) => result.add_message(match config.get(&key) {
            Some(value) => CmdMessage::info(value),
            None => CmdMessage::error(format!("Unknown config key: {}", key)),
        }),
        ConfigAction::Set(key, value) => match config.set(&key, &value) {
            Ok(()) => {
                config.save(dir)?;
                let shown = config.get(&key).unwrap_or(value);
                result.add_message(CmdMessage::success(format!("{} set to {}", key, shown)));
                result = result.with_config(config);
            }
            Err(e) => result.add_message(CmdMessage::error(e)),
        },
    }
    Ok(result)
}
