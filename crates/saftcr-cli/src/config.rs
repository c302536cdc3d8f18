//! Configuration (§4.9): a small INI file under the platform config
//! directory, created interactively on first run.

use failure::Fail;
use ini::Ini;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

const CONF_FILENAME: &str = "saftcr.ini";
const SECTION: &str = "Settings";
const KEY_LANGUAGE: &str = "language";
const KEY_SKIP_PRE_FIRST_Z: &str = "skip_pre_first_z_for_x_reports";

const SUPPORTED_LANGUAGES: [&str; 2] = ["en", "dk"];

#[derive(Debug, Fail)]
pub enum ConfigError {
    #[fail(display = "fail to read configuration file: {}", _0)]
    ReadError(ini::Error),
    #[fail(display = "fail to write configuration file: {}", _0)]
    WriteError(io::Error),
    #[fail(display = "fail to read from stdin: {}", _0)]
    PromptError(io::Error),
    #[fail(display = "no home/config directory available on this platform")]
    NoConfigDir,
}

/// The one settings group the validator reads: report language and the
/// pre-first-Z reconciliation skip-window (§9 Open Question b).
#[derive(Clone, Debug)]
pub struct EngineConfig {
    pub language: String,
    pub skip_pre_first_z_for_x_reports: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            language: "en".to_string(),
            skip_pre_first_z_for_x_reports: true,
        }
    }
}

/// `<platform config dir>/saftcr/`.
pub fn config_dir() -> Result<PathBuf, ConfigError> {
    let mut dir = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
    dir.push("saftcr");
    Ok(dir)
}

fn conf_path(dir: &Path) -> PathBuf {
    dir.join(CONF_FILENAME)
}

/// Load the config from `dir`, creating it interactively (via stdin) if it
/// does not exist yet.
pub fn load_or_create(dir: &Path) -> Result<EngineConfig, ConfigError> {
    std::fs::create_dir_all(dir).map_err(ConfigError::WriteError)?;
    let path = conf_path(dir);
    if path.exists() {
        load(&path)
    } else {
        let conf = prompt_for_config(&mut io::stdin().lock(), &mut io::stdout())?;
        save(&path, &conf)?;
        Ok(conf)
    }
}

fn load(path: &Path) -> Result<EngineConfig, ConfigError> {
    let ini = Ini::load_from_file(path).map_err(ConfigError::ReadError)?;
    let section = ini.section(Some(SECTION));
    let language = section
        .and_then(|s| s.get(KEY_LANGUAGE))
        .filter(|lang| SUPPORTED_LANGUAGES.contains(lang))
        .unwrap_or("en")
        .to_string();
    let skip_pre_first_z_for_x_reports = section
        .and_then(|s| s.get(KEY_SKIP_PRE_FIRST_Z))
        .map(|v| v != "false")
        .unwrap_or(true);
    Ok(EngineConfig { language, skip_pre_first_z_for_x_reports })
}

fn save(path: &Path, conf: &EngineConfig) -> Result<(), ConfigError> {
    let mut ini = Ini::new();
    ini.with_section(Some(SECTION))
        .set(KEY_LANGUAGE, conf.language.as_str())
        .set(KEY_SKIP_PRE_FIRST_Z, conf.skip_pre_first_z_for_x_reports.to_string());
    ini.write_to_file(path).map_err(ConfigError::WriteError)
}

fn prompt_for_config<R: BufRead, W: Write>(input: &mut R, output: &mut W) -> Result<EngineConfig, ConfigError> {
    writeln!(output, "No saftcr configuration found, let's create one.").map_err(ConfigError::PromptError)?;
    let language = loop {
        write!(output, "Report language [en/dk] (default: en): ").map_err(ConfigError::PromptError)?;
        output.flush().map_err(ConfigError::PromptError)?;
        let mut line = String::new();
        input.read_line(&mut line).map_err(ConfigError::PromptError)?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            break "en".to_string();
        }
        if SUPPORTED_LANGUAGES.contains(&trimmed) {
            break trimmed.to_string();
        }
        writeln!(output, "Unknown language '{}'.", trimmed).map_err(ConfigError::PromptError)?;
    };
    Ok(EngineConfig { language, skip_pre_first_z_for_x_reports: true })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn blank_answer_defaults_to_english() {
        let mut input = Cursor::new(b"\n".to_vec());
        let mut output = Vec::new();
        let conf = prompt_for_config(&mut input, &mut output).unwrap();
        assert_eq!(conf.language, "en");
        assert!(conf.skip_pre_first_z_for_x_reports);
    }

    #[test]
    fn reprompts_on_unknown_language() {
        let mut input = Cursor::new(b"fr\ndk\n".to_vec());
        let mut output = Vec::new();
        let conf = prompt_for_config(&mut input, &mut output).unwrap();
        assert_eq!(conf.language, "dk");
    }

    #[test]
    fn save_then_load_round_trips() {
        let dir = std::env::temp_dir().join(format!("saftcr-test-config-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = conf_path(&dir);
        let conf = EngineConfig { language: "dk".to_string(), skip_pre_first_z_for_x_reports: false };
        save(&path, &conf).unwrap();
        let loaded = load(&path).unwrap();
        assert_eq!(loaded.language, "dk");
        assert!(!loaded.skip_pre_first_z_for_x_reports);
        std::fs::remove_dir_all(&dir).ok();
    }
}
