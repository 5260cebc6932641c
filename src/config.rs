use eyre::{Result, WrapErr};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::Level;

pub const DEFAULT_CONFIG_FILE: &str = "cms.toml";

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub files: Files,
    pub logging: Logging,
}

/// Location of the data files. Relative file names are resolved against
/// `data_dir`.
#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Files {
    pub data_dir: PathBuf,
    pub students: PathBuf,
    pub staff: PathBuf,
    pub courses: PathBuf,
}

impl Default for Files {
    fn default() -> Self {
        Files {
            data_dir: PathBuf::from("."),
            students: PathBuf::from("students.csv"),
            staff: PathBuf::from("staff.csv"),
            courses: PathBuf::from("courses.csv"),
        }
    }
}

impl Files {
    pub fn students_path(&self) -> PathBuf {
        self.data_dir.join(&self.students)
    }

    pub fn staff_path(&self) -> PathBuf {
        self.data_dir.join(&self.staff)
    }

    pub fn courses_path(&self) -> PathBuf {
        self.data_dir.join(&self.courses)
    }
}

#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Logging {
    pub level: String,
}

impl Default for Logging {
    fn default() -> Self {
        Logging {
            level: "warn".to_owned(),
        }
    }
}

impl Logging {
    pub fn level(&self) -> Result<Level> {
        self.level
            .parse::<Level>()
            .wrap_err_with(|| format!("cannot parse logging.level {:?}", self.level))
    }
}

impl Config {
    pub fn load(file_name: &Path) -> Result<Config> {
        let content = std::fs::read_to_string(file_name)
            .wrap_err_with(|| format!("cannot load configuration file {}", file_name.display()))?;
        Config::parse(&content)
            .wrap_err_with(|| format!("cannot parse configuration file {}", file_name.display()))
    }

    /// Load the given configuration file, or the default one if it exists.
    pub fn load_or_default(file_name: Option<&Path>) -> Result<Config> {
        match file_name {
            Some(file_name) => Config::load(file_name),
            None if Path::new(DEFAULT_CONFIG_FILE).exists() => {
                Config::load(Path::new(DEFAULT_CONFIG_FILE))
            }
            None => Ok(Config::default()),
        }
    }

    pub fn parse(content: &str) -> Result<Config> {
        Ok(toml::from_str(content)?)
    }
}
