//! Loading, validating and atomically saving `cachemux.toml`.
//!
//! Files with unknown or missing keys are rewritten in canonical form on
//! `load_or_create`. Section updates go through `toml_edit` so the other
//! sections keep their comments.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;
use toml_edit::{DocumentMut, Item};

use super::settings::{ConfigSection, Settings};

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] io::Error),

    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Failed to serialize config: {0}")]
    SerializeError(#[from] toml::ser::Error),

    #[error("Failed to parse config for editing: {0}")]
    EditParseError(#[from] toml_edit::TomlError),

    #[error("Config file not found: {0}")]
    NotFound(PathBuf),

    #[error("Invalid value for {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Owns the config file path and the settings read from it.
pub struct ConfigManager {
    config_path: PathBuf,
    settings: Settings,
}

impl ConfigManager {
    /// Nothing is read until `load()` or `load_or_create()`.
    pub fn new(config_path: impl Into<PathBuf>) -> Self {
        Self {
            config_path: config_path.into(),
            settings: Settings::default(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.config_path
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// In-memory only until `save()` or `update_section()`.
    pub fn settings_mut(&mut self) -> &mut Settings {
        &mut self.settings
    }

    pub fn into_settings(self) -> Settings {
        self.settings
    }

    /// Read and validate the file; a missing file is an error.
    pub fn load(&mut self) -> ConfigResult<()> {
        if !self.config_path.exists() {
            return Err(ConfigError::NotFound(self.config_path.clone()));
        }

        let content = fs::read_to_string(&self.config_path)?;
        let settings: Settings = toml::from_str(&content)?;
        validate_settings(&settings)?;
        self.settings = settings;
        Ok(())
    }

    /// Read the file, or write one with defaults if it does not exist.
    ///
    /// A file whose keys differ from the known set is rewritten.
    pub fn load_or_create(&mut self) -> ConfigResult<()> {
        if !self.config_path.exists() {
            self.settings = Settings::default();
            return self.save();
        }

        let content = fs::read_to_string(&self.config_path)?;
        let (settings, drift) = parse_with_drift(&content)?;
        validate_settings(&settings)?;
        self.settings = settings;

        if !drift.is_empty() {
            tracing::info!(
                "Rewriting {} (unknown: [{}], missing: [{}])",
                self.config_path.display(),
                drift.unknown.join(", "),
                drift.missing.join(", ")
            );
            self.save()?;
        }
        Ok(())
    }

    /// Write every section, replacing the file atomically.
    pub fn save(&self) -> ConfigResult<()> {
        let content = self.generate_config_with_comments()?;
        self.atomic_write(&content)?;
        Ok(())
    }

    /// Rewrite one section from the in-memory settings.
    ///
    /// The file is re-read so edits made to other sections since loading
    /// survive.
    pub fn update_section(&mut self, section: ConfigSection) -> ConfigResult<()> {
        validate_settings(&self.settings)?;

        let mut doc = match fs::read_to_string(&self.config_path) {
            Ok(content) if !content.trim().is_empty() => content.parse::<DocumentMut>()?,
            Ok(_) => DocumentMut::new(),
            Err(e) if e.kind() == io::ErrorKind::NotFound => DocumentMut::new(),
            Err(e) => return Err(e.into()),
        };

        let fresh: DocumentMut = self.section_toml(section)?.parse()?;
        doc[section.table_name()] = Item::Table(fresh.as_table().clone());

        self.atomic_write(&doc.to_string())?;
        Ok(())
    }

    fn section_toml(&self, section: ConfigSection) -> ConfigResult<String> {
        let s = &self.settings;
        Ok(match section {
            ConfigSection::Paths => toml::to_string_pretty(&s.paths)?,
            ConfigSection::Processing => toml::to_string_pretty(&s.processing)?,
            ConfigSection::Tools => toml::to_string_pretty(&s.tools)?,
            ConfigSection::Logging => toml::to_string_pretty(&s.logging)?,
        })
    }

    /// Render the full config file, with section comments.
    pub fn generate_config_with_comments(&self) -> ConfigResult<String> {
        let mut output = String::from("# cachemux configuration\n\n");

        for section in ConfigSection::ALL {
            output.push_str(section.comment());
            output.push('\n');
            output.push_str(&format!("[{}]\n", section.table_name()));
            output.push_str(&self.section_toml(section)?);
            if !output.ends_with('\n') {
                output.push('\n');
            }
            output.push('\n');
        }

        Ok(output)
    }

    fn atomic_write(&self, content: &str) -> io::Result<()> {
        if let Some(parent) = self.config_path.parent() {
            fs::create_dir_all(parent)?;
        }

        // Sibling temp file so the rename stays on one filesystem
        let temp_path = self.config_path.with_extension("toml.tmp");
        {
            let mut file = fs::File::create(&temp_path)?;
            file.write_all(content.as_bytes())?;
            file.sync_all()?;
        }
        fs::rename(&temp_path, &self.config_path)
    }
}

/// Values that parse but cannot drive a batch.
pub fn validate_settings(settings: &Settings) -> ConfigResult<()> {
    let p = &settings.processing;

    let non_empty = [
        ("processing.fragment_extension", &p.fragment_extension),
        ("processing.metadata_file", &p.metadata_file),
        ("processing.temp_prefix", &p.temp_prefix),
        ("processing.output_extension", &p.output_extension),
        ("tools.ffmpeg_path", &settings.tools.ffmpeg_path),
        ("tools.ffprobe_path", &settings.tools.ffprobe_path),
    ];
    for (key, value) in non_empty {
        if value.trim().is_empty() {
            return Err(ConfigError::Invalid {
                key,
                reason: "must not be empty".to_string(),
            });
        }
    }

    if p.parallel_groups == 0 {
        return Err(ConfigError::Invalid {
            key: "processing.parallel_groups",
            reason: "must be at least 1".to_string(),
        });
    }

    let extensions = [
        ("processing.fragment_extension", &p.fragment_extension),
        ("processing.output_extension", &p.output_extension),
    ];
    for (key, value) in extensions {
        if value.starts_with('.') {
            return Err(ConfigError::Invalid {
                key,
                reason: format!("'{}' should be given without the leading dot", value),
            });
        }
    }

    Ok(())
}

/// Keys present in a file but not known, and known keys the file lacks.
#[derive(Debug, Default, PartialEq, Eq)]
struct KeyDrift {
    unknown: Vec<String>,
    missing: Vec<String>,
}

impl KeyDrift {
    fn is_empty(&self) -> bool {
        self.unknown.is_empty() && self.missing.is_empty()
    }
}

fn parse_with_drift(content: &str) -> ConfigResult<(Settings, KeyDrift)> {
    let doc: DocumentMut = content.parse()?;
    let settings: Settings = toml::from_str(content)?;
    let canonical: DocumentMut = toml::to_string_pretty(&settings)?.parse()?;

    let mut drift = KeyDrift::default();

    for (name, item) in doc.iter() {
        let Some(expected) = canonical.get(name).and_then(Item::as_table) else {
            drift.unknown.push(name.to_string());
            continue;
        };
        let Some(table) = item.as_table() else {
            drift.unknown.push(name.to_string());
            continue;
        };
        for (key, _) in table.iter() {
            if !expected.contains_key(key) {
                drift.unknown.push(format!("{}.{}", name, key));
            }
        }
    }

    for (name, item) in canonical.iter() {
        let Some(expected) = item.as_table() else {
            continue;
        };
        let present = doc.get(name).and_then(Item::as_table);
        for (key, _) in expected.iter() {
            if !present.is_some_and(|t| t.contains_key(key)) {
                drift.missing.push(format!("{}.{}", name, key));
            }
        }
    }

    Ok((settings, drift))
}
