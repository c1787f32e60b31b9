//! INI parsing logic for converting `Ini` → `ConfigFile`.
//!
//! This is the single place where INI key names are mapped to struct fields.

use ini::{Ini, Properties};
use std::path::PathBuf;
use std::str::FromStr;

use super::file::ConfigFileError;
use super::settings::ConfigFile;

/// Parse an `Ini` object into a `ConfigFile`.
///
/// Starts from `ConfigFile::default()` and overlays any values found in the INI.
pub(super) fn parse_ini(ini: &Ini) -> Result<ConfigFile, ConfigFileError> {
    let mut config = ConfigFile::default();

    // [source] section
    if let Some(section) = ini.section(Some("source")) {
        if let Some(v) = section.get("url_template") {
            let v = v.trim();
            if !has_tile_placeholders(v) {
                return Err(invalid(
                    "source",
                    "url_template",
                    v,
                    "must contain {z}, {x} and {y} placeholders",
                ));
            }
            config.source.url_template = v.to_string();
        }
        if let Some(v) = section.get("access_token") {
            let v = v.trim();
            if !v.is_empty() {
                config.source.access_token = Some(v.to_string());
            }
        }
        if let Some(v) = parse_value::<u64>(section, "source", "timeout", "must be a positive integer (seconds)")? {
            if v == 0 {
                return Err(invalid("source", "timeout", "0", "must be at least 1"));
            }
            config.source.timeout = v;
        }
    }

    // [pipeline] section
    if let Some(section) = ini.section(Some("pipeline")) {
        if let Some(v) = parse_value::<u32>(section, "pipeline", "max_attempts", "must be a positive integer")? {
            if v == 0 {
                return Err(invalid("pipeline", "max_attempts", "0", "must be at least 1"));
            }
            config.pipeline.max_attempts = v;
        }
        if let Some(v) = parse_value(
            section,
            "pipeline",
            "retry_initial_delay_ms",
            "must be a positive integer (milliseconds)",
        )? {
            config.pipeline.retry_initial_delay_ms = v;
        }
        if let Some(v) = parse_value::<usize>(section, "pipeline", "fetch_concurrency", "must be a positive integer")? {
            if v == 0 {
                return Err(invalid("pipeline", "fetch_concurrency", "0", "must be at least 1"));
            }
            config.pipeline.fetch_concurrency = v;
        }
        if let Some(v) = parse_value(section, "pipeline", "tile_error_policy", "must be 'skip' or 'abort'")? {
            config.pipeline.tile_error_policy = v;
        }
        if let Some(v) = parse_value(section, "pipeline", "field_mode", "must be 'simple' or 'full'")? {
            config.pipeline.field_mode = v;
        }
        if let Some(v) = parse_value::<usize>(section, "pipeline", "max_tiles", "must be a positive integer")? {
            if v == 0 {
                return Err(invalid("pipeline", "max_tiles", "0", "must be at least 1"));
            }
            config.pipeline.max_tiles = v;
        }
        if let Some(v) = section.get("work_dir") {
            let v = v.trim();
            if !v.is_empty() {
                config.pipeline.work_dir = expand_tilde(v);
            }
        }
    }

    // [raster] section
    if let Some(section) = ini.section(Some("raster")) {
        if let Some(v) = section.get("translate_bin") {
            let v = v.trim();
            if !v.is_empty() {
                config.raster.translate_bin = v.to_string();
            }
        }
        if let Some(v) = section.get("warp_bin") {
            let v = v.trim();
            if !v.is_empty() {
                config.raster.warp_bin = v.to_string();
            }
        }
        if let Some(v) = parse_value(section, "raster", "cache_max_mb", "must be a positive integer (megabytes)")? {
            config.raster.cache_max_mb = v;
        }
    }

    // [server] section
    if let Some(section) = ini.section(Some("server")) {
        if let Some(v) = parse_value(section, "server", "port", "must be a port number (0-65535)")? {
            config.server.port = v;
        }
        if let Some(v) = parse_value::<usize>(section, "server", "workers", "must be a positive integer")? {
            if v == 0 {
                return Err(invalid("server", "workers", "0", "must be at least 1"));
            }
            config.server.workers = v;
        }
        if let Some(v) = section.get("output_dir") {
            let v = v.trim();
            if !v.is_empty() {
                config.server.output_dir = expand_tilde(v);
            }
        }
    }

    // [logging] section
    if let Some(section) = ini.section(Some("logging")) {
        if let Some(v) = section.get("directory") {
            let v = v.trim();
            if !v.is_empty() {
                config.logging.directory = expand_tilde(v);
            }
        }
    }

    Ok(config)
}

/// Parses `section.key` when present.
fn parse_value<T: FromStr>(
    properties: &Properties,
    section: &str,
    key: &str,
    reason: &str,
) -> Result<Option<T>, ConfigFileError> {
    match properties.get(key) {
        None => Ok(None),
        Some(v) => v
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| invalid(section, key, v, reason)),
    }
}

fn invalid(section: &str, key: &str, value: &str, reason: &str) -> ConfigFileError {
    ConfigFileError::InvalidValue {
        section: section.to_string(),
        key: key.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

fn has_tile_placeholders(template: &str) -> bool {
    ["{z}", "{x}", "{y}"].iter().all(|p| template.contains(p))
}

pub(super) fn expand_tilde(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(stripped);
        }
    }
    PathBuf::from(path)
}
