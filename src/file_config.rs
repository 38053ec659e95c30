//! INI loading for broker appender settings.
//!
//! Reads a single section from an INI file and maps its keys onto a
//! [`BrokerConfigBuilder`]. Files are decoded as UTF-8 unless another
//! `encoding_rs` label is supplied.

use std::{fs, io::ErrorKind, path::Path};

use encoding_rs::Encoding;
use ini::{Ini, Properties};
use log::warn;

use crate::broker::{BrokerConfig, BrokerConfigBuilder, ConfigError};

/// Section read when callers do not name one.
pub const DEFAULT_SECTION: &str = "amqp_appender";

/// Load the broker config stored in `section` of the INI file at `path`.
pub fn load_ini(
    path: impl AsRef<Path>,
    section: Option<&str>,
    encoding: Option<&str>,
) -> Result<BrokerConfig, ConfigError> {
    let path = path.as_ref();
    let bytes = read_file_bytes(path)?;
    if bytes.is_empty() {
        return Err(ConfigError::Empty(path.display().to_string()));
    }
    let text = decode_with_encoding(&bytes, encoding.unwrap_or("utf-8"))?;
    parse_ini_str(&text, section)
}

/// Parse broker settings from INI text.
pub fn parse_ini_str(text: &str, section: Option<&str>) -> Result<BrokerConfig, ConfigError> {
    let ini = Ini::load_from_str(text)?;
    let name = section.unwrap_or(DEFAULT_SECTION);
    let props = ini
        .section(Some(name))
        .ok_or_else(|| ConfigError::MissingSection(name.to_owned()))?;
    apply_properties(BrokerConfig::builder(), props)?.build()
}

fn read_file_bytes(path: &Path) -> Result<Vec<u8>, ConfigError> {
    fs::read(path).map_err(|err| match err.kind() {
        ErrorKind::NotFound => ConfigError::NotFound(path.display().to_string()),
        _ => ConfigError::Io(err),
    })
}

fn decode_with_encoding(bytes: &[u8], label: &str) -> Result<String, ConfigError> {
    let normalized_label = label.trim().to_ascii_lowercase();
    let encoding = Encoding::for_label(normalized_label.as_bytes())
        .ok_or_else(|| ConfigError::UnknownEncoding(label.to_owned()))?;
    let (decoded, _, had_errors) = encoding.decode(bytes);
    if had_errors {
        return Err(ConfigError::Decode(encoding.name()));
    }
    Ok(decoded.into_owned())
}

fn parse_u16(field: &str, value: &str) -> Result<u16, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::Invalid {
        field: field.to_owned(),
        value: value.to_owned(),
    })
}

fn apply_properties(
    mut builder: BrokerConfigBuilder,
    props: &Properties,
) -> Result<BrokerConfigBuilder, ConfigError> {
    for (key, value) in props.iter() {
        builder = match key {
            "exchange" => builder.with_exchange(value),
            "routing_key" => builder.with_routing_key(value),
            "host" => builder.with_host(value),
            "port" => builder.with_port(parse_u16(key, value)?),
            "virtual_host" => builder.with_virtual_host(value),
            "username" => builder.with_username(value),
            "password" => builder.with_password(value),
            "requested_heartbeat" => builder.with_heartbeat_secs(parse_u16(key, value)?),
            other => {
                warn!("Ignoring unknown appender setting [{other}]");
                builder
            }
        };
    }
    Ok(builder)
}
