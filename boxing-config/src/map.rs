use std::collections::HashMap;

use crate::error::ConfigError;

/// A parsed `[Group]` / `key = value` configuration source, before any
/// typed resolution. Mirrors the shape of the reference library's `.cfg`
/// fixtures.
#[derive(Debug, Default, Clone)]
pub struct RawConfig {
    groups: HashMap<String, HashMap<String, String>>,
}

impl RawConfig {
    /// Parses a line-oriented `[Group]` / `key = value` source. Blank
    /// lines and lines starting with `#` or `;` are ignored.
    pub fn parse(source: &str) -> Result<Self, ConfigError> {
        let mut groups: HashMap<String, HashMap<String, String>> = HashMap::new();
        let mut current: Option<String> = None;

        for (i, raw_line) in source.lines().enumerate() {
            let line = raw_line.trim();
            if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
                continue;
            }
            if line.starts_with('[') {
                if !line.ends_with(']') {
                    return Err(ConfigError::Parse {
                        line: i + 1,
                        message: "unterminated group header".into(),
                    });
                }
                let name = line[1..line.len() - 1].trim().to_string();
                groups.entry(name.clone()).or_default();
                current = Some(name);
                continue;
            }

            let group = current.clone().ok_or_else(|| ConfigError::Parse {
                line: i + 1,
                message: "key = value line outside any [Group] section".into(),
            })?;
            let (key, value) = line.split_once('=').ok_or_else(|| ConfigError::Parse {
                line: i + 1,
                message: "expected 'key = value'".into(),
            })?;
            groups
                .entry(group)
                .or_default()
                .insert(key.trim().to_string(), value.trim().to_string());
        }

        Ok(Self { groups })
    }

    pub fn get(&self, group: &str, key: &str) -> Result<&str, ConfigError> {
        self.groups
            .get(group)
            .and_then(|g| g.get(key))
            .map(|s| s.as_str())
            .ok_or_else(|| ConfigError::MissingKey {
                group: group.to_string(),
                key: key.to_string(),
            })
    }

    pub fn get_u32(&self, group: &str, key: &str) -> Result<u32, ConfigError> {
        self.get(group, key)?.parse().map_err(|_| ConfigError::Parse {
            line: 0,
            message: format!("{}.{} is not a valid integer", group, key),
        })
    }

    pub fn get_i32(&self, group: &str, key: &str) -> Result<i32, ConfigError> {
        self.get(group, key)?.parse().map_err(|_| ConfigError::Parse {
            line: 0,
            message: format!("{}.{} is not a valid integer", group, key),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_groups_and_keys() {
        let src = "[FormatInfo]\nname = 4kv10\n\n[FrameFormat]\nwidth = 4096\n";
        let cfg = RawConfig::parse(src).unwrap();
        assert_eq!(cfg.get("FormatInfo", "name").unwrap(), "4kv10");
        assert_eq!(cfg.get_u32("FrameFormat", "width").unwrap(), 4096);
    }

    #[test]
    fn missing_key_is_a_config_error() {
        let cfg = RawConfig::parse("[FormatInfo]\n").unwrap();
        assert!(matches!(cfg.get("FormatInfo", "name"), Err(ConfigError::MissingKey { .. })));
    }

    #[test]
    fn key_outside_group_is_a_parse_error() {
        let result = RawConfig::parse("name = 4kv10\n");
        assert!(matches!(result, Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn comments_and_blank_lines_are_skipped() {
        let src = "# a comment\n\n[G]\n; also a comment\nk = v\n";
        let cfg = RawConfig::parse(src).unwrap();
        assert_eq!(cfg.get("G", "k").unwrap(), "v");
    }
}
