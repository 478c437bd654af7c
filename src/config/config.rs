/*
 * Copyright (c) 2024 Yunshan Networks
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 * You may obtain a copy of the License at
 *
 *     http://www.apache.org/licenses/LICENSE-2.0
 *
 * Unless required by applicable law or agreed to in writing, software
 * distributed under the License is distributed on an "AS IS" BASIS,
 * WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 * See the License for the specific language governing permissions and
 * limitations under the License.
 */


use std::fs;
use std::path::Path;

use serde::{
    de::{self, Unexpected},
    Deserialize, Deserializer,
};
use thiserror::Error;

use crate::common::decapsulate::TunnelType;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("yaml config invalid: {0}")]
    YamlConfigInvalid(String),
}

#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(default, rename_all = "kebab-case")]
pub struct DecapConfig {
    #[serde(deserialize_with = "to_tunnel_types")]
    pub decap_types: Vec<TunnelType>,
    #[serde(deserialize_with = "to_tunnel_types")]
    pub trim_tunnel_types: Vec<TunnelType>,
}

impl DecapConfig {
    pub fn load_from_file<T: AsRef<Path>>(path: T) -> Result<Self, ConfigError> {
        let contents =
            fs::read_to_string(path).map_err(|e| ConfigError::YamlConfigInvalid(e.to_string()))?;
        Self::load(&contents)
    }

    pub fn load<C: AsRef<str>>(contents: C) -> Result<Self, ConfigError> {
        let contents = contents.as_ref();
        if contents.trim().is_empty() {
            // parsing empty string leads to EOF error
            return Ok(Self::default());
        }
        serde_yaml::from_str(contents).map_err(|e| ConfigError::YamlConfigInvalid(e.to_string()))
    }
}

impl Default for DecapConfig {
    fn default() -> Self {
        Self {
            decap_types: vec![TunnelType::Vxlan, TunnelType::Ipip],
            trim_tunnel_types: vec![],
        }
    }
}

fn to_tunnel_types<'de, D>(deserializer: D) -> Result<Vec<TunnelType>, D::Error>
where
    D: Deserializer<'de>,
{
    Vec::<u8>::deserialize(deserializer)?
        .into_iter()
        .map(|t| {
            TunnelType::try_from(t).map_err(|_| {
                de::Error::invalid_value(
                    Unexpected::Unsigned(t as u64),
                    &"None|Vxlan|Ipip|TencentGre|ErspanOrTeb",
                )
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn read_yaml_file() {
        let c = DecapConfig::load_from_file("config/tunnel-decap.yaml")
            .expect("failed loading config file");
        assert_eq!(
            c.decap_types,
            vec![
                TunnelType::Vxlan,
                TunnelType::Ipip,
                TunnelType::TencentGre,
                TunnelType::ErspanOrTeb
            ]
        );
        assert_eq!(c.trim_tunnel_types, vec![TunnelType::ErspanOrTeb]);
    }

    #[test]
    fn load_defaults() {
        assert_eq!(DecapConfig::load("").unwrap(), DecapConfig::default());
        assert_eq!(DecapConfig::load("\n").unwrap(), DecapConfig::default());

        let c = DecapConfig::load("trim-tunnel-types: [1]").unwrap();
        assert_eq!(c.decap_types, vec![TunnelType::Vxlan, TunnelType::Ipip]);
        assert_eq!(c.trim_tunnel_types, vec![TunnelType::Vxlan]);

        let c = DecapConfig::load("decap-types: []").unwrap();
        assert!(c.decap_types.is_empty());
    }

    #[test]
    fn load_invalid_tunnel_type() {
        let e = DecapConfig::load("decap-types: [1, 4]").unwrap_err();
        let ConfigError::YamlConfigInvalid(message) = e;
        assert!(message.contains("None|Vxlan|Ipip|TencentGre|ErspanOrTeb"));

        assert!(DecapConfig::load("decap-types: vxlan").is_err());
        assert!(DecapConfig::load("decap-types: [-1]").is_err());
    }

    #[test]
    fn load_from_temp_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "decap-types: [3, 15]").unwrap();
        let c = DecapConfig::load_from_file(file.path()).unwrap();
        assert_eq!(
            c.decap_types,
            vec![TunnelType::TencentGre, TunnelType::ErspanOrTeb]
        );
        assert!(c.trim_tunnel_types.is_empty());

        assert!(DecapConfig::load_from_file("/nonexistent/tunnel-decap.yaml").is_err());
    }
}
