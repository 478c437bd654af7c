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


use crate::common::decapsulate::TunnelTypeBitmap;
use crate::config::DecapConfig;

#[derive(Clone, PartialEq, Eq, Debug, Default)]
pub struct DispatcherConfig {
    pub tunnel_type_bitmap: TunnelTypeBitmap,
    pub tunnel_type_trim_bitmap: TunnelTypeBitmap,
}

impl From<&DecapConfig> for DispatcherConfig {
    fn from(conf: &DecapConfig) -> Self {
        Self {
            tunnel_type_bitmap: TunnelTypeBitmap::new(&conf.decap_types),
            tunnel_type_trim_bitmap: TunnelTypeBitmap::new(&conf.trim_tunnel_types),
        }
    }
}
