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


use log::{debug, info, warn};

use public::bytes::read_u16_be;
use public::consts::*;
use public::enums::EthernetType;

use crate::common::decapsulate::{TunnelInfo, TunnelType, TunnelTypeBitmap, TUNNEL_TIER_LIMIT};
use crate::config::{DecapConfig, DispatcherConfig};
use crate::error::{Error, Result};

/// Strips the tunnels of whole ethernet frames.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Decapsulator {
    tunnel_type_bitmap: TunnelTypeBitmap,
    tunnel_type_trim_bitmap: TunnelTypeBitmap,
}

impl Decapsulator {
    pub fn new(conf: &DispatcherConfig) -> Self {
        info!(
            "decapsulate tunnel types: {}, trim tunnel types: {}",
            conf.tunnel_type_bitmap, conf.tunnel_type_trim_bitmap
        );
        for tunnel_type in [
            TunnelType::Vxlan,
            TunnelType::Ipip,
            TunnelType::TencentGre,
            TunnelType::ErspanOrTeb,
        ] {
            if conf.tunnel_type_trim_bitmap.has(tunnel_type)
                && !conf.tunnel_type_bitmap.has(tunnel_type)
            {
                warn!(
                    "trim tunnel type {} is not decapsulated and will never be trimmed",
                    tunnel_type
                );
            }
        }
        Self {
            tunnel_type_bitmap: conf.tunnel_type_bitmap,
            tunnel_type_trim_bitmap: conf.tunnel_type_trim_bitmap,
        }
    }

    pub fn from_yaml<C: AsRef<str>>(contents: C) -> Result<Self> {
        let conf = DecapConfig::load(contents)?;
        Ok(Self::new(&DispatcherConfig::from(&conf)))
    }

    pub fn tunnel_type_bitmap(&self) -> TunnelTypeBitmap {
        self.tunnel_type_bitmap
    }

    pub fn tunnel_type_trim_bitmap(&self) -> TunnelTypeBitmap {
        self.tunnel_type_trim_bitmap
    }

    // returns ethernet_type and l2_len
    pub fn get_l2_info(packet: &[u8]) -> Result<(EthernetType, usize)> {
        if packet.len() < ETH_HEADER_SIZE {
            return Err(Error::PacketInvalid(
                "packet.len() < ETH_HEADER_SIZE".to_string(),
            ));
        }
        let mut eth_type = read_u16_be(&packet[FIELD_OFFSET_ETH_TYPE..]);
        let mut l2_opt_size = 0;
        if eth_type == EthernetType::Dot1Q || eth_type == EthernetType::QinQ {
            if packet.len() < ETH_HEADER_SIZE + VLAN_HEADER_SIZE {
                return Err(Error::PacketInvalid(
                    "packet.len() < ETH_HEADER_SIZE + VLAN_HEADER_SIZE".to_string(),
                ));
            }
            l2_opt_size += VLAN_HEADER_SIZE;
            eth_type = read_u16_be(&packet[FIELD_OFFSET_ETH_TYPE + l2_opt_size..]);
            if eth_type == EthernetType::Dot1Q {
                if packet.len() < ETH_HEADER_SIZE + 2 * VLAN_HEADER_SIZE {
                    return Err(Error::PacketInvalid(
                        "packet.len() < ETH_HEADER_SIZE + 2 * VLAN_HEADER_SIZE".to_string(),
                    ));
                }
                l2_opt_size += VLAN_HEADER_SIZE;
                eth_type = read_u16_be(&packet[FIELD_OFFSET_ETH_TYPE + l2_opt_size..]);
            }
        }
        Ok((
            eth_type.try_into().unwrap_or(EthernetType::Unknown),
            ETH_HEADER_SIZE + l2_opt_size,
        ))
    }

    /// Strips one tunnel off `packet`.
    ///
    /// Returns the position of the inner frame in `packet`, or 0 when there is
    /// no tunnel to strip.
    pub fn decapsulate(&self, packet: &mut [u8], tunnel_info: &mut TunnelInfo) -> Result<usize> {
        let (eth_type, l2_len) = Self::get_l2_info(packet)?;
        let offset = match eth_type {
            EthernetType::Ipv4 => {
                tunnel_info.decapsulate(packet, l2_len, &self.tunnel_type_bitmap)
            }
            EthernetType::Ipv6 => {
                tunnel_info.decapsulate_v6(packet, l2_len, &self.tunnel_type_bitmap)
            }
            _ => return Ok(0),
        };
        Ok(offset.frame_start(l2_len).unwrap_or(0))
    }

    /// Strips up to `TUNNEL_TIER_LIMIT` tunnels off `packet`, recording them
    /// into a cleared `tunnel_info`.
    ///
    /// Returns the position of the innermost frame, 0 if no tunnel was found.
    /// A tunnel listed in the trim bitmap discards itself and every tunnel
    /// outside of it, for example with ERSPAN trimmed:
    ///   vxlan-erspan: no tunnel info
    ///   erspan-vxlan: vxlan, tier 1
    pub fn decap_tunnel(&self, packet: &mut [u8], tunnel_info: &mut TunnelInfo) -> Result<usize> {
        *tunnel_info = TunnelInfo::default();
        let mut decap_len = 0;
        for i in 0..TUNNEL_TIER_LIMIT {
            if i > 0 && packet.len() < decap_len + ETH_HEADER_SIZE {
                debug!(
                    "inner frame at {} of {} bytes is too short, stop decapsulating",
                    decap_len,
                    packet.len()
                );
                break;
            }
            // a failed attempt over IPv6 clears the types recorded so far
            let recorded = *tunnel_info;
            let offset = match self.decapsulate(&mut packet[decap_len..], tunnel_info) {
                Ok(offset) => offset,
                // the outer tunnels are already stripped, keep them
                Err(e) if i > 0 => {
                    debug!(
                        "inner frame at {} is invalid: {}, stop decapsulating",
                        decap_len, e
                    );
                    0
                }
                Err(e) => return Err(e),
            };
            if offset == 0 {
                *tunnel_info = recorded;
                break;
            }
            if self
                .tunnel_type_trim_bitmap
                .has(tunnel_info.tunnel_type.last())
            {
                *tunnel_info = TunnelInfo::default();
            }
            decap_len += offset;
        }
        Ok(decap_len)
    }
}

#[cfg(test)]
mod tests {
    use std::net::Ipv4Addr;

    use super::*;

    use public::enums::IpProtocol;

    use crate::common::decapsulate::TieredTunnelType;
    use crate::utils::test::{PacketBuilder, DEFAULT_DST_MAC};

    fn decapsulator(decap_types: &[TunnelType], trim_tunnel_types: &[TunnelType]) -> Decapsulator {
        Decapsulator::new(&DispatcherConfig {
            tunnel_type_bitmap: TunnelTypeBitmap::new(decap_types),
            tunnel_type_trim_bitmap: TunnelTypeBitmap::new(trim_tunnel_types),
        })
    }

    fn all_types() -> Vec<TunnelType> {
        vec![
            TunnelType::Vxlan,
            TunnelType::Ipip,
            TunnelType::TencentGre,
            TunnelType::ErspanOrTeb,
        ]
    }

    fn erspan(builder: PacketBuilder, session_id: u16) -> PacketBuilder {
        builder
            .ether(EthernetType::Ipv4)
            .ipv4(
                IpProtocol::Gre,
                Ipv4Addr::new(10, 0, 0, 1),
                Ipv4Addr::new(10, 0, 0, 2),
            )
            .gre(gre::FLAGS_SEQ_MASK, EthernetType::ErspanII.into(), 0)
            .erspan_ii(session_id)
    }

    fn vxlan(builder: PacketBuilder, vni: u32) -> PacketBuilder {
        builder
            .ether(EthernetType::Ipv4)
            .ipv4(
                IpProtocol::Udp,
                Ipv4Addr::new(172, 16, 0, 1),
                Ipv4Addr::new(172, 16, 0, 2),
            )
            .udp(49152, 4789)
            .vxlan(8, vni)
    }

    #[test]
    fn l2_info() {
        let packet = PacketBuilder::new().inner_frame().build();
        assert_eq!(
            Decapsulator::get_l2_info(&packet).unwrap(),
            (EthernetType::Ipv4, ETH_HEADER_SIZE)
        );

        let packet = PacketBuilder::new()
            .ether(EthernetType::Dot1Q)
            .vlan(100, EthernetType::Ipv6)
            .inner_ipv6()
            .build();
        assert_eq!(
            Decapsulator::get_l2_info(&packet).unwrap(),
            (EthernetType::Ipv6, ETH_HEADER_SIZE + VLAN_HEADER_SIZE)
        );

        let packet = PacketBuilder::new()
            .ether(EthernetType::QinQ)
            .vlan(100, EthernetType::Dot1Q)
            .vlan(200, EthernetType::Ipv4)
            .inner_ipv4()
            .build();
        assert_eq!(
            Decapsulator::get_l2_info(&packet).unwrap(),
            (EthernetType::Ipv4, ETH_HEADER_SIZE + 2 * VLAN_HEADER_SIZE)
        );

        let packet = PacketBuilder::new().ether(EthernetType::Arp).build();
        assert_eq!(
            Decapsulator::get_l2_info(&packet).unwrap(),
            (EthernetType::Arp, ETH_HEADER_SIZE)
        );
    }

    #[test]
    fn l2_info_too_short() {
        assert!(matches!(
            Decapsulator::get_l2_info(&[0u8; ETH_HEADER_SIZE - 1]),
            Err(Error::PacketInvalid(_))
        ));
        let packet = PacketBuilder::new().ether(EthernetType::Dot1Q).build();
        assert!(Decapsulator::get_l2_info(&packet).is_err());
        let packet = PacketBuilder::new()
            .ether(EthernetType::Dot1Q)
            .vlan(100, EthernetType::Dot1Q)
            .build();
        assert!(Decapsulator::get_l2_info(&packet).is_err());
    }

    #[test]
    fn decapsulate_single_tier() {
        let d = decapsulator(&all_types(), &[]);
        let mut packet = vxlan(PacketBuilder::new(), 7).inner_frame().build();
        let mut info = TunnelInfo::default();
        assert_eq!(d.decapsulate(&mut packet, &mut info).unwrap(), VXLAN_PACKET_SIZE);
        assert_eq!(info.id, 7);

        let mut packet = PacketBuilder::new().inner_frame().build();
        let mut info = TunnelInfo::default();
        assert_eq!(d.decapsulate(&mut packet, &mut info).unwrap(), 0);
        assert!(!info.is_valid());

        let mut packet = PacketBuilder::new()
            .ether(EthernetType::Arp)
            .payload(&[0; 28])
            .build();
        assert_eq!(d.decapsulate(&mut packet, &mut info).unwrap(), 0);

        assert!(d.decapsulate(&mut [0u8; 10], &mut info).is_err());
    }

    #[test]
    fn decap_tunnel_two_tiers() {
        let d = decapsulator(&all_types(), &[]);
        let mut packet = vxlan(erspan(PacketBuilder::new(), 5), 99)
            .inner_frame()
            .build();
        let mut info = TunnelInfo::default();
        let offset = d.decap_tunnel(&mut packet, &mut info).unwrap();
        assert_eq!(offset, 2 * VXLAN_PACKET_SIZE);
        assert_eq!(&packet[offset..offset + MAC_ADDR_LEN], &DEFAULT_DST_MAC);
        assert_eq!(info.tier, 2);
        assert_eq!(
            info.tunnel_type.to_packed(),
            ((u8::from(TunnelType::ErspanOrTeb) as u16) << 6) | u8::from(TunnelType::Vxlan) as u16
        );
        assert_eq!(info.src, Ipv4Addr::new(10, 0, 0, 1));
        assert_eq!(info.id, 5);
    }

    #[test]
    fn decap_tunnel_clears_previous_info() {
        let d = decapsulator(&all_types(), &[]);
        let mut info = TunnelInfo::default();
        let mut packet = vxlan(PacketBuilder::new(), 7).inner_frame().build();
        d.decap_tunnel(&mut packet, &mut info).unwrap();
        assert!(info.is_valid());

        let mut packet = PacketBuilder::new().inner_frame().build();
        assert_eq!(d.decap_tunnel(&mut packet, &mut info).unwrap(), 0);
        assert_eq!(info, TunnelInfo::default());
    }

    #[test]
    fn decap_tunnel_keeps_outer_info_before_ipv6() {
        let d = decapsulator(&all_types(), &[]);
        let mut packet = vxlan(PacketBuilder::new(), 7)
            .ether(EthernetType::Ipv6)
            .inner_ipv6()
            .build();
        let mut info = TunnelInfo::default();
        assert_eq!(
            d.decap_tunnel(&mut packet, &mut info).unwrap(),
            VXLAN_PACKET_SIZE
        );
        assert_eq!(info.tunnel_type, TieredTunnelType::new(TunnelType::Vxlan));
        assert_eq!(info.tier, 1);
    }

    #[test]
    fn decap_tunnel_trim_outer() {
        let d = decapsulator(&all_types(), &[TunnelType::ErspanOrTeb]);
        let mut packet = vxlan(erspan(PacketBuilder::new(), 5), 99)
            .inner_frame()
            .build();
        let mut info = TunnelInfo::default();
        let offset = d.decap_tunnel(&mut packet, &mut info).unwrap();
        assert_eq!(offset, 2 * VXLAN_PACKET_SIZE);
        assert_eq!(info.tunnel_type, TieredTunnelType::new(TunnelType::Vxlan));
        assert_eq!(info.tier, 1);
        assert_eq!(info.src, Ipv4Addr::new(172, 16, 0, 1));
        assert_eq!(info.id, 99);
    }

    #[test]
    fn decap_tunnel_trim_inner() {
        let d = decapsulator(&all_types(), &[TunnelType::ErspanOrTeb]);
        let mut packet = erspan(vxlan(PacketBuilder::new(), 99), 5)
            .inner_frame()
            .build();
        let mut info = TunnelInfo::default();
        let offset = d.decap_tunnel(&mut packet, &mut info).unwrap();
        assert_eq!(offset, 2 * VXLAN_PACKET_SIZE);
        assert_eq!(info, TunnelInfo::default());
    }

    #[test]
    fn decap_tunnel_disabled_type() {
        let d = decapsulator(&[TunnelType::Vxlan], &[]);
        let mut packet = vxlan(erspan(PacketBuilder::new(), 5), 99)
            .inner_frame()
            .build();
        let origin = packet.clone();
        let mut info = TunnelInfo::default();
        assert_eq!(d.decap_tunnel(&mut packet, &mut info).unwrap(), 0);
        assert!(!info.is_valid());
        assert_eq!(packet, origin);
    }

    #[test]
    fn decap_tunnel_ipip_behind_vlan() {
        let d = decapsulator(&all_types(), &[]);
        let mut packet = PacketBuilder::new()
            .ether(EthernetType::Dot1Q)
            .vlan(10, EthernetType::Ipv4)
            .ipv4(
                IpProtocol::Ipv4,
                Ipv4Addr::new(10, 0, 0, 1),
                Ipv4Addr::new(10, 0, 0, 2),
            )
            .inner_ipv4()
            .build();
        let mut info = TunnelInfo::default();
        let offset = d.decap_tunnel(&mut packet, &mut info).unwrap();
        assert_eq!(offset, IPV4_HEADER_SIZE);
        assert_eq!(
            Decapsulator::get_l2_info(&packet[offset..]).unwrap(),
            (EthernetType::Ipv4, ETH_HEADER_SIZE + VLAN_HEADER_SIZE)
        );
        assert_eq!(info.tunnel_type, TieredTunnelType::new(TunnelType::Ipip));
    }

    #[test]
    fn decap_tunnel_truncated_inner_vlan() {
        let d = decapsulator(&all_types(), &[]);
        let mut packet = vxlan(PacketBuilder::new(), 7)
            .ether(EthernetType::Dot1Q)
            .payload(&[0; 2])
            .build();
        let mut info = TunnelInfo::default();
        assert_eq!(
            d.decap_tunnel(&mut packet, &mut info).unwrap(),
            VXLAN_PACKET_SIZE
        );
        assert_eq!(info.tunnel_type, TieredTunnelType::new(TunnelType::Vxlan));
        assert_eq!(info.id, 7);
        assert_eq!(info.tier, 1);
    }

    #[test]
    fn from_yaml() {
        let d = Decapsulator::from_yaml("decap-types: [15]\ntrim-tunnel-types: [15]").unwrap();
        assert!(d.tunnel_type_bitmap().has(TunnelType::ErspanOrTeb));
        assert!(!d.tunnel_type_bitmap().has(TunnelType::Vxlan));
        assert!(d.tunnel_type_trim_bitmap().has(TunnelType::ErspanOrTeb));

        let d = Decapsulator::from_yaml("").unwrap();
        assert_eq!(
            d.tunnel_type_bitmap(),
            TunnelTypeBitmap::new(&[TunnelType::Vxlan, TunnelType::Ipip])
        );

        assert!(matches!(
            Decapsulator::from_yaml("decap-types: [9]"),
            Err(Error::Config(_))
        ));
    }
}
