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

use std::fmt;
use std::net::Ipv4Addr;

use num_enum::{IntoPrimitive, TryFromPrimitive};
use serde::Serialize;

use public::bytes;
use public::consts::*;
use public::enums::{EthernetType, IpProtocol};

#[derive(
    Serialize,
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    TryFromPrimitive,
    IntoPrimitive,
)]
#[repr(u8)]
pub enum TunnelType {
    // The maximum value here is 15
    None = 0,
    Vxlan = 1,
    Ipip = 2,
    // GRE.ver=1 GRE.protoType=IPv4/IPv6
    TencentGre = 3,
    // TEB carries nothing worth recording, it shares the code with ERSPAN
    ErspanOrTeb = 0xf,
}

impl fmt::Display for TunnelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TunnelType::None => write!(f, "none"),
            TunnelType::Vxlan => write!(f, "VXLAN"),
            TunnelType::Ipip => write!(f, "IPIP"),
            TunnelType::TencentGre => write!(f, "GRE"),
            TunnelType::ErspanOrTeb => write!(f, "ERSPAN_TEB"),
        }
    }
}

impl Default for TunnelType {
    fn default() -> Self {
        TunnelType::None
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TunnelTypeBitmap(u16);

impl TunnelTypeBitmap {
    pub fn new(tunnel_types: &[TunnelType]) -> Self {
        let mut bitmap = TunnelTypeBitmap(0);
        for tunnel_type in tunnel_types.iter() {
            bitmap.add(*tunnel_type);
        }
        bitmap
    }

    pub fn add(&mut self, tunnel_type: TunnelType) {
        self.0 |= 1 << u8::from(tunnel_type)
    }

    pub fn has(&self, tunnel_type: TunnelType) -> bool {
        self.0 & (1 << u8::from(tunnel_type)) != 0
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for TunnelTypeBitmap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return write!(f, "{}", TunnelType::None);
        }
        let mut separation = "";
        for tunnel_type in [
            TunnelType::None,
            TunnelType::Vxlan,
            TunnelType::Ipip,
            TunnelType::TencentGre,
            TunnelType::ErspanOrTeb,
        ] {
            if self.has(tunnel_type) {
                write!(f, "{}{}", separation, tunnel_type)?;
                separation = " ";
            }
        }
        Ok(())
    }
}

pub const TUNNEL_TIER_LIMIT: u8 = 2;

const TUNNEL_TYPE_TIER1_MASK: u16 = 0x3f;
const TUNNEL_TYPE_TIER2_SHIFT: u16 = 6;

/// Tunnel types of a packet, outermost first, at most `TUNNEL_TIER_LIMIT` of them.
///
/// On the wire (see `to_packed`) a single tunnel is its plain type code and two
/// tunnels are `outer << 6 | inner`.
#[derive(Serialize, Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TieredTunnelType([TunnelType; TUNNEL_TIER_LIMIT as usize]);

impl TieredTunnelType {
    pub fn new(tunnel_type: TunnelType) -> Self {
        TieredTunnelType([tunnel_type, TunnelType::None])
    }

    /// Appends the type of the next inner tunnel. Nothing changes once both
    /// tiers are taken.
    pub fn push(&mut self, tunnel_type: TunnelType) {
        match self.0 {
            [TunnelType::None, _] => self.0[0] = tunnel_type,
            [_, TunnelType::None] => self.0[1] = tunnel_type,
            _ => (),
        }
    }

    /// True if `tunnel_type` sits in either tier.
    ///
    /// The tier is not part of the match: with two tunnels the outer type also
    /// answers a query meant for the inner one, and while the inner tier is
    /// vacant `has(TunnelType::None)` is true. Consumers of the packed code
    /// see exactly the same answers.
    pub fn has(&self, tunnel_type: TunnelType) -> bool {
        self.0[0] == tunnel_type || self.0[1] == tunnel_type
    }

    pub fn outer(&self) -> TunnelType {
        self.0[0]
    }

    pub fn inner(&self) -> TunnelType {
        self.0[1]
    }

    // type of the most recently decapsulated tunnel
    pub fn last(&self) -> TunnelType {
        match self.0[1] {
            TunnelType::None => self.0[0],
            inner => inner,
        }
    }

    pub fn is_none(&self) -> bool {
        self.0 == [TunnelType::None; TUNNEL_TIER_LIMIT as usize]
    }

    pub fn to_packed(&self) -> u16 {
        let (outer, inner) = (u8::from(self.0[0]) as u16, u8::from(self.0[1]) as u16);
        if inner == 0 {
            outer
        } else {
            (outer << TUNNEL_TYPE_TIER2_SHIFT) | inner
        }
    }

    pub fn from_packed(code: u16) -> Option<Self> {
        if code >> (TUNNEL_TYPE_TIER2_SHIFT * 2) != 0 {
            return None;
        }
        let tier1 = TunnelType::try_from((code & TUNNEL_TYPE_TIER1_MASK) as u8).ok()?;
        match code >> TUNNEL_TYPE_TIER2_SHIFT {
            0 => Some(TieredTunnelType::new(tier1)),
            _ if tier1 == TunnelType::None => None,
            outer => Some(TieredTunnelType([
                TunnelType::try_from(outer as u8).ok()?,
                tier1,
            ])),
        }
    }
}

impl From<TunnelType> for TieredTunnelType {
    fn from(t: TunnelType) -> Self {
        TieredTunnelType::new(t)
    }
}

impl fmt::Display for TieredTunnelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            [outer, TunnelType::None] => write!(f, "{}", outer),
            [outer, inner] => write!(f, "{}|{}", outer, inner),
        }
    }
}

/// Where parsing resumes after a decapsulation attempt.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum DecapOffset {
    /// Nothing stripped, parse on from the current position.
    #[default]
    None,
    /// The next frame starts this many bytes past the start of the L3 header,
    /// i.e. at `packet[l2_len + n..]`.
    L3(usize),
    /// IPIP only: the L2 header was moved in place to `packet[start..]`, right
    /// in front of the overlay IP header, and the next frame starts there.
    Relocated { start: usize },
}

impl DecapOffset {
    pub fn is_none(&self) -> bool {
        *self == DecapOffset::None
    }

    /// Offset from the end of the original L2 header to the next frame.
    ///
    /// Negative for `Relocated` when the L2 header is longer than the removed
    /// underlay IP header, and possibly 0 for `Relocated` as well, so callers
    /// should test `is_none` rather than compare against 0.
    pub fn relative(&self, l2_len: usize) -> isize {
        match self {
            DecapOffset::None => 0,
            DecapOffset::L3(n) => *n as isize,
            DecapOffset::Relocated { start } => *start as isize - l2_len as isize,
        }
    }

    /// Absolute position of the next frame in the buffer.
    pub fn frame_start(&self, l2_len: usize) -> Option<usize> {
        match self {
            DecapOffset::None => None,
            DecapOffset::L3(n) => Some(l2_len + n),
            DecapOffset::Relocated { start } => Some(*start),
        }
    }
}

const LE_IPV4_PROTO_TYPE_I: u16 = 0x0008; // 0x0008's LittleEndian
const LE_IPV6_PROTO_TYPE_I: u16 = 0xDD86; // 0x86dd's LittleEndian
const LE_ERSPAN_PROTO_TYPE_II: u16 = 0xBE88; // 0x88BE's LittleEndian
const LE_ERSPAN_PROTO_TYPE_III: u16 = 0xEB22; // 0x22EB's LittleEndian
const LE_VXLAN_PROTO_UDP_DPORT: u16 = 0xB512; // 0x12B5(4789)'s LittleEndian
const LE_VXLAN_PROTO_UDP_DPORT2: u16 = 0x1821; // 0x2118(8472)'s LittleEndian
const LE_VXLAN_PROTO_UDP_DPORT3: u16 = 0x801A; // 0x1A80(6784)'s LittleEndian
const LE_TRANSPARENT_ETHERNET_BRIDGEING: u16 = 0x5865; // 0x6558(25944)'s LittleEndian

const VXLAN_FLAGS: u8 = 8;

// IPv6 underlay addresses are kept as their low 32 bits
const IP6_SIP_OFFSET: usize = ipv6::SRC_OFFSET + IPV6_ADDR_LEN - IPV4_ADDR_LEN;
const IP6_DIP_OFFSET: usize = ipv6::DST_OFFSET + IPV6_ADDR_LEN - IPV4_ADDR_LEN;

// Entry length checks, long enough for IP + GRE + ERSPAN III + ERSPAN III sub-header.
// Decoders whose headers can grow past this (IPv4 options, GRE options) check again.
const MIN_DECAP_LEN: usize =
    IPV4_HEADER_SIZE + GRE_HEADER_SIZE_DECAP + ERSPAN_III_HEADER_SIZE + ERSPAN_III_SUBHEADER_SIZE;
const MIN_DECAP_V6_LEN: usize =
    IPV6_HEADER_SIZE + GRE_HEADER_SIZE_DECAP + ERSPAN_III_HEADER_SIZE + ERSPAN_III_SUBHEADER_SIZE;

/// The outer IP header wrapping a tunnel.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Underlay {
    header_size: usize,
    is_ipv6: bool,
}

impl Underlay {
    // VXLAN is located at fixed offsets, IPv4 options are not expected there
    const IPV4: Underlay = Underlay {
        header_size: IPV4_HEADER_SIZE,
        is_ipv6: false,
    };
    // options are not supported when the underlay is IPv6
    const IPV6: Underlay = Underlay {
        header_size: IPV6_HEADER_SIZE,
        is_ipv6: true,
    };

    fn ipv4(l3_packet: &[u8]) -> Option<Underlay> {
        let ihl = bytes::get_u8(l3_packet, ipv4::VERSION_IHL_OFFSET)? & ipv4::IHL_MASK;
        let header_size = (ihl as usize) << 2;
        if header_size < IPV4_HEADER_SIZE {
            return None;
        }
        Some(Underlay {
            header_size,
            is_ipv6: false,
        })
    }

    fn addr_offsets(&self) -> (usize, usize) {
        if self.is_ipv6 {
            (IP6_SIP_OFFSET, IP6_DIP_OFFSET)
        } else {
            (ipv4::SRC_OFFSET, ipv4::DST_OFFSET)
        }
    }
}

fn calc_gre_option_size(flags: u16) -> usize {
    let mut size = 0;
    if flags & gre::FLAGS_KEY_MASK != 0 {
        size += gre::KEY_LEN;
    }
    if flags & gre::FLAGS_SEQ_MASK != 0 {
        size += gre::SEQ_LEN;
    }
    if flags & gre::FLAGS_CSUM_MASK != 0 {
        size += gre::CSUM_LEN;
    }
    size
}

fn gre_key_offset(flags: u16) -> usize {
    if flags & gre::FLAGS_CSUM_MASK != 0 {
        gre::KEY_OFFSET + gre::CSUM_LEN
    } else {
        gre::KEY_OFFSET
    }
}

/// Tunnel information of one packet, filled in by successive `decapsulate` and
/// `decapsulate_v6` calls.
///
/// Addresses and id belong to the outermost tunnel, inner tunnels only add
/// their type. Start every packet from `TunnelInfo::default()`.
#[derive(Serialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct TunnelInfo {
    pub src: Ipv4Addr,
    pub dst: Ipv4Addr,
    // VNI, ERSPAN session id or GRE key
    pub id: u32,
    pub tunnel_type: TieredTunnelType,
    pub tier: u8,
    pub is_ipv6: bool,
}

impl Default for TunnelInfo {
    fn default() -> Self {
        TunnelInfo {
            src: Ipv4Addr::UNSPECIFIED,
            dst: Ipv4Addr::UNSPECIFIED,
            id: 0,
            tunnel_type: TieredTunnelType::default(),
            tier: 0,
            is_ipv6: false,
        }
    }
}

impl TunnelInfo {
    // Callers have checked that the addresses are inside `l3_packet`.
    fn update(&mut self, l3_packet: &[u8], underlay: Underlay, tunnel_type: TunnelType, id: u32) {
        // Only the outermost tunnel is recorded in full
        if self.tier == 0 {
            let (src_offset, dst_offset) = underlay.addr_offsets();
            self.src = Ipv4Addr::from(bytes::read_u32_be(&l3_packet[src_offset..]));
            self.dst = Ipv4Addr::from(bytes::read_u32_be(&l3_packet[dst_offset..]));
            self.id = id;
            self.tunnel_type = TieredTunnelType::new(tunnel_type);
            self.is_ipv6 = underlay.is_ipv6;
        } else {
            self.tunnel_type.push(tunnel_type);
        }
        self.tier += 1;
    }

    fn decapsulate_vxlan(&mut self, l3_packet: &[u8], underlay: Underlay) -> DecapOffset {
        let udp_offset = underlay.header_size;
        let vxlan_offset = udp_offset + UDP_HEADER_SIZE;
        if l3_packet.len() < vxlan_offset + VXLAN_HEADER_SIZE {
            return DecapOffset::None;
        }

        let dst_port = bytes::read_u16_le(&l3_packet[udp_offset + udp::DST_OFFSET..]);
        match dst_port {
            LE_VXLAN_PROTO_UDP_DPORT | LE_VXLAN_PROTO_UDP_DPORT2 | LE_VXLAN_PROTO_UDP_DPORT3 => (),
            _ => return DecapOffset::None,
        }
        if l3_packet[vxlan_offset + vxlan::FLAGS_OFFSET] != VXLAN_FLAGS {
            return DecapOffset::None;
        }

        let vni = bytes::read_u32_be(&l3_packet[vxlan_offset + vxlan::VNI_OFFSET..])
            >> vxlan::VNI_SHIFT;
        self.update(l3_packet, underlay, TunnelType::Vxlan, vni);

        // return offset start from L3
        DecapOffset::L3(vxlan_offset + VXLAN_HEADER_SIZE)
    }

    fn decapsulate_erspan(
        &mut self,
        l3_packet: &[u8],
        underlay: Underlay,
        flags: u16,
        gre_protocol_type: u16,
    ) -> DecapOffset {
        let ip_header_size = underlay.header_size;
        match gre_protocol_type {
            // ERSPAN I
            LE_ERSPAN_PROTO_TYPE_II if flags == 0 => {
                let offset = ip_header_size + GRE_HEADER_SIZE_DECAP + ERSPAN_I_HEADER_SIZE;
                if l3_packet.len() < offset {
                    return DecapOffset::None;
                }
                self.update(l3_packet, underlay, TunnelType::ErspanOrTeb, 0);
                DecapOffset::L3(offset)
            }
            // ERSPAN II
            LE_ERSPAN_PROTO_TYPE_II => {
                let erspan_offset =
                    ip_header_size + GRE_HEADER_SIZE_DECAP + calc_gre_option_size(flags);
                if l3_packet.len() < erspan_offset + ERSPAN_II_HEADER_SIZE {
                    return DecapOffset::None;
                }
                let id = bytes::read_u32_be(&l3_packet[erspan_offset + erspan::SESSION_ID_OFFSET..])
                    & erspan::SESSION_ID_MASK;
                self.update(l3_packet, underlay, TunnelType::ErspanOrTeb, id);
                DecapOffset::L3(erspan_offset + ERSPAN_II_HEADER_SIZE)
            }
            // ERSPAN III
            LE_ERSPAN_PROTO_TYPE_III => {
                let erspan_offset =
                    ip_header_size + GRE_HEADER_SIZE_DECAP + calc_gre_option_size(flags);
                let mut header_size = ERSPAN_III_HEADER_SIZE;
                if l3_packet.len() < erspan_offset + header_size {
                    return DecapOffset::None;
                }
                if l3_packet[erspan_offset + erspan::TYPE3_FLAGS_OFFSET]
                    & erspan::TYPE3_SUBHEADER_MASK
                    != 0
                {
                    header_size += ERSPAN_III_SUBHEADER_SIZE;
                    if l3_packet.len() < erspan_offset + header_size {
                        return DecapOffset::None;
                    }
                }
                let id = bytes::read_u32_be(&l3_packet[erspan_offset + erspan::SESSION_ID_OFFSET..])
                    & erspan::SESSION_ID_MASK;
                self.update(l3_packet, underlay, TunnelType::ErspanOrTeb, id);
                DecapOffset::L3(erspan_offset + header_size)
            }
            _ => DecapOffset::None,
        }
    }

    /// True for the MACs forged by Tencent GRE decapsulation, `mac` being
    /// the 6 address bytes in the low 48 bits.
    pub fn is_gre_pseudo_inner_mac(mac: u64) -> bool {
        mac >> 16 == 0
    }

    fn decapsulate_tencent_gre(
        &mut self,
        l3_packet: &mut [u8],
        underlay: Underlay,
        flags: u16,
        gre_protocol_type: u16,
    ) -> DecapOffset {
        if flags & gre::FLAGS_VER_MASK != 1 || flags & gre::FLAGS_KEY_MASK == 0 {
            return DecapOffset::None;
        }

        let ip_header_size = underlay.header_size;
        let gre_header_size = GRE_HEADER_SIZE_DECAP + calc_gre_option_size(flags);
        if l3_packet.len() < ip_header_size + gre_header_size {
            return DecapOffset::None;
        }
        let key = bytes::read_u32_be(&l3_packet[ip_header_size + gre_key_offset(flags)..]);
        // The forged L2 header overwrites the tail of the underlay headers, read them first
        self.update(l3_packet, underlay, TunnelType::TencentGre, key);

        // NOTICE:
        //     Tencent GRE identifies the VPC of a packet by the GRE key only. The fast path
        // of policy lookup tells VPCs apart by MAC, so the key is written as the suffix of
        // both MACs: the low half into the destination, the high half into the source.
        //     Forged MACs are detected by `is_gre_pseudo_inner_mac`.
        let overlay_offset = ip_header_size + gre_header_size - ETH_HEADER_SIZE;
        let key = key.to_be_bytes();
        let mut macs = [0u8; ETH_HEADER_SIZE];
        macs[FIELD_OFFSET_DA + 4..FIELD_OFFSET_DA + MAC_ADDR_LEN].copy_from_slice(&key[2..]);
        macs[FIELD_OFFSET_SA + 4..FIELD_OFFSET_SA + MAC_ADDR_LEN].copy_from_slice(&key[..2]);
        let eth_type = if gre_protocol_type == LE_IPV4_PROTO_TYPE_I {
            EthernetType::Ipv4
        } else {
            EthernetType::Ipv6
        };
        bytes::write_u16_be(&mut macs[FIELD_OFFSET_ETH_TYPE..], eth_type.into());
        l3_packet[overlay_offset..overlay_offset + ETH_HEADER_SIZE].copy_from_slice(&macs);

        DecapOffset::L3(overlay_offset)
    }

    fn decapsulate_teb(&mut self, l3_packet: &[u8], underlay: Underlay, flags: u16) -> DecapOffset {
        if flags & gre::FLAGS_VER_MASK != 0 || flags & gre::FLAGS_KEY_MASK == 0 {
            return DecapOffset::None;
        }

        let ip_header_size = underlay.header_size;
        let gre_header_size = GRE_HEADER_SIZE_DECAP + calc_gre_option_size(flags);
        if l3_packet.len() < ip_header_size + gre_header_size {
            return DecapOffset::None;
        }
        let key = bytes::read_u32_be(&l3_packet[ip_header_size + gre_key_offset(flags)..]);
        self.update(l3_packet, underlay, TunnelType::ErspanOrTeb, key);
        DecapOffset::L3(ip_header_size + gre_header_size)
    }

    fn decapsulate_gre(
        &mut self,
        l3_packet: &mut [u8],
        underlay: Underlay,
        tunnel_types: &TunnelTypeBitmap,
    ) -> DecapOffset {
        let ip_header_size = underlay.header_size;
        let (Some(flags), Some(gre_protocol_type)) = (
            bytes::get_u16_be(l3_packet, ip_header_size + gre::FLAGS_OFFSET),
            bytes::get_u16_le(l3_packet, ip_header_size + gre::PROTOCOL_OFFSET),
        ) else {
            return DecapOffset::None;
        };

        match gre_protocol_type {
            LE_ERSPAN_PROTO_TYPE_II | LE_ERSPAN_PROTO_TYPE_III
                if tunnel_types.has(TunnelType::ErspanOrTeb) =>
            {
                self.decapsulate_erspan(l3_packet, underlay, flags, gre_protocol_type)
            }
            LE_IPV4_PROTO_TYPE_I | LE_IPV6_PROTO_TYPE_I
                if tunnel_types.has(TunnelType::TencentGre) =>
            {
                self.decapsulate_tencent_gre(l3_packet, underlay, flags, gre_protocol_type)
            }
            LE_TRANSPARENT_ETHERNET_BRIDGEING if tunnel_types.has(TunnelType::ErspanOrTeb) => {
                self.decapsulate_teb(l3_packet, underlay, flags)
            }
            _ => DecapOffset::None,
        }
    }

    fn decapsulate_ipip(
        &mut self,
        packet: &mut [u8],
        l2_len: usize,
        underlay: Underlay,
        overlay_ipv6: bool,
    ) -> DecapOffset {
        let underlay_ip_header_size = underlay.header_size;
        if l2_len < ETH_TYPE_LEN || packet.len() < l2_len + underlay_ip_header_size {
            return DecapOffset::None;
        }
        self.update(&packet[l2_len..], underlay, TunnelType::Ipip, 0);

        // Remove the underlay ip header by moving the L2 header right in front of the
        // overlay ip header, which starts at l2_len + underlay_ip_header_size.
        let start = underlay_ip_header_size;
        packet.copy_within(0..l2_len, start);
        let eth_type = if overlay_ipv6 {
            EthernetType::Ipv6
        } else {
            EthernetType::Ipv4
        };
        bytes::write_u16_be(
            &mut packet[start + l2_len - ETH_TYPE_LEN..],
            eth_type.into(),
        );
        DecapOffset::Relocated { start }
    }

    /// Strips one tunnel from a packet whose outer network is IPv4.
    ///
    /// `l2_len` is the length of the L2 header in `packet`. The packet may be
    /// rewritten in place (Tencent GRE and IPIP), and nothing is recorded when
    /// `DecapOffset::None` is returned.
    pub fn decapsulate(
        &mut self,
        packet: &mut [u8],
        l2_len: usize,
        tunnel_types: &TunnelTypeBitmap,
    ) -> DecapOffset {
        if tunnel_types.is_empty() || self.tier >= TUNNEL_TIER_LIMIT {
            return DecapOffset::None;
        }

        let Some(l3_packet) = packet.get(l2_len..) else {
            return DecapOffset::None;
        };
        if l3_packet.len() < MIN_DECAP_LEN {
            return DecapOffset::None;
        }

        let protocol: IpProtocol = l3_packet[ipv4::PROTO_OFFSET]
            .try_into()
            .unwrap_or_default();
        match protocol {
            IpProtocol::Udp if tunnel_types.has(TunnelType::Vxlan) => {
                self.decapsulate_vxlan(l3_packet, Underlay::IPV4)
            }
            IpProtocol::Gre => match Underlay::ipv4(l3_packet) {
                Some(underlay) => {
                    self.decapsulate_gre(&mut packet[l2_len..], underlay, tunnel_types)
                }
                None => DecapOffset::None,
            },
            IpProtocol::Ipv4 | IpProtocol::Ipv6 if tunnel_types.has(TunnelType::Ipip) => {
                match Underlay::ipv4(l3_packet) {
                    Some(underlay) => self.decapsulate_ipip(
                        packet,
                        l2_len,
                        underlay,
                        protocol == IpProtocol::Ipv6,
                    ),
                    None => DecapOffset::None,
                }
            }
            _ => DecapOffset::None,
        }
    }

    /// Strips one tunnel from a packet whose outer network is IPv6.
    ///
    /// Unlike `decapsulate`, the recorded tunnel types are cleared on entry,
    /// before any check on the packet.
    pub fn decapsulate_v6(
        &mut self,
        packet: &mut [u8],
        l2_len: usize,
        tunnel_types: &TunnelTypeBitmap,
    ) -> DecapOffset {
        if tunnel_types.is_empty() || self.tier >= TUNNEL_TIER_LIMIT {
            return DecapOffset::None;
        }

        self.tunnel_type = TieredTunnelType::default();
        let Some(l3_packet) = packet.get(l2_len..) else {
            return DecapOffset::None;
        };
        if l3_packet.len() < MIN_DECAP_V6_LEN {
            return DecapOffset::None;
        }

        let protocol: IpProtocol = l3_packet[ipv6::PROTO_OFFSET]
            .try_into()
            .unwrap_or_default();
        match protocol {
            IpProtocol::Udp if tunnel_types.has(TunnelType::Vxlan) => {
                self.decapsulate_vxlan(l3_packet, Underlay::IPV6)
            }
            IpProtocol::Gre => {
                self.decapsulate_gre(&mut packet[l2_len..], Underlay::IPV6, tunnel_types)
            }
            IpProtocol::Ipv4 | IpProtocol::Ipv6 if tunnel_types.has(TunnelType::Ipip) => self
                .decapsulate_ipip(
                    packet,
                    l2_len,
                    Underlay::IPV6,
                    protocol == IpProtocol::Ipv6,
                ),
            _ => DecapOffset::None,
        }
    }

    pub fn is_valid(&self) -> bool {
        !self.tunnel_type.is_none()
    }
}

impl fmt::Display for TunnelInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "type: {}, src: {}, dst: {}, id: {}, tier: {}",
            self.tunnel_type, self.src, self.dst, self.id, self.tier
        )
    }
}
