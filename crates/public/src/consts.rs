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


pub const FIELD_OFFSET_DA: usize = 0;
pub const FIELD_OFFSET_SA: usize = 6;
pub const FIELD_OFFSET_ETH_TYPE: usize = 12;

pub const MAC_ADDR_LEN: usize = 6;
pub const ETH_TYPE_LEN: usize = 2;
pub const IPV4_ADDR_LEN: usize = 4;
pub const IPV6_ADDR_LEN: usize = 16;

pub const ETH_HEADER_SIZE: usize = MAC_ADDR_LEN * 2 + ETH_TYPE_LEN;
pub const VLAN_HEADER_SIZE: usize = 4;
pub const IPV4_HEADER_SIZE: usize = 20;
pub const IPV6_HEADER_SIZE: usize = 40;
pub const UDP_HEADER_SIZE: usize = 8;
pub const VXLAN_HEADER_SIZE: usize = 8;
// GRE header without any optional field
pub const GRE_HEADER_SIZE_DECAP: usize = 4;
pub const ERSPAN_I_HEADER_SIZE: usize = 0;
pub const ERSPAN_II_HEADER_SIZE: usize = 8;
pub const ERSPAN_III_HEADER_SIZE: usize = 12;
pub const ERSPAN_III_SUBHEADER_SIZE: usize = 8;

// min packet size
pub const IPV4_PACKET_SIZE: usize = ETH_HEADER_SIZE + IPV4_HEADER_SIZE; // 34
pub const UDP_PACKET_SIZE: usize = IPV4_PACKET_SIZE + UDP_HEADER_SIZE; // 42
pub const VXLAN_PACKET_SIZE: usize = UDP_PACKET_SIZE + VXLAN_HEADER_SIZE; // 50
pub const IPV6_PACKET_SIZE: usize = ETH_HEADER_SIZE + IPV6_HEADER_SIZE; // 54
pub const UDP6_PACKET_SIZE: usize = IPV6_PACKET_SIZE + UDP_HEADER_SIZE; // 62
pub const VXLAN6_PACKET_SIZE: usize = UDP6_PACKET_SIZE + VXLAN_HEADER_SIZE; // 70

pub const VLAN_ID_MASK: u16 = 0xfff;

pub mod ipv4 {
    pub const VERSION_IHL_OFFSET: usize = 0;
    pub const IHL_MASK: u8 = 0xf;
    pub const PROTO_OFFSET: usize = 9;
    pub const SRC_OFFSET: usize = 12;
    pub const DST_OFFSET: usize = 16;
}

pub mod ipv6 {
    pub const PROTO_OFFSET: usize = 6;
    pub const SRC_OFFSET: usize = 8;
    pub const DST_OFFSET: usize = 24;
}

pub mod udp {
    pub const SRC_OFFSET: usize = 0;
    pub const DST_OFFSET: usize = 2;
}

pub mod vxlan {
    // VXLAN Header:
    // +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
    // |R|R|R|R|I|R|R|R|            Reserved                           |
    // +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
    // |                VXLAN Network Identifier (VNI) |   Reserved    |
    // +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
    pub const FLAGS_OFFSET: usize = 0;
    pub const VNI_OFFSET: usize = 4;
    pub const VNI_SHIFT: u32 = 8;
}

pub mod gre {
    // GRE Header (RFC 2784, RFC 2890, RFC 2637):
    // +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
    // |C|R|K|S|s|Recur|  Flags  | Ver |         Protocol Type         |
    // +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
    // |      Checksum (optional)      |       Reserved1 (Optional)    |
    // +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
    // |                         Key (optional)                        |
    // +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
    // |                 Sequence Number (Optional)                    |
    // +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
    pub const FLAGS_OFFSET: usize = 0;
    pub const PROTOCOL_OFFSET: usize = 2;
    // relative to the GRE header start, shifted by CSUM_LEN when the checksum is present
    pub const KEY_OFFSET: usize = 4;

    pub const FLAGS_CSUM_MASK: u16 = 0x8000;
    pub const FLAGS_KEY_MASK: u16 = 0x2000;
    pub const FLAGS_SEQ_MASK: u16 = 0x1000;
    pub const FLAGS_VER_MASK: u16 = 0x7;

    pub const CSUM_LEN: usize = 4;
    pub const KEY_LEN: usize = 4;
    pub const SEQ_LEN: usize = 4;
}

pub mod erspan {
    /*
    ERSPAN Type II header (8 octets)
    0                   1                   2                   3
    0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
    +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
    |  Ver  |          VLAN         | COS | En|T|    Session ID     |
    +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
    |      Reserved         |                  Index                |
    +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+

    ERSPAN Type III header (12 octets)
    0                   1                   2                   3
    0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
    +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
    |  Ver  |          VLAN         | COS |BSO|T|     Session ID    |
    +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
    |                          Timestamp                            |
    +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
    |             SGT               |P|    FT   |   Hw ID   |D|Gra|O|
    +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
    */
    pub const SESSION_ID_OFFSET: usize = 0;
    pub const SESSION_ID_MASK: u32 = 0x3ff;
    pub const TYPE3_FLAGS_OFFSET: usize = 11;
    // O bit, an 8-byte platform specific sub-header follows
    pub const TYPE3_SUBHEADER_MASK: u8 = 0x1;
}
