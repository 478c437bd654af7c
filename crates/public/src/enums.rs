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


use num_enum::{IntoPrimitive, TryFromPrimitive};
use serde::Serialize;

/// EthernetType is an enumeration of ethernet type values, and acts as a decoder
/// for any type it supports.
#[derive(
    Serialize, Debug, PartialEq, Eq, Clone, Copy, PartialOrd, Ord, TryFromPrimitive, IntoPrimitive,
)]
#[repr(u16)]
pub enum EthernetType {
    // EthernetTypeLLC is not an actual ethernet type.  It is instead a
    // placeholder we use in Ethernet frames that use the 802.3 standard of
    // srcmac|dstmac|length|LLC instead of srcmac|dstmac|ethertype.
    Llc = 0,
    Ipv4 = 0x0800,
    Arp = 0x0806,
    Ipv6 = 0x86DD,
    TransparentEthernetBridging = 0x6558,
    Dot1Q = 0x8100,
    ErspanII = 0x88BE,
    ErspanIII = 0x22EB,
    QinQ = 0x88a8,
    Unknown = 0xFFFF,
}

impl Default for EthernetType {
    fn default() -> Self {
        EthernetType::Llc
    }
}

impl PartialEq<u16> for EthernetType {
    fn eq(&self, other: &u16) -> bool {
        u16::from(*self).eq(other)
    }
}

impl PartialEq<EthernetType> for u16 {
    fn eq(&self, other: &EthernetType) -> bool {
        u16::from(*other).eq(self)
    }
}

// IPProtocol is an enumeration of IP protocol values, and acts as a decoder
// for any type it supports.
#[derive(
    Serialize, Debug, PartialEq, Eq, PartialOrd, Ord, Clone, Copy, TryFromPrimitive, IntoPrimitive,
)]
#[repr(u8)]
pub enum IpProtocol {
    Icmpv4 = 1,
    Ipv4 = 4,
    Tcp = 6,
    Udp = 17,
    Ipv6 = 41,
    Gre = 47,
    Icmpv6 = 58,
    Unknown = 255,
}

impl Default for IpProtocol {
    fn default() -> Self {
        IpProtocol::Unknown
    }
}

impl PartialEq<u8> for IpProtocol {
    fn eq(&self, other: &u8) -> bool {
        u8::from(*self).eq(other)
    }
}

impl PartialEq<IpProtocol> for u8 {
    fn eq(&self, other: &IpProtocol) -> bool {
        u8::from(*other).eq(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ethernet_type_from_u16() {
        assert_eq!(EthernetType::try_from(0x0800u16).ok(), Some(EthernetType::Ipv4));
        assert_eq!(EthernetType::try_from(0x86ddu16).ok(), Some(EthernetType::Ipv6));
        assert!(EthernetType::try_from(0x1234u16).is_err());
        assert!(EthernetType::Dot1Q == 0x8100);
        assert!(0x6558 == EthernetType::TransparentEthernetBridging);
    }

    #[test]
    fn ip_protocol_from_u8() {
        let p: IpProtocol = 47u8.try_into().unwrap_or_default();
        assert_eq!(p, IpProtocol::Gre);
        let p: IpProtocol = 132u8.try_into().unwrap_or_default();
        assert_eq!(p, IpProtocol::Unknown);
        assert!(IpProtocol::Udp == 17);
    }
}
