use serde::{Deserialize, Serialize};
use std::net::IpAddr;

/// Policy that converts a matched blacklist question into a DNS response.
/// Parsing of the `Blocking.BlockType` config string happens in
/// [`BlockHandler::parse`].
#[derive(Debug, Clone, PartialEq)]
pub enum BlockHandler {
    ZeroIp,
    NxDomain,
    IpList(Vec<IpAddr>),
}

impl Default for BlockHandler {
    fn default() -> Self {
        BlockHandler::ZeroIp
    }
}

impl BlockHandler {
    pub fn parse(raw: &str) -> Self {
        match raw.trim() {
            "" | "ZEROIP" => BlockHandler::ZeroIp,
            "NXDOMAIN" => BlockHandler::NxDomain,
            list => {
                let ips: Vec<IpAddr> = list
                    .split(',')
                    .filter_map(|s| s.trim().parse().ok())
                    .collect();
                if ips.is_empty() {
                    BlockHandler::ZeroIp
                } else {
                    BlockHandler::IpList(ips)
                }
            }
        }
    }
}

/// TTL applied to synthesized block responses: 6 hours.
pub const BLOCK_RESPONSE_TTL_SECS: u32 = 6 * 3600;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub enum BlockReasonKind {
    Blacklist,
    WhitelistOnly,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_zeroip_default() {
        assert_eq!(BlockHandler::parse(""), BlockHandler::ZeroIp);
        assert_eq!(BlockHandler::parse("ZEROIP"), BlockHandler::ZeroIp);
    }

    #[test]
    fn parses_nxdomain() {
        assert_eq!(BlockHandler::parse("NXDOMAIN"), BlockHandler::NxDomain);
    }

    #[test]
    fn parses_ip_list() {
        let h = BlockHandler::parse("1.2.3.4, ::1");
        match h {
            BlockHandler::IpList(ips) => assert_eq!(ips.len(), 2),
            _ => panic!("expected IpList"),
        }
    }

    #[test]
    fn falls_back_to_zeroip_on_garbage() {
        assert_eq!(BlockHandler::parse("not-an-ip"), BlockHandler::ZeroIp);
    }
}
