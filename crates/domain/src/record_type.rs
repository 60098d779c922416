use std::fmt;

/// Minimal record-type discriminant used as part of the cache key.
///
/// Kept deliberately small and codec-agnostic: the infrastructure layer maps
/// `hickory_proto::rr::RecordType` to/from this enum at the wire boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordType {
    A,
    AAAA,
    CNAME,
    PTR,
    MX,
    TXT,
    Other(u16),
}

impl RecordType {
    pub fn as_u16(&self) -> u16 {
        match self {
            RecordType::A => 1,
            RecordType::CNAME => 5,
            RecordType::PTR => 12,
            RecordType::MX => 15,
            RecordType::TXT => 16,
            RecordType::AAAA => 28,
            RecordType::Other(v) => *v,
        }
    }

    pub fn from_u16(v: u16) -> Self {
        match v {
            1 => RecordType::A,
            5 => RecordType::CNAME,
            12 => RecordType::PTR,
            15 => RecordType::MX,
            16 => RecordType::TXT,
            28 => RecordType::AAAA,
            other => RecordType::Other(other),
        }
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordType::A => write!(f, "A"),
            RecordType::AAAA => write!(f, "AAAA"),
            RecordType::CNAME => write!(f, "CNAME"),
            RecordType::PTR => write!(f, "PTR"),
            RecordType::MX => write!(f, "MX"),
            RecordType::TXT => write!(f, "TXT"),
            RecordType::Other(v) => write!(f, "TYPE{v}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_known_types() {
        for rt in [
            RecordType::A,
            RecordType::AAAA,
            RecordType::CNAME,
            RecordType::PTR,
            RecordType::MX,
            RecordType::TXT,
        ] {
            assert_eq!(RecordType::from_u16(rt.as_u16()), rt);
        }
    }

    #[test]
    fn other_preserves_value() {
        let rt = RecordType::from_u16(65);
        assert_eq!(rt, RecordType::Other(65));
        assert_eq!(rt.as_u16(), 65);
    }
}
