//! Bandwidth utilization
//!
//! Full-duplex links carry both directions independently, so the busier
//! direction is what saturates the link. Half-duplex links share the medium,
//! so both directions add up.

/// Value written to the store when a bitrate or utilization is unknown
pub const UNKNOWN: f64 = -1.0;

/// dot3StatsDuplexStatus, plus a state for rows missing from that table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DuplexStatus {
    #[default]
    NotInitialized,
    Unknown,
    HalfDuplex,
    FullDuplex,
}

impl DuplexStatus {
    /// Map the MIB enumeration: unknown(1), halfDuplex(2), fullDuplex(3)
    pub fn from_code(code: i64) -> Self {
        match code {
            1 => DuplexStatus::Unknown,
            2 => DuplexStatus::HalfDuplex,
            3 => DuplexStatus::FullDuplex,
            _ => DuplexStatus::NotInitialized,
        }
    }
}

/// ifSpeed in bits/s. The maximum 32-bit value means the agent cannot
/// represent the speed in this column.
pub fn standard_speed(if_speed: u64) -> Option<f64> {
    (if_speed < u32::MAX as u64).then_some(if_speed as f64)
}

/// ifHighSpeed in Mbit/s, scaled to bits/s
pub fn high_capacity_speed(if_high_speed: u64) -> Option<f64> {
    Some(if_high_speed as f64 * 1_000_000.0)
}

/// Octets/s to bits/s. Zero and negative sentinels pass through unscaled.
pub fn octets_to_bits(octet_rate: f64) -> f64 {
    if octet_rate > 0.0 {
        octet_rate * 8.0
    } else {
        octet_rate
    }
}

/// Utilization percentage, `None` when it cannot be determined.
///
/// Not clamped: jitter between polls can yield values slightly above 100.
pub fn utilization(
    bitrate_in: f64,
    bitrate_out: f64,
    speed: Option<f64>,
    duplex: DuplexStatus,
) -> Option<f64> {
    let speed = speed.filter(|s| *s > 0.0)?;
    if bitrate_in < 0.0 || bitrate_out < 0.0 {
        return None;
    }

    let used = match duplex {
        DuplexStatus::FullDuplex => bitrate_in.max(bitrate_out),
        DuplexStatus::HalfDuplex => bitrate_in + bitrate_out,
        DuplexStatus::Unknown | DuplexStatus::NotInitialized => return None,
    };

    Some(used / speed * 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_duplex_takes_busier_direction() {
        let u = utilization(60e6, 40e6, Some(100e6), DuplexStatus::FullDuplex).unwrap();
        assert!((u - 60.0).abs() < 1e-9);
    }

    #[test]
    fn test_half_duplex_sums_directions() {
        let u = utilization(60e6, 40e6, Some(100e6), DuplexStatus::HalfDuplex).unwrap();
        assert!((u - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_unknown_inputs() {
        assert_eq!(utilization(60e6, 40e6, None, DuplexStatus::FullDuplex), None);
        assert_eq!(utilization(60e6, 40e6, None, DuplexStatus::HalfDuplex), None);
        assert_eq!(utilization(60e6, 40e6, Some(0.0), DuplexStatus::FullDuplex), None);
        assert_eq!(utilization(60e6, 40e6, Some(100e6), DuplexStatus::NotInitialized), None);
        assert_eq!(utilization(60e6, 40e6, Some(100e6), DuplexStatus::Unknown), None);
        assert_eq!(utilization(-1.0, 40e6, Some(100e6), DuplexStatus::FullDuplex), None);
    }

    #[test]
    fn test_not_clamped() {
        let u = utilization(101e6, 0.0, Some(100e6), DuplexStatus::FullDuplex).unwrap();
        assert!(u > 100.0);
    }

    #[test]
    fn test_speed_units() {
        assert_eq!(standard_speed(100_000_000), Some(100e6));
        assert_eq!(standard_speed(u32::MAX as u64), None);
        assert_eq!(high_capacity_speed(10_000), Some(10e9));
    }

    #[test]
    fn test_octet_to_bit_scaling() {
        assert_eq!(octets_to_bits(125_000.0), 1_000_000.0);
        assert_eq!(octets_to_bits(0.0), 0.0);
        assert_eq!(octets_to_bits(-1.0), -1.0);
    }

    #[test]
    fn test_duplex_codes() {
        assert_eq!(DuplexStatus::from_code(3), DuplexStatus::FullDuplex);
        assert_eq!(DuplexStatus::from_code(2), DuplexStatus::HalfDuplex);
        assert_eq!(DuplexStatus::from_code(1), DuplexStatus::Unknown);
        assert_eq!(DuplexStatus::from_code(0), DuplexStatus::NotInitialized);
        assert_eq!(DuplexStatus::from_code(9), DuplexStatus::NotInitialized);
    }
}
