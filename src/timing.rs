//! Character-time arithmetic.
//!
//! An RTU character is 11 bits on the wire (start, 8 data, parity or a
//! second stop, stop). Above 19200 baud the specification fixes the two
//! silent intervals instead of deriving them:
//!
//! ```text
//! 1.5t_us = (10^6 x 11 x 3) / (4 x rate) =  8'250'000 / rate
//! 3.5t_us = (10^6 x 11 x 7) / (4 x rate) = 19'250'000 / rate
//! ```

use std::time::Duration;

/// The inter-frame timeout: the longest permitted gap between two
/// characters of one frame.
pub fn interval_1t5(baud_rate: u32) -> Duration {
    if baud_rate < 19_200 {
        Duration::from_micros(8_250_000 / u64::from(baud_rate))
    } else {
        Duration::from_micros(750)
    }
}

/// The silent interval separating frames.
pub fn interval_3t5(baud_rate: u32) -> Duration {
    if baud_rate < 19_200 {
        Duration::from_micros(19_250_000 / u64::from(baud_rate))
    } else {
        Duration::from_micros(1_750)
    }
}

/// Minimum time to push `size` bytes through the line, used to bound
/// write timeouts.
pub fn min_tx_time(baud_rate: u32, size: usize) -> Duration {
    Duration::from_millis(size as u64 * 11_000 / u64::from(baud_rate))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derives_intervals_below_19200() {
        assert_eq!(interval_1t5(9_600), Duration::from_micros(859));
        assert_eq!(interval_3t5(9_600), Duration::from_micros(2_005));
        assert_eq!(interval_1t5(1_200), Duration::from_micros(6_875));
        assert_eq!(interval_3t5(1_200), Duration::from_micros(16_041));
    }

    #[test]
    fn fixed_floors_at_19200_and_above() {
        for rate in [19_200, 57_600, 115_200] {
            assert_eq!(interval_1t5(rate), Duration::from_micros(750));
            assert_eq!(interval_3t5(rate), Duration::from_micros(1_750));
        }
    }

    #[test]
    fn min_tx_time_scales_with_size() {
        assert_eq!(min_tx_time(19_200, 256), Duration::from_millis(146));
        assert_eq!(min_tx_time(9_600, 8), Duration::from_millis(9));
    }
}
