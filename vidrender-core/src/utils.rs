//! Utility functions for formatting and media arithmetic.
//!
//! General-purpose helpers used across vidrender-core and the CLI: duration
//! and byte formatting, frame-rate parsing, aspect-ratio reduction, and the
//! speedup rule of the benchmark.

/// Formats seconds as HH:MM:SS (e.g., 3725.0 -> "01:02:05"). Returns "??:??:??" for invalid inputs.
#[must_use]
pub fn format_duration(seconds: f64) -> String {
    if seconds < 0.0 || !seconds.is_finite() {
        return "??:??:??".to_string();
    }

    let total_seconds = seconds as u64;
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let secs = total_seconds % 60;
    format!("{hours:02}:{minutes:02}:{secs:02}")
}

/// Formats bytes with appropriate binary units (B, KiB, MiB, GiB).
#[must_use]
pub fn format_bytes(bytes: u64) -> String {
    const KIB: f64 = 1024.0;
    const MIB: f64 = KIB * 1024.0;
    const GIB: f64 = MIB * 1024.0;

    let bytes_f64 = bytes as f64;
    if bytes_f64 >= GIB {
        format!("{:.2} GiB", bytes_f64 / GIB)
    } else if bytes_f64 >= MIB {
        format!("{:.2} MiB", bytes_f64 / MIB)
    } else if bytes_f64 >= KIB {
        format!("{:.2} KiB", bytes_f64 / KIB)
    } else {
        format!("{bytes} B")
    }
}

/// Parses an ffprobe frame rate ("30000/1001" or "25"). Zero or malformed
/// rates give `None`.
#[must_use]
pub fn parse_frame_rate(rate: &str) -> Option<f64> {
    let value = match rate.split_once('/') {
        Some((num, den)) => {
            let num: f64 = num.trim().parse().ok()?;
            let den: f64 = den.trim().parse().ok()?;
            if den == 0.0 {
                return None;
            }
            num / den
        }
        None => rate.trim().parse().ok()?,
    };
    (value.is_finite() && value > 0.0).then_some(value)
}

fn gcd(mut a: u32, mut b: u32) -> u32 {
    while b != 0 {
        (a, b) = (b, a % b);
    }
    a
}

/// Reduced `W:H` string (1920x1080 -> "16:9"). Degenerate sizes give "0:0".
#[must_use]
pub fn aspect_ratio(width: u32, height: u32) -> String {
    if width == 0 || height == 0 {
        return "0:0".to_string();
    }
    let divisor = gcd(width, height);
    format!("{}:{}", width / divisor, height / divisor)
}

/// Benchmark speedup. Exactly 1.0 when there was nothing to compare: a
/// zero-length parallel pass or a single worker.
#[must_use]
pub fn speedup(sequential_time: f64, parallel_time: f64, workers: usize) -> f64 {
    if parallel_time <= 0.0 || workers <= 1 {
        return 1.0;
    }
    sequential_time / parallel_time
}

/// Rounds to two decimals for reported figures.
#[must_use]
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(3725.0), "01:02:05");
        assert_eq!(format_duration(0.4), "00:00:00");
        assert_eq!(format_duration(-1.0), "??:??:??");
        assert_eq!(format_duration(f64::NAN), "??:??:??");
    }

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(512), "512 B");
        assert_eq!(format_bytes(2048), "2.00 KiB");
        assert_eq!(format_bytes(5 * 1024 * 1024), "5.00 MiB");
    }

    #[test]
    fn test_parse_frame_rate() {
        assert_eq!(parse_frame_rate("25/1"), Some(25.0));
        assert_eq!(parse_frame_rate("30"), Some(30.0));
        let ntsc = parse_frame_rate("30000/1001").unwrap();
        assert!((ntsc - 29.97).abs() < 0.01);
        assert_eq!(parse_frame_rate("0/0"), None);
        assert_eq!(parse_frame_rate("abc"), None);
    }

    #[test]
    fn test_aspect_ratio() {
        assert_eq!(aspect_ratio(1920, 1080), "16:9");
        assert_eq!(aspect_ratio(1080, 1920), "9:16");
        assert_eq!(aspect_ratio(640, 480), "4:3");
        assert_eq!(aspect_ratio(0, 480), "0:0");
    }

    #[test]
    fn test_speedup_rule() {
        assert_eq!(speedup(8.0, 2.0, 4), 4.0);
        assert_eq!(speedup(8.0, 0.0, 4), 1.0);
        assert_eq!(speedup(8.0, 7.9, 1), 1.0);
    }
}
