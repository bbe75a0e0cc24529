//! 時間・メモリ表記のパース

use crate::error::{Result, ValidationError};
use std::time::Duration;

/// compose形式の時間表記をパース
///
/// 受け付ける形式:
/// - 裸の数値（秒）: "30"
/// - 単位付き: "30s", "1m30s", "2h", "500ms"
pub fn parse_duration(value: &str) -> Result<Duration> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ValidationError::InvalidDuration(value.to_string()));
    }

    // 裸の数値は秒として扱う
    if value.chars().all(|c| c.is_ascii_digit()) {
        let secs: u64 = value
            .parse()
            .map_err(|_| ValidationError::InvalidDuration(value.to_string()))?;
        return Ok(Duration::from_secs(secs));
    }

    let mut total = Duration::ZERO;
    let mut chars = value.chars().peekable();

    while chars.peek().is_some() {
        let mut digits = String::new();
        while let Some(c) = chars.peek() {
            if c.is_ascii_digit() {
                digits.push(*c);
                chars.next();
            } else {
                break;
            }
        }

        let mut unit = String::new();
        while let Some(c) = chars.peek() {
            if c.is_ascii_alphabetic() {
                unit.push(*c);
                chars.next();
            } else {
                break;
            }
        }

        if digits.is_empty() || unit.is_empty() {
            return Err(ValidationError::InvalidDuration(value.to_string()));
        }

        let amount: u64 = digits
            .parse()
            .map_err(|_| ValidationError::InvalidDuration(value.to_string()))?;

        total += match unit.as_str() {
            "h" => Duration::from_secs(amount * 3600),
            "m" => Duration::from_secs(amount * 60),
            "s" => Duration::from_secs(amount),
            "ms" => Duration::from_millis(amount),
            _ => return Err(ValidationError::InvalidDuration(value.to_string())),
        };
    }

    Ok(total)
}

/// Duration を compose形式の文字列へ（正規形）
pub fn format_duration(d: Duration) -> String {
    if d.subsec_nanos() == 0 {
        format!("{}s", d.as_secs())
    } else {
        format!("{}ms", d.as_millis())
    }
}

/// compose形式のメモリ表記をパースしてバイト数へ
///
/// 受け付ける形式: "512m", "2g", "1024k", "104857600b", 裸のバイト数
pub fn parse_memory(value: &str) -> Result<u64> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ValidationError::InvalidMemory(value.to_string()));
    }

    let lower = value.to_lowercase();
    let digits_end = lower
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(lower.len());
    let (digits, suffix) = lower.split_at(digits_end);

    let amount: u64 = digits
        .parse()
        .map_err(|_| ValidationError::InvalidMemory(value.to_string()))?;

    let multiplier: u64 = match suffix {
        "" | "b" => 1,
        "k" | "kb" => 1024,
        "m" | "mb" => 1024 * 1024,
        "g" | "gb" => 1024 * 1024 * 1024,
        _ => return Err(ValidationError::InvalidMemory(value.to_string())),
    };

    Ok(amount * multiplier)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_duration_bare_seconds() {
        assert_eq!(parse_duration("30").unwrap(), Duration::from_secs(30));
        assert_eq!(parse_duration("0").unwrap(), Duration::ZERO);
    }

    #[test]
    fn test_parse_duration_with_units() {
        assert_eq!(parse_duration("30s").unwrap(), Duration::from_secs(30));
        assert_eq!(parse_duration("1m30s").unwrap(), Duration::from_secs(90));
        assert_eq!(parse_duration("2h").unwrap(), Duration::from_secs(7200));
        assert_eq!(parse_duration("500ms").unwrap(), Duration::from_millis(500));
    }

    #[test]
    fn test_parse_duration_rejects_garbage() {
        assert!(parse_duration("").is_err());
        assert!(parse_duration("abc").is_err());
        assert!(parse_duration("30x").is_err());
        assert!(parse_duration("s30").is_err());
    }

    #[test]
    fn test_format_duration_roundtrip() {
        for d in [
            Duration::from_secs(30),
            Duration::from_secs(90),
            Duration::from_millis(500),
        ] {
            assert_eq!(parse_duration(&format_duration(d)).unwrap(), d);
        }
    }

    #[test]
    fn test_parse_memory() {
        assert_eq!(parse_memory("512m").unwrap(), 512 * 1024 * 1024);
        assert_eq!(parse_memory("2g").unwrap(), 2 * 1024 * 1024 * 1024);
        assert_eq!(parse_memory("1024k").unwrap(), 1024 * 1024);
        assert_eq!(parse_memory("100").unwrap(), 100);
        assert_eq!(parse_memory("100b").unwrap(), 100);
        assert_eq!(parse_memory("512M").unwrap(), 512 * 1024 * 1024);
    }

    #[test]
    fn test_parse_memory_rejects_garbage() {
        assert!(parse_memory("").is_err());
        assert!(parse_memory("lots").is_err());
        assert!(parse_memory("512q").is_err());
    }
}
