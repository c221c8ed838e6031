use crate::common::*;

#[doc = "현재시간 - epoch milliseconds"]
pub fn time_now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

#[doc = "현재시간 - epoch seconds (쓰기압력 이벤트 키 전용)"]
pub fn time_now_secs() -> i64 {
    Utc::now().timestamp()
}

/*
    Function that converts the epoch seconds to a human readable string
*/
pub fn get_str_from_epoch_secs(epoch_secs: i64) -> String {
    match DateTime::<Utc>::from_timestamp(epoch_secs, 0) {
        Some(dt) => dt.format("%Y-%m-%d %H:%M:%S").to_string(),
        None => epoch_secs.to_string(),
    }
}

pub fn get_current_utc_str() -> String {
    Utc::now().format("%Y-%m-%d %H:%M:%S%.3f").to_string()
}

#[doc = "'30s', '3m', '1h' 형태의 duration 문자열을 밀리초로 변환해주는 함수"]
pub fn parse_duration_to_millis(duration: &str) -> i64 {
    let trimmed: String = duration.trim().to_lowercase();

    let digit_end: usize = trimmed
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(trimmed.len());

    let value: i64 = trimmed[..digit_end].parse().unwrap_or(0);
    let unit: &str = trimmed[digit_end..].trim();

    match unit {
        "s" | "sec" | "second" | "seconds" => value * 1000,
        "m" | "min" | "minute" | "minutes" => value * 60 * 1000,
        "h" | "hour" | "hours" => value * 60 * 60 * 1000,
        _ => value * 1000,
    }
}

#[doc = "duration 문자열을 tokio Duration 으로 변환해주는 함수"]
pub fn parse_duration_str(duration: &str) -> Result<Duration> {
    let millis: i64 = parse_duration_to_millis(duration);

    if millis <= 0 {
        return Err(anyhow!(
            "[Error][parse_duration_str()] Invalid duration string: '{}'",
            duration
        ));
    }

    Ok(Duration::from_millis(millis as u64))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duration_strings_to_millis() {
        assert_eq!(parse_duration_to_millis("30s"), 30_000);
        assert_eq!(parse_duration_to_millis("3m"), 180_000);
        assert_eq!(parse_duration_to_millis("1h"), 3_600_000);
        assert_eq!(parse_duration_to_millis("10"), 10_000);
        assert_eq!(parse_duration_to_millis(" 5 min "), 300_000);
    }

    #[test]
    fn invalid_duration_is_rejected() {
        assert!(parse_duration_str("abc").is_err());
        assert!(parse_duration_str("0s").is_err());
        assert!(parse_duration_str("3m").is_ok());
    }
}
