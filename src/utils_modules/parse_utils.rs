use crate::common::*;

static TRAILING_DIGITS_RE: once_lazy<Regex> =
    once_lazy::new(|| Regex::new(r"(\d+)$").unwrap_or_else(|e| panic!("{:?}", e)));

static TRAILING_DATE_RE: once_lazy<Regex> =
    once_lazy::new(|| Regex::new(r"-?\d{4}\.\d{2}\.\d{2}$").unwrap_or_else(|e| panic!("{:?}", e)));

static STORAGE_SIZE_RE: once_lazy<Regex> = once_lazy::new(|| {
    Regex::new(r"^(\d+(?:\.\d+)?)\s*([kmgt]?b?)$").unwrap_or_else(|e| panic!("{:?}", e))
});

#[doc = "인덱스 이름에서 index_base 와 seq_no 를 분리해주는 함수"]
/// 뒤쪽 숫자 suffix 가 seq_no, 이어서 trailing '-'/'_' 와 YYYY.MM.DD 패턴을 제거한 나머지가 base.
/// 예) `.ds-logs-2025.09.17-000012` -> (".ds-logs", 12)
///
/// # Returns
/// * (index_base, seq_no)
pub fn parse_index_name(index_name: &str) -> (String, u64) {
    let mut remain: String = index_name.to_string();
    let mut seq_no: u64 = 0;

    if let Some(caps) = TRAILING_DIGITS_RE.captures(&remain) {
        if let Some(digits) = caps.get(1) {
            seq_no = digits.as_str().parse().unwrap_or(0);
            let cut: usize = digits.start();
            remain.truncate(cut);
        }
    }

    remain = remain.trim_end_matches(['-', '_']).to_string();

    if TRAILING_DATE_RE.is_match(&remain) {
        remain = TRAILING_DATE_RE.replace(&remain, "").to_string();
        remain = remain.trim_end_matches(['-', '_']).to_string();
    }

    (remain, seq_no)
}

#[doc = "'1.5gb' 형태의 스토리지 크기 문자열을 바이트로 변환해주는 함수 - 1024 배수"]
/// # Returns
/// * Result<u64, anyhow::Error> - 빈 문자열은 0, 해석 불가능한 값은 에러
pub fn parse_storage_size(size_str: &str) -> Result<u64> {
    let normalized: String = size_str.trim().to_lowercase();

    if normalized.is_empty() {
        return Ok(0);
    }

    let caps = match STORAGE_SIZE_RE.captures(&normalized) {
        Some(caps) => caps,
        None => {
            /* 단위 없는 숫자는 바이트로 취급 */
            let plain: f64 = normalized.parse().map_err(|_| {
                anyhow!(
                    "[Error][parse_storage_size()] Invalid storage size format: '{}'",
                    size_str
                )
            })?;
            return Ok(plain as u64);
        }
    };

    let value: f64 = caps
        .get(1)
        .and_then(|m| m.as_str().parse().ok())
        .ok_or_else(|| {
            anyhow!(
                "[Error][parse_storage_size()] Invalid storage size value: '{}'",
                size_str
            )
        })?;

    let multiplier: f64 = match caps.get(2).map(|m| m.as_str()).unwrap_or("") {
        "" | "b" => 1.0,
        "kb" => 1024.0,
        "mb" => 1024.0 * 1024.0,
        "gb" => 1024.0 * 1024.0 * 1024.0,
        "tb" => 1024.0 * 1024.0 * 1024.0 * 1024.0,
        unit => {
            return Err(anyhow!(
                "[Error][parse_storage_size()] Unknown storage unit: '{}'",
                unit
            ))
        }
    };

    Ok((value * multiplier) as u64)
}

#[doc = "_cat/indices 의 status 컬럼이 open 인지 여부"]
pub fn parse_status_open(status: &str) -> bool {
    status.to_lowercase() == "open"
}

#[doc = "API path 의 cluster 이름 검증"]
pub fn validate_cluster_name(name: &str) -> bool {
    !name.is_empty() && name.len() <= 255
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_name_with_numeric_suffix() {
        assert_eq!(parse_index_name("abc001"), (String::from("abc"), 1));
    }

    #[test]
    fn index_name_with_datestream_pattern() {
        assert_eq!(
            parse_index_name(".ds-x-2025.09.17-000012"),
            (String::from(".ds-x"), 12)
        );
    }

    #[test]
    fn index_name_without_suffix() {
        assert_eq!(
            parse_index_name("169736-elk-transforms"),
            (String::from("169736-elk-transforms"), 0)
        );
    }

    #[test]
    fn index_name_with_version_segment() {
        assert_eq!(
            parse_index_name(".kibana_task_manager_7.17.2_001"),
            (String::from(".kibana_task_manager_7.17.2"), 1)
        );
    }

    #[test]
    fn storage_size_units() {
        assert_eq!(parse_storage_size("1.5gb").unwrap(), 1_610_612_736);
        assert_eq!(parse_storage_size("512mb").unwrap(), 536_870_912);
        assert_eq!(parse_storage_size("10kb").unwrap(), 10_240);
        assert_eq!(parse_storage_size("42b").unwrap(), 42);
        assert_eq!(parse_storage_size("1234").unwrap(), 1234);
        assert_eq!(parse_storage_size("").unwrap(), 0);
    }

    #[test]
    fn storage_size_garbage_is_error() {
        assert!(parse_storage_size("garbage").is_err());
        assert!(parse_storage_size("1.5xb").is_err());
    }
}
