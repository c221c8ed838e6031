use crate::common::*;

#[doc = "_cat/indices 의 health 컬럼 값 - 와이어 포맷은 숫자코드."]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "u8", from = "u8")]
pub enum IndexHealth {
    Unknown,
    Green,
    Yellow,
    Red,
}

impl IndexHealth {
    pub fn from_cat_value(value: &str) -> Self {
        match value.to_lowercase().as_str() {
            "green" => IndexHealth::Green,
            "yellow" => IndexHealth::Yellow,
            "red" => IndexHealth::Red,
            _ => IndexHealth::Unknown,
        }
    }
}

impl From<IndexHealth> for u8 {
    fn from(health: IndexHealth) -> u8 {
        match health {
            IndexHealth::Unknown => 0,
            IndexHealth::Green => 1,
            IndexHealth::Yellow => 2,
            IndexHealth::Red => 3,
        }
    }
}

impl From<u8> for IndexHealth {
    fn from(code: u8) -> IndexHealth {
        match code {
            1 => IndexHealth::Green,
            2 => IndexHealth::Yellow,
            3 => IndexHealth::Red,
            _ => IndexHealth::Unknown,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn health_codes_round_trip() {
        assert_eq!(u8::from(IndexHealth::from_cat_value("green")), 1);
        assert_eq!(u8::from(IndexHealth::from_cat_value("YELLOW")), 2);
        assert_eq!(u8::from(IndexHealth::from_cat_value("red")), 3);
        assert_eq!(u8::from(IndexHealth::from_cat_value("weird")), 0);
    }
}
