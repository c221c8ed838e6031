use crate::common::*;

#[doc = "쓰기압력 판정시 결측 포인트를 어떻게 취급할지."]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub enum MissingDataMode {
    #[default]
    Missing,
    NonOffending,
    Offending,
}
