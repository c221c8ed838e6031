use crate::common::*;

#[doc = "derived 매핑 한 건 - column 값에 function 을 적용해서 field 에 대입"]
#[derive(Debug, Clone, Deserialize, Getters)]
#[getset(get = "pub")]
pub struct DerivedField {
    pub field: String,
    pub column: String,
    pub function: String,
    #[serde(default)]
    pub arg: Value,
    #[serde(rename = "retVal", default)]
    pub ret_val: Option<Vec<String>>,
}

#[doc = "CSV 컬럼 -> 내부 필드 매핑 DSL"]
#[derive(Debug, Clone, Default, Deserialize, Getters)]
#[getset(get = "pub")]
#[serde(default)]
pub struct InputMapping {
    pub constant: HashMap<String, Value>,
    pub straight: HashMap<String, String>,
    pub derived: Vec<DerivedField>,
}

#[doc = "loadFromMasterCSV 잡 파라미터"]
#[derive(Debug, Clone, Deserialize, Getters)]
#[getset(get = "pub")]
pub struct CsvLoadParams {
    #[serde(rename = "csv_fileName")]
    pub csv_file_name: String,
    #[serde(rename = "csv_deleteFileName", default)]
    pub csv_delete_file_name: Option<String>,
    #[serde(rename = "inputMapping", default)]
    pub input_mapping: InputMapping,
}

#[doc = "updateAccessCredentials 잡 파라미터"]
#[derive(Debug, Clone, Deserialize, Getters)]
#[getset(get = "pub")]
pub struct CredentialLoadParams {
    #[serde(rename = "csv_fileName")]
    pub csv_file_name: String,
}
