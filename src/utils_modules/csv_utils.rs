use crate::common::*;

static NON_ALNUM_RE: once_lazy<Regex> =
    once_lazy::new(|| Regex::new(r"[^a-zA-Z0-9]+").unwrap_or_else(|e| panic!("{:?}", e)));

#[doc = "헤더 키 기반의 row 맵 스트림 - 인벤토리 CSV 의 공통 진입점"]
#[derive(Debug, Clone, Getters)]
#[getset(get = "pub")]
pub struct CsvRowStream {
    headers: Vec<String>,
    rows: Vec<HashMap<String, String>>,
}

impl CsvRowStream {
    pub fn from_path(file_path: &Path) -> Result<Self> {
        let file = std::fs::File::open(file_path)
            .map_err(|e| anyhow!("[CsvRowStream->from_path] {:?}: {:?}", file_path, e))?;
        Self::from_reader(file)
    }

    pub fn from_reader<R: std::io::Read>(reader: R) -> Result<Self> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(reader);

        let headers: Vec<String> = csv_reader
            .headers()
            .map_err(|e| anyhow!("[CsvRowStream->from_reader] header: {:?}", e))?
            .iter()
            .map(str::to_string)
            .collect();

        if headers.is_empty() {
            return Err(anyhow!("[CsvRowStream->from_reader] CSV file is empty"));
        }

        let mut rows: Vec<HashMap<String, String>> = Vec::new();

        for record in csv_reader.records() {
            let record = match record {
                Ok(record) => record,
                Err(e) => {
                    warn!("[CsvRowStream->from_reader] Skipping malformed row: {:?}", e);
                    continue;
                }
            };

            /* 헤더와 컬럼 개수가 다른 행은 버린다. */
            if record.len() != headers.len() {
                continue;
            }

            let mut row: HashMap<String, String> = HashMap::new();
            for (header, value) in headers.iter().zip(record.iter()) {
                row.insert(header.clone(), value.to_string());
            }
            rows.push(row);
        }

        Ok(CsvRowStream { headers, rows })
    }
}

pub fn get_value<'a>(row: &'a HashMap<String, String>, column: &str) -> &'a str {
    row.get(column).map(String::as_str).unwrap_or("")
}

#[doc = "derived 변환의 결과 타입"]
#[derive(Debug, Clone, PartialEq)]
pub enum TransformOutcome {
    Text(String),
    Flag(bool),
    Number(i64),
    List(Vec<String>),
}

pub fn remove_non_alphanumeric(value: &str) -> String {
    NON_ALNUM_RE.replace_all(value, "_").to_string()
}

#[doc = "trim + 대소문자 무시 비교로 value 가 목록에 속하는지 판정"]
pub fn bool_string_compare(value: &str, compare_list: &[String]) -> bool {
    let lowered: String = value.trim().to_lowercase();
    compare_list
        .iter()
        .any(|item| item.trim().to_lowercase() == lowered)
}

#[doc = "value 가 arg[i] 목록에 속하면 ret_vals[i] 를, 아니면 원본을 반환"]
pub fn str_string_compare(value: &str, compare_list: &[Vec<String>], ret_vals: &[String]) -> String {
    let lowered: String = value.trim().to_lowercase();

    for (idx, sub_list) in compare_list.iter().enumerate() {
        for item in sub_list {
            if item.trim().to_lowercase() == lowered {
                return match ret_vals.get(idx) {
                    Some(ret) => ret.clone(),
                    None => value.to_string(),
                };
            }
        }
    }

    value.to_string()
}

pub fn split_string(value: &str, delimiter: &str) -> Vec<String> {
    let delimiter: &str = if delimiter.is_empty() { "," } else { delimiter };

    value
        .split(delimiter)
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(str::to_string)
        .collect()
}

fn value_to_string_list(arg: &Value) -> Vec<String> {
    arg.as_array()
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

fn value_to_nested_string_list(arg: &Value) -> Vec<Vec<String>> {
    arg.as_array()
        .map(|items| items.iter().map(value_to_string_list).collect())
        .unwrap_or_default()
}

#[doc = "derived 섹션의 변환함수 적용"]
/// # Arguments
/// * `value`    - CSV 컬럼 원본값
/// * `function` - 변환함수 이름
/// * `arg`      - 함수 인자 (함수별 해석)
/// * `ret_val`  - strStringCompare 의 반환값 목록
///
/// # Returns
/// * Result<TransformOutcome, anyhow::Error> - 알 수 없는 함수이름은 에러 (호출부에서 경고 후 원본값 유지)
pub fn apply_transformation(
    value: &str,
    function: &str,
    arg: &Value,
    ret_val: Option<&Vec<String>>,
) -> Result<TransformOutcome> {
    match function {
        "toLower" => Ok(TransformOutcome::Text(value.to_lowercase())),
        "toUpper" => Ok(TransformOutcome::Text(value.to_uppercase())),
        "removeNonAlphaNumeric" => Ok(TransformOutcome::Text(remove_non_alphanumeric(value))),
        "boolStringCompare" => {
            let compare_list: Vec<String> = value_to_string_list(arg);
            Ok(TransformOutcome::Flag(bool_string_compare(
                value,
                &compare_list,
            )))
        }
        "strStringCompare" => {
            let compare_list: Vec<Vec<String>> = value_to_nested_string_list(arg);
            let ret_vals: Vec<String> = ret_val.cloned().unwrap_or_default();
            Ok(TransformOutcome::Text(str_string_compare(
                value,
                &compare_list,
                &ret_vals,
            )))
        }
        "splitString" => {
            let delimiter: &str = arg.as_str().unwrap_or(",");
            Ok(TransformOutcome::List(split_string(value, delimiter)))
        }
        "parseInt" => {
            let parsed: i64 = value.trim().parse().map_err(|_| {
                anyhow!(
                    "[Error][apply_transformation()] parseInt failed for '{}'",
                    value
                )
            })?;
            Ok(TransformOutcome::Number(parsed))
        }
        "parseBool" => {
            let truthy: [String; 4] = [
                String::from("true"),
                String::from("yes"),
                String::from("1"),
                String::from("on"),
            ];
            Ok(TransformOutcome::Flag(bool_string_compare(value, &truthy)))
        }
        unknown => Err(anyhow!(
            "[Error][apply_transformation()] Unknown transformation function: '{}'",
            unknown
        )),
    }
}
