use std::fs;

use crate::common::*;

#[doc = "yaml/json 설정파일을 확장자에 따라 읽어서 객체로 변환해주는 함수"]
/// # Arguments
/// * `file_path` - 읽을 대상 설정파일 경로 (.yaml / .yml / .json)
///
/// # Returns
/// * Result<T, anyhow::Error>
pub fn read_config_from_file<T: DeserializeOwned>(file_path: &Path) -> Result<T> {
    let content: String = fs::read_to_string(file_path)
        .map_err(|e| anyhow!("[io_utils->read_config_from_file] {:?}: {:?}", file_path, e))?;

    let ext: &str = file_path
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or("");

    match ext {
        "yaml" | "yml" => serde_yaml::from_str(&content).map_err(|e| {
            anyhow!(
                "[io_utils->read_config_from_file] Failed to parse YAML {:?}: {:?}",
                file_path,
                e
            )
        }),
        "json" => serde_json::from_str(&content).map_err(|e| {
            anyhow!(
                "[io_utils->read_config_from_file] Failed to parse JSON {:?}: {:?}",
                file_path,
                e
            )
        }),
        other => Err(anyhow!(
            "[io_utils->read_config_from_file] Unsupported config file format: '{}'",
            other
        )),
    }
}

#[doc = "디렉토리에서 base.{yaml|yml|json} 순서로 설정파일을 찾아주는 함수"]
pub fn find_config_file(config_dir: &Path, base_name: &str) -> Option<PathBuf> {
    for ext in ["yaml", "yml", "json"] {
        let candidate: PathBuf = config_dir.join(format!("{}.{}", base_name, ext));
        if candidate.is_file() {
            return Some(candidate);
        }
    }
    None
}

#[doc = "JSON 문자열을 temp 파일에 쓴 뒤 rename 으로 교체해주는 함수 - 디렉토리는 0755, 파일은 0644"]
pub fn write_json_atomic(path: &Path, content: &str) -> Result<()> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir)
            .map_err(|e| anyhow!("[io_utils->write_json_atomic] create_dir_all: {:?}", e))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let _ = fs::set_permissions(dir, fs::Permissions::from_mode(0o755));
        }
    }

    let tmp_path: PathBuf = path.with_extension("json.tmp");

    fs::write(&tmp_path, content)
        .map_err(|e| anyhow!("[io_utils->write_json_atomic] write {:?}: {:?}", tmp_path, e))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let _ = fs::set_permissions(&tmp_path, fs::Permissions::from_mode(0o644));
    }

    fs::rename(&tmp_path, path)
        .map_err(|e| anyhow!("[io_utils->write_json_atomic] rename {:?}: {:?}", path, e))?;

    Ok(())
}

#[doc = "append 전용 로그파일에 한 줄을 추가해주는 함수"]
pub fn append_line(path: &Path, line: &str) -> Result<()> {
    use std::io::Write;

    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir)
            .map_err(|e| anyhow!("[io_utils->append_line] create_dir_all: {:?}", e))?;
    }

    let mut file: fs::File = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| anyhow!("[io_utils->append_line] open {:?}: {:?}", path, e))?;

    writeln!(file, "{}", line)
        .map_err(|e| anyhow!("[io_utils->append_line] write {:?}: {:?}", path, e))?;

    Ok(())
}

#[doc = "처리가 끝난 oneTime job 파일을 processed 디렉토리로 옮겨주는 함수"]
/// # Arguments
/// * `file_path`     - 처리한 oneTime job 파일
/// * `processed_dir` - 이동할 디렉토리
/// * `status`        - "success" 면 suffix 없음, 그 외에는 .{status} suffix
pub fn move_processed_job(file_path: &Path, processed_dir: &Path, status: &str) -> Result<()> {
    let file_name: &str = file_path
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| {
            anyhow!(
                "[io_utils->move_processed_job] Invalid file path: {:?}",
                file_path
            )
        })?;

    let dest_path: PathBuf = if status == "success" {
        processed_dir.join(file_name)
    } else {
        processed_dir.join(format!("{}.{}", file_name, status))
    };

    fs::create_dir_all(processed_dir)
        .map_err(|e| anyhow!("[io_utils->move_processed_job] create_dir_all: {:?}", e))?;

    fs::rename(file_path, &dest_path).map_err(|e| {
        anyhow!(
            "[io_utils->move_processed_job] rename {:?} -> {:?}: {:?}",
            file_path,
            dest_path,
            e
        )
    })?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn atomic_write_replaces_file() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("nested/stats.json");

        write_json_atomic(&target, "{\"a\":1}").unwrap();
        assert_eq!(fs::read_to_string(&target).unwrap(), "{\"a\":1}");

        write_json_atomic(&target, "{\"a\":2}").unwrap();
        assert_eq!(fs::read_to_string(&target).unwrap(), "{\"a\":2}");
    }

    #[test]
    fn processed_job_gets_status_suffix() {
        let dir = tempfile::tempdir().unwrap();
        let one_time = dir.path().join("oneTime");
        let processed = dir.path().join("processedOneTime");
        fs::create_dir_all(&one_time).unwrap();

        let job_file = one_time.join("x.yaml");
        fs::write(&job_file, "jobs: []").unwrap();

        move_processed_job(&job_file, &processed, "unparsed").unwrap();
        assert!(processed.join("x.yaml.unparsed").is_file());
        assert!(!job_file.exists());
    }

    #[test]
    fn processed_job_success_keeps_name() {
        let dir = tempfile::tempdir().unwrap();
        let job_file = dir.path().join("y.yaml");
        fs::write(&job_file, "jobs: []").unwrap();

        let processed = dir.path().join("processedOneTime");
        move_processed_job(&job_file, &processed, "success").unwrap();
        assert!(processed.join("y.yaml").is_file());
    }
}
