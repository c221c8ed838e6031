use crate::common::*;

#[doc = "env 헬퍼함수 정의"]
fn get_env_or_panic(key: &str) -> String {
    match std::env::var(key) {
        Ok(val) => val,
        Err(_) => {
            let msg = format!("[ENV file read Error] '{}' must be set", key);
            log::error!("{}", msg);
            panic!("{}", msg);
        }
    }
}

#[doc = "Function to globally initialize the 'SERVER_CONFIG_PATH' variable"]
pub static SERVER_CONFIG_PATH: once_lazy<String> =
    once_lazy::new(|| get_env_or_panic("SERVER_CONFIG_PATH"));

#[doc = "Function to globally initialize the 'LOG_DIR' variable"]
pub static LOG_DIR: once_lazy<String> =
    once_lazy::new(|| std::env::var("LOG_DIR").unwrap_or_else(|_| String::from("./logs")));
