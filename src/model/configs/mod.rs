pub mod bulk_tasks_config;
pub mod config;
pub mod csv_mapping;
pub mod indices_config;
pub mod job_config;
pub mod tpw_config;
pub mod write_pressure_config;
