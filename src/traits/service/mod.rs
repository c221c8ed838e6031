pub mod bulk_tasks_service_trait;
pub mod csv_load_service_trait;
pub mod endpoint_service_trait;
pub mod indices_service_trait;
pub mod ingest_service_trait;
pub mod stats_service_trait;
pub mod tpw_service_trait;
pub mod write_pressure_service_trait;
