pub mod bulk_tasks;
pub mod cluster;
pub mod configs;
pub mod elastic_dto;
pub mod index_info;
pub mod indexing_rate;
pub mod stat_by_day;
pub mod store;
pub mod tpw_queue;
pub mod write_pressure;
