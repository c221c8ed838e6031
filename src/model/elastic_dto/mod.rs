pub mod cat_index_row;
pub mod tasks_response;
pub mod tpw_response;
