pub mod main_handler;
