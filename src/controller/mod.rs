pub mod api_controller;
