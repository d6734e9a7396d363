pub mod group_handler;
