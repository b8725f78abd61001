mod controller_tests;
mod file_store_tests;
mod page_command_tests;
