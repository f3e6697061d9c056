pub mod print_job;
pub mod print_queue;
pub mod settle;
pub mod watcher;
