pub mod db;
pub mod scheduler;
pub mod user;
