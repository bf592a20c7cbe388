// Elevated handlers: administrative surfaces gated to ADMIN.
pub mod scheduler;
pub mod users;
