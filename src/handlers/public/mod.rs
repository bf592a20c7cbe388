// Public handlers: no authentication, used for token acquisition and probes
pub mod auth;
pub mod system;
