// handlers/mod.rs - handlers grouped by security tier
//
// Public (no auth) → Protected (JWT + validated user) → Elevated (ADMIN only)
pub mod elevated; // /api/users/*, /api/scheduler/*
pub mod protected; // /api/* domain resources and the caller's inbox
pub mod public; // /, /health, /api/auth/login
