// handlers/protected/mod.rs - Protected handlers (bearer authentication required)
//
// Route Prefix: /api/*
// Middleware: jwt_auth_middleware, which inserts the verified `AuthUser`

pub mod me; // GET /api/me, GET /api/v1/auth/me

pub use me::me_get;
