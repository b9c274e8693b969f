pub mod controller;
pub mod crud;
pub mod extract;
pub mod interface;
pub mod model;
pub mod routes;
pub mod schema;
pub mod service;

pub use routes::auth_routes;
