pub mod files;
pub mod health;
pub mod imports;
pub mod openapi;
pub mod route;
