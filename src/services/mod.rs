pub mod account_service;
pub mod admin_service;
pub mod auth_service;
pub mod brand_service;
pub mod platform_service;

pub use account_service::*;
pub use admin_service::*;
pub use auth_service::*;
pub use brand_service::*;
pub use platform_service::*;
