pub mod admin;
pub mod brand;
pub mod common;
pub mod gift_code;
pub mod pagination;
pub mod payment;
pub mod platform;
pub mod user;

pub use admin::*;
pub use brand::*;
pub use common::*;
pub use gift_code::*;
pub use pagination::*;
pub use payment::*;
pub use platform::*;
pub use user::*;
