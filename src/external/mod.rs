pub mod email;
pub mod oauth;
pub mod paypal;
pub mod storage;

pub use email::*;
pub use oauth::*;
pub use paypal::*;
pub use storage::*;
