//! Staff authentication: password hashing, the cookie session and flash
//! messages carried across redirects.

pub mod flash;
pub mod password;
pub mod session;

pub use flash::{Flash, FlashCategory};
pub use session::{CookieSettings, SessionUser};
