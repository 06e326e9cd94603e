// Service exports
pub mod captcha;
pub mod pages;
pub mod ticketing;

pub use captcha::{CaptchaError, CaptchaVerifier};
pub use pages::{PageDirectory, PageDirectoryError, StaticPageDirectory, WikiApiPageDirectory};
pub use ticketing::{is_valid_email, TicketingClient, TicketingError};
