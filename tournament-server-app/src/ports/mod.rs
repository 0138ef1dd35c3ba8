pub mod identity;
pub mod notification;
pub mod session;
