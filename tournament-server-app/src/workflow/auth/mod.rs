pub mod authenticate;
pub mod sign_in;
