pub mod patterns;
pub mod smoke;
