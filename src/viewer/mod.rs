pub mod session;
pub mod xr;
