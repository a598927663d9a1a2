pub mod gesture;
pub mod router;
pub mod selection;
