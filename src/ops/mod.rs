pub mod blend;
pub mod gamma;
pub mod transform;
