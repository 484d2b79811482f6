// Domain layer - Pure data and derivations, no I/O
pub mod color;
pub mod fields;
pub mod key;
pub mod level;
pub mod normalize;
pub mod reading;
pub mod summary;
