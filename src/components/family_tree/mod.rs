//! Canvas view of a family tree centred on one member.

mod component;
mod photos;
mod render;
mod state;

pub use component::FamilyTreeCanvas;
