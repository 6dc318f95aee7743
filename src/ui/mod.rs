pub mod icons;
pub mod layout;
pub mod render;
pub mod surface;
pub mod wayland;
