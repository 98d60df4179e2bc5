pub mod columns;
pub mod compiler;
pub mod gate;
pub mod lifecycle;
pub mod presets;
