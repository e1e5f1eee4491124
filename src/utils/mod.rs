//! Utility Module
//!
//! - [`OrbitControls`]: 鼠标环绕相机控制器
//! - [`FpsCounter`]: 帧率统计

pub mod fps_counter;
#[cfg(feature = "winit")]
pub mod orbit_control;

pub use fps_counter::FpsCounter;
#[cfg(feature = "winit")]
pub use orbit_control::OrbitControls;
