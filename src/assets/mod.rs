//! 资产加载
//!
//! 目前只有 glTF 2.0 导入。加载是全有或全无的：任何解析失败都在写入
//! 场景之前返回错误，场景保持原样。

pub mod gltf;

pub use gltf::load_gltf;
