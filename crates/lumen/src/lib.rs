//! # Lumen
//!
//! A small 2D game engine: a fixed-timestep frame loop, a batched OpenGL
//! renderer and BMFont bitmap text.
//!
//! ## Features
//!
//! - **Batched rendering**: every frame's geometry is packed into a handful
//!   of draw calls, up to 16 textures per call
//! - **Stencil pass**: mask geometry is flushed after regular geometry
//! - **Bitmap fonts**: BMFont text metrics, measurement and layout
//! - **Fixed timestep**: logic runs at a steady UPS independent of FPS
//! - **Headless back ends**: the whole loop runs in tests without a display
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use lumen::prelude::*;
//!
//! struct MyApp;
//!
//! impl Application for MyApp {
//!     fn draw(&mut self, _engine: &mut Engine, window: &mut Window) -> Result<(), AppError> {
//!         Draw2D::new(window.batch_controller_mut())
//!             .color([1.0, 0.5, 0.0, 1.0])
//!             .rectangle(10.0, 10.0, 100.0, 50.0)?;
//!         Ok(())
//!     }
//! }
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut engine = Engine::new(EngineConfig::default());
//!     let mut window = engine.create_window(WindowConfig::new(800, 600, "My Game"))?;
//!     window.run(&mut engine, &mut MyApp)?;
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

pub mod config;
pub mod core;
pub mod foundation;
pub mod input;
pub mod render;

mod application;
mod engine;

pub use application::{AppError, Application};
pub use engine::{Engine, EngineError, Looper};

/// Common imports for engine users
pub mod prelude {
    pub use crate::{
        config::Config,
        core::config::{EngineConfig, FpsAppendConfiguration, RenderingApi, WindowConfig},
        foundation::{
            logging::{codes, ErrorRecord, ErrorRouter, ErrorSink, MemorySink, Severity},
            math::{Mat4, Vec2},
        },
        input::{InputManager, KeyCode, MouseButton},
        render::{
            draw::Draw2D,
            text::{BitmapFont, FontSource},
            vertex::{Transform, Vertex, VertexGroup},
            window::{CursorShape, Window},
            BatchController, Camera2D, Texture,
        },
        AppError, Application, Engine, EngineError, Looper,
    };
}
