//! Quad demo: bouncing squares, a spinning textured panel and bitmap text
//!
//! Usage: `quad_demo [font.png font.fnt]`
//!
//! Keys: F11 toggles fullscreen, V toggles vsync, arrows pan the camera,
//! Escape quits.

use lumen::config::Config;
use lumen::prelude::*;
use lumen::render::{texture, Render};
use rand::Rng;

const SQUARE_COUNT: usize = 400;
const SQUARE_SIZE: f32 = 12.0;
const CAMERA_SPEED: f32 = 4.0;

struct Square {
    position: Vec2,
    velocity: Vec2,
    color: [f32; 4],
}

struct QuadDemo {
    squares: Vec<Square>,
    checker: Option<Texture>,
    font: Option<BitmapFont>,
    spin: f32,
}

impl QuadDemo {
    fn new(font: Option<BitmapFont>) -> Self {
        Self {
            squares: Vec::new(),
            checker: None,
            font,
            spin: 0.0,
        }
    }
}

impl Application for QuadDemo {
    fn start(&mut self, _engine: &mut Engine, window: &mut Window) -> Result<(), AppError> {
        let mut rng = rand::thread_rng();
        let (width, height) = (window.width() as f32, window.height() as f32);
        self.squares = (0..SQUARE_COUNT)
            .map(|_| Square {
                position: Vec2::new(rng.gen_range(0.0..width), rng.gen_range(0.0..height)),
                velocity: Vec2::new(rng.gen_range(-3.0..3.0), rng.gen_range(-3.0..3.0)),
                color: [rng.gen(), rng.gen(), rng.gen(), 1.0],
            })
            .collect();

        let mut image = texture::solid_color(8, 8, [255, 255, 255, 255]);
        for (x, y, pixel) in image.enumerate_pixels_mut() {
            if (x + y) % 2 == 0 {
                pixel.0 = [40, 40, 40, 255];
            }
        }
        self.checker = Some(window.render_mut().create_texture(&image)?);

        if let Some(font) = self.font.as_mut() {
            font.load(window.render_mut());
        }

        window.add_resize_callback(|w: &Window| log::info!("Resized to {}x{}", w.width(), w.height()));
        log::info!("Quad demo started with {SQUARE_COUNT} squares");
        Ok(())
    }

    fn update(&mut self, _engine: &mut Engine, window: &mut Window) -> Result<(), AppError> {
        let (width, height) = (window.width() as f32, window.height() as f32);
        for square in &mut self.squares {
            square.position += square.velocity;
            if square.position.x < 0.0 || square.position.x + SQUARE_SIZE > width {
                square.velocity.x = -square.velocity.x;
            }
            if square.position.y < 0.0 || square.position.y + SQUARE_SIZE > height {
                square.velocity.y = -square.velocity.y;
            }
        }
        self.spin += 0.02;

        let input = window.input();
        let pan = Vec2::new(
            f32::from(i8::from(input.is_key_down(KeyCode::Right)) - i8::from(input.is_key_down(KeyCode::Left))),
            f32::from(i8::from(input.is_key_down(KeyCode::Up)) - i8::from(input.is_key_down(KeyCode::Down))),
        );
        if input.is_key_down(KeyCode::Escape) {
            window.stop();
        }
        window.camera_mut().pan(pan * CAMERA_SPEED);
        Ok(())
    }

    fn draw(&mut self, _engine: &mut Engine, window: &mut Window) -> Result<(), AppError> {
        // Edges are rolled after draw, so one-shot toggles are read here.
        let toggle_fullscreen = window.input().is_key_pressed(KeyCode::F11);
        let toggle_vsync = window.input().is_key_pressed(KeyCode::V);
        if toggle_fullscreen {
            window.toggle_fullscreen();
        }
        if toggle_vsync {
            let vsync = !window.is_vsync();
            window.set_vsync(vsync);
        }

        let (width, height) = (window.width() as f32, window.height() as f32);
        let fps = window.fps();
        let mut draw = Draw2D::new(window.batch_controller_mut()).with_camera(true);

        for square in &self.squares {
            draw.set_color(square.color);
            draw.rectangle(square.position.x, square.position.y, SQUARE_SIZE, SQUARE_SIZE)?;
        }

        draw.set_color([1.0, 0.8, 0.2, 1.0]);
        draw.triangle([width / 2.0 - 40.0, 40.0], [width / 2.0 + 40.0, 40.0], [width / 2.0, 110.0])?;

        if let Some(checker) = &self.checker {
            let mut panel = Draw2D::new(window.batch_controller_mut()).depth(1.0);
            panel.rotated_rectangle(width / 2.0 - 64.0, height / 2.0 - 64.0, 128.0, 128.0, self.spin)?;
            panel.image(16.0, 16.0, 64.0, 64.0, checker)?;
        }

        if let Some(font) = self.font.as_ref().filter(|f| f.is_loaded()) {
            let label = format!("{SQUARE_COUNT} squares at {fps} FPS");
            Draw2D::new(window.batch_controller_mut()).text(font, &label, 16.0, height - 40.0, 24)?;
        }
        Ok(())
    }

    fn exit(&mut self, _engine: &mut Engine, _window: &mut Window) -> Result<(), AppError> {
        log::info!("Quad demo finished");
        Ok(())
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = EngineConfig::load_from_file("engine.toml").unwrap_or_default();
    let mut engine = Engine::new(config);

    engine.register_looper(|window: &mut Window| {
        if window.current_tick() % 300 == 0 {
            log::info!("{} FPS / {} UPS", window.fps(), window.ups());
        }
        Ok::<(), AppError>(())
    });

    let window_config = WindowConfig::new(1280, 720, "Quad Demo")
        .with_caps(144, 60)
        .with_fps_in_title(FpsAppendConfiguration::default());
    let mut window = engine.create_window(window_config)?;

    let args: Vec<String> = std::env::args().skip(1).collect();
    let font = match args.as_slice() {
        [png, fnt] => Some(BitmapFont::from_paths(png, fnt, engine.router().clone())),
        _ => None,
    };

    window.run(&mut engine, &mut QuadDemo::new(font))?;
    Ok(())
}
