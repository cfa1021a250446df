/// Packed `0xRRGGBBAA` colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgba8(pub u32);

pub const BACKGROUND: Rgba8 = Rgba8::new(255, 255, 255, 255);
pub const ARTBOARD: Rgba8 = Rgba8::new(0, 0, 0, 255);
pub const GRID_FINE: Rgba8 = Rgba8::new(0, 0, 0, 20);
pub const GRID_COARSE: Rgba8 = Rgba8::new(0, 0, 0, 46);
pub const ORIGIN: Rgba8 = Rgba8::new(0, 0, 0, 128);
pub const GUIDE: Rgba8 = Rgba8::new(0, 130, 255, 255);
pub const SELECTION: Rgba8 = Rgba8::new(255, 128, 0, 255);
pub const HOVER: Rgba8 = Rgba8::new(255, 128, 0, 128);
pub const FOREGROUND: Rgba8 = Rgba8::new(0, 0, 0, 255);
pub const FILL: Rgba8 = Rgba8::new(0, 0, 0, 255);
pub const STROKE: Rgba8 = Rgba8::new(0, 0, 0, 255);

impl Rgba8 {
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self((r as u32) << 24 | (g as u32) << 16 | (b as u32) << 8 | a as u32)
    }

    pub fn r(&self) -> u8 {
        (self.0 >> 24) as u8
    }

    pub fn g(&self) -> u8 {
        ((self.0 >> 16) & 0xff) as u8
    }

    pub fn b(&self) -> u8 {
        ((self.0 >> 8) & 0xff) as u8
    }

    pub fn a(&self) -> u8 {
        (self.0 & 0xff) as u8
    }

    pub fn to_array(&self) -> [u8; 4] {
        [self.r(), self.g(), self.b(), self.a()]
    }

    pub fn to_f32_array(&self) -> [f32; 4] {
        self.to_array().map(|c| c as f32 / 255.0)
    }

    /// `rgba(r,g,b,a)` with alpha in `0..=1`, for SVG attributes.
    pub fn css(&self) -> String {
        format!("rgba({},{},{},{:.3})", self.r(), self.g(), self.b(), self.a() as f32 / 255.0)
    }
}
