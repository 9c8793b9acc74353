use core::hash::Hash;
use serde::{Deserialize, Serialize};

/// Structure that represents a color with straight (non-premultiplied) alpha.
/// All four channels are stored as `f32` in the `0.0` to `1.0` range for SDR content.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Color {
	red: f32,
	green: f32,
	blue: f32,
	alpha: f32,
}

#[allow(clippy::derived_hash_with_manual_eq)]
impl Hash for Color {
	fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
		self.red.to_bits().hash(state);
		self.green.to_bits().hash(state);
		self.blue.to_bits().hash(state);
		self.alpha.to_bits().hash(state);
	}
}

impl Color {
	pub const BLACK: Color = Color::from_rgbf32_unchecked(0., 0., 0.);
	pub const WHITE: Color = Color::from_rgbf32_unchecked(1., 1., 1.);
	pub const RED: Color = Color::from_rgbf32_unchecked(1., 0., 0.);
	pub const GREEN: Color = Color::from_rgbf32_unchecked(0., 1., 0.);
	pub const BLUE: Color = Color::from_rgbf32_unchecked(0., 0., 1.);
	pub const TRANSPARENT: Color = Self {
		red: 0.,
		green: 0.,
		blue: 0.,
		alpha: 0.,
	};

	/// Returns `Some(Color)` if every channel is finite, non-negative, and alpha does not exceed `1.0`.
	///
	/// # Examples
	/// ```
	/// use raster_types::Color;
	/// let color = Color::from_rgbaf32(0.3, 0.14, 0.15, 0.92).unwrap();
	/// assert!(color.components() == (0.3, 0.14, 0.15, 0.92));
	///
	/// let color = Color::from_rgbaf32(1.0, 1.0, 1.0, f32::NAN);
	/// assert!(color == None);
	/// ```
	pub fn from_rgbaf32(red: f32, green: f32, blue: f32, alpha: f32) -> Option<Color> {
		if alpha > 1. || [red, green, blue, alpha].iter().any(|c| c.is_sign_negative() || !c.is_finite()) {
			return None;
		}
		Some(Color { red, green, blue, alpha })
	}

	/// Return an opaque `Color` from given `f32` RGB channels.
	pub const fn from_rgbf32_unchecked(red: f32, green: f32, blue: f32) -> Color {
		Color { red, green, blue, alpha: 1. }
	}

	pub const fn from_rgbaf32_unchecked(red: f32, green: f32, blue: f32, alpha: f32) -> Color {
		Color { red, green, blue, alpha }
	}

	/// Return an opaque `Color` given RGB channels from `0` to `255`.
	pub fn from_rgb8(red: u8, green: u8, blue: u8) -> Color {
		Color::from_rgba8(red, green, blue, 255)
	}

	/// Return a `Color` given RGBA channels from `0` to `255`.
	///
	/// # Examples
	/// ```
	/// use raster_types::Color;
	/// let color = Color::from_rgba8(0x72, 0x67, 0x62, 0xFF);
	/// assert_eq!(color.to_rgba8(), [0x72, 0x67, 0x62, 0xFF]);
	/// ```
	pub fn from_rgba8(red: u8, green: u8, blue: u8, alpha: u8) -> Color {
		let map_range = |int_color| int_color as f32 / 255.;
		Color {
			red: map_range(red),
			green: map_range(green),
			blue: map_range(blue),
			alpha: map_range(alpha),
		}
	}

	pub fn r(&self) -> f32 {
		self.red
	}

	pub fn g(&self) -> f32 {
		self.green
	}

	pub fn b(&self) -> f32 {
		self.blue
	}

	pub fn a(&self) -> f32 {
		self.alpha
	}

	/// Return the all components as a tuple, first component is red, followed by green, followed by blue, followed by alpha.
	pub fn components(&self) -> (f32, f32, f32, f32) {
		(self.red, self.green, self.blue, self.alpha)
	}

	/// Return the all RGBA components as a u8 slice, first component is red, followed by green, followed by blue, followed by alpha.
	pub fn to_rgba8(&self) -> [u8; 4] {
		let to_u8 = |channel: f32| (channel.clamp(0., 1.) * 255.).round() as u8;
		[to_u8(self.red), to_u8(self.green), to_u8(self.blue), to_u8(self.alpha)]
	}

	/// A fully transparent pixel, regardless of what its color channels hold.
	pub fn is_transparent(&self) -> bool {
		self.alpha == 0.
	}

	#[must_use]
	pub fn with_alpha(&self, alpha: f32) -> Color {
		Color { alpha, ..*self }
	}

	/// Scales alpha by `factor`, which is clamped to the `0.0..=1.0` range.
	#[must_use]
	pub fn multiplied_alpha(&self, factor: f32) -> Color {
		Color {
			alpha: self.alpha * factor.clamp(0., 1.),
			..*self
		}
	}

	/// Applies `f` to the color channels, leaving alpha untouched.
	#[must_use]
	pub fn map_rgb<F: Fn(f32) -> f32>(&self, f: F) -> Color {
		Color {
			red: f(self.red),
			green: f(self.green),
			blue: f(self.blue),
			alpha: self.alpha,
		}
	}

	#[must_use]
	pub fn inverted_rgb(&self) -> Color {
		self.map_rgb(|channel| 1. - channel)
	}

	/// Linearly interpolates every channel, including alpha, towards `other`.
	#[must_use]
	pub fn lerp(&self, other: &Color, t: f32) -> Color {
		let lerp = |a: f32, b: f32| a + (b - a) * t;
		Color {
			red: lerp(self.red, other.red),
			green: lerp(self.green, other.green),
			blue: lerp(self.blue, other.blue),
			alpha: lerp(self.alpha, other.alpha),
		}
	}
}
