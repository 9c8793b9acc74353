use crate::Color;
use serde::{Deserialize, Serialize};

/// Describes how a layer's pixels are combined with the pixels beneath it.
/// Every mode is separable: it is evaluated independently per color channel before alpha compositing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BlendMode {
	/// The top color replaces the bottom color wherever it is opaque.
	#[default]
	Normal,
	/// Multiplies both colors. Black stays black and white leaves the backdrop unchanged.
	Multiply,
	/// Keeps the darker value of each channel.
	Darken,
	/// Darkens the backdrop to reflect the source, increasing contrast.
	ColorBurn,
	/// Inverts both colors, multiplies them and inverts the product.
	Screen,
	/// Keeps the lighter value of each channel.
	Lighten,
	/// Brightens the backdrop to reflect the source, decreasing contrast.
	ColorDodge,
	/// Adds both colors, clamping at white.
	LinearDodge,
	/// [Multiply](BlendMode::Multiply) for dark backdrops and [Screen](BlendMode::Screen) for light ones.
	Overlay,
	/// Subtracts the darker color from the lighter one.
	Difference,
	/// Like [Difference](BlendMode::Difference) with lower contrast.
	Exclusion,
}

impl BlendMode {
	pub fn list() -> &'static [BlendMode] {
		use BlendMode::*;
		&[Normal, Multiply, Darken, ColorBurn, Screen, Lighten, ColorDodge, LinearDodge, Overlay, Difference, Exclusion]
	}

	/// Blend function `B(backdrop, source)` for a single channel.
	fn blend_channel(self, backdrop: f32, source: f32) -> f32 {
		match self {
			BlendMode::Normal => source,
			BlendMode::Multiply => backdrop * source,
			BlendMode::Darken => backdrop.min(source),
			BlendMode::ColorBurn => {
				if backdrop >= 1. {
					1.
				} else if source <= 0. {
					0.
				} else {
					1. - ((1. - backdrop) / source).min(1.)
				}
			}
			BlendMode::Screen => backdrop + source - backdrop * source,
			BlendMode::Lighten => backdrop.max(source),
			BlendMode::ColorDodge => {
				if backdrop <= 0. {
					0.
				} else if source >= 1. {
					1.
				} else {
					(backdrop / (1. - source)).min(1.)
				}
			}
			BlendMode::LinearDodge => (backdrop + source).min(1.),
			BlendMode::Overlay => {
				if backdrop <= 0.5 {
					2. * backdrop * source
				} else {
					let screen = |b: f32, s: f32| b + s - b * s;
					screen(source, 2. * backdrop - 1.)
				}
			}
			BlendMode::Difference => (backdrop - source).abs(),
			BlendMode::Exclusion => backdrop + source - 2. * backdrop * source,
		}
	}

	/// Composites `source` over `backdrop` with the given layer `opacity`, returning a straight-alpha color.
	///
	/// # Examples
	/// ```
	/// use raster_types::{BlendMode, Color};
	/// let result = BlendMode::Normal.blend(Color::RED, Color::BLUE, 1.);
	/// assert_eq!(result, Color::RED);
	/// ```
	pub fn blend(self, source: Color, backdrop: Color, opacity: f32) -> Color {
		let source_alpha = source.a() * opacity.clamp(0., 1.);
		let backdrop_alpha = backdrop.a();
		if source_alpha <= 0. {
			return backdrop;
		}
		if backdrop_alpha <= 0. {
			return source.with_alpha(source_alpha);
		}
		if self == BlendMode::Normal && source_alpha >= 1. {
			return source;
		}

		let out_alpha = source_alpha + backdrop_alpha * (1. - source_alpha);
		let channel = |backdrop_channel: f32, source_channel: f32| {
			let mixed = (1. - backdrop_alpha) * source_channel + backdrop_alpha * self.blend_channel(backdrop_channel, source_channel);
			(source_alpha * mixed + backdrop_alpha * backdrop_channel * (1. - source_alpha)) / out_alpha
		};

		Color::from_rgbaf32_unchecked(
			channel(backdrop.r(), source.r()),
			channel(backdrop.g(), source.g()),
			channel(backdrop.b(), source.b()),
			out_alpha,
		)
	}
}

impl std::fmt::Display for BlendMode {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		let name = match self {
			BlendMode::Normal => "Normal",
			BlendMode::Multiply => "Multiply",
			BlendMode::Darken => "Darken",
			BlendMode::ColorBurn => "Color Burn",
			BlendMode::Screen => "Screen",
			BlendMode::Lighten => "Lighten",
			BlendMode::ColorDodge => "Color Dodge",
			BlendMode::LinearDodge => "Linear Dodge",
			BlendMode::Overlay => "Overlay",
			BlendMode::Difference => "Difference",
			BlendMode::Exclusion => "Exclusion",
		};
		write!(f, "{name}")
	}
}
