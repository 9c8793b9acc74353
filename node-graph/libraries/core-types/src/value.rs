use glam::DVec2;
use raster_types::{BlendMode, Color, ShapeData, Surface};
use serde::{Deserialize, Serialize};
use std::hash::Hash;

/// The declared type of a port.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Type {
	None,
	F64,
	U32,
	Bool,
	Color,
	BlendMode,
	DVec2,
	String,
	Surface,
	Shape,
}

impl Type {
	/// Whether a value may be stored in a port of this type. [`TaggedValue::None`] is accepted everywhere and stands for an empty result.
	pub fn accepts(&self, value: &TaggedValue) -> bool {
		matches!(value, TaggedValue::None) || value.ty() == *self
	}
}

impl std::fmt::Display for Type {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		let name = match self {
			Type::None => "()",
			Type::F64 => "f64",
			Type::U32 => "u32",
			Type::Bool => "bool",
			Type::Color => "Color",
			Type::BlendMode => "BlendMode",
			Type::DVec2 => "DVec2",
			Type::String => "String",
			Type::Surface => "Surface",
			Type::Shape => "Shape",
		};
		write!(f, "{name}")
	}
}

/// A value flowing through the graph, tagged with its type.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub enum TaggedValue {
	#[default]
	None,
	F64(f64),
	U32(u32),
	Bool(bool),
	Color(Color),
	BlendMode(BlendMode),
	DVec2(DVec2),
	String(String),
	Surface(Surface),
	Shape(ShapeData),
}

#[allow(clippy::derived_hash_with_manual_eq)]
impl Hash for TaggedValue {
	fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
		core::mem::discriminant(self).hash(state);
		match self {
			Self::None => {}
			Self::F64(x) => x.to_bits().hash(state),
			Self::U32(x) => x.hash(state),
			Self::Bool(x) => x.hash(state),
			Self::Color(x) => x.hash(state),
			Self::BlendMode(x) => x.hash(state),
			Self::DVec2(x) => x.to_array().iter().for_each(|x| x.to_bits().hash(state)),
			Self::String(x) => x.hash(state),
			Self::Surface(x) => x.hash(state),
			Self::Shape(x) => x.hash(state),
		}
	}
}

impl TaggedValue {
	pub fn ty(&self) -> Type {
		match self {
			TaggedValue::None => Type::None,
			TaggedValue::F64(_) => Type::F64,
			TaggedValue::U32(_) => Type::U32,
			TaggedValue::Bool(_) => Type::Bool,
			TaggedValue::Color(_) => Type::Color,
			TaggedValue::BlendMode(_) => Type::BlendMode,
			TaggedValue::DVec2(_) => Type::DVec2,
			TaggedValue::String(_) => Type::String,
			TaggedValue::Surface(_) => Type::Surface,
			TaggedValue::Shape(_) => Type::Shape,
		}
	}

	pub fn is_none(&self) -> bool {
		matches!(self, TaggedValue::None)
	}

	pub fn as_f64(&self) -> Option<f64> {
		match self {
			TaggedValue::F64(x) => Some(*x),
			TaggedValue::U32(x) => Some(*x as f64),
			_ => None,
		}
	}

	pub fn as_u32(&self) -> Option<u32> {
		match self {
			TaggedValue::U32(x) => Some(*x),
			_ => None,
		}
	}

	pub fn as_bool(&self) -> Option<bool> {
		match self {
			TaggedValue::Bool(x) => Some(*x),
			_ => None,
		}
	}

	pub fn as_color(&self) -> Option<Color> {
		match self {
			TaggedValue::Color(x) => Some(*x),
			_ => None,
		}
	}

	pub fn as_blend_mode(&self) -> Option<BlendMode> {
		match self {
			TaggedValue::BlendMode(x) => Some(*x),
			_ => None,
		}
	}

	pub fn as_dvec2(&self) -> Option<DVec2> {
		match self {
			TaggedValue::DVec2(x) => Some(*x),
			_ => None,
		}
	}

	pub fn as_str(&self) -> Option<&str> {
		match self {
			TaggedValue::String(x) => Some(x),
			_ => None,
		}
	}

	pub fn as_surface(&self) -> Option<&Surface> {
		match self {
			TaggedValue::Surface(x) => Some(x),
			_ => None,
		}
	}

	pub fn as_surface_mut(&mut self) -> Option<&mut Surface> {
		match self {
			TaggedValue::Surface(x) => Some(x),
			_ => None,
		}
	}

	pub fn into_surface(self) -> Option<Surface> {
		match self {
			TaggedValue::Surface(x) => Some(x),
			_ => None,
		}
	}

	pub fn as_shape(&self) -> Option<&ShapeData> {
		match self {
			TaggedValue::Shape(x) => Some(x),
			_ => None,
		}
	}
}

macro_rules! tagged_value_from {
	($($ty:ty => $variant:ident),* $(,)?) => {
		$(
			impl From<$ty> for TaggedValue {
				fn from(value: $ty) -> Self {
					TaggedValue::$variant(value)
				}
			}
		)*
	};
}

tagged_value_from! {
	f64 => F64,
	u32 => U32,
	bool => Bool,
	Color => Color,
	BlendMode => BlendMode,
	DVec2 => DVec2,
	String => String,
	Surface => Surface,
	ShapeData => Shape,
}
