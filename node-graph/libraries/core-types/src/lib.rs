pub mod context;
pub mod node;
pub mod uuid;
pub mod value;

pub use context::{CacheTriggers, EvaluationContext, RenderParams};
pub use node::{InputDeclaration, Node, NodeIo, NodeMetadata, NodeSignature, OutputDeclaration};
pub use uuid::NodeId;
pub use value::{TaggedValue, Type};

pub use raster_types;
