//! The document model of a non-destructive raster editor.
//!
//! A [`Document`] owns a node graph whose output is the rendered image, a structure tree of layers and folders
//! mirroring part of that graph, and the undo history. The UI talks to it only through [`Action`]s.

pub mod actions;
pub mod changes;
pub mod config;
pub mod consts;
pub mod document;
pub mod error;
pub mod history;
pub mod persistence;
pub mod response;
pub mod structure;

#[cfg(test)]
pub(crate) mod test_utils;

#[doc(inline)]
pub use actions::Action;
#[doc(inline)]
pub use config::DocumentConfig;
#[doc(inline)]
pub use document::{Document, DocumentState};
#[doc(inline)]
pub use error::{ChangeError, DocumentError, PersistenceError, TrackerError};
#[doc(inline)]
pub use persistence::SerializedDocument;
#[doc(inline)]
pub use response::DocumentResponse;
#[doc(inline)]
pub use structure::{MemberKind, MemberLocation, StructureMember, StructureTree};

pub use core_types::NodeId;
