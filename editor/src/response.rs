use core_types::NodeId;
use glam::UVec2;
use graph_craft::InputConnector;
use raster_types::TileCoord;

/// Tells a viewer what a processed action changed, so it knows what to repaint or refresh.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentResponse {
	NodeCreated(NodeId),
	NodeDeleted(NodeId),
	ConnectionChanged(InputConnector),
	InputValueChanged(InputConnector),
	MemberCreated(NodeId),
	MemberDeleted(NodeId),
	MemberMoved(NodeId),
	MemberPropertiesChanged(NodeId),
	/// Tiles of a layer image that were drawn into, committed or not.
	LayerImageChanged { member: NodeId, tiles: Vec<TileCoord> },
	CanvasResized(UVec2),
	NothingToUndo,
	NothingToRedo,
}
