pub mod callback;
pub mod mock_color;
pub mod mock_depth;
pub mod pattern;

pub use callback::{CallbackBackend, FrameFeeder};
pub use mock_color::MockColorBackend;
pub use mock_depth::{DepthScene, MockDepthBackend};
