pub mod desktop;
pub mod frame_store;
pub mod graph_store;
pub mod operator;
pub mod recorder;

use self::desktop::Desktop;
use self::frame_store::FrameStore;
use self::graph_store::GraphStore;
use self::operator::Operator;
use self::recorder::ClickRecorder;

/// External collaborators the exploration core drives.
pub struct Collaborators {
    pub desktop: Box<dyn Desktop>,
    pub frames: Box<dyn FrameStore>,
    pub store: Box<dyn GraphStore>,
    pub operator: Box<dyn Operator>,
    pub recorder: Box<dyn ClickRecorder>,
}
