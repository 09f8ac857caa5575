//! Pass sequencing for a frame.
//!
//! The graph is a linear chain of nodes. Every node but the last renders
//! into one of two off-screen HDR targets, alternating between them, and
//! reads the previous node's output; the last node renders to the screen.
//! A 2D overlay pass runs after the chain.
//!
//! ```text
//! ┌──────────────┐    ┌─────────────┐    ┌─────────────┐
//! │  Background  │───▶│    Scene    │───▶│    Bloom    │───▶ screen ───▶ overlay
//! └──────────────┘    └─────────────┘    └─────────────┘
//!        │                  │
//!        ▼                  ▼
//!    Target A ◀────────▶ Target B        (ping-pong)
//! ```
//!
//! # Node Types
//!
//! - [`BackgroundNode`]: the backdrop image, drawn first
//! - [`SceneNode`]: meshes, helper lines and particles from a shared [`SceneQueue`]
//! - [`BloomNode`]: bright pass, blur and composite
//!
//! Nodes that write an off-screen target must be built for [`HDR_FORMAT`];
//! the last node writes the surface format.
//!
//! # Example
//!
//! ```ignore
//! let queue = Rc::new(RefCell::new(SceneQueue::new(lights, fog)));
//! let bloom = Rc::new(Cell::new(BloomSettings::default()));
//!
//! let mut graph = RenderGraph::builder()
//!     .node(BackgroundNode::new(&gpu, &stars, HDR_FORMAT))
//!     .node(SceneNode::new(&gpu, Rc::clone(&queue), HDR_FORMAT))
//!     .node(BloomNode::new(&gpu, Rc::clone(&bloom), gpu.config.format))
//!     .build(&gpu);
//!
//! graph.execute_with_ui(&gpu, time, &camera, |gpu, pass| draw.render(gpu, pass));
//! ```

mod effect_nodes;
mod graph;
mod post_process_nodes;
mod render_node;
mod render_target;
mod scene_queue;

pub use effect_nodes::BackgroundNode;
pub use graph::{FrameOutcome, RenderGraph, RenderGraphBuilder};
pub use post_process_nodes::BloomNode;
pub use render_node::RenderNode;
pub use render_target::{HDR_FORMAT, RenderContext, RenderTarget};
pub use scene_queue::{QueuedDraw, SceneNode, SceneQueue};
