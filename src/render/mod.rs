/*!
 * Render Module
 * Presentation collaborator contract and the built-in renderers
 */

pub mod dispatch;
pub mod recording;
pub mod tracing_renderer;
pub mod traits;

pub use dispatch::{Notifier, RenderEvent};
pub use recording::RecordingRenderer;
pub use tracing_renderer::TracingRenderer;
pub use traits::Renderer;
