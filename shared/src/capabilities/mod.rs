//! Capability set for the shared core.
//!
//! We use Crux's built-in Http and Render capabilities directly; the shell
//! provides the actual transport, which keeps the core free of any global
//! client instance.

pub use crux_core::render::Render;
pub use crux_http::Http;

use crate::app::App;
use crate::Event;

pub type AppHttp = Http<Event>;
pub type AppRender = Render<Event>;

#[derive(crux_core::macros::Effect)]
#[effect(app = "App")]
pub struct Capabilities {
    pub http: Http<Event>,
    pub render: Render<Event>,
}
