mod actions;
mod codec;
mod collection;
mod geometry;
mod state;

// Everything that touches the DOM or the socket is wasm-only; the modules
// above stay target-independent so their tests run on the host.
#[cfg(target_arch = "wasm32")]
mod app;
#[cfg(target_arch = "wasm32")]
mod dom;
#[cfg(target_arch = "wasm32")]
mod net;
#[cfg(target_arch = "wasm32")]
mod render;
#[cfg(target_arch = "wasm32")]
mod speech;
#[cfg(target_arch = "wasm32")]
mod ws;

#[cfg(target_arch = "wasm32")]
pub use app::run;
