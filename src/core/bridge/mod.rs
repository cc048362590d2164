//=========================================================================
// Thread Bridge
//
// Everything that crosses between script threads and the render thread.
//
// Responsibilities:
// - One-shot result delivery and the shutdown interrupt (`promise`)
// - FIFO operation queue drained once per frame (`render_queue`)
// - The script-facing API built on both (`script_context`)
//
//=========================================================================

//=== Submodules ==========================================================

pub mod promise;
pub mod render_queue;
pub mod script_context;

//=== Re-exports ==========================================================

pub use promise::{interrupt, promise, Completer, Interrupt, InterruptTrigger, Promise, PromiseState};
pub use render_queue::{RenderHandle, RenderQueue, RenderTask};
pub use script_context::ScriptContext;
