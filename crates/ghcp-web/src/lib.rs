//! ghcp web backend.
//!
//! Serves the demo page and three SSE endpoints that relay chat sessions:
//! `/api/chat`, `/api/codegen` and `/api/tools`.

pub mod presets;
pub mod routes;
