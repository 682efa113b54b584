//! Server-side page negotiation for single-page front ends.
//!
//! This crate re-exports everything a host application needs:
//!
//! ```ignore
//! use inertia_sdk::prelude::*;
//!
//! let inertia = Inertia::new("https://shop.test", "views/app.html", "v42");
//! inertia.share("appName", "Shop");
//!
//! let app = ServiceBuilder::new()
//!     .layer(inertia.version_guard())
//!     .service(router);
//!
//! // In a handler:
//! let mut props = Props::new();
//! props.insert("users".into(), users_json);
//! let response = inertia.render(&request, "users/index", props).await?;
//! ```

pub use inertia_core;
pub use inertia_engine;
pub use inertia_render;
pub use inertia_ssr;

/// Prelude for convenient imports.
pub mod prelude {
    pub use inertia_core::*;
    pub use inertia_engine::*;
    pub use inertia_render::*;
    pub use inertia_ssr::*;
}
