//! Semantic middle-end for Citrus.
//!
//! Takes the forest of unresolved trees produced by the parser, resolves
//! names and types in dependency order, specializes generic templates on
//! demand, and lowers the result against an [`IrBackend`].
//!
//! # Architecture
//!
//! - **[`Module`]**: per-unit context. Owns the [`Ast`](citrus_ast::Ast), the
//!   type [`Pool`](citrus_types::Pool), the copy-context stack, instance
//!   caches and the work queue.
//! - **Search** ([`Query`]): scoped name lookup with a memoized parent cache.
//! - **Pipeline**: initialize, find dependencies, resolve, build.
//! - **Generics**: instance cache plus clone-substitute-queue.
//! - **Lowering**: functions, loops, calls and constructor calls.
//!
//! # Usage
//!
//! ```text
//! let mut module = Module::new(ast);
//! let mut builder = IrBuilder::new();
//! module.compile(&mut builder)?;
//! let ir = builder.finish();
//! ```

mod generics;
mod lower;
mod mangle;
mod module;
mod options;
mod pipeline;
mod search;

#[cfg(test)]
mod test_helpers;

pub use citrus_ir::IrBackend;
pub use module::Module;
pub use options::SemaOptions;
pub use search::{Query, SearchFilter, Searcher};

use std::sync::Once;

static TRACING_INIT: Once = Once::new();

/// Initialize tracing for debug output.
///
/// Safe to call multiple times. Enable with `RUST_LOG=citrus_sema=debug`
/// or `RUST_LOG=citrus_sema=trace`.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, prelude::*, EnvFilter};

        // Only initialize if RUST_LOG is set
        if std::env::var("RUST_LOG").is_ok() {
            let filter = EnvFilter::from_default_env();
            tracing_subscriber::registry()
                .with(fmt::layer().with_target(true).with_level(true))
                .with(filter)
                .init();
        }
    });
}
