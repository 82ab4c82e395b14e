//! Edit-and-continue session driver.
//!
//! One [`Session`] analyzes one "apply my changes" action over a set of
//! documents:
//!
//! 1. Every document's old and new declaration trees are matched, in
//!    parallel when configured.
//! 2. Once all documents are matched, partial types are merged and every
//!    edit is classified, synthesized and checked against the active
//!    statements of the running program.
//!
//! Cancellation discards the whole session; nothing partial is returned.

mod config;
mod session;

use std::sync::Once;

pub use config::SessionConfig;
pub use enc_analysis::{ActiveStatementUpdate, DocumentAnalysis, SemanticEdit, SemanticEditKind};
pub use enc_capabilities::Capabilities;
pub use enc_diagnostic::{RudeEditDiagnostic, RudeEditKind};
pub use session::{DocumentInput, Session, SessionError, SessionOutput};

static TRACING_INIT: Once = Once::new();

/// Install a tracing subscriber when `RUST_LOG` is set.
///
/// Safe to call more than once; only the first call has any effect.
/// `ENC_LOG_TREE` switches from flat lines to an indented span tree.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, prelude::*, EnvFilter};

        if std::env::var("RUST_LOG").is_err() {
            return;
        }
        let filter = EnvFilter::from_default_env();
        let registry = tracing_subscriber::registry().with(filter);
        if std::env::var_os("ENC_LOG_TREE").is_some() {
            registry
                .with(
                    tracing_tree::HierarchicalLayer::new(2)
                        .with_targets(true)
                        .with_bracketed_fields(true),
                )
                .init();
        } else {
            registry
                .with(fmt::layer().with_target(true).with_level(true))
                .init();
        }
    });
}
