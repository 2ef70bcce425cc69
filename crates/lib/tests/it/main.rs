/*! Integration tests for exam-archive.
 *
 * This test suite is organized as a single integration test binary
 * following the pattern described by matklad in
 * https://matklad.github.io/2021/02/27/delete-cargo-integration-tests.html
 *
 * The module structure mirrors the main library structure:
 * - keys: cache key construction and username validation
 * - cache: failure policy, verification codes and counter hashes
 * - archive: the filesystem store
 * - engine: session-boundary flows over both stores
 */

use tracing_subscriber::EnvFilter;

#[ctor::ctor]
fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive("exam_archive=info".parse().unwrap()),
        )
        .with_test_writer()
        .try_init();
}

mod archive;
mod cache;
mod context;
mod engine;
mod helpers;
mod keys;
