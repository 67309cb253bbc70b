//! Print the toolchain configuration and the resolved host platform.
//!
//! Usage: toolchain-info

use platform_api::{current_api, diagnostics, BuildKind, Platform};

fn main() {
    println!("platform={}", Platform::current());
    println!("build_kind={:?}", BuildKind::current());
    let api = current_api();
    println!("api=[{}]", api.api);
    diagnostics::print();
}
