//! Toolchain report printed by `toolchain-info`.

use std::io::{self, Write};

pub const FOOTER: &str = "This is a project template";

/// Write the toolchain configuration this crate was compiled with,
/// followed by [`FOOTER`].
pub fn report(out: &mut impl Write) -> io::Result<()> {
    if cfg!(target_env = "msvc") {
        writeln!(out, "target_env=msvc")?;
    }
    if cfg!(target_env = "gnu") {
        writeln!(out, "target_env=gnu")?;
    }
    if cfg!(target_env = "musl") {
        writeln!(out, "target_env=musl")?;
    }
    writeln!(out, "target_pointer_width={}", usize::BITS)?;
    if cfg!(panic = "abort") {
        writeln!(out, "panic=abort")?;
    } else {
        writeln!(out, "panic=unwind")?;
    }
    if cfg!(debug_assertions) {
        writeln!(out, "debug_assertions=on")?;
    } else {
        writeln!(out, "debug_assertions NOT enabled")?;
    }
    writeln!(out, "{FOOTER}")
}

/// [`report`] to stdout. Output errors are ignored.
pub fn print() {
    let _ = report(&mut io::stdout().lock());
}
