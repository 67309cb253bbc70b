//! Test runner for generated export headers
//!
//! This test runner validates the generated C headers by:
//! 1. Generating headers with gen-export-header for one or more prefixes
//! 2. Compiling small C programs against them with a real C compiler
//! 3. Running the programs and checking how the `_API` macros expanded
//! 4. Simulating rejected platforms by redefining the compiler's
//!    predefined macros and checking the build fails with the right message
//!
//! Usage: test-runner --generator <path> [--cc <compiler>] [--work-dir <dir>]
//!
//! The platform checks assume a Linux host with a GCC or Clang compiler.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitCode, Output};

use serde_json::Value;

/// Executable extension
#[cfg(windows)]
const EXE_EXT: &str = ".exe";
#[cfg(not(windows))]
const EXE_EXT: &str = "";

const VISIBILITY_DEFAULT: &str = r#"__attribute__((visibility("default")))"#;

/// Prints which ANT platform macro is defined and what `ANT_API` expands to.
const PROBE_SOURCE: &str = r#"#include <stdio.h>
#include "export.h"

#define STR2(x) #x
#define STR(x) STR2(x)

int main(void) {
#ifdef ANT_PLATFORM_LINUX
    puts("PLATFORM:linux");
#endif
#ifdef ANT_PLATFORM_WINDOWS
    puts("PLATFORM:windows");
#endif
    puts("API:[" STR(ANT_API) "]");
    return 0;
}
"#;

/// Test configuration
struct TestConfig {
    /// Path to the gen-export-header binary
    generator_path: PathBuf,
    /// C compiler driver
    cc: String,
    /// Working directory for test artifacts
    work_dir: PathBuf,
}

impl TestConfig {
    fn from_args() -> Result<Self, String> {
        let args: Vec<String> = env::args().collect();

        let mut generator_path = None;
        let mut cc = None;
        let mut work_dir = None;

        let mut i = 1;
        while i < args.len() {
            match args[i].as_str() {
                "--generator" | "--cc" | "--work-dir" if i + 1 >= args.len() => {
                    return Err(format!("{} requires an argument", args[i]));
                }
                "--generator" => {
                    i += 1;
                    generator_path = Some(PathBuf::from(&args[i]));
                }
                "--cc" => {
                    i += 1;
                    cc = Some(args[i].clone());
                }
                "--work-dir" => {
                    i += 1;
                    work_dir = Some(PathBuf::from(&args[i]));
                }
                "--help" | "-h" => {
                    println!("Usage: test-runner --generator <path> [--cc <compiler>] [--work-dir <dir>]");
                    println!();
                    println!("Options:");
                    println!("  --generator  Path to gen-export-header binary");
                    println!("  --cc         C compiler (default: $CC or cc)");
                    println!("  --work-dir   Working directory for test artifacts (default: temp dir)");
                    std::process::exit(0);
                }
                _ => {
                    return Err(format!("Unknown argument: {}", args[i]));
                }
            }
            i += 1;
        }

        let generator_path = generator_path.ok_or("--generator is required")?;
        let cc = cc
            .or_else(|| env::var("CC").ok())
            .unwrap_or_else(|| "cc".to_string());
        let work_dir = work_dir.unwrap_or_else(|| env::temp_dir().join("export-header-tests"));

        if !generator_path.exists() {
            return Err(format!("Generator not found: {}", generator_path.display()));
        }

        Ok(Self {
            generator_path,
            cc,
            work_dir,
        })
    }
}

/// Generate `<dir>/<file>` for `prefix`.
fn generate_header(config: &TestConfig, dir: &Path, prefix: &str, file: &str) -> Result<PathBuf, String> {
    let output_path = dir.join(file);
    let output = Command::new(&config.generator_path)
        .args(["header", "--prefix", prefix, "--output"])
        .arg(&output_path)
        .output()
        .map_err(|e| format!("Failed to run generator: {}", e))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(format!("Generator failed: {}", stderr));
    }

    Ok(output_path)
}

/// Compile `source` in `dir`. With `link` the result is an executable
/// named `probe`, otherwise only an object file is produced.
fn compile(config: &TestConfig, dir: &Path, source: &str, defines: &[&str], link: bool) -> Result<Output, String> {
    let source_path = dir.join("probe.c");
    fs::write(&source_path, source).map_err(|e| format!("Failed to write probe.c: {}", e))?;

    let mut cmd = Command::new(&config.cc);
    cmd.current_dir(dir);
    cmd.args(["-Wall", "-Werror", "-I."]);
    for define in defines {
        cmd.arg(define);
    }
    if link {
        cmd.arg("-o").arg(format!("probe{}", EXE_EXT));
    } else {
        cmd.args(["-c", "-o", "probe.o"]);
    }
    cmd.arg("probe.c");

    cmd.output().map_err(|e| format!("Failed to run {}: {}", config.cc, e))
}

/// Compile, link and run a probe, returning its stdout.
fn run_probe(config: &TestConfig, dir: &Path, source: &str, defines: &[&str]) -> Result<String, String> {
    let output = compile(config, dir, source, defines, true)?;
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(format!("Compilation failed with {:?}: {}", defines, stderr));
    }

    let output = Command::new(dir.join(format!("probe{}", EXE_EXT)))
        .output()
        .map_err(|e| format!("Failed to run probe: {}", e))?;
    if !output.status.success() {
        return Err(format!("Probe exited with {:?}", output.status.code()));
    }

    Ok(String::from_utf8_lossy(&output.stdout).to_string())
}

fn test_dir(config: &TestConfig, name: &str) -> Result<PathBuf, String> {
    let dir = config.work_dir.join(name);
    fs::create_dir_all(&dir).map_err(|e| format!("Failed to create test dir: {}", e))?;
    Ok(dir)
}

fn expect_line(stdout: &str, expected: &str) -> Result<(), String> {
    if stdout.lines().any(|l| l == expected) {
        Ok(())
    } else {
        Err(format!("Expected line '{}', got:\n{}", expected, stdout))
    }
}

/// Test: platform macro and the three build kinds on the host
fn test_build_kinds(config: &TestConfig) -> Result<(), String> {
    println!("  Running test: build_kinds");

    let dir = test_dir(config, "test_build_kinds")?;
    generate_header(config, &dir, "ANT", "export.h")?;

    let stdout = run_probe(config, &dir, PROBE_SOURCE, &[])?;
    expect_line(&stdout, "PLATFORM:linux")?;
    expect_line(&stdout, "API:[]")?;
    println!("    PASS (consumer)");

    let stdout = run_probe(config, &dir, PROBE_SOURCE, &["-DANT_BUILD"])?;
    expect_line(&stdout, &format!("API:[{}]", VISIBILITY_DEFAULT))?;
    println!("    PASS (building)");

    let stdout = run_probe(config, &dir, PROBE_SOURCE, &["-DANT_STATIC"])?;
    expect_line(&stdout, "API:[]")?;
    println!("    PASS (static)");

    Ok(())
}

/// Test: static wins when both static and build are set
fn test_static_precedence(config: &TestConfig) -> Result<(), String> {
    println!("  Running test: static_precedence");

    let dir = test_dir(config, "test_static_precedence")?;
    generate_header(config, &dir, "ANT", "export.h")?;

    let stdout = run_probe(config, &dir, PROBE_SOURCE, &["-DANT_STATIC", "-DANT_BUILD"])?;
    expect_line(&stdout, "API:[]")?;

    println!("    PASS");
    Ok(())
}

/// Test: including the header twice is harmless
fn test_double_include(config: &TestConfig) -> Result<(), String> {
    println!("  Running test: double_include");

    let dir = test_dir(config, "test_double_include")?;
    generate_header(config, &dir, "ANT", "export.h")?;

    let source = "#include \"export.h\"\n#include \"export.h\"\nANT_API int answer(void);\nint answer(void) { return 42; }\n";
    for defines in [&[][..], &["-DANT_BUILD"][..], &["-DANT_STATIC"][..]] {
        let output = compile(config, &dir, source, defines, false)?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(format!("Double include failed with {:?}: {}", defines, stderr));
        }
    }

    println!("    PASS");
    Ok(())
}

/// Test: two libraries with different prefixes in one translation unit
fn test_two_prefixes(config: &TestConfig) -> Result<(), String> {
    println!("  Running test: two_prefixes");

    let dir = test_dir(config, "test_two_prefixes")?;
    generate_header(config, &dir, "ANT", "export.h")?;
    generate_header(config, &dir, "PROJ", "proj_export.h")?;

    let source = r#"#include <stdio.h>
#include "export.h"
#include "proj_export.h"

#define STR2(x) #x
#define STR(x) STR2(x)

int main(void) {
    puts("ANT:[" STR(ANT_API) "]");
    puts("PROJ:[" STR(PROJ_API) "]");
    return 0;
}
"#;
    let stdout = run_probe(config, &dir, source, &["-DANT_BUILD"])?;
    expect_line(&stdout, &format!("ANT:[{}]", VISIBILITY_DEFAULT))?;
    expect_line(&stdout, "PROJ:[]")?;

    println!("    PASS");
    Ok(())
}

/// Test: redefined platform macros are rejected with the right diagnostic
fn test_rejected_platforms(config: &TestConfig) -> Result<(), String> {
    println!("  Running test: rejected_platforms");

    let dir = test_dir(config, "test_rejected_platforms")?;
    generate_header(config, &dir, "ANT", "export.h")?;

    let source = "#include \"export.h\"\nint unused;\n";
    let cases: [(&[&str], &str); 3] = [
        // Android toolchains define __linux__ too.
        (&["-D__ANDROID__"], "Android is not supported!"),
        (&["-U__linux__"], "Unknown platform!"),
        (&["-D_WIN32"], "x86 builds are not supported!"),
    ];

    for (defines, message) in cases {
        let output = compile(config, &dir, source, defines, false)?;
        let stderr = String::from_utf8_lossy(&output.stderr);
        if output.status.success() {
            return Err(format!("Compilation with {:?} should have failed", defines));
        }
        if !stderr.contains(message) {
            return Err(format!("Expected '{}' with {:?}, got: {}", message, defines, stderr));
        }
        println!("    PASS ({})", message);
    }

    Ok(())
}

/// Run `gen-export-header resolve` and return (exit code, stdout, stderr)
fn run_resolve(config: &TestConfig, args: &[&str]) -> Result<(i32, String, String), String> {
    let output = Command::new(&config.generator_path)
        .arg("resolve")
        .args(args)
        .output()
        .map_err(|e| format!("Failed to run generator: {}", e))?;

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    Ok((output.status.code().unwrap_or(-1), stdout, stderr))
}

/// Test: resolution of foreign targets through the CLI
fn test_resolve_targets(config: &TestConfig) -> Result<(), String> {
    println!("  Running test: resolve_targets");

    let (code, stdout, stderr) = run_resolve(
        config,
        &["--target", "x86_64-pc-windows-msvc", "--build-kind", "build", "--prefix", "PROJ", "--json"],
    )?;
    if code != 0 {
        return Err(format!("resolve failed: {}", stderr));
    }
    let value: Value = serde_json::from_str(&stdout).map_err(|e| format!("Invalid JSON: {}: {}", e, stdout))?;
    if value["platform"] != "windows-x64" || value["platform_macro"] != "PROJ_PLATFORM_WINDOWS" {
        return Err(format!("Unexpected platform: {}", stdout));
    }
    if value["api"] != "__declspec(dllexport)" {
        return Err(format!("Unexpected api decoration: {}", value["api"]));
    }
    println!("    PASS (windows x64 build)");

    let (code, stdout, stderr) = run_resolve(
        config,
        &["--target", "x86_64-unknown-linux-gnu", "--build-kind", "consume", "--json"],
    )?;
    if code != 0 {
        return Err(format!("resolve failed: {}", stderr));
    }
    let value: Value = serde_json::from_str(&stdout).map_err(|e| format!("Invalid JSON: {}: {}", e, stdout))?;
    if value["api"] != "" {
        return Err(format!("Linux consumers should not be decorated: {}", value["api"]));
    }
    println!("    PASS (linux consume)");

    let rejected = [
        ("i686-pc-windows-msvc", "x86 builds are not supported!"),
        ("aarch64-apple-darwin", "macOS is not supported!"),
        ("aarch64-apple-ios-sim", "iOS simulator is not supported!"),
        ("aarch64-linux-android", "Android is not supported!"),
    ];
    for (target, message) in rejected {
        let (code, _, stderr) = run_resolve(config, &["--target", target])?;
        if code != 1 {
            return Err(format!("{} should be rejected, exit code {}", target, code));
        }
        if !stderr.contains(message) {
            return Err(format!("Expected '{}' for {}, got: {}", message, target, stderr));
        }
    }
    println!("    PASS (rejections)");

    Ok(())
}

fn main() -> ExitCode {
    println!("=== Export Header Test Suite ===");
    println!();

    let config = match TestConfig::from_args() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: {}", e);
            eprintln!("Use --help for usage information");
            return ExitCode::from(1);
        }
    };

    // Clean and recreate work directory
    if config.work_dir.exists() {
        if let Err(e) = fs::remove_dir_all(&config.work_dir) {
            eprintln!("Warning: Failed to clean work dir: {}", e);
        }
    }
    if let Err(e) = fs::create_dir_all(&config.work_dir) {
        eprintln!("Error: Failed to create work dir: {}", e);
        return ExitCode::from(1);
    }

    println!("Configuration:");
    println!("  Generator: {}", config.generator_path.display());
    println!("  Compiler:  {}", config.cc);
    println!("  Work dir:  {}", config.work_dir.display());
    println!();

    let tests: Vec<(&str, fn(&TestConfig) -> Result<(), String>)> = vec![
        ("build_kinds", test_build_kinds),
        ("static_precedence", test_static_precedence),
        ("double_include", test_double_include),
        ("two_prefixes", test_two_prefixes),
        ("rejected_platforms", test_rejected_platforms),
        ("resolve_targets", test_resolve_targets),
    ];

    let mut passed = 0;
    let mut failed = 0;

    println!("Running {} tests...", tests.len());
    println!();

    for (name, test_fn) in &tests {
        match test_fn(&config) {
            Ok(()) => {
                passed += 1;
            }
            Err(e) => {
                println!("  FAILED ({}): {}", name, e);
                failed += 1;
            }
        }
    }

    println!();
    println!("=== Results ===");
    println!("Passed: {}", passed);
    println!("Failed: {}", failed);
    println!();

    if failed > 0 {
        ExitCode::from(1)
    } else {
        println!("All tests passed!");
        ExitCode::SUCCESS
    }
}
