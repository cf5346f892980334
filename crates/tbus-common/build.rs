//! ---
//! tbus_section: "01-core-functionality"
//! tbus_subsection: "build"
//! tbus_type: "source"
//! tbus_scope: "code"
//! tbus_description: "Build script capturing version metadata."
//! tbus_version: "v0.0.0-prealpha"
//! tbus_owner: "tbd"
//! ---
use vergen::EmitBuilder;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // No git instructions: the commit hash comes from `TBUS_GIT_SHA` at build time.
    EmitBuilder::builder().all_build().all_cargo().emit()?;

    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-env-changed=TBUS_GIT_SHA");
    Ok(())
}
