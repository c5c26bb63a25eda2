fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Compile the proto file for the encoder client. If `protoc` is not
    // available in the build environment, fall back to the vendored
    // pre-generated code (kept in sync with ../../proto/encoder.proto).
    println!("cargo:rerun-if-changed=../../proto/encoder.proto");
    println!("cargo:rerun-if-changed=vendored/encoder.rs");
    if let Err(err) = tonic_build::compile_protos("../../proto/encoder.proto") {
        let msg = err.to_string();
        if msg.contains("protoc") {
            let out_dir = std::env::var("OUT_DIR")?;
            std::fs::copy(
                "vendored/encoder.rs",
                std::path::Path::new(&out_dir).join("encoder.rs"),
            )?;
        } else {
            return Err(err.into());
        }
    }
    Ok(())
}
