use std::path::PathBuf;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Use protoc-bin-vendored to avoid needing protoc installed
    std::env::set_var("PROTOC", protoc_bin_vendored::protoc_bin_path().unwrap());

    // Proto files are relative to workspace root
    let proto_dir = PathBuf::from("../../protocol");
    let proto = proto_dir.join("inference.proto");

    if !proto.exists() {
        panic!("Proto file not found: {}", proto.display());
    }

    // Server stubs are only used by the in-process mock backend in tests,
    // but generating them keeps one compile path for both sides.
    tonic_build::configure()
        .build_server(true)
        .build_client(true)
        .compile_protos(&[&proto], &[&proto_dir])?;

    println!("cargo:rerun-if-changed={}", proto.display());
    println!("cargo:rerun-if-changed=build.rs");

    Ok(())
}
