fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Calls go through path-based transports in dex-server, so only the
    // message types are generated.
    tonic_build::configure()
        .build_server(false)
        .build_client(false)
        .compile_protos(
            &[
                "proto/odpf/entropy/v1beta1/resource.proto",
                "proto/odpf/shield/v1beta1/shield.proto",
            ],
            &["proto"],
        )?;

    println!("cargo:rerun-if-changed=proto/odpf/entropy/v1beta1/resource.proto");
    println!("cargo:rerun-if-changed=proto/odpf/shield/v1beta1/shield.proto");
    println!("cargo:rerun-if-changed=proto");

    Ok(())
}
