use clap::Parser;

#[derive(clap::Parser)]
struct Xtask {
    #[clap(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Regenerate the checked-in protobuf bindings of `strata-proto`.
    #[command(name = "generate-proto")]
    GenerateProto,
}

fn execute_generate_proto() -> anyhow::Result<()> {
    let strata_proto = std::env::current_dir()?.join("strata-proto");
    let proto_files = vec![strata_proto.join("proto").join("encodings.proto")];

    for file in &proto_files {
        if !file.exists() {
            anyhow::bail!("proto file not found: {}", file.display());
        }
    }

    let out_dir = strata_proto.join("src").join("generated");
    std::fs::create_dir_all(&out_dir)?;

    prost_build::Config::new()
        .out_dir(out_dir)
        .compile_protos(&proto_files, &[strata_proto.join("proto")])?;

    Ok(())
}

fn main() -> anyhow::Result<()> {
    let cli = Xtask::parse();
    match cli.command {
        Commands::GenerateProto => execute_generate_proto()?,
    }
    Ok(())
}
