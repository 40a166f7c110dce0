use clap::{Parser, Subcommand};
use std::fs;
use std::path::PathBuf;

use protolith::compile_to_json;
use protolith_compiler::error::ProtoError;
use protolith_compiler::{compile_schema, compile_to_artifacts};

#[derive(Parser)]
#[command(name = "protolith-cli")]
#[command(about = "Compile proto2 schemas to record layouts and wire codecs", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate the layout and codec source files from a schema
    Gen {
        /// Input schema file
        #[arg(short, long)]
        input: PathBuf,

        /// Output directory (defaults to the input file's directory)
        #[arg(short, long)]
        out_dir: Option<PathBuf>,
    },

    /// Compile a schema and report its message and enum inventory
    Check {
        /// Input schema file
        #[arg(short, long)]
        input: PathBuf,
    },

    /// Compile a schema and print its flat form as JSON
    Dump {
        /// Input schema file
        #[arg(short, long)]
        input: PathBuf,
    },
}

fn main() -> Result<(), ProtoError> {
    let cli = Cli::parse();

    match &cli.command {
        Commands::Gen { input, out_dir } => {
            let text = fs::read_to_string(input).map_err(ProtoError::Io)?;

            let stem = input
                .file_stem()
                .map(|s| s.to_string_lossy().to_lowercase())
                .unwrap_or_else(|| "schema".to_string());
            let layout_mod = format!("{}_layout", stem);

            let (layout_src, codec_src) = compile_to_artifacts(&text, &layout_mod)?;

            let dir = match out_dir {
                Some(dir) => dir.clone(),
                None => input.parent().map(PathBuf::from).unwrap_or_default(),
            };
            let layout_path = dir.join(format!("{}_layout.rs", stem));
            let codec_path = dir.join(format!("{}_codec.rs", stem));

            fs::write(&layout_path, &layout_src).map_err(ProtoError::Io)?;
            fs::write(&codec_path, &codec_src).map_err(ProtoError::Io)?;
            println!(
                "Compiled {} → {} + {}",
                input.display(),
                layout_path.display(),
                codec_path.display()
            );
            Ok(())
        }

        Commands::Check { input } => {
            let text = fs::read_to_string(input).map_err(ProtoError::Io)?;
            let (flat, _codec) = compile_schema(&text)?;
            println!(
                "{}: {} message(s), {} enum(s)",
                input.display(),
                flat.messages.len(),
                flat.enums.len()
            );
            for message in &flat.messages {
                println!("  message {} ({} field(s))", message.name, message.fields.len());
            }
            for spec in &flat.enums {
                println!("  enum {} ({} value(s))", spec.name, spec.values.len());
            }
            Ok(())
        }

        Commands::Dump { input } => {
            let text = fs::read_to_string(input).map_err(ProtoError::Io)?;
            let json = compile_to_json(&text)?;
            println!("{}", json);
            Ok(())
        }
    }
}
