//! Terrain Mosaic CLI - Command-line interface
//!
//! Builds elevation rasters from terrain-RGB tiles, either once for a given
//! extent (`build`) or on demand through the HTTP job service (`serve`).

mod commands;
mod error;
mod runner;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use commands::build::BuildArgs;
use commands::serve::ServeArgs;

#[derive(Parser)]
#[command(name = "terrain-mosaic")]
#[command(version = terrain_mosaic::VERSION)]
#[command(about = "Build elevation rasters from terrain-RGB tiles", long_about = None)]
struct Cli {
    /// Enable debug logging
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build one elevation raster covering an extent
    Build {
        /// Bounding box in degrees
        #[arg(
            long,
            num_args = 4,
            value_names = ["WEST", "SOUTH", "EAST", "NORTH"],
            allow_negative_numbers = true
        )]
        extent: Vec<f64>,

        /// Tile zoom level (derived from the extent if omitted)
        #[arg(long)]
        zoom: Option<u8>,

        /// Tile source access token (overrides config)
        #[arg(long)]
        access_token: Option<String>,

        /// Output raster path (.tif appended if missing)
        #[arg(long)]
        out_file: PathBuf,

        /// Write every sample field to the intermediate point tables
        #[arg(long)]
        full: bool,
    },

    /// Run the HTTP job service
    Serve {
        /// Port to listen on (default: 3000)
        #[arg(long)]
        port: Option<u16>,

        /// Tile source access token used for every job (overrides config)
        #[arg(long)]
        access_token: Option<String>,

        /// Jobs running at once (default: 4)
        #[arg(long)]
        workers: Option<usize>,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Build {
            extent,
            zoom,
            access_token,
            out_file,
            full,
        } => {
            commands::build::run(BuildArgs {
                extent,
                zoom,
                access_token,
                out_file,
                full,
                verbose: cli.verbose,
            })
            .await
        }
        Commands::Serve {
            port,
            access_token,
            workers,
        } => {
            commands::serve::run(ServeArgs {
                port,
                access_token,
                workers,
                verbose: cli.verbose,
            })
            .await
        }
    };

    if let Err(e) = result {
        e.exit();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_build_parses_negative_extent() {
        let cli = Cli::try_parse_from([
            "terrain-mosaic",
            "build",
            "--extent",
            "-1",
            "-1.5",
            "1",
            "1.5",
            "--access-token",
            "pk.test",
            "--out-file",
            "dem.tif",
        ])
        .unwrap();

        match cli.command {
            Commands::Build {
                extent, zoom, full, ..
            } => {
                assert_eq!(extent, vec![-1.0, -1.5, 1.0, 1.5]);
                assert_eq!(zoom, None);
                assert!(!full);
            }
            _ => panic!("expected build"),
        }
    }

    #[test]
    fn test_build_requires_four_extent_values() {
        let result = Cli::try_parse_from([
            "terrain-mosaic",
            "build",
            "--extent",
            "1",
            "2",
            "3",
            "--out-file",
            "dem.tif",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_serve_flags() {
        let cli = Cli::try_parse_from([
            "terrain-mosaic",
            "serve",
            "--port",
            "8080",
            "--workers",
            "2",
        ])
        .unwrap();

        match cli.command {
            Commands::Serve {
                port,
                workers,
                access_token,
            } => {
                assert_eq!(port, Some(8080));
                assert_eq!(workers, Some(2));
                assert_eq!(access_token, None);
            }
            _ => panic!("expected serve"),
        }
    }
}
