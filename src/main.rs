//! Heightsim CLI - heightfield terrain generator.
//!
//! Generates hill terrains or imports grayscale images, runs droplet erosion
//! and exports the result as 16-bit PNG heightmaps and normal maps.

use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::time::Instant;

use heightsim::erosion::ErosionConfig;
use heightsim::export::{
    export_height_png, export_normal_map_png, NormalMapOptions, PngExportOptions,
};
use heightsim::mesh::{index_count, MeshBuilder, VertexAttributes};
use heightsim::pipeline::{ErosionStage, HillStage, ImageStage, Pipeline, StageConfig};
use heightsim::terrain::{HeightField, HillParameters};

/// Heightfield terrain generator with droplet erosion.
#[derive(Parser)]
#[command(name = "heightsim")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a terrain from randomly placed hills.
    Generate {
        /// Grid rows.
        #[arg(long)]
        rows: Option<usize>,

        /// Grid columns.
        #[arg(long)]
        columns: Option<usize>,

        /// Number of hills to place.
        #[arg(long)]
        hills: Option<u32>,

        /// Smallest hill radius in cells.
        #[arg(long)]
        radius_min: Option<u32>,

        /// Largest hill radius in cells.
        #[arg(long)]
        radius_max: Option<u32>,

        /// Lowest hill peak height.
        #[arg(long)]
        height_min: Option<f32>,

        /// Highest hill peak height.
        #[arg(long)]
        height_max: Option<f32>,

        /// JSON file with hill parameters; flags override its values.
        #[arg(long)]
        hills_config: Option<PathBuf>,

        /// Random seed for reproducible generation.
        #[arg(short, long)]
        seed: Option<u64>,

        #[command(flatten)]
        erosion: ErosionArgs,

        #[command(flatten)]
        export: ExportArgs,
    },

    /// Load a terrain from a grayscale image (first channel is used).
    Load {
        /// Image file to read heights from.
        image: PathBuf,

        /// Random seed for erosion.
        #[arg(short, long)]
        seed: Option<u64>,

        #[command(flatten)]
        erosion: ErosionArgs,

        #[command(flatten)]
        export: ExportArgs,
    },

    /// Display buffer sizes for a grid and vertex layout.
    Info {
        /// Grid rows.
        #[arg(long, default_value = "200")]
        rows: usize,

        /// Grid columns.
        #[arg(long, default_value = "200")]
        columns: usize,

        /// Leave texture coordinates out of the vertex layout.
        #[arg(long)]
        no_texcoords: bool,

        /// Leave normals out of the vertex layout.
        #[arg(long)]
        no_normals: bool,
    },
}

#[derive(Args)]
struct ErosionArgs {
    /// Skip droplet erosion.
    #[arg(long)]
    skip_erosion: bool,

    /// Droplets per erosion invocation.
    #[arg(long)]
    erosion_cycles: Option<u32>,

    /// Number of erosion invocations.
    #[arg(long)]
    erosion_invocations: Option<u32>,

    /// JSON file with erosion parameters; flags override its values.
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Args)]
struct ExportArgs {
    /// Output directory for generated files.
    #[arg(short, long, default_value = "./output")]
    output: PathBuf,

    /// Base name for output files.
    #[arg(short, long, default_value = "terrain")]
    name: String,

    /// Also export an RGB normal map.
    #[arg(long)]
    normal_map: bool,

    /// Stretch the actual height range over the full 16 bits.
    #[arg(long)]
    auto_range: bool,
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Generate {
            rows,
            columns,
            hills,
            radius_min,
            radius_max,
            height_min,
            height_max,
            hills_config,
            seed,
            erosion,
            export,
        } => {
            let mut params = match &hills_config {
                Some(path) => HillParameters::from_json_file(path).unwrap_or_else(|e| {
                    eprintln!("Error reading hill config {}: {}", path.display(), e);
                    std::process::exit(1);
                }),
                None => HillParameters::default(),
            };
            params.rows = rows.unwrap_or(params.rows);
            params.columns = columns.unwrap_or(params.columns);
            params.num_hills = hills.unwrap_or(params.num_hills);
            params.radius_min = radius_min.unwrap_or(params.radius_min);
            params.radius_max = radius_max.unwrap_or(params.radius_max);
            params.height_min = height_min.unwrap_or(params.height_min);
            params.height_max = height_max.unwrap_or(params.height_max);

            if let Err(e) = params.validate() {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }

            let seed = seed.unwrap_or_else(rand::random);
            println!("Heightsim - Hill Terrain Generator");
            println!("==================================");
            println!("Grid: {}x{} ({} hills)", params.rows, params.columns, params.num_hills);
            println!("Seed: {}", seed);

            run_pipeline(HillStage::new(params), seed, &erosion, &export);
        }
        Commands::Load {
            image,
            seed,
            erosion,
            export,
        } => {
            let seed = seed.unwrap_or_else(rand::random);
            println!("Heightsim - Image Terrain Import");
            println!("================================");
            println!("Image: {}", image.display());
            println!("Seed: {}", seed);

            run_pipeline(ImageStage::new(image), seed, &erosion, &export);
        }
        Commands::Info {
            rows,
            columns,
            no_texcoords,
            no_normals,
        } => {
            let attributes = VertexAttributes {
                positions: true,
                texcoords: !no_texcoords,
                normals: !no_normals,
            };
            run_info(rows, columns, attributes);
        }
    }
}

fn erosion_config(args: &ErosionArgs) -> ErosionConfig {
    let mut config = match &args.config {
        Some(path) => ErosionConfig::from_json_file(path).unwrap_or_else(|e| {
            eprintln!("Error reading erosion config {}: {}", path.display(), e);
            std::process::exit(1);
        }),
        None => ErosionConfig::default(),
    };
    config.cycles = args.erosion_cycles.unwrap_or(config.cycles);
    config.remaining = args.erosion_invocations.unwrap_or(config.remaining);
    config
}

fn run_pipeline<S>(source: S, seed: u64, erosion: &ErosionArgs, export: &ExportArgs)
where
    S: heightsim::pipeline::GenerationStage + 'static,
{
    let start = Instant::now();

    let mut pipeline = Pipeline::new(StageConfig::with_seed(seed));
    pipeline.add_stage(source);

    if !erosion.skip_erosion {
        let config = erosion_config(erosion);
        println!(
            "Erosion enabled: {} invocations x {} droplets",
            config.remaining, config.cycles
        );
        pipeline.add_stage(ErosionStage::new(config));
    } else {
        println!("Erosion: SKIPPED");
    }

    let mut field = HeightField::empty();
    pipeline
        .run_with_callbacks(
            &mut field,
            |name, i, total| {
                println!("\n[{}/{}] {}...", i + 1, total, name);
            },
            |name, _, _| {
                println!("  {} complete ({:.2?})", name, start.elapsed());
            },
        )
        .unwrap_or_else(|e| {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        });

    let (min, max) = field.height_range();
    let mesh = MeshBuilder::default().build(&field);
    println!("\nTerrain: {}x{}", field.rows(), field.columns());
    println!("Height range: [{:.4}, {:.4}]", min, max);
    println!(
        "Mesh: {} vertices, {} indices",
        mesh.vertex_count,
        mesh.indices.len()
    );

    write_outputs(&field, export);

    println!("\nTotal time: {:.2?}", start.elapsed());
    println!("Done!");
}

fn write_outputs(field: &HeightField, export: &ExportArgs) {
    std::fs::create_dir_all(&export.output).unwrap_or_else(|e| {
        eprintln!("Error creating {}: {}", export.output.display(), e);
        std::process::exit(1);
    });

    let options = if export.auto_range {
        PngExportOptions::auto_range(field)
    } else {
        PngExportOptions::default()
    };
    let height_path = export.output.join(format!("{}.png", export.name));
    export_height_png(field, &height_path, &options).unwrap_or_else(|e| {
        eprintln!("Error exporting heightmap: {}", e);
        std::process::exit(1);
    });
    report_file(&height_path);

    if export.normal_map {
        let normal_path = export.output.join(format!("{}_normal.png", export.name));
        export_normal_map_png(field, &normal_path, &NormalMapOptions::default()).unwrap_or_else(
            |e| {
                eprintln!("Error exporting normal map: {}", e);
                std::process::exit(1);
            },
        );
        report_file(&normal_path);
    }
}

fn report_file(path: &Path) {
    match std::fs::metadata(path) {
        Ok(meta) => println!("Wrote {} ({} bytes)", path.display(), meta.len()),
        Err(_) => println!("Wrote {}", path.display()),
    }
}

fn run_info(rows: usize, columns: usize, attributes: VertexAttributes) {
    let vertices = (rows as u64) * (columns as u64);
    let indices = index_count(rows, columns) as u64;
    let stride = attributes.stride() as u64;

    let bytes_heights = vertices * 4;
    let bytes_vertices = vertices * stride;
    let bytes_indices = indices * 4;
    let bytes_png = vertices * 2;

    println!("Heightsim - Terrain Configuration Info");
    println!("======================================");
    println!();
    println!("Grid: {}x{}", rows, columns);
    println!(
        "Vertex layout: positions={} texcoords={} normals={} ({} bytes/vertex)",
        attributes.positions, attributes.texcoords, attributes.normals, stride
    );
    println!();
    println!("Buffer sizes:");
    println!("  Vertices:  {:>12}", vertices);
    println!("  Indices:   {:>12} ({} strips)", indices, rows.saturating_sub(1));
    println!("  Restart:   {:>12}", vertices);
    println!();
    println!("Memory usage:");
    println!("  Heights:        {:>12} bytes ({:.2} MB)", bytes_heights, bytes_heights as f64 / 1024.0 / 1024.0);
    println!("  Vertex buffer:  {:>12} bytes ({:.2} MB)", bytes_vertices, bytes_vertices as f64 / 1024.0 / 1024.0);
    println!("  Index buffer:   {:>12} bytes ({:.2} MB)", bytes_indices, bytes_indices as f64 / 1024.0 / 1024.0);
    println!("  PNG (16-bit):   {:>12} bytes ({:.2} MB, uncompressed)", bytes_png, bytes_png as f64 / 1024.0 / 1024.0);

    if vertices > u32::MAX as u64 {
        println!();
        println!("Warning: grid exceeds 32-bit index range");
    }
}
