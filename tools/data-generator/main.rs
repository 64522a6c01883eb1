use ahash::AHashMap;
use clap::Parser;
use meshflow::data::Dataset;
use meshflow::mesh::{MeshHeader, VariableInfo};
use rand::{Rng, rngs::ThreadRng};
use std::fs;
use std::path::{Path, PathBuf};

/// A CLI tool to generate a synthetic result file, regions and a project for meshflow
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// The directory to write the generated files to
    #[arg(short, long, default_value = "generated")]
    output: PathBuf,

    /// Number of grid cells along x
    #[arg(long, default_value_t = 20)]
    nx: usize,

    /// Number of grid cells along y
    #[arg(long, default_value_t = 10)]
    ny: usize,

    /// Number of frames
    #[arg(long, default_value_t = 12)]
    frames: usize,

    /// Time step between frames, in seconds
    #[arg(long, default_value_t = 600.0)]
    dt: f64,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let mut rng = rand::rng();

    if cli.nx == 0 || cli.ny == 0 || cli.frames == 0 {
        eprintln!("Error: --nx, --ny and --frames must be positive");
        std::process::exit(1);
    }

    println!(
        "Generating a {}x{} grid with {} frames...",
        cli.nx, cli.ny, cli.frames
    );
    fs::create_dir_all(&cli.output)?;

    let header = generate_header(cli.nx, cli.ny);
    let time: Vec<f64> = (0..cli.frames).map(|i| i as f64 * cli.dt).collect();
    let frames = generate_frames(&mut rng, &header, cli.frames);
    let dataset = Dataset::new(header, time, frames);
    write_json(&cli.output.join("result.json"), &dataset)?;

    let (width, height) = (cli.nx as f64, cli.ny as f64);
    let polygons = vec![
        vec![[0.0, 0.0], [width / 2.0, 0.0], [width / 2.0, height], [0.0, height]],
        vec![[width / 4.0, height / 4.0], [width * 0.75, height / 4.0], [width / 2.0, height * 0.75]],
    ];
    write_json(&cli.output.join("polygons.json"), &polygons)?;

    let sections = vec![
        vec![[width / 2.0, 0.0], [width / 2.0, height]],
        vec![[0.0, height / 2.0], [width / 3.0, height / 3.0], [width, height / 2.0]],
    ];
    write_json(&cli.output.join("sections.json"), &sections)?;

    fs::write(cli.output.join("project.txt"), PROJECT)?;

    println!(
        "Successfully generated result.json, polygons.json, sections.json and project.txt in '{}'",
        cli.output.display()
    );

    Ok(())
}

const PROJECT: &str = "\
6
Input/Output|Load Mesh|0|10|20|result.json|en|
Input/Output|Load 2D Polygons|1|10|120|polygons.json
Input/Output|Load 2D Open Polylines|2|10|220|sections.json
Calculations|Compute Volume|3|220|60|H||0
Calculations|Compute Flux|4|220|180|Liquid flux (m3/s): (U, V, H)
Calculations|Compute Arrival Duration|5|220|300|[H] > 0.5|[H] > 0.5,A [H]>0.5,D [H]>0.5|minute
0|0|3|0
1|0|3|1
0|0|4|0
2|0|4|1
0|0|5|0
";

fn write_json<T: serde::Serialize>(path: &Path, value: &T) -> Result<(), Box<dyn std::error::Error>> {
    fs::write(path, serde_json::to_string_pretty(value)?)?;
    println!("-> Wrote '{}'", path.display());
    Ok(())
}

/// A regular grid, each cell split into two triangles.
fn generate_header(nx: usize, ny: usize) -> MeshHeader {
    let node = |i: usize, j: usize| j * (nx + 1) + i;
    let mut x = Vec::with_capacity((nx + 1) * (ny + 1));
    let mut y = Vec::with_capacity((nx + 1) * (ny + 1));
    for j in 0..=ny {
        for i in 0..=nx {
            x.push(i as f64);
            y.push(j as f64);
        }
    }
    let mut ikle = Vec::with_capacity(2 * nx * ny);
    for j in 0..ny {
        for i in 0..nx {
            ikle.push([node(i, j), node(i + 1, j), node(i + 1, j + 1)]);
            ikle.push([node(i, j), node(i + 1, j + 1), node(i, j + 1)]);
        }
    }
    MeshHeader {
        title: "Synthetic flood wave".to_string(),
        x,
        y,
        ikle,
        variables: vec![
            VariableInfo::new("U", "VELOCITY U", "M/S"),
            VariableInfo::new("V", "VELOCITY V", "M/S"),
            VariableInfo::new("H", "WATER DEPTH", "M"),
            VariableInfo::new("B", "BOTTOM", "M"),
        ],
        nb_frames: 0,
    }
}

/// A wave travelling along x over a noisy bottom.
fn generate_frames(rng: &mut ThreadRng, header: &MeshHeader, nb_frames: usize) -> Vec<AHashMap<String, Vec<f64>>> {
    let width = header.x.iter().copied().fold(0.0, f64::max);
    let bottom: Vec<f64> = header.x.iter().map(|_| rng.random_range(-0.1..0.1)).collect();
    (0..nb_frames)
        .map(|frame| {
            let front = width * frame as f64 / nb_frames.max(2).saturating_sub(1) as f64;
            let depth: Vec<f64> = header
                .x
                .iter()
                .zip(&bottom)
                .map(|(&x, &b)| (1.0 - (x - front).abs() / (width / 4.0).max(1.0)).max(0.0) + b.max(0.0))
                .collect();
            let u: Vec<f64> = depth
                .iter()
                .map(|&h| if h > 0.0 { 0.5 + rng.random_range(0.0..0.1) } else { 0.0 })
                .collect();
            let v: Vec<f64> = depth.iter().map(|_| rng.random_range(-0.05..0.05)).collect();

            let mut values = AHashMap::new();
            values.insert("U".to_string(), u);
            values.insert("V".to_string(), v);
            values.insert("H".to_string(), depth);
            values.insert("B".to_string(), bottom.clone());
            println!("-> Generated frame {frame}.");
            values
        })
        .collect()
}
