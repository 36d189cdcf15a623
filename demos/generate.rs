//! Command line fractal mesh generator
//!
//! Builds a parameter set from the defaults, an optional JSON file and the
//! command line flags (in that order), regenerates the mesh and writes it as
//! Wavefront OBJ.
//!
//! ```text
//! generate --kind mandelbrot --step 0.025 --supersampling 2 -o mandelbrot.obj
//! RUST_LOG=debug generate --config params.json --repeat 5
//! ```

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use morphosis::prelude::*;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum KindArg {
    Julia,
    Mandelbrot,
    Hybrid,
}

impl From<KindArg> for FractalKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Julia => FractalKind::Julia,
            KindArg::Mandelbrot => FractalKind::Mandelbrot,
            KindArg::Hybrid => FractalKind::Hybrid,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum FormulaArg {
    /// z² + c
    Standard,
    /// z³ + c
    Cubic,
    /// z² + z + c
    QuadraticLinear,
    /// |z|² − z² + c
    MagnitudeBased,
}

impl From<FormulaArg> for Formula {
    fn from(formula: FormulaArg) -> Self {
        match formula {
            FormulaArg::Standard => Formula::Standard,
            FormulaArg::Cubic => Formula::Cubic,
            FormulaArg::QuadraticLinear => Formula::QuadraticLinear,
            FormulaArg::MagnitudeBased => Formula::MagnitudeBased,
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "generate")]
#[command(about = "Mesh a quaternion Julia/Mandelbrot fractal with marching cubes", long_about = None)]
struct Args {
    /// JSON file with fractal parameters; flags override its values
    #[arg(long)]
    config: Option<PathBuf>,

    /// Lower lattice corner as x,y,z
    #[arg(long, value_parser = parse_vec3, allow_hyphen_values = true)]
    min: Option<[f32; 3]>,

    /// Upper lattice corner as x,y,z
    #[arg(long, value_parser = parse_vec3, allow_hyphen_values = true)]
    max: Option<[f32; 3]>,

    /// Lattice spacing
    #[arg(long)]
    step: Option<f32>,

    #[arg(long, value_enum)]
    kind: Option<KindArg>,

    #[arg(long, value_enum)]
    formula: Option<FormulaArg>,

    /// Request double precision iteration for deep zoom
    #[arg(long)]
    double: bool,

    #[arg(long)]
    zoom: Option<f64>,

    /// Zoom level above which double precision kicks in
    #[arg(long)]
    deep_zoom_threshold: Option<f64>,

    /// Sub-samples per axis
    #[arg(long)]
    supersampling: Option<u32>,

    /// Enable adaptive cell refinement
    #[arg(long)]
    adaptive: bool,

    /// Standard deviation above which a cell is refined
    #[arg(long)]
    detail_threshold: Option<f32>,

    /// Maximum refinement depth
    #[arg(long)]
    max_depth: Option<u32>,

    #[arg(long)]
    max_iterations: Option<u32>,

    /// Escape radius
    #[arg(long)]
    threshold: Option<f32>,

    /// Julia constant as x,y,z,w
    #[arg(long, value_parser = parse_vec4, allow_hyphen_values = true)]
    c: Option<[f32; 4]>,

    /// Fourth coordinate of the 3D slice
    #[arg(long, allow_hyphen_values = true)]
    w: Option<f32>,

    /// Output OBJ path
    #[arg(short, long, default_value = morphosis::io::DEFAULT_OUTPUT)]
    output: PathBuf,

    /// Number of regenerations over the same buffers
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
    repeat: u32,

    /// Write per-face normals
    #[arg(long)]
    normals: bool,

    /// Decimal places in the OBJ file
    #[arg(long, default_value_t = 3)]
    precision: usize,

    /// Triangulate on rayon workers
    #[cfg(feature = "parallel")]
    #[arg(long)]
    parallel: bool,

    /// Worker threads (default: rayon's global pool)
    #[cfg(feature = "parallel")]
    #[arg(long, requires = "parallel")]
    threads: Option<usize>,
}

impl Args {
    fn grid(&self) -> Result<GridSpec> {
        let defaults = GridSpec::default();
        let min = self.min.map(|[x, y, z]| Point3f::new(x, y, z)).unwrap_or(defaults.p0());
        let max = self.max.map(|[x, y, z]| Point3f::new(x, y, z)).unwrap_or(defaults.p1());
        let step = self.step.unwrap_or(defaults.step());

        GridSpec::new(min, max, step).context("invalid lattice")
    }

    fn parameters(&self) -> Result<FractalParameters> {
        let mut params = match &self.config {
            Some(path) => {
                let text = std::fs::read_to_string(path)
                    .with_context(|| format!("failed to read {}", path.display()))?;
                serde_json::from_str(&text)
                    .with_context(|| format!("failed to parse {}", path.display()))?
            }
            None => FractalParameters::default(),
        };

        if let Some(kind) = self.kind {
            params = params.with_kind(kind.into());
        }
        if let Some(formula) = self.formula {
            params = params.with_formula(formula.into());
        }
        if self.double {
            params = params.with_precision(Precision::Double);
        }
        if let Some(zoom) = self.zoom {
            params = params.with_zoom_level(zoom);
        }
        if let Some(threshold) = self.deep_zoom_threshold {
            params.deep_zoom_threshold = threshold;
        }
        if let Some(factor) = self.supersampling {
            params = params.with_supersampling(factor);
        }
        if self.adaptive {
            params = params.with_adaptive(
                self.detail_threshold.unwrap_or(params.detail_threshold),
                self.max_depth.unwrap_or(params.max_depth),
            );
        }
        if let Some(iterations) = self.max_iterations {
            params = params.with_max_iterations(iterations);
        }
        if let Some(threshold) = self.threshold {
            params = params.with_threshold(threshold);
        }
        if let Some([x, y, z, w]) = self.c {
            params = params.with_c(Quaternionf::new(x, y, z, w));
        }
        if let Some(w) = self.w {
            params = params.with_w(w);
        }

        params.validate().context("invalid fractal parameters")?;
        Ok(params)
    }
}

fn parse_components<const N: usize>(s: &str) -> std::result::Result<[f32; N], String> {
    let values = s
        .split(',')
        .map(|part| part.trim().parse::<f32>().map_err(|e| format!("'{}': {}", part, e)))
        .collect::<std::result::Result<Vec<_>, _>>()?;

    values
        .try_into()
        .map_err(|v: Vec<f32>| format!("expected {} comma-separated values, got {}", N, v.len()))
}

fn parse_vec3(s: &str) -> std::result::Result<[f32; 3], String> {
    parse_components(s)
}

fn parse_vec4(s: &str) -> std::result::Result<[f32; 4], String> {
    parse_components(s)
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    let grid = args.grid()?;
    let params = args.parameters()?;

    info!(
        resolution = ?grid.resolution(),
        kind = ?params.kind,
        formula = ?params.formula,
        "morphosis v{}",
        env!("CARGO_PKG_VERSION")
    );

    #[allow(unused_mut)]
    let mut session = GenerationSession::new(grid, params)?;

    #[cfg(feature = "parallel")]
    if args.parallel {
        let mut config = ParallelConfig::default();
        if let Some(threads) = args.threads {
            config = config.with_threads(threads);
        }
        session = session.with_parallel(config);
    }

    for run in 1..=args.repeat {
        let report = session.regenerate()?;
        info!(
            run,
            triangles = report.triangle_count,
            empty_cubes = report.empty_cubes,
            refined_cells = report.refined_cells,
            pool_overflow = report.pool_overflow,
            elapsed_ms = report.elapsed.as_secs_f64() * 1000.0,
            "generation finished"
        );
    }

    let options = ObjWriteOptions::new()
        .with_precision(args.precision)
        .with_normals(args.normals)
        .with_comment(format!(
            "morphosis {:?} {:?}, step {}, {} iterations",
            params.kind,
            params.formula,
            grid.step(),
            params.max_iterations
        ));

    ObjWriter::write_obj_file(session.triangles(), &args.output, &options)
        .with_context(|| format!("failed to write {}", args.output.display()))?;

    println!(
        "Wrote {} triangles to {}",
        session.triangles().len(),
        args.output.display()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_components() {
        assert_eq!(parse_vec3("-1.5, 0,2").unwrap(), [-1.5, 0.0, 2.0]);
        assert_eq!(parse_vec4("-0.2,0.8,0,0").unwrap(), [-0.2, 0.8, 0.0, 0.0]);
        assert!(parse_vec3("1,2").is_err());
        assert!(parse_vec4("1,2,x,4").is_err());
    }

    #[test]
    fn test_flags_override_defaults() {
        let args = Args::parse_from([
            "generate",
            "--kind",
            "mandelbrot",
            "--formula",
            "cubic",
            "--min",
            "-1,-1,-1",
            "--max",
            "1,1,1",
            "--step",
            "0.5",
            "--c",
            "0.1,-0.2,0.3,0",
            "--adaptive",
            "--max-depth",
            "2",
        ]);

        let grid = args.grid().unwrap();
        assert_eq!(grid.resolution(), [4, 4, 4]);

        let params = args.parameters().unwrap();
        assert_eq!(params.kind, FractalKind::Mandelbrot);
        assert_eq!(params.formula, Formula::Cubic);
        assert_eq!(params.c, Quaternionf::new(0.1, -0.2, 0.3, 0.0));
        assert!(params.adaptive);
        assert_eq!(params.max_depth, 2);
        assert_eq!(params.detail_threshold, 0.1);
        assert_eq!(args.output, PathBuf::from("fractal.obj"));
    }

    #[test]
    fn test_invalid_flags_are_rejected() {
        let args = Args::parse_from(["generate", "--zoom", "0.5"]);
        assert!(args.parameters().is_err());

        let args = Args::parse_from(["generate", "--step", "0"]);
        assert!(args.grid().is_err());
    }
}
