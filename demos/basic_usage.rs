//! Basic usage example for morphosis
//!
//! This example walks through the pipeline one stage at a time:
//! - Evaluating the fractal at single points
//! - Sampling a lattice into a scalar field
//! - Triangulating the field with marching cubes
//! - Regenerating through a session and exporting the mesh

use morphosis::prelude::*;

fn main() -> anyhow::Result<()> {
    println!("morphosis Umbrella Crate Example");
    println!("================================");

    // Point evaluation
    let params = FractalParameters::default();
    let evaluator = FractalEvaluator::new(params, 0.05);
    println!("\nJulia c = {:?}", params.c);
    for position in [
        Point3f::new(0.0, 0.0, 0.0),
        Point3f::new(0.5, 0.0, 0.0),
        Point3f::new(1.5, 1.5, 1.5),
    ] {
        println!("- value at {:?}: {}", position, evaluator.evaluate(&position));
    }

    // Lattice sampling
    let grid = GridSpec::centered(1.5, 0.1)?;
    let field = sample_grid(&grid, &params)?;
    let inside = field.values().iter().filter(|&&v| v > 0.0).count();
    println!("\nSampled {} lattice points, {} inside the set", field.len(), inside);

    // Triangulation
    let triangulator = MarchingCubesTriangulator::new();
    let pool = TriangleAccumulator::pool_for_cubes(grid.cube_count()?)?;
    let mut accumulator = TriangleAccumulator::with_pool(pool)?;
    let stats = triangulator.triangulate_field(&field, &mut accumulator)?;
    println!(
        "Triangulated {} cubes ({} empty) into {} triangles",
        stats.cubes, stats.empty_cubes, stats.triangles
    );

    let (min, max) = accumulator.triangles().bounding_box();
    println!("Bounding box: {:?} .. {:?}", min, max);

    // Render attribute streams, one entry per vertex
    let triangles = accumulator.triangles();
    let normals = triangles.normal_data();
    let colors = triangles.color_data(&params.c);
    println!(
        "Vertex streams: {} position, {} normal, {} colour floats",
        triangles.vertex_data().len(),
        normals.len(),
        colors.len()
    );

    // Session with buffer reuse across parameter changes
    let mut session = GenerationSession::new(grid, params)?;
    for kind in [FractalKind::Julia, FractalKind::Mandelbrot, FractalKind::Hybrid] {
        session.set_parameters(params.with_kind(kind))?;
        let report = session.regenerate()?;
        println!(
            "- {:?}: {} triangles in {:.2?}",
            kind, report.triangle_count, report.elapsed
        );
    }

    // Export
    let path = std::env::temp_dir().join("morphosis_basic_usage.obj");
    write_mesh(session.triangles(), &path)?;
    println!("\nWrote {}", path.display());

    Ok(())
}
