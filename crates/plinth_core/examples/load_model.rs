//! Example: load and inspect a 3D asset file.
//!
//! Run with: cargo run --example load_model -- path/to/model.usdz

use std::env;
use std::path::Path;

use anyhow::Context;

use plinth_core::{load_asset, CancelFlag, SUPPORTED_FORMATS};

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        println!("Usage: load_model <path-to-model>");
        println!("\nSupported formats:");
        for capability in SUPPORTED_FORMATS {
            println!("  {:?}: {}", capability.format, capability.extensions.join(", "));
        }
        return Ok(());
    }

    let path = Path::new(&args[1]);
    println!("Loading {}", path.display());

    let asset = load_asset(path, &CancelFlag::new())
        .with_context(|| format!("failed to load {}", path.display()))?;

    println!("\n=== Asset: {} ===", asset.root.name);
    println!("Nodes: {}", asset.root.node_count());
    println!("Meshes: {}", asset.root.mesh_count());
    println!("Triangles: {}", asset.root.triangle_count());
    println!("Materials: {}", asset.materials.len());

    println!("\n--- Tree ---");
    asset.root.visit(|node, world| {
        let pos = world.transform_point3(plinth_math::Vec3::ZERO);
        let kind = if node.mesh.is_some() { "mesh" } else { "group" };
        println!(
            "  {} '{}' at ({:.2}, {:.2}, {:.2})",
            kind,
            if node.name.is_empty() { "<unnamed>" } else { &node.name },
            pos.x,
            pos.y,
            pos.z
        );
    });

    let bounds = asset.root.world_bounds();
    if !bounds.is_empty() {
        println!("\n--- World bounds (meters) ---");
        println!(
            "  Min: ({:.3}, {:.3}, {:.3})",
            bounds.min().x,
            bounds.min().y,
            bounds.min().z
        );
        println!(
            "  Max: ({:.3}, {:.3}, {:.3})",
            bounds.max().x,
            bounds.max().y,
            bounds.max().z
        );
    }

    Ok(())
}
